//! Surveykit CLI - collect and export survey responses
//!
//! # Main Commands
//!
//! ```bash
//! surveykit serve                        # Start HTTP server (port 3000)
//! surveykit survey import def.json      # Import a survey definition
//! surveykit survey publish <survey>     # Open a survey for responses
//! surveykit export <survey> -f csv      # Export submitted responses
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! surveykit survey list                 # List stored surveys
//! surveykit survey show <survey>        # Show one survey definition
//! surveykit validate <survey> ans.json  # Dry-run answer validation
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use surveykit::export::{export_survey, ExportArtifact, ExportFormat};
use surveykit::models::{AnswerInput, Survey, SurveyDefinition, SurveyStatus};
use surveykit::store::SurveyStore;
use surveykit::submission::SubmissionCoordinator;
use surveykit::validation::{check_logic_graph, validate_definition, validate_response};

#[derive(Parser)]
#[command(name = "surveykit")]
#[command(about = "Survey definition, validation, and response collection", long_about = None)]
struct Cli {
    /// Database file (falls back to SURVEYKIT_DB, then surveykit.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (falls back to PORT, then 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage surveys
    Survey {
        #[command(subcommand)]
        action: SurveyAction,
    },

    /// Export submitted responses of a survey
    Export {
        /// Survey id or slug
        survey: String,

        /// Output format: csv or json
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dry-run validation of an answers file against a survey
    Validate {
        /// Survey id or slug
        survey: String,

        /// JSON file: array of {questionId, answer}
        answers: PathBuf,
    },
}

#[derive(Subcommand)]
enum SurveyAction {
    /// Import a survey definition JSON file
    Import {
        /// Definition file
        file: PathBuf,

        /// Publish immediately after import
        #[arg(long)]
        publish: bool,
    },

    /// List all stored surveys
    List,

    /// Show one survey with its questions
    Show {
        /// Survey id or slug
        survey: String,
    },

    /// Open a survey for responses
    Publish {
        /// Survey id or slug
        survey: String,
    },

    /// Close a survey to new responses
    Close {
        /// Survey id or slug
        survey: String,
    },

    /// Delete a survey (blocked while responses exist)
    Delete {
        /// Survey id or slug
        survey: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let db_path = cli
        .db
        .or_else(|| std::env::var("SURVEYKIT_DB").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("surveykit.db"));

    let result = match cli.command {
        Commands::Serve { port } => cmd_serve(port, &db_path).await,
        Commands::Survey { action } => cmd_survey(action, &db_path),
        Commands::Export {
            survey,
            format,
            output,
        } => cmd_export(&survey, &format, output.as_deref(), &db_path),
        Commands::Validate { survey, answers } => cmd_validate(&survey, &answers, &db_path),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn open_store(db_path: &Path) -> Result<SurveyStore, Box<dyn std::error::Error>> {
    Ok(SurveyStore::open(db_path)?)
}

async fn cmd_serve(port: Option<u16>, db_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let port = port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(3000);
    let store = open_store(db_path)?;
    surveykit::server::start_server(port, store).await
}

fn cmd_survey(action: SurveyAction, db_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(db_path)?;

    match action {
        SurveyAction::Import { file, publish } => {
            eprintln!("Importing definition: {}", file.display());

            let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&file)?)?;
            validate_definition(&raw)?;

            let definition: SurveyDefinition = serde_json::from_value(raw)?;
            let mut survey = Survey::from_definition(definition, chrono::Utc::now());
            if publish {
                survey.status = SurveyStatus::Published;
            }
            check_logic_graph(&survey.questions)?;

            store.create_survey(&mut survey)?;
            eprintln!("Imported '{}' ({} questions)", survey.title, survey.questions.len());
            eprintln!("   id:   {}", survey.id);
            eprintln!("   slug: {}", survey.slug);
            eprintln!("   status: {}", survey.status.as_str());
        }

        SurveyAction::List => {
            let surveys = store.list_surveys()?;
            if surveys.is_empty() {
                eprintln!("No surveys stored yet.");
                eprintln!("   Use 'surveykit survey import <file>' to add one.");
                return Ok(());
            }

            eprintln!("Stored surveys ({}):\n", surveys.len());
            for s in surveys {
                let responses = store.response_count(&s.id)?;
                println!("  {} ({})", s.title, s.slug);
                println!("     id: {}", s.id);
                println!("     status: {}", s.status.as_str());
                println!("     questions: {}, responses: {}", s.questions.len(), responses);
                println!();
            }
        }

        SurveyAction::Show { survey } => {
            let s = store
                .get_survey(&survey)?
                .ok_or_else(|| format!("Survey not found: {survey}"))?;
            println!("{}", serde_json::to_string_pretty(&s)?);
        }

        SurveyAction::Publish { survey } => {
            if !store.set_survey_status(&survey, SurveyStatus::Published)? {
                return Err(format!("Survey not found: {survey}").into());
            }
            eprintln!("Survey published: {survey}");
        }

        SurveyAction::Close { survey } => {
            if !store.set_survey_status(&survey, SurveyStatus::Closed)? {
                return Err(format!("Survey not found: {survey}").into());
            }
            eprintln!("Survey closed: {survey}");
        }

        SurveyAction::Delete { survey } => {
            let coordinator = SubmissionCoordinator::new(store);
            coordinator.remove_survey(&survey)?;
            eprintln!("Survey deleted: {survey}");
        }
    }

    Ok(())
}

fn cmd_export(
    survey: &str,
    format: &str,
    output: Option<&Path>,
    db_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let format =
        ExportFormat::parse(format).ok_or_else(|| format!("Unknown export format: {format}"))?;
    let store = open_store(db_path)?;

    match export_survey(&store, survey, format)? {
        ExportArtifact::Json(doc) => {
            let json = serde_json::to_string_pretty(&doc)?;
            write_output(&json, output)?;
        }
        ExportArtifact::Csv { content, .. } => {
            write_output(&content, output)?;
        }
    }
    Ok(())
}

fn cmd_validate(
    survey: &str,
    answers_path: &Path,
    db_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Validating answers: {}", answers_path.display());

    let store = open_store(db_path)?;
    let survey = store
        .get_survey(survey)?
        .ok_or_else(|| format!("Survey not found: {survey}"))?;

    let answers: Vec<AnswerInput> = serde_json::from_str(&fs::read_to_string(answers_path)?)?;
    let (validated, issues) = validate_response(&survey, &answers);

    if issues.is_empty() {
        eprintln!("All {} answer(s) valid!", validated.len());
        return Ok(());
    }

    eprintln!("{} issue(s) found:", issues.len());
    for issue in &issues {
        eprintln!("   - {}", issue.message);
    }
    std::process::exit(1);
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
