//! SQLite-backed storage for surveys, responses, and answers.
//!
//! The storage contract this engine relies on:
//!
//! - Every submit/draft-save writes all of its rows in one transaction;
//!   either all rows commit or none do.
//! - Duplicate submissions are prevented by a `UNIQUE` constraint on
//!   `responses.submission_key`, populated only for submitted rows of
//!   surveys that disallow multiple submissions. The coordinator's
//!   existence pre-check is an optimization; this constraint is the
//!   real guarantee under concurrency.
//! - Questions cascade-delete with their survey, answers with their
//!   response (`PRAGMA foreign_keys` is enabled on open).

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Answer, AnswerValue, FileDescriptor, Question, ResponseMetadata, ResponseStatus, Survey,
    SurveyResponse, SurveyStatus,
};
use crate::slug;
use crate::validation::ValidatedAnswer;

/// Handle to the survey database. Cheap to clone; all clones share one
/// connection.
#[derive(Clone)]
pub struct SurveyStore {
    conn: Arc<Mutex<Connection>>,
}

impl SurveyStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS surveys (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT,
                settings TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                metadata TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS questions (
                id TEXT PRIMARY KEY,
                survey_id TEXT NOT NULL REFERENCES surveys(id) ON DELETE CASCADE,
                question_type TEXT NOT NULL,
                label TEXT NOT NULL,
                description TEXT,
                placeholder TEXT,
                required INTEGER NOT NULL DEFAULT 0,
                order_index INTEGER NOT NULL DEFAULT 0,
                options TEXT,
                validation TEXT,
                logic TEXT,
                parent_question_id TEXT,
                group_id TEXT,
                allow_other INTEGER NOT NULL DEFAULT 0,
                metadata TEXT
            );

            CREATE TABLE IF NOT EXISTS responses (
                id TEXT PRIMARY KEY,
                survey_id TEXT NOT NULL REFERENCES surveys(id) ON DELETE CASCADE,
                user_id TEXT,
                uuid TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL,
                submitted_at TEXT,
                metadata TEXT,
                submission_key TEXT UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                response_id TEXT NOT NULL REFERENCES responses(id) ON DELETE CASCADE,
                question_id TEXT NOT NULL,
                value TEXT,
                files TEXT,
                UNIQUE(response_id, question_id)
            );

            CREATE INDEX IF NOT EXISTS idx_questions_survey ON questions(survey_id);
            CREATE INDEX IF NOT EXISTS idx_responses_survey ON responses(survey_id, status);
            CREATE INDEX IF NOT EXISTS idx_answers_response ON answers(response_id);
            "#,
        )?;
        Ok(())
    }

    // =========================================================================
    // Surveys
    // =========================================================================

    /// Persist a survey and its questions in one transaction, allocating
    /// a unique slug (base, then `-2`, `-3`, ... bounded by
    /// [`slug::MAX_SLUG_ATTEMPTS`]). The chosen slug is written back
    /// into `survey`.
    pub fn create_survey(&self, survey: &mut Survey) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut chosen = None;
        for candidate in slug::candidates(&survey.title) {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM surveys WHERE slug = ?1)",
                params![candidate],
                |row| row.get(0),
            )?;
            if !exists {
                chosen = Some(candidate);
                break;
            }
        }
        survey.slug = chosen.ok_or_else(|| StoreError::SlugExhausted(survey.title.clone()))?;

        tx.execute(
            "INSERT INTO surveys (id, title, slug, description, settings, status, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                survey.id,
                survey.title,
                survey.slug,
                survey.description,
                serde_json::to_string(&survey.settings)?,
                survey.status.as_str(),
                metadata_to_json(&survey.metadata)?,
                survey.created_at,
            ],
        )?;

        for question in &survey.questions {
            tx.execute(
                "INSERT INTO questions
                 (id, survey_id, question_type, label, description, placeholder, required,
                  order_index, options, validation, logic, parent_question_id, group_id,
                  allow_other, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    question.id,
                    survey.id,
                    question.question_type.as_str(),
                    question.label,
                    question.description,
                    question.placeholder,
                    question.required,
                    question.order,
                    option_to_json(&question.options)?,
                    option_to_json(&question.validation)?,
                    option_to_json(&question.logic)?,
                    question.parent_question_id,
                    question.group_id,
                    question.allow_other,
                    metadata_to_json(&question.metadata)?,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Load a survey with its questions, by id or slug.
    pub fn get_survey(&self, reference: &str) -> StoreResult<Option<Survey>> {
        let conn = self.conn.lock().unwrap();
        load_survey(&conn, reference)
    }

    /// All surveys with their questions.
    pub fn list_surveys(&self) -> StoreResult<Vec<Survey>> {
        let conn = self.conn.lock().unwrap();
        let ids: Vec<String> = {
            let mut stmt =
                conn.prepare("SELECT id FROM surveys ORDER BY created_at, rowid")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        let mut surveys = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(survey) = load_survey(&conn, &id)? {
                surveys.push(survey);
            }
        }
        Ok(surveys)
    }

    /// Change a survey's status. Returns false when the survey does not
    /// exist.
    pub fn set_survey_status(&self, reference: &str, status: SurveyStatus) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE surveys SET status = ?1 WHERE id = ?2 OR slug = ?2",
            params![status.as_str(), reference],
        )?;
        Ok(changed > 0)
    }

    /// Delete a survey; its questions and responses cascade. The
    /// response-count guard lives in the coordinator.
    pub fn delete_survey(&self, survey_id: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM surveys WHERE id = ?1", params![survey_id])?;
        Ok(deleted > 0)
    }

    // =========================================================================
    // Responses
    // =========================================================================

    /// Insert a response and its answers in one transaction.
    ///
    /// With `enforce_single` set and a user present, a `submission_key`
    /// is written; the UNIQUE index on that column makes a concurrent
    /// duplicate fail the commit with a constraint violation.
    pub fn insert_response(
        &self,
        response: &SurveyResponse,
        answers: &[ValidatedAnswer],
        enforce_single: bool,
    ) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let submission_key = if enforce_single && response.status == ResponseStatus::Submitted {
            response
                .user_id
                .as_ref()
                .map(|user| format!("{}:{}", response.survey_id, user))
        } else {
            None
        };

        tx.execute(
            "INSERT INTO responses
             (id, survey_id, user_id, uuid, status, submitted_at, metadata, submission_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                response.id,
                response.survey_id,
                response.user_id,
                response.uuid,
                response.status.as_str(),
                response.submitted_at,
                serde_json::to_string(&response.metadata)?,
                submission_key,
                response.created_at,
            ],
        )?;

        insert_answers(&tx, &response.id, answers)?;
        tx.commit()?;
        Ok(())
    }

    /// Re-save a draft wholesale: prior answers are deleted, the new set
    /// inserted, metadata refreshed. All in one transaction; there is no
    /// merge.
    pub fn replace_draft(
        &self,
        response_id: &str,
        metadata: &ResponseMetadata,
        answers: &[ValidatedAnswer],
    ) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE responses SET metadata = ?1 WHERE id = ?2",
            params![serde_json::to_string(metadata)?, response_id],
        )?;
        tx.execute(
            "DELETE FROM answers WHERE response_id = ?1",
            params![response_id],
        )?;
        insert_answers(&tx, response_id, answers)?;

        tx.commit()?;
        Ok(())
    }

    /// Load one response with its answers by external uuid.
    pub fn get_response_by_uuid(&self, uuid: &str) -> StoreResult<Option<SurveyResponse>> {
        let conn = self.conn.lock().unwrap();
        load_response(&conn, "uuid = ?1", uuid)
    }

    /// Load one response with its answers by internal id.
    pub fn get_response_by_id(&self, id: &str) -> StoreResult<Option<SurveyResponse>> {
        let conn = self.conn.lock().unwrap();
        load_response(&conn, "id = ?1", id)
    }

    /// Whether a submitted response already exists for (survey, user).
    pub fn has_submitted(&self, survey_id: &str, user_id: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM responses
             WHERE survey_id = ?1 AND user_id = ?2 AND status = 'submitted')",
            params![survey_id, user_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// All submitted responses of a survey, with answers, oldest first.
    /// Drafts are not included.
    pub fn submitted_responses(&self, survey_id: &str) -> StoreResult<Vec<SurveyResponse>> {
        let conn = self.conn.lock().unwrap();
        let ids: Vec<String> = {
            let mut stmt = conn.prepare(
                "SELECT id FROM responses
                 WHERE survey_id = ?1 AND status = 'submitted'
                 ORDER BY submitted_at, rowid",
            )?;
            let rows = stmt.query_map(params![survey_id], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        let mut responses = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(response) = load_response(&conn, "id = ?1", &id)? {
                responses.push(response);
            }
        }
        Ok(responses)
    }

    /// Count every response (draft or submitted) of a survey.
    pub fn response_count(&self, survey_id: &str) -> StoreResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM responses WHERE survey_id = ?1",
            params![survey_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// =============================================================================
// Row mapping helpers
// =============================================================================

fn insert_answers(
    tx: &rusqlite::Transaction<'_>,
    response_id: &str,
    answers: &[ValidatedAnswer],
) -> StoreResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO answers (response_id, question_id, value, files) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for answer in answers {
        stmt.execute(params![
            response_id,
            answer.question_id,
            option_to_json(&answer.value)?,
            option_to_json(&answer.files)?,
        ])?;
    }
    Ok(())
}

fn load_survey(conn: &Connection, reference: &str) -> StoreResult<Option<Survey>> {
    let row = conn
        .query_row(
            "SELECT id, title, slug, description, settings, status, metadata, created_at
             FROM surveys WHERE id = ?1 OR slug = ?1",
            params![reference],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, DateTime<Utc>>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((id, title, slug, description, settings, status, metadata, created_at)) = row else {
        return Ok(None);
    };

    let questions = load_questions(conn, &id)?;
    Ok(Some(Survey {
        id,
        title,
        slug,
        description,
        settings: serde_json::from_str(&settings)?,
        status: parse_enum(&status)?,
        questions,
        metadata: json_to_metadata(metadata.as_deref())?,
        created_at,
    }))
}

fn load_questions(conn: &Connection, survey_id: &str) -> StoreResult<Vec<Question>> {
    struct Row {
        id: String,
        question_type: String,
        label: String,
        description: Option<String>,
        placeholder: Option<String>,
        required: bool,
        order: i32,
        options: Option<String>,
        validation: Option<String>,
        logic: Option<String>,
        parent_question_id: Option<String>,
        group_id: Option<String>,
        allow_other: bool,
        metadata: Option<String>,
    }

    let mut stmt = conn.prepare(
        "SELECT id, question_type, label, description, placeholder, required, order_index,
                options, validation, logic, parent_question_id, group_id, allow_other, metadata
         FROM questions WHERE survey_id = ?1 ORDER BY order_index, rowid",
    )?;
    let rows = stmt.query_map(params![survey_id], |row| {
        Ok(Row {
            id: row.get(0)?,
            question_type: row.get(1)?,
            label: row.get(2)?,
            description: row.get(3)?,
            placeholder: row.get(4)?,
            required: row.get(5)?,
            order: row.get(6)?,
            options: row.get(7)?,
            validation: row.get(8)?,
            logic: row.get(9)?,
            parent_question_id: row.get(10)?,
            group_id: row.get(11)?,
            allow_other: row.get(12)?,
            metadata: row.get(13)?,
        })
    })?;

    let mut questions = Vec::new();
    for row in rows {
        let row = row?;
        questions.push(Question {
            id: row.id,
            survey_id: survey_id.to_string(),
            question_type: parse_enum(&row.question_type)?,
            label: row.label,
            description: row.description,
            placeholder: row.placeholder,
            required: row.required,
            order: row.order,
            options: parse_opt_json(row.options.as_deref())?,
            validation: parse_opt_json(row.validation.as_deref())?,
            logic: parse_opt_json(row.logic.as_deref())?,
            parent_question_id: row.parent_question_id,
            group_id: row.group_id,
            allow_other: row.allow_other,
            metadata: json_to_metadata(row.metadata.as_deref())?,
        });
    }
    Ok(questions)
}

fn load_response(
    conn: &Connection,
    predicate: &str,
    key: &str,
) -> StoreResult<Option<SurveyResponse>> {
    let sql = format!(
        "SELECT id, survey_id, user_id, uuid, status, submitted_at, metadata, created_at
         FROM responses WHERE {predicate}"
    );
    let row = conn
        .query_row(&sql, params![key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<DateTime<Utc>>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, DateTime<Utc>>(7)?,
            ))
        })
        .optional()?;

    let Some((id, survey_id, user_id, uuid, status, submitted_at, metadata, created_at)) = row
    else {
        return Ok(None);
    };

    let answers = load_answers(conn, &id)?;
    Ok(Some(SurveyResponse {
        id,
        survey_id,
        user_id,
        uuid,
        status: parse_enum(&status)?,
        submitted_at,
        metadata: match metadata.as_deref() {
            Some(json) => serde_json::from_str(json)?,
            None => ResponseMetadata::default(),
        },
        answers,
        created_at,
    }))
}

fn load_answers(conn: &Connection, response_id: &str) -> StoreResult<Vec<Answer>> {
    let mut stmt = conn.prepare(
        "SELECT id, question_id, value, files FROM answers WHERE response_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![response_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut answers = Vec::new();
    for row in rows {
        let (id, question_id, value, files) = row?;
        answers.push(Answer {
            id,
            response_id: response_id.to_string(),
            question_id,
            value: parse_opt_json::<AnswerValue>(value.as_deref())?,
            files: parse_opt_json::<Vec<FileDescriptor>>(files.as_deref())?,
        });
    }
    Ok(answers)
}

/// Parse a stored enum string through its serde representation.
fn parse_enum<T: serde::de::DeserializeOwned>(stored: &str) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::String(stored.to_string()))?)
}

fn parse_opt_json<T: serde::de::DeserializeOwned>(stored: Option<&str>) -> StoreResult<Option<T>> {
    match stored {
        Some(json) => Ok(Some(serde_json::from_str(json)?)),
        None => Ok(None),
    }
}

fn option_to_json<T: serde::Serialize>(value: &Option<T>) -> StoreResult<Option<String>> {
    match value {
        Some(v) => Ok(Some(serde_json::to_string(v)?)),
        None => Ok(None),
    }
}

fn metadata_to_json(metadata: &serde_json::Map<String, Value>) -> StoreResult<Option<String>> {
    if metadata.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(metadata)?))
    }
}

fn json_to_metadata(stored: Option<&str>) -> StoreResult<serde_json::Map<String, Value>> {
    match stored {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(serde_json::Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionType, SurveyDefinition};
    use serde_json::json;

    fn sample_survey(title: &str) -> Survey {
        let def: SurveyDefinition = serde_json::from_value(json!({
            "title": title,
            "status": "published",
            "questions": [
                { "id": "q1", "type": "text", "label": "Name", "required": true },
                { "id": "q2", "type": "number", "label": "Age",
                  "validation": { "min": 0, "max": 120 } }
            ]
        }))
        .unwrap();
        Survey::from_definition(def, Utc::now())
    }

    fn text_answer(question_id: &str, value: &str) -> ValidatedAnswer {
        ValidatedAnswer {
            question_id: question_id.into(),
            value: Some(AnswerValue::Text(value.into())),
            files: None,
        }
    }

    #[test]
    fn test_create_and_load_survey_by_id_and_slug() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut survey = sample_survey("Customer Feedback");
        store.create_survey(&mut survey).unwrap();
        assert_eq!(survey.slug, "customer-feedback");

        let by_id = store.get_survey(&survey.id).unwrap().unwrap();
        assert_eq!(by_id.questions.len(), 2);
        assert_eq!(by_id.questions[0].question_type, QuestionType::Text);
        assert!(by_id.questions[0].required);

        let by_slug = store.get_survey("customer-feedback").unwrap().unwrap();
        assert_eq!(by_slug.id, survey.id);
    }

    #[test]
    fn test_slug_collision_appends_suffix() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut first = sample_survey("My Survey");
        let mut second = sample_survey("My Survey");
        let mut third = sample_survey("My Survey");
        store.create_survey(&mut first).unwrap();
        store.create_survey(&mut second).unwrap();
        store.create_survey(&mut third).unwrap();
        assert_eq!(first.slug, "my-survey");
        assert_eq!(second.slug, "my-survey-2");
        assert_eq!(third.slug, "my-survey-3");
    }

    #[test]
    fn test_insert_and_reload_submission() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut survey = sample_survey("S");
        store.create_survey(&mut survey).unwrap();

        let now = Utc::now();
        let response = SurveyResponse::new_submitted(
            &survey.id,
            Some("user-1".into()),
            ResponseMetadata::default(),
            now,
        );
        let answers = vec![
            text_answer("q1", "Ada"),
            ValidatedAnswer {
                question_id: "q2".into(),
                value: Some(AnswerValue::Number(36.0)),
                files: None,
            },
        ];
        store.insert_response(&response, &answers, true).unwrap();

        let loaded = store.get_response_by_uuid(&response.uuid).unwrap().unwrap();
        assert_eq!(loaded.status, ResponseStatus::Submitted);
        assert!(loaded.submitted_at.is_some());
        assert_eq!(loaded.answers.len(), 2);
        assert_eq!(
            loaded.answers[1].value,
            Some(AnswerValue::Number(36.0))
        );
    }

    #[test]
    fn test_duplicate_submission_hits_constraint() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut survey = sample_survey("S");
        store.create_survey(&mut survey).unwrap();

        let first = SurveyResponse::new_submitted(
            &survey.id,
            Some("user-1".into()),
            ResponseMetadata::default(),
            Utc::now(),
        );
        let second = SurveyResponse::new_submitted(
            &survey.id,
            Some("user-1".into()),
            ResponseMetadata::default(),
            Utc::now(),
        );
        store.insert_response(&first, &[], true).unwrap();
        let err = store.insert_response(&second, &[], true).unwrap_err();
        assert!(err.is_constraint_violation());

        // Nothing of the failed write is visible.
        assert_eq!(store.response_count(&survey.id).unwrap(), 1);
    }

    #[test]
    fn test_multiple_submissions_allowed_without_key() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut survey = sample_survey("S");
        store.create_survey(&mut survey).unwrap();

        for _ in 0..2 {
            let response = SurveyResponse::new_submitted(
                &survey.id,
                Some("user-1".into()),
                ResponseMetadata::default(),
                Utc::now(),
            );
            store.insert_response(&response, &[], false).unwrap();
        }
        assert_eq!(store.response_count(&survey.id).unwrap(), 2);
    }

    #[test]
    fn test_anonymous_submissions_never_conflict() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut survey = sample_survey("S");
        store.create_survey(&mut survey).unwrap();

        for _ in 0..2 {
            let response = SurveyResponse::new_submitted(
                &survey.id,
                None,
                ResponseMetadata::default(),
                Utc::now(),
            );
            store.insert_response(&response, &[], true).unwrap();
        }
        assert_eq!(store.response_count(&survey.id).unwrap(), 2);
    }

    #[test]
    fn test_replace_draft_is_wholesale() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut survey = sample_survey("S");
        store.create_survey(&mut survey).unwrap();

        let draft = SurveyResponse::new_draft(
            &survey.id,
            None,
            ResponseMetadata::default(),
            Utc::now(),
        );
        store
            .insert_response(
                &draft,
                &[text_answer("q1", "old"), text_answer("q2", "keep?")],
                false,
            )
            .unwrap();

        // Re-save with only q1: q2's prior answer must be gone.
        store
            .replace_draft(
                &draft.id,
                &ResponseMetadata::default(),
                &[text_answer("q1", "new")],
            )
            .unwrap();

        let loaded = store.get_response_by_id(&draft.id).unwrap().unwrap();
        assert_eq!(loaded.answers.len(), 1);
        assert_eq!(loaded.answers[0].question_id, "q1");
        assert_eq!(loaded.answers[0].value, Some(AnswerValue::Text("new".into())));
    }

    #[test]
    fn test_has_submitted_ignores_drafts() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut survey = sample_survey("S");
        store.create_survey(&mut survey).unwrap();

        let draft = SurveyResponse::new_draft(
            &survey.id,
            Some("user-1".into()),
            ResponseMetadata::default(),
            Utc::now(),
        );
        store.insert_response(&draft, &[], false).unwrap();
        assert!(!store.has_submitted(&survey.id, "user-1").unwrap());

        let submitted = SurveyResponse::new_submitted(
            &survey.id,
            Some("user-1".into()),
            ResponseMetadata::default(),
            Utc::now(),
        );
        store.insert_response(&submitted, &[], true).unwrap();
        assert!(store.has_submitted(&survey.id, "user-1").unwrap());
    }

    #[test]
    fn test_submitted_responses_excludes_drafts() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut survey = sample_survey("S");
        store.create_survey(&mut survey).unwrap();

        let draft = SurveyResponse::new_draft(
            &survey.id,
            None,
            ResponseMetadata::default(),
            Utc::now(),
        );
        store.insert_response(&draft, &[], false).unwrap();
        for _ in 0..2 {
            let r = SurveyResponse::new_submitted(
                &survey.id,
                None,
                ResponseMetadata::default(),
                Utc::now(),
            );
            store.insert_response(&r, &[], false).unwrap();
        }

        let submitted = store.submitted_responses(&survey.id).unwrap();
        assert_eq!(submitted.len(), 2);
    }

    #[test]
    fn test_delete_survey_cascades() {
        let store = SurveyStore::open_in_memory().unwrap();
        let mut survey = sample_survey("S");
        store.create_survey(&mut survey).unwrap();

        let response = SurveyResponse::new_submitted(
            &survey.id,
            None,
            ResponseMetadata::default(),
            Utc::now(),
        );
        store
            .insert_response(&response, &[text_answer("q1", "x")], false)
            .unwrap();

        assert!(store.delete_survey(&survey.id).unwrap());
        assert!(store.get_survey(&survey.id).unwrap().is_none());
        assert!(store.get_response_by_uuid(&response.uuid).unwrap().is_none());
    }

    #[test]
    fn test_on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surveys.db");

        let survey_id = {
            let store = SurveyStore::open(&path).unwrap();
            let mut survey = sample_survey("Persisted");
            store.create_survey(&mut survey).unwrap();
            survey.id
        };

        let store = SurveyStore::open(&path).unwrap();
        let survey = store.get_survey(&survey_id).unwrap().unwrap();
        assert_eq!(survey.slug, "persisted");
        assert_eq!(survey.questions.len(), 2);
    }
}
