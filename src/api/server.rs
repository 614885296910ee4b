//! HTTP server for the response-collection API.
//!
//! # API Endpoints
//!
//! | Method | Path                             | Description                     |
//! |--------|----------------------------------|---------------------------------|
//! | GET    | `/health`                        | Health check                    |
//! | POST   | `/surveys/{id}/responses`        | Submit a final response         |
//! | POST   | `/surveys/{id}/responses/draft`  | Save or replace a draft         |
//! | GET    | `/surveys/{id}/export`           | Export responses (`?format=`)   |
//! | GET    | `/responses/{uuid}`              | Fetch one response with answers |
//! | GET    | `/api/logs`                      | SSE stream of activity logs     |
//!
//! `{id}` accepts a survey id or slug. The auth collaborator hands the
//! caller's identity over in the `x-user-id` header; absent means
//! anonymous.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::ACTIVITY_LOG;
use super::types::{
    error_response, export_error_response, submit_error_response, DraftBody, ResponsePayload,
    SubmitBody,
};
use crate::export::{export_survey, ExportArtifact, ExportFormat};
use crate::store::SurveyStore;
use crate::submission::{SubmissionCoordinator, SubmitRequest};

#[derive(Clone)]
struct AppState {
    coordinator: SubmissionCoordinator,
}

/// Start the HTTP server.
pub async fn start_server(port: u16, store: SurveyStore) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let state = AppState {
        coordinator: SubmissionCoordinator::new(store),
    };

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/surveys/{id}/responses", post(submit_response))
        .route("/surveys/{id}/responses/draft", post(save_draft))
        .route("/surveys/{id}/export", get(export_responses))
        .route("/responses/{uuid}", get(fetch_response))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("surveykit server running on http://localhost:{}", port);
    println!("   POST /surveys/{{id}}/responses        - Submit a response");
    println!("   POST /surveys/{{id}}/responses/draft  - Save a draft");
    println!("   GET  /surveys/{{id}}/export           - Export responses");
    println!("   GET  /responses/{{uuid}}              - Fetch a response");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "surveykit",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time activity streaming.
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = ACTIVITY_LOG.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Submit a final response: 201 with the persisted response, 400 on
/// validation/window/state failure, 404 when the survey is missing,
/// 409 on a duplicate submission.
async fn submit_response(
    State(state): State<AppState>,
    Path(survey_ref): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<ResponsePayload>), (StatusCode, Json<Value>)> {
    let request = SubmitRequest {
        answers: body.answers,
        metadata: body.metadata.unwrap_or_default(),
        user_id: caller_id(&headers),
    };
    let response = state
        .coordinator
        .submit(&survey_ref, request)
        .map_err(submit_error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(ResponsePayload::from_response(response)),
    ))
}

/// Save or replace a draft. No validation is enforced for drafts.
async fn save_draft(
    State(state): State<AppState>,
    Path(survey_ref): Path<String>,
    headers: HeaderMap,
    Json(body): Json<DraftBody>,
) -> Result<(StatusCode, Json<ResponsePayload>), (StatusCode, Json<Value>)> {
    let request = SubmitRequest {
        answers: body.answers,
        metadata: body.metadata.unwrap_or_default(),
        user_id: caller_id(&headers),
    };
    let response = state
        .coordinator
        .save_draft(&survey_ref, request, body.response_id.as_deref())
        .map_err(submit_error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(ResponsePayload::from_response(response)),
    ))
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

/// Export submitted responses. `?format=csv` downloads as an
/// attachment; `json` (the default) returns the nested document.
async fn export_responses(
    State(state): State<AppState>,
    Path(survey_ref): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let format = match query.format.as_deref() {
        None => ExportFormat::Json,
        Some(name) => ExportFormat::parse(name).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(error_response(&format!("Unknown export format: {name}"))),
            )
        })?,
    };

    let artifact = export_survey(state.coordinator.store(), &survey_ref, format)
        .map_err(export_error_response)?;

    match artifact {
        ExportArtifact::Json(doc) => Ok(Json(doc).into_response()),
        ExportArtifact::Csv { filename, content } => Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            content,
        )
            .into_response()),
    }
}

/// Fetch one response with its answers and question metadata.
async fn fetch_response(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<ResponsePayload>, (StatusCode, Json<Value>)> {
    let response = state
        .coordinator
        .fetch_response(&uuid)
        .map_err(submit_error_response)?;
    let survey = state
        .coordinator
        .store()
        .get_survey(&response.survey_id)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_response(&e.to_string())),
            )
        })?;

    let payload = match survey {
        Some(survey) => ResponsePayload::with_questions(response, &survey),
        None => ResponsePayload::from_response(response),
    };
    Ok(Json(payload))
}

fn caller_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(String::from)
}
