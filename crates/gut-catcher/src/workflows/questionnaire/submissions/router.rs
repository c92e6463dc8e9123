use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::workflows::questionnaire::storage::QuestionnaireSource;

use super::domain::{ClientContext, SubmissionRequest};
use super::repository::{SubmissionNotifier, SubmissionRepository};
use super::service::{SubmissionService, SubmissionServiceError};

/// Router builder exposing the questionnaire data and submission endpoints.
///
/// The read endpoints serve the typed model rather than the files on disk, so
/// weights come back as floats and entries scoring cannot use are left out.
pub fn questionnaire_router<S, R, N>(service: Arc<SubmissionService<S, R, N>>) -> Router
where
    S: QuestionnaireSource + 'static,
    R: SubmissionRepository + 'static,
    N: SubmissionNotifier + 'static,
{
    Router::new()
        .route("/api/questions", get(questions_handler::<S, R, N>))
        .route("/api/personas", get(personas_handler::<S, R, N>))
        .route("/api/scoring", get(scoring_handler::<S, R, N>))
        .route(
            "/api/submissions",
            get(list_handler::<S, R, N>).post(submit_handler::<S, R, N>),
        )
        .with_state(service)
}

pub(crate) async fn questions_handler<S, R, N>(
    State(service): State<Arc<SubmissionService<S, R, N>>>,
) -> Response
where
    S: QuestionnaireSource + 'static,
    R: SubmissionRepository + 'static,
    N: SubmissionNotifier + 'static,
{
    let catalog = service.catalog();
    info!(sections = catalog.len(), "serving questionnaire catalog");
    Json(catalog).into_response()
}

pub(crate) async fn personas_handler<S, R, N>(
    State(service): State<Arc<SubmissionService<S, R, N>>>,
) -> Response
where
    S: QuestionnaireSource + 'static,
    R: SubmissionRepository + 'static,
    N: SubmissionNotifier + 'static,
{
    Json(service.personas()).into_response()
}

pub(crate) async fn scoring_handler<S, R, N>(
    State(service): State<Arc<SubmissionService<S, R, N>>>,
) -> Response
where
    S: QuestionnaireSource + 'static,
    R: SubmissionRepository + 'static,
    N: SubmissionNotifier + 'static,
{
    Json(service.scoring_profiles()).into_response()
}

pub(crate) async fn list_handler<S, R, N>(
    State(service): State<Arc<SubmissionService<S, R, N>>>,
) -> Response
where
    S: QuestionnaireSource + 'static,
    R: SubmissionRepository + 'static,
    N: SubmissionNotifier + 'static,
{
    match tokio::task::spawn_blocking(move || service.list()).await {
        Ok(Ok(submissions)) => {
            let payload = json!({
                "count": submissions.len(),
                "submissions": submissions,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(Err(err)) => {
            error!(error = %err, "failed to read submissions");
            read_failure()
        }
        Err(err) => {
            error!(error = %err, "submission listing task failed");
            read_failure()
        }
    }
}

/// Accepts any body; a missing or non-JSON body fails email validation like an empty form.
pub(crate) async fn submit_handler<S, R, N>(
    State(service): State<Arc<SubmissionService<S, R, N>>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: QuestionnaireSource + 'static,
    R: SubmissionRepository + 'static,
    N: SubmissionNotifier + 'static,
{
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let request = match SubmissionRequest::from_json(payload) {
        Ok(request) => request,
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    let context = client_context(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    // Scoring and the submission log rewrite block on file I/O.
    match tokio::task::spawn_blocking(move || service.submit(request, context)).await {
        Ok(Ok(_)) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Ok(Err(SubmissionServiceError::Validation(err))) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        Ok(Err(SubmissionServiceError::Repository(err))) => {
            error!(error = %err, "failed to write submission");
            save_failure()
        }
        Err(err) => {
            error!(error = %err, "submission task failed");
            save_failure()
        }
    }
}

fn read_failure() -> Response {
    let payload = json!({ "error": "Failed to read submissions." });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

fn save_failure() -> Response {
    let payload = json!({ "error": "Failed to save submission." });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// `x-forwarded-for` wins over the socket peer address.
pub(crate) fn client_context(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientContext {
    ClientContext {
        ip: header_text(headers, "x-forwarded-for").or_else(|| peer.map(|addr| addr.ip().to_string())),
        user_agent: header_text(headers, header::USER_AGENT.as_str()),
    }
}
