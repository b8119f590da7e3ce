use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::projector::{ProjectionError, ProjectionOutcome};
use super::rematerializer::RematerializeError;
use super::service::{ApplicantPipelineService, PipelineError};
use super::shortlist::ShortlistError;
use super::store::{RecordId, RecordStore};

/// Body sent by spreadsheet automations. Both casings are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default, alias = "recordId")]
    pub record_id: Option<String>,
}

impl WebhookPayload {
    fn record_id(&self) -> Option<RecordId> {
        self.record_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(RecordId::new)
    }
}

/// Router exposing the webhook triggers and the pipeline API.
pub fn pipeline_router<S>(service: Arc<ApplicantPipelineService<S>>) -> Router
where
    S: RecordStore + 'static,
{
    Router::new()
        .route(
            "/webhook/new-application",
            post(new_application_handler::<S>),
        )
        .route("/webhook/compress", post(compress_handler::<S>))
        .route("/webhook/decompress", post(decompress_handler::<S>))
        .route("/webhook/shortlist", post(shortlist_handler::<S>))
        .route("/api/v1/pipeline/project", post(project_all_handler::<S>))
        .route(
            "/api/v1/pipeline/shortlist",
            post(shortlist_all_handler::<S>),
        )
        .route(
            "/api/v1/applicants/:record_id",
            get(status_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn new_application_handler<S>(
    State(service): State<Arc<ApplicantPipelineService<S>>>,
    Json(payload): Json<WebhookPayload>,
) -> Response
where
    S: RecordStore + 'static,
{
    let Some(record_id) = payload.record_id() else {
        return missing_record_id();
    };

    match service.process_new_application(&record_id) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn compress_handler<S>(
    State(service): State<Arc<ApplicantPipelineService<S>>>,
    Json(payload): Json<WebhookPayload>,
) -> Response
where
    S: RecordStore + 'static,
{
    let Some(record_id) = payload.record_id() else {
        return missing_record_id();
    };

    match service.project(&record_id) {
        Ok(ProjectionOutcome::Projected { document, warnings }) => {
            let payload = json!({
                "record_id": record_id,
                "outcome": "projected",
                "document": document,
                "warnings": warnings,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(ProjectionOutcome::Skipped) => {
            let payload = json!({
                "record_id": record_id,
                "outcome": "skipped",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn decompress_handler<S>(
    State(service): State<Arc<ApplicantPipelineService<S>>>,
    Json(payload): Json<WebhookPayload>,
) -> Response
where
    S: RecordStore + 'static,
{
    let Some(record_id) = payload.record_id() else {
        return missing_record_id();
    };

    match service.rematerialize(&record_id) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn shortlist_handler<S>(
    State(service): State<Arc<ApplicantPipelineService<S>>>,
    Json(payload): Json<WebhookPayload>,
) -> Response
where
    S: RecordStore + 'static,
{
    let Some(record_id) = payload.record_id() else {
        return missing_record_id();
    };

    match service.shortlist(&record_id) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn project_all_handler<S>(
    State(service): State<Arc<ApplicantPipelineService<S>>>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service.project_all() {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn shortlist_all_handler<S>(
    State(service): State<Arc<ApplicantPipelineService<S>>>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service.shortlist_all() {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<S>(
    State(service): State<Arc<ApplicantPipelineService<S>>>,
    Path(record_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service.status(&RecordId::new(record_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

fn missing_record_id() -> Response {
    let payload = json!({
        "error": "record_id is required",
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

pub(crate) fn error_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::ApplicantNotFound { .. } => StatusCode::NOT_FOUND,
        PipelineError::Projection(ProjectionError::MissingApplicantId { .. })
        | PipelineError::Rematerialize(RematerializeError::MalformedDocument { .. })
        | PipelineError::Shortlist(ShortlistError::MalformedDocument { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PipelineError::Rematerialize(RematerializeError::NoDocument { .. })
        | PipelineError::Rematerialize(RematerializeError::OwnerMismatch { .. }) => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: PipelineError) -> Response {
    let status = error_status(&err);
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
