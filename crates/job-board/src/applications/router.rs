use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::repository::{ApplicationId, ApplicationRecord, ApplicationRepository};
use super::service::{ApplicationService, ApplicationServiceError};
use crate::accounts::Actor;
use crate::documents::DocumentRef;
use crate::notifications::NotificationSender;
use crate::postings::{JobPostingId, JobPostingRepository};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubmitApplicationRequest {
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Router builder exposing submission, listing and status endpoints.
pub fn application_router<A, P, N>(service: Arc<ApplicationService<A, P, N>>) -> Router
where
    A: ApplicationRepository + 'static,
    P: JobPostingRepository + 'static,
    N: NotificationSender + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs/:id/applications",
            get(posting_applications_handler::<A, P, N>).post(submit_handler::<A, P, N>),
        )
        .route("/api/v1/applications", get(my_applications_handler::<A, P, N>))
        .route("/api/v1/applications/:id", get(status_handler::<A, P, N>))
        .route(
            "/api/v1/applications/:id/status",
            patch(update_status_handler::<A, P, N>),
        )
        .with_state(service)
}

pub(crate) fn error_response(err: ApplicationServiceError) -> Response {
    let status = match &err {
        ApplicationServiceError::NotFound(_) | ApplicationServiceError::PostingNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ApplicationServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ApplicationServiceError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        ApplicationServiceError::IllegalTransition { .. }
        | ApplicationServiceError::Duplicate(_) => StatusCode::CONFLICT,
        ApplicationServiceError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        ApplicationServiceError::Repository(_) => {
            error!(error = %err, "application storage failure");
            let payload = json!({ "error": "internal server error" });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}

fn list_response(records: Vec<ApplicationRecord>) -> Response {
    let views: Vec<_> = records.iter().map(ApplicationRecord::status_view).collect();
    (StatusCode::OK, axum::Json(views)).into_response()
}

pub(crate) async fn submit_handler<A, P, N>(
    State(service): State<Arc<ApplicationService<A, P, N>>>,
    Path(posting_id): Path<u64>,
    actor: Actor,
    request: Option<axum::Json<SubmitApplicationRequest>>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: JobPostingRepository + 'static,
    N: NotificationSender + 'static,
{
    let documents = request
        .map(|axum::Json(request)| request.documents)
        .unwrap_or_default();
    match service.submit(&actor, JobPostingId(posting_id), documents) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn posting_applications_handler<A, P, N>(
    State(service): State<Arc<ApplicationService<A, P, N>>>,
    Path(posting_id): Path<u64>,
    actor: Actor,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: JobPostingRepository + 'static,
    N: NotificationSender + 'static,
{
    match service.list_for_posting(&actor, JobPostingId(posting_id)) {
        Ok(records) => list_response(records),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn my_applications_handler<A, P, N>(
    State(service): State<Arc<ApplicationService<A, P, N>>>,
    actor: Actor,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: JobPostingRepository + 'static,
    N: NotificationSender + 'static,
{
    match service.list_for_student(&actor) {
        Ok(records) => list_response(records),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<A, P, N>(
    State(service): State<Arc<ApplicationService<A, P, N>>>,
    Path(application_id): Path<u64>,
    actor: Actor,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: JobPostingRepository + 'static,
    N: NotificationSender + 'static,
{
    match service.get(&actor, ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_status_handler<A, P, N>(
    State(service): State<Arc<ApplicationService<A, P, N>>>,
    Path(application_id): Path<u64>,
    actor: Actor,
    axum::Json(request): axum::Json<StatusUpdateRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: JobPostingRepository + 'static,
    N: NotificationSender + 'static,
{
    match service.update_status(ApplicationId(application_id), &request.status, &actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}
