use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{JobPostingId, JobPostingView};
use super::filter::FilterCriteria;
use super::repository::JobPostingRepository;
use super::service::{JobPostingService, PostingServiceError};
use super::validation::JobPostForm;
use crate::accounts::Actor;

/// Job post body: the form plus whether to publish immediately.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobPostRequest {
    #[serde(flatten)]
    pub form: JobPostForm,
    #[serde(default)]
    pub publish: bool,
}

/// Router builder exposing posting search and company management endpoints.
pub fn posting_router<P>(service: Arc<JobPostingService<P>>) -> Router
where
    P: JobPostingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            get(search_handler::<P>).post(create_handler::<P>),
        )
        .route("/api/v1/jobs/validate", post(validate_handler::<P>))
        .route(
            "/api/v1/jobs/:id",
            get(fetch_handler::<P>)
                .put(update_handler::<P>)
                .delete(delete_handler::<P>),
        )
        .route("/api/v1/jobs/:id/publish", post(publish_handler::<P>))
        .route("/api/v1/jobs/:id/unpublish", post(unpublish_handler::<P>))
        .route("/api/v1/companies/me/jobs", get(owned_handler::<P>))
        .with_state(service)
}

pub(crate) fn error_response(err: PostingServiceError) -> Response {
    match err {
        PostingServiceError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "errors": errors.0 })),
        )
            .into_response(),
        PostingServiceError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "error": format!("job posting {id} not found") })),
        )
            .into_response(),
        PostingServiceError::Forbidden(_) => (
            StatusCode::FORBIDDEN,
            axum::Json(json!({ "error": "not allowed to manage this job posting" })),
        )
            .into_response(),
        PostingServiceError::Repository(err) => {
            error!(error = %err, "job posting storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(json!({ "error": "internal server error" })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn search_handler<P>(
    State(service): State<Arc<JobPostingService<P>>>,
    Query(criteria): Query<FilterCriteria>,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    match service.search(&criteria) {
        Ok(jobs) => {
            let today = service.clock().today();
            let views: Vec<JobPostingView> = jobs
                .into_iter()
                .map(|posting| JobPostingView::new(posting, today))
                .collect();
            let payload = json!({ "count": views.len(), "jobs": views });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<P>(
    State(service): State<Arc<JobPostingService<P>>>,
    actor: Actor,
    axum::Json(request): axum::Json<JobPostRequest>,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    match service.create(&actor, request.form, request.publish) {
        Ok(posting) => {
            let view = JobPostingView::new(posting, service.clock().today());
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn validate_handler<P>(
    State(service): State<Arc<JobPostingService<P>>>,
    axum::Json(form): axum::Json<JobPostForm>,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    let errors = service.validate(&form);
    let payload = json!({ "valid": errors.is_empty(), "errors": errors });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn fetch_handler<P>(
    State(service): State<Arc<JobPostingService<P>>>,
    Path(id): Path<u64>,
    actor: Option<Actor>,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    match service.get(JobPostingId(id), actor.as_ref()) {
        Ok(posting) => {
            let view = JobPostingView::new(posting, service.clock().today());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<P>(
    State(service): State<Arc<JobPostingService<P>>>,
    Path(id): Path<u64>,
    actor: Actor,
    axum::Json(request): axum::Json<JobPostRequest>,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    match service.update(&actor, JobPostingId(id), request.form, request.publish) {
        Ok(posting) => {
            let view = JobPostingView::new(posting, service.clock().today());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<P>(
    State(service): State<Arc<JobPostingService<P>>>,
    Path(id): Path<u64>,
    actor: Actor,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    match service.delete(&actor, JobPostingId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

async fn toggle_published<P>(
    service: Arc<JobPostingService<P>>,
    id: u64,
    actor: Actor,
    published: bool,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    match service.set_published(&actor, JobPostingId(id), published) {
        Ok(posting) => {
            let view = JobPostingView::new(posting, service.clock().today());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn publish_handler<P>(
    State(service): State<Arc<JobPostingService<P>>>,
    Path(id): Path<u64>,
    actor: Actor,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    toggle_published(service, id, actor, true).await
}

pub(crate) async fn unpublish_handler<P>(
    State(service): State<Arc<JobPostingService<P>>>,
    Path(id): Path<u64>,
    actor: Actor,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    toggle_published(service, id, actor, false).await
}

pub(crate) async fn owned_handler<P>(
    State(service): State<Arc<JobPostingService<P>>>,
    actor: Actor,
) -> Response
where
    P: JobPostingRepository + 'static,
{
    match service.owned_by(actor.account_id) {
        Ok(jobs) => {
            let today = service.clock().today();
            let views: Vec<JobPostingView> = jobs
                .into_iter()
                .map(|posting| JobPostingView::new(posting, today))
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}
