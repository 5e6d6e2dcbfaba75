use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::accounts::{AccountId, Actor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message addressed to an account before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub recipient: AccountId,
    pub message: String,
    pub sender: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: AccountId,
    pub sender: Option<AccountId>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// Outbound hook persisting notifications; delivery is best effort.
pub trait NotificationSender: Send + Sync {
    fn send(&self, notification: NewNotification) -> Result<Notification, NotificationError>;
}

/// Read side of the notification store.
pub trait NotificationFeed: Send + Sync {
    /// Newest first.
    fn for_recipient(&self, recipient: AccountId) -> Result<Vec<Notification>, NotificationError>;
    fn mark_read(&self, recipient: AccountId, id: NotificationId) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification {0} not found")]
    NotFound(NotificationId),
    #[error("notification store unavailable: {0}")]
    Transport(String),
}

/// Router exposing the acting account's notification feed.
pub fn notification_router<F>(feed: Arc<F>) -> Router
where
    F: NotificationFeed + 'static,
{
    Router::new()
        .route("/api/v1/notifications", get(feed_handler::<F>))
        .route("/api/v1/notifications/:id/read", post(mark_read_handler::<F>))
        .with_state(feed)
}

fn feed_error(err: NotificationError) -> Response {
    match err {
        NotificationError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "error": format!("notification {id} not found") })),
        )
            .into_response(),
        NotificationError::Transport(_) => {
            error!(error = %err, "notification store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(json!({ "error": "internal server error" })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn feed_handler<F>(State(feed): State<Arc<F>>, actor: Actor) -> Response
where
    F: NotificationFeed + 'static,
{
    match feed.for_recipient(actor.account_id) {
        Ok(notifications) => {
            let unread = notifications.iter().filter(|item| !item.read).count();
            let payload = json!({ "unread": unread, "notifications": notifications });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => feed_error(err),
    }
}

pub(crate) async fn mark_read_handler<F>(
    State(feed): State<Arc<F>>,
    Path(id): Path<u64>,
    actor: Actor,
) -> Response
where
    F: NotificationFeed + 'static,
{
    match feed.mark_read(actor.account_id, NotificationId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => feed_error(err),
    }
}
