use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;

use super::live::LiveUpdatePublisher;
use super::repository::MarketplaceStore;
use super::service::{MarketplaceError, MarketplaceService};

mod auth;
pub(crate) mod jobs;
mod live;
pub(crate) mod notifications;
pub(crate) mod payments;
pub(crate) mod quotes;
mod reminders;
mod users;

pub use auth::AuthRejection;

pub(crate) type SharedService<S, L> = Arc<MarketplaceService<S, L>>;

/// Router builder exposing the marketplace HTTP surface under `/api/v1`.
pub fn marketplace_router<S, L>(service: Arc<MarketplaceService<S, L>>) -> Router
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            get(jobs::list_handler::<S, L>).post(jobs::create_handler::<S, L>),
        )
        .route(
            "/api/v1/jobs/:job_id",
            get(jobs::get_handler::<S, L>).put(jobs::update_handler::<S, L>),
        )
        .route("/api/v1/jobs/:job_id/accept", put(jobs::accept_handler::<S, L>))
        .route("/api/v1/jobs/:job_id/start", put(jobs::start_handler::<S, L>))
        .route(
            "/api/v1/jobs/:job_id/complete",
            put(jobs::complete_handler::<S, L>),
        )
        .route("/api/v1/jobs/:job_id/cancel", put(jobs::cancel_handler::<S, L>))
        .route(
            "/api/v1/quotes",
            get(quotes::list_handler::<S, L>).post(quotes::submit_handler::<S, L>),
        )
        .route("/api/v1/quotes/:quote_id", get(quotes::get_handler::<S, L>))
        .route(
            "/api/v1/quotes/:quote_id/accept",
            put(quotes::accept_handler::<S, L>),
        )
        .route(
            "/api/v1/quotes/:quote_id/reject",
            put(quotes::reject_handler::<S, L>),
        )
        .route(
            "/api/v1/payments",
            get(payments::list_handler::<S, L>).post(payments::pay_handler::<S, L>),
        )
        .route(
            "/api/v1/notifications",
            get(notifications::list_handler::<S, L>),
        )
        .route(
            "/api/v1/notifications/unread-count",
            get(notifications::unread_count_handler::<S, L>),
        )
        .route(
            "/api/v1/notifications/read-all",
            put(notifications::mark_all_read_handler::<S, L>),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            put(notifications::mark_read_handler::<S, L>),
        )
        .route(
            "/api/v1/users",
            get(users::list_handler::<S, L>).post(users::register_handler::<S, L>),
        )
        .route(
            "/api/v1/users/:user_id",
            get(users::get_handler::<S, L>).put(users::update_handler::<S, L>),
        )
        .route(
            "/api/v1/reminders",
            get(reminders::list_handler::<S, L>).post(reminders::create_handler::<S, L>),
        )
        .route(
            "/api/v1/reminders/suggestions/:category",
            get(reminders::suggestion_handler::<S, L>),
        )
        .route(
            "/api/v1/reminders/:reminder_id",
            put(reminders::update_handler::<S, L>).delete(reminders::delete_handler::<S, L>),
        )
        .route("/api/v1/live", get(live::live_handler::<S, L>))
        .with_state(service)
}

/// Shorthand for `201 Created` with a JSON body.
pub(crate) fn created<T: serde::Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

impl MarketplaceError {
    pub fn status(&self) -> StatusCode {
        match self {
            MarketplaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            MarketplaceError::Forbidden(_) => StatusCode::FORBIDDEN,
            MarketplaceError::InvalidState(_)
            | MarketplaceError::OutOfRange(_)
            | MarketplaceError::PreconditionFailed(_)
            | MarketplaceError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketplaceError::Conflict(_) => StatusCode::CONFLICT,
            MarketplaceError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketplaceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            MarketplaceError::Unexpected(detail) => {
                tracing::error!(%detail, "marketplace request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let payload = json!({
            "error": message,
            "code": self.code(),
        });
        (status, Json(payload)).into_response()
    }
}
