//! Workflow orchestrator: validates an action against current state, applies
//! it through the store, then emits notifications and live updates.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::MarketplaceConfig;

use super::domain::{
    Job, JobId, Notification, NotificationId, NotificationKind, QuoteId, User, UserId, UserRole,
};
use super::live::{Audience, LiveEventKind, LiveUpdate, LiveUpdatePublisher};
use super::pricing::{PriceEstimator, PricingError};
use super::repository::{MarketplaceStore, RepositoryError};
use super::views::JobView;

mod jobs;
mod notifications;
mod payments;
mod quotes;
mod reminders;
mod users;

pub use jobs::NewJob;
pub use payments::{CardInput, PaymentRequest};
pub use quotes::NewQuote;
pub use reminders::{NewReminder, ReminderSuggestion, ReminderUpdate};
pub use users::{ProfileUpdate, Registration};

/// Verified caller identity supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId(id.into()),
            role,
        }
    }

    pub fn homeowner(id: impl Into<String>) -> Self {
        Self::new(id, UserRole::Homeowner)
    }

    pub fn professional(id: impl Into<String>) -> Self {
        Self::new(id, UserRole::Professional)
    }
}

/// Service composing the store, the live-update channel and the optional price estimator.
pub struct MarketplaceService<S, L> {
    store: Arc<S>,
    live: Arc<L>,
    estimator: Option<Arc<dyn PriceEstimator>>,
    config: MarketplaceConfig,
}

impl<S, L> MarketplaceService<S, L>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    pub fn new(store: Arc<S>, live: Arc<L>, config: MarketplaceConfig) -> Self {
        Self {
            store,
            live,
            estimator: None,
            config,
        }
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn PriceEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn live_updates(&self) -> &Arc<L> {
        &self.live
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    /// Profile and receiver for a live-update subscriber.
    pub fn subscribe(
        &self,
        actor: &Actor,
    ) -> Result<(User, broadcast::Receiver<LiveUpdate>), MarketplaceError> {
        let profile = self.authenticate(actor)?;
        let receiver = self.live.subscribe().ok_or_else(|| {
            MarketplaceError::PreconditionFailed("live updates are not enabled".to_string())
        })?;
        Ok((profile, receiver))
    }

    /// Current stored profile of a user.
    pub fn profile_of(&self, id: &UserId) -> Result<User, MarketplaceError> {
        self.store
            .fetch_user(id)?
            .ok_or_else(|| MarketplaceError::not_found("user", id))
    }

    /// The caller's registered profile. Runs before any write so an unknown
    /// id or a claimed role that differs from the stored one changes nothing.
    fn authenticate(&self, actor: &Actor) -> Result<User, MarketplaceError> {
        let profile = self.profile_of(&actor.id)?;
        if profile.role != actor.role {
            return Err(MarketplaceError::Forbidden(format!(
                "user {} is registered as a {}",
                actor.id, profile.role
            )));
        }
        Ok(profile)
    }

    fn require_role(actor: &Actor, role: UserRole, action: &str) -> Result<(), MarketplaceError> {
        if actor.role == role {
            Ok(())
        } else {
            Err(MarketplaceError::Forbidden(format!(
                "only a {role} may {action}"
            )))
        }
    }

    fn load_job(&self, id: &JobId) -> Result<Job, MarketplaceError> {
        self.store
            .fetch_job(id)?
            .ok_or_else(|| MarketplaceError::not_found("job", id))
    }

    /// Resolve a stored reference. A dangling one means the store is inconsistent.
    fn resolve_user(&self, id: &UserId) -> Result<User, MarketplaceError> {
        self.store
            .fetch_user(id)?
            .ok_or_else(|| MarketplaceError::Unexpected(format!("dangling user reference {id}")))
    }

    fn job_view(&self, job: Job) -> Result<JobView, MarketplaceError> {
        let homeowner = self.resolve_user(&job.homeowner)?;
        let professional = job
            .professional
            .as_ref()
            .map(|id| self.resolve_user(id))
            .transpose()?;
        Ok(JobView::new(job, &homeowner, professional.as_ref()))
    }

    /// Append a notification. Failure is logged and never undoes the transition.
    fn notify(
        &self,
        user: &UserId,
        kind: NotificationKind,
        message: String,
        job: Option<&JobId>,
        quote: Option<&QuoteId>,
    ) {
        let notification = Notification {
            id: NotificationId::generate(),
            user: user.clone(),
            kind,
            message,
            related_job: job.cloned(),
            related_quote: quote.cloned(),
            read: false,
            created_at: Utc::now(),
        };

        if let Err(error) = self.store.append(notification) {
            tracing::warn!(user = %user, ?kind, %error, "failed to record notification");
        }
    }

    /// Fire-and-forget live update.
    fn broadcast<P: Serialize>(&self, kind: LiveEventKind, audience: Audience, payload: &P) {
        let payload = match serde_json::to_value(payload) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::debug!(event = kind.name(), %error, "live update payload not serializable");
                return;
            }
        };

        if let Err(error) = self.live.publish(LiveUpdate::new(kind, audience, payload)) {
            tracing::debug!(event = kind.name(), %error, "live update dropped");
        }
    }
}

/// Names the job in store failures from a conditional write.
fn job_error(id: &JobId) -> impl FnOnce(RepositoryError) -> MarketplaceError + '_ {
    move |error| match error {
        RepositoryError::NotFound => MarketplaceError::not_found("job", id),
        RepositoryError::StaleStatus { expected, actual } => MarketplaceError::InvalidState(
            format!("job {id} is {actual}, expected {expected}"),
        ),
        other => other.into(),
    }
}

fn quote_error(id: &QuoteId) -> impl FnOnce(RepositoryError) -> MarketplaceError + '_ {
    move |error| match error {
        RepositoryError::NotFound => MarketplaceError::not_found("quote", id),
        RepositoryError::StaleStatus { expected, actual } => MarketplaceError::InvalidState(
            format!("quote {id} is {actual}, expected {expected}"),
        ),
        other => other.into(),
    }
}

/// Job parties as a live-update audience.
fn job_parties(job: &Job) -> Audience {
    let mut users = vec![job.homeowner.clone()];
    if let Some(professional) = &job.professional {
        users.push(professional.clone());
    }
    Audience::Users(users)
}

/// Error raised by the marketplace orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    OutOfRange(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unexpected(String),
}

impl MarketplaceError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            MarketplaceError::NotFound { .. } => "NOT_FOUND",
            MarketplaceError::Forbidden(_) => "FORBIDDEN",
            MarketplaceError::InvalidState(_) => "INVALID_STATE",
            MarketplaceError::OutOfRange(_) => "OUT_OF_RANGE",
            MarketplaceError::Conflict(_) => "CONFLICT",
            MarketplaceError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            MarketplaceError::Validation(_) => "VALIDATION",
            MarketplaceError::Unexpected(_) => "UNEXPECTED",
        }
    }
}

impl From<RepositoryError> for MarketplaceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => Self::NotFound {
                entity: "record",
                id: "unknown".to_string(),
            },
            RepositoryError::Conflict => Self::Conflict(error.to_string()),
            RepositoryError::StaleStatus { .. } => Self::InvalidState(error.to_string()),
            RepositoryError::Unavailable(_) => Self::Unexpected(error.to_string()),
        }
    }
}

impl From<PricingError> for MarketplaceError {
    fn from(error: PricingError) -> Self {
        Self::OutOfRange(error.to_string())
    }
}
