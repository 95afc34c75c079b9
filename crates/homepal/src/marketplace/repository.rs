//! Storage ports for the marketplace. Every conditional write below must be
//! applied atomically by implementations: the status check and the mutation
//! observe the same state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::domain::{
    Job, JobId, JobPriority, JobStatus, Notification, NotificationId, Payment, Quote, QuoteId,
    QuoteStatus, Reminder, ReminderId, User, UserId, UserRole,
};

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    /// A conditional write found the record in a different status.
    #[error("record is {actual}, expected {expected}")]
    StaleStatus {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

pub trait UserDirectory: Send + Sync {
    /// Fails with `Conflict` when the e-mail address is already registered.
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn update_user(&self, user: User) -> Result<User, RepositoryError>;
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn users_with_role(&self, role: UserRole) -> Result<Vec<User>, RepositoryError>;
}

/// Field-level change applied by a conditional job write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobChange {
    pub status: Option<JobStatus>,
    pub professional: Option<UserId>,
    pub completed_date: Option<DateTime<Utc>>,
    pub edits: JobEdits,
}

/// Client-editable job fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobEdits {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<JobPriority>,
    pub location: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl JobEdits {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub(crate) fn apply(self, job: &mut Job) {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(priority) = self.priority {
            job.priority = priority;
        }
        if let Some(location) = self.location {
            job.location = Some(location);
        }
        if let Some(date) = self.scheduled_date {
            job.scheduled_date = Some(date);
        }
        if let Some(notes) = self.notes {
            job.notes = Some(notes);
        }
    }
}

impl JobChange {
    pub(crate) fn apply(self, job: &mut Job, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(professional) = self.professional {
            job.professional = Some(professional);
        }
        if let Some(date) = self.completed_date {
            job.completed_date = Some(date);
        }
        self.edits.apply(job);
        job.updated_at = now;
    }
}

pub trait JobRegistry: Send + Sync {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    /// Newest first.
    fn jobs_for_homeowner(&self, homeowner: &UserId) -> Result<Vec<Job>, RepositoryError>;
    /// Jobs assigned to `professional` plus unassigned pending jobs accepted by
    /// `open_filter`, newest first.
    fn jobs_for_professional(
        &self,
        professional: &UserId,
        open_filter: &dyn Fn(&Job) -> bool,
    ) -> Result<Vec<Job>, RepositoryError>;
    /// Apply `change` only when the job's status is one of `expected`.
    fn transition_job(
        &self,
        id: &JobId,
        expected: &[JobStatus],
        change: JobChange,
    ) -> Result<Job, RepositoryError>;
    /// Cancel a job from one of `expected` and reject its pending quotes as one unit.
    fn cancel_job(&self, id: &JobId, expected: &[JobStatus]) -> Result<Job, RepositoryError>;
}

/// Result of settling a job on one quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSettlement {
    pub quote: Quote,
    pub job: Job,
    pub rejected: Vec<QuoteId>,
}

pub trait QuoteLedger: Send + Sync {
    /// Fails with `Conflict` when the professional already has a pending or
    /// accepted quote on the same job.
    fn insert_quote(&self, quote: Quote) -> Result<Quote, RepositoryError>;
    fn fetch_quote(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;
    /// Newest first.
    fn quotes_for_homeowner(&self, homeowner: &UserId) -> Result<Vec<Quote>, RepositoryError>;
    /// Newest first.
    fn quotes_for_professional(&self, professional: &UserId)
        -> Result<Vec<Quote>, RepositoryError>;
    fn transition_quote(
        &self,
        id: &QuoteId,
        expected: &[QuoteStatus],
        to: QuoteStatus,
    ) -> Result<Quote, RepositoryError>;
    /// Accept a pending quote, assign and price its pending job, and reject every
    /// other pending quote on that job. All or nothing.
    fn settle_quote(&self, id: &QuoteId) -> Result<QuoteSettlement, RepositoryError>;
}

pub trait PaymentLedger: Send + Sync {
    /// Fails with `Conflict` when the job already has a completed payment.
    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError>;
    /// Payments where `user` is either party, newest first.
    fn payments_for_user(&self, user: &UserId) -> Result<Vec<Payment>, RepositoryError>;
}

pub trait NotificationOutbox: Send + Sync {
    fn append(&self, notification: Notification) -> Result<Notification, RepositoryError>;
    fn fetch_notification(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError>;
    /// Newest first, at most `limit` entries.
    fn notifications_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError>;
    fn mark_read(&self, id: &NotificationId) -> Result<Notification, RepositoryError>;
    /// Returns how many notifications flipped from unread to read.
    fn mark_all_read(&self, user: &UserId) -> Result<usize, RepositoryError>;
    fn unread_count(&self, user: &UserId) -> Result<usize, RepositoryError>;
}

pub trait ReminderBook: Send + Sync {
    fn insert_reminder(&self, reminder: Reminder) -> Result<Reminder, RepositoryError>;
    fn fetch_reminder(&self, id: &ReminderId) -> Result<Option<Reminder>, RepositoryError>;
    fn update_reminder(&self, reminder: Reminder) -> Result<Reminder, RepositoryError>;
    fn delete_reminder(&self, id: &ReminderId) -> Result<(), RepositoryError>;
    /// Earliest due first.
    fn reminders_for_homeowner(&self, homeowner: &UserId)
        -> Result<Vec<Reminder>, RepositoryError>;
}

/// Everything the orchestrator needs from storage.
pub trait MarketplaceStore:
    UserDirectory + JobRegistry + QuoteLedger + PaymentLedger + NotificationOutbox + ReminderBook
{
}

impl<T> MarketplaceStore for T where
    T: UserDirectory + JobRegistry + QuoteLedger + PaymentLedger + NotificationOutbox + ReminderBook
{
}
