use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use indexmap::IndexMap;

use super::domain::{
    Job, JobId, JobStatus, Notification, NotificationId, Payment, PaymentId, PaymentStatus,
    Quote, QuoteId, QuoteStatus, Reminder, ReminderId, User, UserId, UserRole,
};
use super::repository::{
    JobChange, JobRegistry, NotificationOutbox, PaymentLedger, QuoteLedger, QuoteSettlement,
    ReminderBook, RepositoryError, UserDirectory,
};

/// Process-local store. A single lock over every table gives each operation,
/// including the multi-record ones, all-or-nothing semantics.
#[derive(Debug, Default)]
pub struct InMemoryMarketplaceStore {
    tables: Mutex<Tables>,
}

/// Insertion-ordered tables; insertion order doubles as creation order.
#[derive(Debug, Default)]
struct Tables {
    users: IndexMap<UserId, User>,
    jobs: IndexMap<JobId, Job>,
    quotes: IndexMap<QuoteId, Quote>,
    payments: IndexMap<PaymentId, Payment>,
    notifications: IndexMap<NotificationId, Notification>,
    reminders: IndexMap<ReminderId, Reminder>,
}

impl InMemoryMarketplaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

fn stale_job(expected: &[JobStatus], actual: JobStatus) -> RepositoryError {
    RepositoryError::StaleStatus {
        expected: expected.first().map_or("none", |status| status.label()),
        actual: actual.label(),
    }
}

fn email_taken(tables: &Tables, email: &str, except: Option<&UserId>) -> bool {
    tables
        .users
        .values()
        .any(|user| user.email == email && Some(&user.id) != except)
}

impl UserDirectory for InMemoryMarketplaceStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.users.contains_key(&user.id) || email_taken(&tables, &user.email, None) {
            return Err(RepositoryError::Conflict);
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn update_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        if email_taken(&tables, &user.email, Some(&user.id)) {
            return Err(RepositoryError::Conflict);
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables()?.users.get(id).cloned())
    }

    fn users_with_role(&self, role: UserRole) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .values()
            .filter(|user| user.role == role)
            .cloned()
            .collect())
    }
}

impl JobRegistry for InMemoryMarketplaceStore {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.tables()?.jobs.get(id).cloned())
    }

    fn jobs_for_homeowner(&self, homeowner: &UserId) -> Result<Vec<Job>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .jobs
            .values()
            .rev()
            .filter(|job| &job.homeowner == homeowner)
            .cloned()
            .collect())
    }

    fn jobs_for_professional(
        &self,
        professional: &UserId,
        open_filter: &dyn Fn(&Job) -> bool,
    ) -> Result<Vec<Job>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .jobs
            .values()
            .rev()
            .filter(|job| match &job.professional {
                Some(assigned) => assigned == professional,
                None => job.status == JobStatus::Pending && open_filter(job),
            })
            .cloned()
            .collect())
    }

    fn transition_job(
        &self,
        id: &JobId,
        expected: &[JobStatus],
        change: JobChange,
    ) -> Result<Job, RepositoryError> {
        let mut tables = self.tables()?;
        let job = tables.jobs.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if !expected.contains(&job.status) {
            return Err(stale_job(expected, job.status));
        }
        change.apply(job, Utc::now());
        Ok(job.clone())
    }

    fn cancel_job(&self, id: &JobId, expected: &[JobStatus]) -> Result<Job, RepositoryError> {
        let mut tables = self.tables()?;
        let now = Utc::now();
        let job = tables.jobs.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if !expected.contains(&job.status) {
            return Err(stale_job(expected, job.status));
        }
        job.status = JobStatus::Cancelled;
        job.updated_at = now;
        let cancelled = job.clone();

        for quote in tables.quotes.values_mut() {
            if quote.job == cancelled.id && quote.status == QuoteStatus::Pending {
                quote.status = QuoteStatus::Rejected;
                quote.updated_at = now;
            }
        }
        Ok(cancelled)
    }
}

impl QuoteLedger for InMemoryMarketplaceStore {
    fn insert_quote(&self, quote: Quote) -> Result<Quote, RepositoryError> {
        let mut tables = self.tables()?;
        let duplicate = tables.quotes.values().any(|existing| {
            existing.job == quote.job
                && existing.professional == quote.professional
                && existing.status.is_active()
        });
        if duplicate || tables.quotes.contains_key(&quote.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.quotes.insert(quote.id.clone(), quote.clone());
        Ok(quote)
    }

    fn fetch_quote(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        Ok(self.tables()?.quotes.get(id).cloned())
    }

    fn quotes_for_homeowner(&self, homeowner: &UserId) -> Result<Vec<Quote>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .quotes
            .values()
            .rev()
            .filter(|quote| &quote.homeowner == homeowner)
            .cloned()
            .collect())
    }

    fn quotes_for_professional(
        &self,
        professional: &UserId,
    ) -> Result<Vec<Quote>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .quotes
            .values()
            .rev()
            .filter(|quote| &quote.professional == professional)
            .cloned()
            .collect())
    }

    fn transition_quote(
        &self,
        id: &QuoteId,
        expected: &[QuoteStatus],
        to: QuoteStatus,
    ) -> Result<Quote, RepositoryError> {
        let mut tables = self.tables()?;
        let quote = tables.quotes.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if !expected.contains(&quote.status) {
            return Err(RepositoryError::StaleStatus {
                expected: expected.first().map_or("none", |status| status.label()),
                actual: quote.status.label(),
            });
        }
        quote.status = to;
        quote.updated_at = Utc::now();
        Ok(quote.clone())
    }

    fn settle_quote(&self, id: &QuoteId) -> Result<QuoteSettlement, RepositoryError> {
        let mut tables = self.tables()?;
        let now = Utc::now();

        // Validate both records before touching either.
        let quote = tables.quotes.get(id).ok_or(RepositoryError::NotFound)?.clone();
        if quote.status != QuoteStatus::Pending {
            return Err(RepositoryError::StaleStatus {
                expected: QuoteStatus::Pending.label(),
                actual: quote.status.label(),
            });
        }
        let job = tables.jobs.get_mut(&quote.job).ok_or(RepositoryError::NotFound)?;
        if job.status != JobStatus::Pending {
            return Err(stale_job(&[JobStatus::Pending], job.status));
        }

        job.status = JobStatus::Accepted;
        job.professional = Some(quote.professional.clone());
        job.price = Some(quote.price);
        job.updated_at = now;
        let job = job.clone();

        let mut rejected = Vec::new();
        for sibling in tables.quotes.values_mut() {
            if sibling.job != quote.job {
                continue;
            }
            if sibling.id == quote.id {
                sibling.status = QuoteStatus::Accepted;
                sibling.updated_at = now;
            } else if sibling.status == QuoteStatus::Pending {
                sibling.status = QuoteStatus::Rejected;
                sibling.updated_at = now;
                rejected.push(sibling.id.clone());
            }
        }

        let quote = tables.quotes.get(id).ok_or(RepositoryError::NotFound)?.clone();
        Ok(QuoteSettlement {
            quote,
            job,
            rejected,
        })
    }
}

impl PaymentLedger for InMemoryMarketplaceStore {
    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let mut tables = self.tables()?;
        let already_paid = tables.payments.values().any(|existing| {
            existing.job == payment.job && existing.status == PaymentStatus::Completed
        });
        if already_paid || tables.payments.contains_key(&payment.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.payments.insert(payment.id.clone(), payment.clone());
        Ok(payment)
    }

    fn payments_for_user(&self, user: &UserId) -> Result<Vec<Payment>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .payments
            .values()
            .rev()
            .filter(|payment| &payment.homeowner == user || &payment.professional == user)
            .cloned()
            .collect())
    }
}

impl NotificationOutbox for InMemoryMarketplaceStore {
    fn append(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.notifications.contains_key(&notification.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .notifications
            .insert(notification.id.clone(), notification.clone());
        Ok(notification)
    }

    fn fetch_notification(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        Ok(self.tables()?.notifications.get(id).cloned())
    }

    fn notifications_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .notifications
            .values()
            .rev()
            .filter(|notification| &notification.user == user)
            .take(limit)
            .cloned()
            .collect())
    }

    fn mark_read(&self, id: &NotificationId) -> Result<Notification, RepositoryError> {
        let mut tables = self.tables()?;
        let notification = tables
            .notifications
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        notification.read = true;
        Ok(notification.clone())
    }

    fn mark_all_read(&self, user: &UserId) -> Result<usize, RepositoryError> {
        let mut tables = self.tables()?;
        let mut flipped = 0;
        for notification in tables.notifications.values_mut() {
            if &notification.user == user && !notification.read {
                notification.read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    fn unread_count(&self, user: &UserId) -> Result<usize, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .notifications
            .values()
            .filter(|notification| &notification.user == user && !notification.read)
            .count())
    }
}

impl ReminderBook for InMemoryMarketplaceStore {
    fn insert_reminder(&self, reminder: Reminder) -> Result<Reminder, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.reminders.contains_key(&reminder.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.reminders.insert(reminder.id.clone(), reminder.clone());
        Ok(reminder)
    }

    fn fetch_reminder(&self, id: &ReminderId) -> Result<Option<Reminder>, RepositoryError> {
        Ok(self.tables()?.reminders.get(id).cloned())
    }

    fn update_reminder(&self, reminder: Reminder) -> Result<Reminder, RepositoryError> {
        let mut tables = self.tables()?;
        let slot = tables
            .reminders
            .get_mut(&reminder.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = reminder.clone();
        Ok(reminder)
    }

    fn delete_reminder(&self, id: &ReminderId) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        tables
            .reminders
            .shift_remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn reminders_for_homeowner(
        &self,
        homeowner: &UserId,
    ) -> Result<Vec<Reminder>, RepositoryError> {
        let tables = self.tables()?;
        let mut reminders: Vec<Reminder> = tables
            .reminders
            .values()
            .filter(|reminder| &reminder.homeowner == homeowner)
            .cloned()
            .collect();
        reminders.sort_by_key(|reminder| reminder.next_due_date);
        Ok(reminders)
    }
}
