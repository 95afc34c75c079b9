use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::config::MarketplaceConfig;
use crate::marketplace::domain::{
    Job, JobCategory, JobId, JobStatus, Notification, NotificationId, Payment, Quote, QuoteId, QuoteStatus,
    Reminder, ReminderId, User, UserId, UserRole,
};
use crate::marketplace::live::{LiveUpdatePublisher, RecordingLiveUpdates};
use crate::marketplace::memory::InMemoryMarketplaceStore;
use crate::marketplace::repository::{
    JobChange, JobRegistry, MarketplaceStore, NotificationOutbox, PaymentLedger, QuoteLedger, QuoteSettlement,
    ReminderBook, RepositoryError, UserDirectory,
};
use crate::marketplace::service::{Actor, MarketplaceService, NewJob, NewQuote, Registration};
use crate::marketplace::views::{JobView, QuoteView};

pub(super) type TestService = MarketplaceService<InMemoryMarketplaceStore, RecordingLiveUpdates>;

pub(super) fn build_service() -> (
    TestService,
    Arc<InMemoryMarketplaceStore>,
    Arc<RecordingLiveUpdates>,
) {
    let store = Arc::new(InMemoryMarketplaceStore::new());
    let live = Arc::new(RecordingLiveUpdates::default());
    let service = MarketplaceService::new(store.clone(), live.clone(), MarketplaceConfig::default());
    (service, store, live)
}

fn registration(name: &str, role: UserRole, specialties: &[&str]) -> Registration {
    Registration {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        role,
        phone: Some("+90 555 000 0000".to_string()),
        address: None,
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        saved_card: None,
    }
}

pub(super) fn register_homeowner<S, L>(service: &MarketplaceService<S, L>, name: &str) -> Actor
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    let profile = service
        .register(registration(name, UserRole::Homeowner, &[]))
        .expect("homeowner registers");
    Actor::new(profile.id.0, UserRole::Homeowner)
}

pub(super) fn register_professional<S, L>(
    service: &MarketplaceService<S, L>,
    name: &str,
    specialties: &[&str],
) -> Actor
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    let profile = service
        .register(registration(name, UserRole::Professional, specialties))
        .expect("professional registers");
    Actor::new(profile.id.0, UserRole::Professional)
}

pub(super) fn leaking_tap() -> NewJob {
    NewJob::new(
        "Leaking kitchen tap",
        "The tap under the sink drips all night.",
        JobCategory::Plumbing,
    )
}

pub(super) fn post_plumbing_job<S, L>(service: &MarketplaceService<S, L>, homeowner: &Actor) -> JobView
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service
        .create_job(homeowner, leaking_tap())
        .expect("job posted")
}

pub(super) fn quote(job: &JobId, price: u32) -> NewQuote {
    NewQuote {
        job_id: job.clone(),
        price,
        message: Some("Can come tomorrow morning.".to_string()),
    }
}

/// Homeowner, professional, and a plumbing job settled on a 1200 TL quote.
pub(super) fn accepted_job(service: &TestService) -> (Actor, Actor, JobView, QuoteView) {
    let homeowner = register_homeowner(service, "Ayse");
    let professional = register_professional(service, "Usta Mehmet", &["tesisat"]);
    let job = post_plumbing_job(service, &homeowner);
    let submitted = service
        .submit_quote(&professional, quote(&job.id, 1_200))
        .expect("quote submitted");
    let accepted = service
        .accept_quote(&homeowner, &submitted.id)
        .expect("quote accepted");
    let job = service.get_job(&job.id).expect("job reloads");
    (homeowner, professional, job, accepted)
}

pub(super) fn quote_status(store: &InMemoryMarketplaceStore, id: &QuoteId) -> QuoteStatus {
    store
        .fetch_quote(id)
        .expect("fetch succeeds")
        .expect("quote present")
        .status
}

pub(super) fn notifications_for(store: &InMemoryMarketplaceStore, user: &UserId) -> Vec<Notification> {
    store
        .notifications_for_user(user, usize::MAX)
        .expect("notifications load")
}

/// Store whose notification outbox is down; everything else delegates.
#[derive(Default)]
pub(super) struct FailingOutbox {
    pub(super) inner: InMemoryMarketplaceStore,
}

impl UserDirectory for FailingOutbox {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        self.inner.insert_user(user)
    }

    fn update_user(&self, user: User) -> Result<User, RepositoryError> {
        self.inner.update_user(user)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.fetch_user(id)
    }

    fn users_with_role(&self, role: UserRole) -> Result<Vec<User>, RepositoryError> {
        self.inner.users_with_role(role)
    }
}

impl JobRegistry for FailingOutbox {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.insert_job(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.fetch_job(id)
    }

    fn jobs_for_homeowner(&self, homeowner: &UserId) -> Result<Vec<Job>, RepositoryError> {
        self.inner.jobs_for_homeowner(homeowner)
    }

    fn jobs_for_professional(
        &self,
        professional: &UserId,
        open_filter: &dyn Fn(&Job) -> bool,
    ) -> Result<Vec<Job>, RepositoryError> {
        self.inner.jobs_for_professional(professional, open_filter)
    }

    fn transition_job(
        &self,
        id: &JobId,
        expected: &[JobStatus],
        change: JobChange,
    ) -> Result<Job, RepositoryError> {
        self.inner.transition_job(id, expected, change)
    }

    fn cancel_job(
        &self,
        id: &JobId,
        expected: &[JobStatus],
    ) -> Result<Job, RepositoryError> {
        self.inner.cancel_job(id, expected)
    }
}

impl QuoteLedger for FailingOutbox {
    fn insert_quote(&self, quote: Quote) -> Result<Quote, RepositoryError> {
        self.inner.insert_quote(quote)
    }

    fn fetch_quote(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        self.inner.fetch_quote(id)
    }

    fn quotes_for_homeowner(&self, homeowner: &UserId) -> Result<Vec<Quote>, RepositoryError> {
        self.inner.quotes_for_homeowner(homeowner)
    }

    fn quotes_for_professional(
        &self,
        professional: &UserId,
    ) -> Result<Vec<Quote>, RepositoryError> {
        self.inner.quotes_for_professional(professional)
    }

    fn transition_quote(
        &self,
        id: &QuoteId,
        expected: &[QuoteStatus],
        to: QuoteStatus,
    ) -> Result<Quote, RepositoryError> {
        self.inner.transition_quote(id, expected, to)
    }

    fn settle_quote(&self, id: &QuoteId) -> Result<QuoteSettlement, RepositoryError> {
        self.inner.settle_quote(id)
    }
}

impl PaymentLedger for FailingOutbox {
    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        self.inner.insert_payment(payment)
    }

    fn payments_for_user(&self, user: &UserId) -> Result<Vec<Payment>, RepositoryError> {
        self.inner.payments_for_user(user)
    }
}

impl NotificationOutbox for FailingOutbox {
    fn append(&self, _notification: Notification) -> Result<Notification, RepositoryError> {
        Err(RepositoryError::Unavailable("outbox offline".to_string()))
    }

    fn fetch_notification(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        self.inner.fetch_notification(id)
    }

    fn notifications_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        self.inner.notifications_for_user(user, limit)
    }

    fn mark_read(&self, id: &NotificationId) -> Result<Notification, RepositoryError> {
        self.inner.mark_read(id)
    }

    fn mark_all_read(&self, user: &UserId) -> Result<usize, RepositoryError> {
        self.inner.mark_all_read(user)
    }

    fn unread_count(&self, user: &UserId) -> Result<usize, RepositoryError> {
        self.inner.unread_count(user)
    }
}

impl ReminderBook for FailingOutbox {
    fn insert_reminder(&self, reminder: Reminder) -> Result<Reminder, RepositoryError> {
        self.inner.insert_reminder(reminder)
    }

    fn fetch_reminder(&self, id: &ReminderId) -> Result<Option<Reminder>, RepositoryError> {
        self.inner.fetch_reminder(id)
    }

    fn update_reminder(&self, reminder: Reminder) -> Result<Reminder, RepositoryError> {
        self.inner.update_reminder(reminder)
    }

    fn delete_reminder(&self, id: &ReminderId) -> Result<(), RepositoryError> {
        self.inner.delete_reminder(id)
    }

    fn reminders_for_homeowner(
        &self,
        homeowner: &UserId,
    ) -> Result<Vec<Reminder>, RepositoryError> {
        self.inner.reminders_for_homeowner(homeowner)
    }
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    actor: Option<&Actor>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder
            .header("x-user-id", actor.id.as_str())
            .header("x-user-role", actor.role.label());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
