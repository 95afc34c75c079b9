//! Best-effort live-update channel. Events describe a change after it is
//! stored; they are never a source of truth and delivery is not guaranteed.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use super::domain::{JobCategory, User, UserId, UserRole};
use super::pricing::SpecialtyFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveEventKind {
    NewJob,
    JobUpdated,
    JobAccepted,
    JobCompleted,
    JobCancelled,
    NewQuote,
    QuoteAccepted,
    QuoteRejected,
    PaymentCompleted,
}

impl LiveEventKind {
    pub const fn name(self) -> &'static str {
        match self {
            LiveEventKind::NewJob => "new-job",
            LiveEventKind::JobUpdated => "job-updated",
            LiveEventKind::JobAccepted => "job-accepted",
            LiveEventKind::JobCompleted => "job-completed",
            LiveEventKind::JobCancelled => "job-cancelled",
            LiveEventKind::NewQuote => "new-quote",
            LiveEventKind::QuoteAccepted => "quote-accepted",
            LiveEventKind::QuoteRejected => "quote-rejected",
            LiveEventKind::PaymentCompleted => "payment-completed",
        }
    }
}

/// Who should receive an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Users(Vec<UserId>),
    /// Professionals whose specialties cover the category.
    Professionals(JobCategory),
}

impl Audience {
    pub fn includes(&self, user: &User) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::Users(ids) => ids.contains(&user.id),
            Audience::Professionals(category) => {
                user.role == UserRole::Professional
                    && SpecialtyFilter::from_specialties(&user.specialties).allows(*category)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiveUpdate {
    pub kind: LiveEventKind,
    pub audience: Audience,
    pub payload: serde_json::Value,
    pub emitted_at: DateTime<Utc>,
}

impl LiveUpdate {
    pub fn new(kind: LiveEventKind, audience: Audience, payload: serde_json::Value) -> Self {
        Self {
            kind,
            audience,
            payload,
            emitted_at: Utc::now(),
        }
    }

    /// Frame sent to subscribers.
    pub fn frame(&self) -> serde_json::Value {
        serde_json::json!({
            "event": self.kind.name(),
            "payload": self.payload,
            "emitted_at": self.emitted_at,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LiveUpdateError {
    #[error("live-update transport unavailable: {0}")]
    Transport(String),
}

/// Injected publish side of the live-update channel.
pub trait LiveUpdatePublisher: Send + Sync {
    fn publish(&self, update: LiveUpdate) -> Result<(), LiveUpdateError>;

    /// Transports that can fan events out to connected clients return a receiver.
    fn subscribe(&self) -> Option<broadcast::Receiver<LiveUpdate>> {
        None
    }
}

/// In-process fan-out over a `tokio::sync::broadcast` channel.
#[derive(Debug)]
pub struct BroadcastLiveUpdates {
    sender: broadcast::Sender<LiveUpdate>,
}

impl BroadcastLiveUpdates {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }
}

impl LiveUpdatePublisher for BroadcastLiveUpdates {
    fn publish(&self, update: LiveUpdate) -> Result<(), LiveUpdateError> {
        // A send error only means nobody is connected right now.
        let _ = self.sender.send(update);
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<LiveUpdate>> {
        Some(self.sender.subscribe())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLiveUpdates;

impl LiveUpdatePublisher for NoopLiveUpdates {
    fn publish(&self, _update: LiveUpdate) -> Result<(), LiveUpdateError> {
        Ok(())
    }
}

/// Keeps every published event; used by tests and the CLI demo.
#[derive(Debug, Default, Clone)]
pub struct RecordingLiveUpdates {
    events: Arc<Mutex<Vec<LiveUpdate>>>,
}

impl RecordingLiveUpdates {
    pub fn events(&self) -> Vec<LiveUpdate> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn kinds(&self) -> Vec<LiveEventKind> {
        self.events().into_iter().map(|event| event.kind).collect()
    }
}

impl LiveUpdatePublisher for RecordingLiveUpdates {
    fn publish(&self, update: LiveUpdate) -> Result<(), LiveUpdateError> {
        self.events
            .lock()
            .map_err(|_| LiveUpdateError::Transport("recorder lock poisoned".to_string()))?
            .push(update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: &str, role: UserRole, specialties: &[&str]) -> User {
        let now = Utc::now();
        User {
            id: UserId::from(id),
            name: id.to_string(),
            email: format!("{id}@example.com"),
            role,
            phone: None,
            address: None,
            specialties: specialties.iter().map(|s| s.to_string()).collect(),
            rating: 0.0,
            completed_jobs: 0,
            saved_card: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn professional_audience_follows_specialties() {
        let audience = Audience::Professionals(JobCategory::Plumbing);
        assert!(audience.includes(&user("p1", UserRole::Professional, &["Tesisat"])));
        assert!(audience.includes(&user("p2", UserRole::Professional, &[])));
        assert!(!audience.includes(&user("p3", UserRole::Professional, &["boya"])));
        assert!(!audience.includes(&user("h1", UserRole::Homeowner, &[])));
    }

    #[test]
    fn user_audience_is_exact() {
        let audience = Audience::Users(vec![UserId::from("h1")]);
        assert!(audience.includes(&user("h1", UserRole::Homeowner, &[])));
        assert!(!audience.includes(&user("h2", UserRole::Homeowner, &[])));
    }

    #[tokio::test]
    async fn broadcast_delivers_to_subscribers() {
        let bus = BroadcastLiveUpdates::new(4);
        let mut rx = bus.subscribe().expect("broadcast supports subscribers");

        bus.publish(LiveUpdate::new(
            LiveEventKind::NewJob,
            Audience::Everyone,
            json!({ "id": "job-1" }),
        ))
        .expect("publish never fails");

        let received = rx.recv().await.expect("event delivered");
        assert_eq!(received.kind, LiveEventKind::NewJob);
        assert_eq!(received.frame()["event"], json!("new-job"));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = BroadcastLiveUpdates::new(1);
        assert!(bus
            .publish(LiveUpdate::new(
                LiveEventKind::JobUpdated,
                Audience::Everyone,
                json!({}),
            ))
            .is_ok());
        assert!(NoopLiveUpdates.subscribe().is_none());
    }
}
