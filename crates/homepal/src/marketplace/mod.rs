//! Job, quote and payment workflow for the home-repair marketplace.
//!
//! The orchestrator in [`service`] owns every status transition. Storage,
//! live updates and price estimation are injected through the traits in
//! [`repository`], [`live`] and [`pricing`].

pub mod domain;
pub mod live;
pub mod memory;
pub mod pricing;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    CardSummary, Job, JobCategory, JobId, JobPriority, JobStatus, Notification, NotificationId,
    NotificationKind, Payment, PaymentId, PaymentMethod, PaymentStatus, PriceBand, Quote,
    QuoteId, QuoteStatus, Reminder, ReminderCategory, ReminderId, User, UserId, UserRole,
};
pub use live::{
    Audience, BroadcastLiveUpdates, LiveEventKind, LiveUpdate, LiveUpdateError,
    LiveUpdatePublisher, NoopLiveUpdates, RecordingLiveUpdates,
};
pub use memory::InMemoryMarketplaceStore;
pub use pricing::{CategoryEstimator, PriceEstimator, PricingError, SpecialtyFilter};
pub use repository::{
    JobChange, JobEdits, JobRegistry, MarketplaceStore, NotificationOutbox, PaymentLedger,
    QuoteLedger, QuoteSettlement, ReminderBook, RepositoryError, UserDirectory,
};
pub use router::marketplace_router;
pub use service::{
    Actor, CardInput, MarketplaceError, MarketplaceService, NewJob, NewQuote, NewReminder,
    PaymentRequest, ProfileUpdate, Registration, ReminderSuggestion, ReminderUpdate,
};
pub use views::{
    JobReference, JobSummary, JobView, NotificationView, PaymentView, ProfessionalSummary,
    QuoteView, UserProfile, UserSummary,
};
