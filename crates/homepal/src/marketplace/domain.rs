use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

entity_id!(
    /// Identifier of a homeowner or professional account.
    UserId
);
entity_id!(
    /// Identifier of a job request.
    JobId
);
entity_id!(QuoteId);
entity_id!(PaymentId);
entity_id!(NotificationId);
entity_id!(ReminderId);

/// Account role, fixed when the account is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Homeowner,
    Professional,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Homeowner => "homeowner",
            UserRole::Professional => "professional",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "homeowner" => Some(Self::Homeowner),
            "professional" => Some(Self::Professional),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Masked card details. Only the last four digits are ever kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub last4: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
}

impl CardSummary {
    pub fn is_valid_last4(raw: &str) -> bool {
        raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Stored account. Credentials live with the authentication collaborator, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Declared competences (professionals only). Free text, resolved through the alias table.
    pub specialties: Vec<String>,
    pub rating: f32,
    pub completed_jobs: u32,
    pub saved_card: Option<CardSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobCategory {
    Plumbing,
    Electrical,
    Hvac,
    Appliances,
    Paint,
    Furniture,
    Flooring,
    Roofing,
    General,
    Other,
}

impl JobCategory {
    pub const ALL: [JobCategory; 10] = [
        JobCategory::Plumbing,
        JobCategory::Electrical,
        JobCategory::Hvac,
        JobCategory::Appliances,
        JobCategory::Paint,
        JobCategory::Furniture,
        JobCategory::Flooring,
        JobCategory::Roofing,
        JobCategory::General,
        JobCategory::Other,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            JobCategory::Plumbing => "plumbing",
            JobCategory::Electrical => "electrical",
            JobCategory::Hvac => "hvac",
            JobCategory::Appliances => "appliances",
            JobCategory::Paint => "paint",
            JobCategory::Furniture => "furniture",
            JobCategory::Flooring => "flooring",
            JobCategory::Roofing => "roofing",
            JobCategory::General => "general",
            JobCategory::Other => "other",
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Job lifecycle: `pending -> accepted -> in-progress -> completed`, with
/// `cancelled` reachable from `pending` and `accepted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Accepted => "accepted",
            JobStatus::InProgress => "in-progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Assigned to a professional but not yet done.
    pub const fn is_assigned(self) -> bool {
        matches!(self, JobStatus::Accepted | JobStatus::InProgress)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive acceptable bid range for a job, in whole lira.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min_price: u32,
    pub max_price: u32,
}

impl PriceBand {
    pub const fn new(min_price: u32, max_price: u32) -> Self {
        Self {
            min_price,
            max_price,
        }
    }

    pub const fn contains(&self, price: u32) -> bool {
        price >= self.min_price && price <= self.max_price
    }

    pub const fn is_within(&self, outer: &PriceBand) -> bool {
        self.min_price >= outer.min_price && self.max_price <= outer.max_price
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub location: Option<String>,
    pub homeowner: UserId,
    pub professional: Option<UserId>,
    #[serde(flatten)]
    pub price_band: PriceBand,
    /// Agreed price, only ever set by quote acceptance.
    pub price: Option<u32>,
    pub scheduled_date: Option<NaiveDate>,
    pub completed_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn involves(&self, user: &UserId) -> bool {
        &self.homeowner == user || self.professional.as_ref() == Some(user)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Pending,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    pub const fn label(self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
        }
    }

    /// Pending or accepted quotes block a second bid from the same professional.
    pub const fn is_active(self) -> bool {
        matches!(self, QuoteStatus::Pending | QuoteStatus::Accepted)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub job: JobId,
    pub professional: UserId,
    pub homeowner: UserId,
    pub price: u32,
    pub message: Option<String>,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub job: JobId,
    pub homeowner: UserId,
    pub professional: UserId,
    pub amount: u32,
    pub method: PaymentMethod,
    pub card: CardSummary,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    QuoteReceived,
    QuoteAccepted,
    QuoteRejected,
    JobAssigned,
    JobCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub related_job: Option<JobId>,
    pub related_quote: Option<QuoteId>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Maintenance areas homeowners can schedule recurring reminders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderCategory {
    Cati,
    Tesisat,
    Elektrik,
    Bahce,
    Boya,
    Klima,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub homeowner: UserId,
    pub name: String,
    pub category: ReminderCategory,
    pub frequency_days: u32,
    pub next_due_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
