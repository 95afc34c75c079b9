//! Response shapes with reference fields resolved. Stored records keep bare
//! ids; these views are built once the referenced records have been loaded.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    CardSummary, Job, JobCategory, JobId, JobPriority, JobStatus, Notification, NotificationId,
    NotificationKind, Payment, PaymentId, PaymentMethod, PaymentStatus, PriceBand, Quote,
    QuoteId, QuoteStatus, User, UserId, UserRole,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessionalSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rating: f32,
    pub completed_jobs: u32,
    pub specialties: Vec<String>,
}

impl From<&User> for ProfessionalSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            rating: user.rating,
            completed_jobs: user.completed_jobs,
            specialties: user.specialties.clone(),
        }
    }
}

/// Account as shown to other users. The saved card is only echoed to its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub specialties: Vec<String>,
    pub rating: f32,
    pub completed_jobs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_card: Option<CardSummary>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user: User, include_card: bool) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            address: user.address,
            specialties: user.specialties,
            rating: user.rating,
            completed_jobs: user.completed_jobs,
            saved_card: if include_card { user.saved_card } else { None },
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    pub status: JobStatus,
    pub priority: JobPriority,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            description: job.description.clone(),
            category: job.category,
            status: job.status,
            priority: job.priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub location: Option<String>,
    pub homeowner: UserSummary,
    pub professional: Option<ProfessionalSummary>,
    #[serde(flatten)]
    pub price_band: PriceBand,
    pub price: Option<u32>,
    pub scheduled_date: Option<NaiveDate>,
    pub completed_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobView {
    pub fn new(job: Job, homeowner: &User, professional: Option<&User>) -> Self {
        Self {
            id: job.id,
            title: job.title,
            description: job.description,
            category: job.category,
            priority: job.priority,
            status: job.status,
            location: job.location,
            homeowner: UserSummary::from(homeowner),
            professional: professional.map(ProfessionalSummary::from),
            price_band: job.price_band,
            price: job.price,
            scheduled_date: job.scheduled_date,
            completed_date: job.completed_date,
            notes: job.notes,
            photo_url: job.photo_url,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteView {
    pub id: QuoteId,
    pub job: JobSummary,
    pub professional: ProfessionalSummary,
    pub homeowner: UserSummary,
    pub price: u32,
    pub message: Option<String>,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuoteView {
    pub fn new(quote: Quote, job: &Job, professional: &User, homeowner: &User) -> Self {
        Self {
            id: quote.id,
            job: JobSummary::from(job),
            professional: ProfessionalSummary::from(professional),
            homeowner: UserSummary::from(homeowner),
            price: quote.price,
            message: quote.message,
            status: quote.status,
            created_at: quote.created_at,
            updated_at: quote.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentView {
    pub id: PaymentId,
    pub job: JobSummary,
    pub homeowner: UserSummary,
    pub professional: UserSummary,
    pub amount: u32,
    pub method: PaymentMethod,
    pub card: CardSummary,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl PaymentView {
    pub fn new(payment: Payment, job: &Job, homeowner: &User, professional: &User) -> Self {
        Self {
            id: payment.id,
            job: JobSummary::from(job),
            homeowner: UserSummary::from(homeowner),
            professional: UserSummary::from(professional),
            amount: payment.amount,
            method: payment.method,
            card: payment.card,
            status: payment.status,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReference {
    pub id: JobId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub related_job: Option<JobReference>,
    pub related_quote: Option<QuoteId>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationView {
    /// `job` is the resolved related job, if it still exists.
    pub fn new(notification: Notification, job: Option<&Job>) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            message: notification.message,
            related_job: job.map(|job| JobReference {
                id: job.id.clone(),
                title: job.title.clone(),
            }),
            related_quote: notification.related_quote,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}
