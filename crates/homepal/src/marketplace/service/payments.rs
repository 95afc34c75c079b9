use chrono::Utc;
use serde::Deserialize;

use super::{Actor, MarketplaceError, MarketplaceService};
use crate::marketplace::domain::{
    CardSummary, JobId, NotificationKind, Payment, PaymentId, PaymentMethod, PaymentStatus,
    UserRole,
};
use crate::marketplace::live::{Audience, LiveEventKind, LiveUpdatePublisher};
use crate::marketplace::repository::{MarketplaceStore, RepositoryError};
use crate::marketplace::views::PaymentView;

const FALLBACK_LAST4: &str = "0000";
const FALLBACK_BRAND: &str = "visa";

/// Card details as typed by the client. Only the last four digits are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct CardInput {
    pub last4: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub holder_name: Option<String>,
}

impl CardInput {
    pub fn into_summary(self) -> Result<CardSummary, MarketplaceError> {
        let last4 = self.last4.trim().to_string();
        if !CardSummary::is_valid_last4(&last4) {
            return Err(MarketplaceError::Validation(
                "card last4 must be exactly four digits".to_string(),
            ));
        }
        Ok(CardSummary {
            last4,
            brand: self
                .brand
                .map(|brand| brand.trim().to_lowercase())
                .filter(|brand| !brand.is_empty())
                .unwrap_or_else(|| FALLBACK_BRAND.to_string()),
            holder_name: self.holder_name,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub job_id: JobId,
    #[serde(default)]
    pub card: Option<CardInput>,
}

impl<S, L> MarketplaceService<S, L>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    fn payment_view(&self, payment: Payment) -> Result<PaymentView, MarketplaceError> {
        let job = self.load_job(&payment.job)?;
        let homeowner = self.resolve_user(&payment.homeowner)?;
        let professional = self.resolve_user(&payment.professional)?;
        Ok(PaymentView::new(payment, &job, &homeowner, &professional))
    }

    /// Mock checkout: always succeeds once a price is agreed, at most once per job.
    pub fn pay(&self, actor: &Actor, request: PaymentRequest) -> Result<PaymentView, MarketplaceError> {
        Self::require_role(actor, UserRole::Homeowner, "pay for a job")?;
        let payer = self.authenticate(actor)?;
        let job = self.load_job(&request.job_id)?;
        if job.homeowner != actor.id {
            return Err(MarketplaceError::Forbidden(
                "only the job's homeowner can pay for it".to_string(),
            ));
        }

        let (Some(amount), Some(professional)) = (job.price, job.professional.clone()) else {
            return Err(MarketplaceError::PreconditionFailed(format!(
                "job {} has no agreed price yet",
                job.id
            )));
        };

        let card = match request.card {
            Some(card) => card.into_summary()?,
            None => payer.saved_card.unwrap_or_else(|| CardSummary {
                last4: FALLBACK_LAST4.to_string(),
                brand: FALLBACK_BRAND.to_string(),
                holder_name: None,
            }),
        };

        let payment = Payment {
            id: PaymentId::generate(),
            job: job.id.clone(),
            homeowner: job.homeowner.clone(),
            professional: professional.clone(),
            amount,
            method: PaymentMethod::Card,
            card,
            status: PaymentStatus::Completed,
            created_at: Utc::now(),
        };

        let stored = self.store.insert_payment(payment).map_err(|error| match error {
            RepositoryError::Conflict => {
                MarketplaceError::Conflict(format!("job {} has already been paid", job.id))
            }
            other => other.into(),
        })?;
        tracing::info!(
            payment_id = %stored.id,
            job_id = %job.id,
            actor = %actor.id,
            amount,
            "payment completed"
        );

        self.notify(
            &professional,
            NotificationKind::JobCompleted,
            format!("Payment of {amount} TL received for \"{}\".", job.title),
            Some(&job.id),
            None,
        );
        self.notify(
            &job.homeowner,
            NotificationKind::JobCompleted,
            format!("You paid {amount} TL for \"{}\".", job.title),
            Some(&job.id),
            None,
        );

        let view = self.payment_view(stored)?;
        self.broadcast(
            LiveEventKind::PaymentCompleted,
            Audience::Users(vec![job.homeowner.clone(), professional]),
            &view,
        );
        Ok(view)
    }

    pub fn list_payments(&self, actor: &Actor) -> Result<Vec<PaymentView>, MarketplaceError> {
        self.store
            .payments_for_user(&actor.id)?
            .into_iter()
            .map(|payment| self.payment_view(payment))
            .collect()
    }
}
