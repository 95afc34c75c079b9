use chrono::Utc;
use serde::Deserialize;

use super::{job_parties, quote_error, Actor, MarketplaceError, MarketplaceService};
use crate::marketplace::domain::{
    JobId, JobStatus, NotificationKind, Quote, QuoteId, QuoteStatus, UserRole,
};
use crate::marketplace::live::{Audience, LiveEventKind, LiveUpdatePublisher};
use crate::marketplace::repository::{MarketplaceStore, RepositoryError};
use crate::marketplace::views::QuoteView;

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuote {
    pub job_id: JobId,
    pub price: u32,
    #[serde(default)]
    pub message: Option<String>,
}

impl<S, L> MarketplaceService<S, L>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    fn load_quote(&self, id: &QuoteId) -> Result<Quote, MarketplaceError> {
        self.store
            .fetch_quote(id)?
            .ok_or_else(|| MarketplaceError::not_found("quote", id))
    }

    fn quote_view(&self, quote: Quote) -> Result<QuoteView, MarketplaceError> {
        let job = self.load_job(&quote.job)?;
        let professional = self.resolve_user(&quote.professional)?;
        let homeowner = self.resolve_user(&quote.homeowner)?;
        Ok(QuoteView::new(quote, &job, &professional, &homeowner))
    }

    /// Bid on a pending job. One active bid per professional and job.
    pub fn submit_quote(
        &self,
        actor: &Actor,
        request: NewQuote,
    ) -> Result<QuoteView, MarketplaceError> {
        Self::require_role(actor, UserRole::Professional, "submit a quote")?;
        self.authenticate(actor)?;
        let job = self.load_job(&request.job_id)?;

        let already_bidding = self
            .store
            .quotes_for_professional(&actor.id)?
            .iter()
            .any(|quote| quote.job == job.id && quote.status.is_active());
        if already_bidding {
            return Err(MarketplaceError::Conflict(format!(
                "you already have an active quote on job {}",
                job.id
            )));
        }

        if job.status != JobStatus::Pending {
            return Err(MarketplaceError::InvalidState(format!(
                "job {} is {} and no longer takes quotes",
                job.id, job.status
            )));
        }

        let band = job.price_band;
        if !band.contains(request.price) {
            return Err(MarketplaceError::OutOfRange(format!(
                "price {} TL is outside the accepted range {}-{} TL",
                request.price, band.min_price, band.max_price
            )));
        }

        let now = Utc::now();
        let quote = Quote {
            id: QuoteId::generate(),
            job: job.id.clone(),
            professional: actor.id.clone(),
            homeowner: job.homeowner.clone(),
            price: request.price,
            message: request.message,
            status: QuoteStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_quote(quote).map_err(|error| match error {
            RepositoryError::Conflict => MarketplaceError::Conflict(format!(
                "you already have an active quote on job {}",
                job.id
            )),
            other => other.into(),
        })?;
        tracing::info!(
            quote_id = %stored.id,
            job_id = %job.id,
            actor = %actor.id,
            price = stored.price,
            "quote submitted"
        );

        let view = self.quote_view(stored)?;
        self.notify(
            &job.homeowner,
            NotificationKind::QuoteReceived,
            format!(
                "{} quoted {} TL for \"{}\".",
                view.professional.name, view.price, job.title
            ),
            Some(&job.id),
            Some(&view.id),
        );
        self.broadcast(
            LiveEventKind::NewQuote,
            Audience::Users(vec![job.homeowner.clone()]),
            &view,
        );
        Ok(view)
    }

    /// Homeowners see quotes on their jobs, professionals their own bids.
    pub fn list_quotes(
        &self,
        actor: &Actor,
        job: Option<&JobId>,
    ) -> Result<Vec<QuoteView>, MarketplaceError> {
        let quotes = match actor.role {
            UserRole::Homeowner => self.store.quotes_for_homeowner(&actor.id)?,
            UserRole::Professional => self.store.quotes_for_professional(&actor.id)?,
        };

        quotes
            .into_iter()
            .filter(|quote| job.map_or(true, |job| &quote.job == job))
            .map(|quote| self.quote_view(quote))
            .collect()
    }

    pub fn get_quote(&self, actor: &Actor, id: &QuoteId) -> Result<QuoteView, MarketplaceError> {
        let quote = self.load_quote(id)?;
        if quote.homeowner != actor.id && quote.professional != actor.id {
            return Err(MarketplaceError::Forbidden(
                "only the quote's parties can view it".to_string(),
            ));
        }
        self.quote_view(quote)
    }

    /// Settle the job on this quote: the quote is accepted, the job assigned and
    /// priced, and competing pending quotes rejected, all in one store write.
    pub fn accept_quote(&self, actor: &Actor, id: &QuoteId) -> Result<QuoteView, MarketplaceError> {
        self.authenticate(actor)?;
        let quote = self.load_quote(id)?;
        if quote.homeowner != actor.id {
            return Err(MarketplaceError::Forbidden(
                "only the job's homeowner can accept quotes".to_string(),
            ));
        }
        if quote.status != QuoteStatus::Pending {
            return Err(MarketplaceError::InvalidState(format!(
                "quote {id} is already {}",
                quote.status
            )));
        }

        let settlement = self.store.settle_quote(id).map_err(|error| match error {
            RepositoryError::StaleStatus { actual, .. } => MarketplaceError::InvalidState(
                format!("quote {id} can no longer be accepted: a record is now {actual}"),
            ),
            other => quote_error(id)(other),
        })?;
        tracing::info!(
            quote_id = %id,
            job_id = %settlement.job.id,
            actor = %actor.id,
            price = settlement.quote.price,
            rejected = settlement.rejected.len(),
            "quote accepted"
        );

        let job = settlement.job;
        self.notify(
            &settlement.quote.professional,
            NotificationKind::QuoteAccepted,
            format!(
                "Your quote of {} TL for \"{}\" was accepted. You can start the job.",
                settlement.quote.price, job.title
            ),
            Some(&job.id),
            Some(id),
        );

        let view = self.quote_view(settlement.quote)?;
        self.broadcast(
            LiveEventKind::QuoteAccepted,
            Audience::Users(vec![view.professional.id.clone()]),
            &view,
        );
        let job_audience = job_parties(&job);
        match self.job_view(job) {
            Ok(job_view) => self.broadcast(LiveEventKind::JobAccepted, job_audience, &job_view),
            Err(error) => tracing::debug!(%error, "skipping job-accepted update"),
        }
        Ok(view)
    }

    /// Decline a pending quote.
    ///
    /// An `accepted` quote is never declined (`InvalidState`): a priced job keeps
    /// exactly one accepted quote. Declining an already rejected quote returns
    /// it unchanged and sends no second notification.
    pub fn reject_quote(&self, actor: &Actor, id: &QuoteId) -> Result<QuoteView, MarketplaceError> {
        self.authenticate(actor)?;
        let quote = self.load_quote(id)?;
        if quote.homeowner != actor.id {
            return Err(MarketplaceError::Forbidden(
                "only the job's homeowner can reject quotes".to_string(),
            ));
        }

        match quote.status {
            QuoteStatus::Rejected => return self.quote_view(quote),
            QuoteStatus::Accepted => {
                return Err(MarketplaceError::InvalidState(format!(
                    "quote {id} was already accepted"
                )))
            }
            QuoteStatus::Pending => {}
        }

        let rejected = self
            .store
            .transition_quote(id, &[QuoteStatus::Pending], QuoteStatus::Rejected)
            .map_err(quote_error(id))?;
        tracing::info!(quote_id = %id, job_id = %rejected.job, actor = %actor.id, "quote rejected");

        let view = self.quote_view(rejected)?;
        self.notify(
            &view.professional.id,
            NotificationKind::QuoteRejected,
            format!("Your quote for \"{}\" was declined.", view.job.title),
            Some(&view.job.id),
            Some(id),
        );
        self.broadcast(
            LiveEventKind::QuoteRejected,
            Audience::Users(vec![view.professional.id.clone()]),
            &view,
        );
        Ok(view)
    }
}
