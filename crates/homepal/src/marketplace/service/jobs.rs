use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::{job_error, job_parties, Actor, MarketplaceError, MarketplaceService};
use crate::marketplace::domain::{
    Job, JobCategory, JobId, JobPriority, JobStatus, NotificationKind, PriceBand, UserRole,
};
use crate::marketplace::live::{Audience, LiveEventKind, LiveUpdatePublisher};
use crate::marketplace::pricing::{resolve_band, SpecialtyFilter};
use crate::marketplace::repository::{JobChange, JobEdits, MarketplaceStore};
use crate::marketplace::views::JobView;

const OPEN_STATUSES: [JobStatus; 3] = [
    JobStatus::Pending,
    JobStatus::Accepted,
    JobStatus::InProgress,
];

#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    #[serde(default)]
    pub priority: JobPriority,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Explicit estimate; both bounds or neither.
    #[serde(default)]
    pub min_price: Option<u32>,
    #[serde(default)]
    pub max_price: Option<u32>,
}

impl NewJob {
    pub fn new(title: &str, description: &str, category: JobCategory) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            category,
            priority: JobPriority::default(),
            location: None,
            scheduled_date: None,
            notes: None,
            photo_url: None,
            min_price: None,
            max_price: None,
        }
    }
}

impl<S, L> MarketplaceService<S, L>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    /// Post a job in `pending` with a band from the estimate or the category default.
    pub fn create_job(&self, actor: &Actor, request: NewJob) -> Result<JobView, MarketplaceError> {
        Self::require_role(actor, UserRole::Homeowner, "post a job")?;
        self.authenticate(actor)?;

        let title = request.title.trim();
        let description = request.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(MarketplaceError::Validation(
                "title and description are required".to_string(),
            ));
        }

        let estimate = match (request.min_price, request.max_price) {
            (Some(min_price), Some(max_price)) => Some(PriceBand::new(min_price, max_price)),
            (None, None) => self.estimate_from_photo(request.category, request.photo_url.as_deref()),
            _ => {
                return Err(MarketplaceError::Validation(
                    "min_price and max_price must be supplied together".to_string(),
                ))
            }
        };
        let price_band = resolve_band(request.category, estimate)?;

        let now = Utc::now();
        let job = Job {
            id: JobId::generate(),
            title: title.to_string(),
            description: description.to_string(),
            category: request.category,
            priority: request.priority,
            status: JobStatus::Pending,
            location: request.location,
            homeowner: actor.id.clone(),
            professional: None,
            price_band,
            price: None,
            scheduled_date: request.scheduled_date,
            completed_date: None,
            notes: request.notes,
            photo_url: request.photo_url,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_job(job)?;
        tracing::info!(
            job_id = %stored.id,
            actor = %actor.id,
            category = %stored.category,
            min_price = stored.price_band.min_price,
            max_price = stored.price_band.max_price,
            "job posted"
        );

        let category = stored.category;
        let view = self.job_view(stored)?;
        self.broadcast(
            LiveEventKind::NewJob,
            Audience::Professionals(category),
            &view,
        );
        Ok(view)
    }

    fn estimate_from_photo(&self, category: JobCategory, photo_url: Option<&str>) -> Option<PriceBand> {
        let estimator = self.estimator.as_ref()?;
        let band = estimator.estimate(category, photo_url?)?;
        tracing::debug!(%category, min = band.min_price, max = band.max_price, "photo estimate");
        Some(band)
    }

    /// Homeowners see their own jobs. Professionals see their assignments plus
    /// unassigned pending jobs matching their specialties.
    pub fn list_jobs(&self, actor: &Actor) -> Result<Vec<JobView>, MarketplaceError> {
        let jobs = match actor.role {
            UserRole::Homeowner => self.store.jobs_for_homeowner(&actor.id)?,
            UserRole::Professional => {
                let profile = self.authenticate(actor)?;
                let filter = SpecialtyFilter::from_specialties(&profile.specialties);
                self.store
                    .jobs_for_professional(&actor.id, &|job: &Job| filter.allows(job.category))?
            }
        };

        jobs.into_iter().map(|job| self.job_view(job)).collect()
    }

    pub fn get_job(&self, id: &JobId) -> Result<JobView, MarketplaceError> {
        let job = self.load_job(id)?;
        self.job_view(job)
    }

    /// The owner may edit any descriptive field; the assigned professional only
    /// scheduling fields. Finished jobs are frozen.
    pub fn update_job(
        &self,
        actor: &Actor,
        id: &JobId,
        edits: JobEdits,
    ) -> Result<JobView, MarketplaceError> {
        self.authenticate(actor)?;
        let job = self.load_job(id)?;
        if job.status.is_terminal() {
            return Err(MarketplaceError::InvalidState(format!(
                "job {id} is {} and can no longer be edited",
                job.status
            )));
        }

        if job.homeowner != actor.id {
            if job.professional.as_ref() != Some(&actor.id) {
                return Err(MarketplaceError::Forbidden(
                    "only the job's parties can edit it".to_string(),
                ));
            }
            let scheduling_only = edits.title.is_none()
                && edits.description.is_none()
                && edits.priority.is_none()
                && edits.location.is_none();
            if !scheduling_only {
                return Err(MarketplaceError::Forbidden(
                    "the assigned professional may only change scheduled_date and notes"
                        .to_string(),
                ));
            }
        }

        if edits.is_empty() {
            return Err(MarketplaceError::Validation(
                "no editable fields supplied".to_string(),
            ));
        }

        let updated = self
            .store
            .transition_job(
                id,
                &OPEN_STATUSES,
                JobChange {
                    edits,
                    ..JobChange::default()
                },
            )
            .map_err(job_error(id))?;
        tracing::info!(job_id = %id, actor = %actor.id, "job updated");

        let audience = job_parties(&updated);
        let view = self.job_view(updated)?;
        self.broadcast(LiveEventKind::JobUpdated, audience, &view);
        Ok(view)
    }

    /// Direct assignment without a quote. Never sets a price.
    pub fn accept_job(&self, actor: &Actor, id: &JobId) -> Result<JobView, MarketplaceError> {
        Self::require_role(actor, UserRole::Professional, "accept a job")?;
        let professional = self.authenticate(actor)?;

        let accepted = self
            .store
            .transition_job(
                id,
                &[JobStatus::Pending],
                JobChange {
                    status: Some(JobStatus::Accepted),
                    professional: Some(actor.id.clone()),
                    ..JobChange::default()
                },
            )
            .map_err(job_error(id))?;
        tracing::info!(job_id = %id, actor = %actor.id, status = %accepted.status, "job accepted directly");

        self.notify(
            &accepted.homeowner,
            NotificationKind::JobAssigned,
            format!("{} accepted your job \"{}\".", professional.name, accepted.title),
            Some(&accepted.id),
            None,
        );

        let audience = job_parties(&accepted);
        let view = self.job_view(accepted)?;
        self.broadcast(LiveEventKind::JobAccepted, audience, &view);
        Ok(view)
    }

    /// Assigned professional starts work: `accepted -> in-progress`.
    pub fn start_job(&self, actor: &Actor, id: &JobId) -> Result<JobView, MarketplaceError> {
        self.authenticate(actor)?;
        let job = self.load_job(id)?;
        if job.professional.as_ref() != Some(&actor.id) {
            return Err(MarketplaceError::Forbidden(
                "only the assigned professional can start this job".to_string(),
            ));
        }

        let started = self
            .store
            .transition_job(
                id,
                &[JobStatus::Accepted],
                JobChange {
                    status: Some(JobStatus::InProgress),
                    ..JobChange::default()
                },
            )
            .map_err(job_error(id))?;
        tracing::info!(job_id = %id, actor = %actor.id, status = %started.status, "job started");

        let audience = job_parties(&started);
        let view = self.job_view(started)?;
        self.broadcast(LiveEventKind::JobUpdated, audience, &view);
        Ok(view)
    }

    /// Finish an assigned job and ask the homeowner to pay.
    pub fn complete_job(
        &self,
        actor: &Actor,
        id: &JobId,
        notes: Option<String>,
    ) -> Result<JobView, MarketplaceError> {
        self.authenticate(actor)?;
        let job = self.load_job(id)?;
        if !job.involves(&actor.id) {
            return Err(MarketplaceError::Forbidden(
                "only the job's parties can complete it".to_string(),
            ));
        }

        let completed = self
            .store
            .transition_job(
                id,
                &[JobStatus::Accepted, JobStatus::InProgress],
                JobChange {
                    status: Some(JobStatus::Completed),
                    completed_date: Some(Utc::now()),
                    edits: JobEdits {
                        notes,
                        ..JobEdits::default()
                    },
                    ..JobChange::default()
                },
            )
            .map_err(job_error(id))?;
        tracing::info!(job_id = %id, actor = %actor.id, price = ?completed.price, "job completed");

        let request = match completed.price {
            Some(price) => format!("Please pay {price} TL."),
            None => "Please arrange payment.".to_string(),
        };
        self.notify(
            &completed.homeowner,
            NotificationKind::JobCompleted,
            format!("Your job \"{}\" is complete. {request}", completed.title),
            Some(&completed.id),
            None,
        );
        if let Some(professional) = &completed.professional {
            self.notify(
                professional,
                NotificationKind::JobCompleted,
                format!("You completed \"{}\". Awaiting payment.", completed.title),
                Some(&completed.id),
                None,
            );
        }

        let audience = job_parties(&completed);
        let view = self.job_view(completed)?;
        self.broadcast(LiveEventKind::JobCompleted, audience, &view);
        Ok(view)
    }

    /// Owner withdraws an unfinished job; its pending quotes are rejected with it.
    pub fn cancel_job(&self, actor: &Actor, id: &JobId) -> Result<JobView, MarketplaceError> {
        self.authenticate(actor)?;
        let job = self.load_job(id)?;
        if job.homeowner != actor.id {
            return Err(MarketplaceError::Forbidden(
                "only the job's homeowner can cancel it".to_string(),
            ));
        }

        let cancelled = self
            .store
            .cancel_job(id, &[JobStatus::Pending, JobStatus::Accepted])
            .map_err(job_error(id))?;
        tracing::info!(job_id = %id, actor = %actor.id, "job cancelled");

        let audience = job_parties(&cancelled);
        let view = self.job_view(cancelled)?;
        self.broadcast(LiveEventKind::JobCancelled, audience, &view);
        Ok(view)
    }
}
