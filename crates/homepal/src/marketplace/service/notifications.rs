use super::{Actor, MarketplaceError, MarketplaceService};
use crate::marketplace::domain::NotificationId;
use crate::marketplace::live::LiveUpdatePublisher;
use crate::marketplace::repository::MarketplaceStore;
use crate::marketplace::views::NotificationView;

impl<S, L> MarketplaceService<S, L>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    /// Most recent first, capped at the configured page size.
    pub fn list_notifications(
        &self,
        actor: &Actor,
    ) -> Result<Vec<NotificationView>, MarketplaceError> {
        let notifications = self
            .store
            .notifications_for_user(&actor.id, self.config.notification_page_size)?;

        notifications
            .into_iter()
            .map(|notification| -> Result<NotificationView, MarketplaceError> {
                let job = match &notification.related_job {
                    Some(id) => self.store.fetch_job(id)?,
                    None => None,
                };
                Ok(NotificationView::new(notification, job.as_ref()))
            })
            .collect()
    }

    pub fn mark_notification_read(
        &self,
        actor: &Actor,
        id: &NotificationId,
    ) -> Result<NotificationView, MarketplaceError> {
        let notification = self
            .store
            .fetch_notification(id)?
            .filter(|notification| notification.user == actor.id)
            .ok_or_else(|| MarketplaceError::not_found("notification", id))?;

        let updated = if notification.read {
            notification
        } else {
            self.store.mark_read(id)?
        };
        let job = match &updated.related_job {
            Some(job_id) => self.store.fetch_job(job_id)?,
            None => None,
        };
        Ok(NotificationView::new(updated, job.as_ref()))
    }

    /// Returns how many notifications were flipped to read.
    pub fn mark_all_notifications_read(&self, actor: &Actor) -> Result<usize, MarketplaceError> {
        let flipped = self.store.mark_all_read(&actor.id)?;
        tracing::debug!(user = %actor.id, flipped, "notifications marked read");
        Ok(flipped)
    }

    pub fn unread_notifications(&self, actor: &Actor) -> Result<usize, MarketplaceError> {
        Ok(self.store.unread_count(&actor.id)?)
    }
}
