use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Actor, MarketplaceError, MarketplaceService};
use crate::marketplace::domain::{Reminder, ReminderCategory, ReminderId, UserRole};
use crate::marketplace::live::LiveUpdatePublisher;
use crate::marketplace::repository::MarketplaceStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderSuggestion {
    pub category: ReminderCategory,
    pub name: String,
    pub frequency_days: u32,
}

impl ReminderCategory {
    /// Recommended task and interval for the area.
    pub fn suggestion(self) -> ReminderSuggestion {
        let (name, frequency_days) = match self {
            ReminderCategory::Cati => ("Çatı bakımı", 365),
            ReminderCategory::Tesisat => ("Tesisat kaçak kontrolü", 180),
            ReminderCategory::Elektrik => ("Elektrik tesisatı kontrolü", 365),
            ReminderCategory::Bahce => ("Bahçe sulama sistemi bakımı", 90),
            ReminderCategory::Boya => ("Duvarda boya/derz kontrolü", 180),
            ReminderCategory::Klima => ("Klima filtre temizliği", 90),
        };
        ReminderSuggestion {
            category: self,
            name: name.to_string(),
            frequency_days,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReminder {
    pub name: String,
    pub category: ReminderCategory,
    pub frequency_days: u32,
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReminderUpdate {
    pub name: Option<String>,
    pub category: Option<ReminderCategory>,
    pub frequency_days: Option<u32>,
    pub next_due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

fn check_frequency(days: u32) -> Result<u32, MarketplaceError> {
    if days == 0 {
        return Err(MarketplaceError::Validation(
            "frequency_days must be at least 1".to_string(),
        ));
    }
    Ok(days)
}

impl<S, L> MarketplaceService<S, L>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    pub fn reminder_suggestion(
        &self,
        actor: &Actor,
        category: ReminderCategory,
    ) -> Result<ReminderSuggestion, MarketplaceError> {
        Self::require_role(actor, UserRole::Homeowner, "plan maintenance")?;
        Ok(category.suggestion())
    }

    /// Without an explicit due date the first reminder falls one interval from today.
    pub fn create_reminder(
        &self,
        actor: &Actor,
        request: NewReminder,
    ) -> Result<Reminder, MarketplaceError> {
        Self::require_role(actor, UserRole::Homeowner, "plan maintenance")?;
        self.authenticate(actor)?;
        let name = request.name.trim();
        if name.is_empty() {
            return Err(MarketplaceError::Validation("name is required".to_string()));
        }
        let frequency_days = check_frequency(request.frequency_days)?;

        let now = Utc::now();
        let next_due_date = match request.next_due_date {
            Some(date) => date,
            None => now
                .date_naive()
                .checked_add_days(Days::new(u64::from(frequency_days)))
                .ok_or_else(|| {
                    MarketplaceError::Validation("frequency_days is out of range".to_string())
                })?,
        };

        let reminder = Reminder {
            id: ReminderId::generate(),
            homeowner: actor.id.clone(),
            name: name.to_string(),
            category: request.category,
            frequency_days,
            next_due_date,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_reminder(reminder)?;
        tracing::info!(reminder_id = %stored.id, actor = %actor.id, due = %stored.next_due_date, "reminder scheduled");
        Ok(stored)
    }

    /// Earliest due first.
    pub fn list_reminders(&self, actor: &Actor) -> Result<Vec<Reminder>, MarketplaceError> {
        Self::require_role(actor, UserRole::Homeowner, "plan maintenance")?;
        Ok(self.store.reminders_for_homeowner(&actor.id)?)
    }

    fn owned_reminder(&self, actor: &Actor, id: &ReminderId) -> Result<Reminder, MarketplaceError> {
        Self::require_role(actor, UserRole::Homeowner, "plan maintenance")?;
        self.store
            .fetch_reminder(id)?
            .filter(|reminder| reminder.homeowner == actor.id)
            .ok_or_else(|| MarketplaceError::not_found("reminder", id))
    }

    pub fn update_reminder(
        &self,
        actor: &Actor,
        id: &ReminderId,
        update: ReminderUpdate,
    ) -> Result<Reminder, MarketplaceError> {
        let mut reminder = self.owned_reminder(actor, id)?;

        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(MarketplaceError::Validation("name is required".to_string()));
            }
            reminder.name = name.to_string();
        }
        if let Some(category) = update.category {
            reminder.category = category;
        }
        if let Some(days) = update.frequency_days {
            reminder.frequency_days = check_frequency(days)?;
        }
        if let Some(date) = update.next_due_date {
            reminder.next_due_date = date;
        }
        if let Some(notes) = update.notes {
            reminder.notes = Some(notes);
        }
        reminder.updated_at = Utc::now();

        Ok(self.store.update_reminder(reminder)?)
    }

    pub fn delete_reminder(&self, actor: &Actor, id: &ReminderId) -> Result<(), MarketplaceError> {
        self.owned_reminder(actor, id)?;
        self.store.delete_reminder(id)?;
        tracing::info!(reminder_id = %id, actor = %actor.id, "reminder deleted");
        Ok(())
    }
}
