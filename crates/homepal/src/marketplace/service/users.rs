use chrono::Utc;
use serde::Deserialize;

use super::{Actor, MarketplaceError, MarketplaceService};
use crate::marketplace::domain::{User, UserId, UserRole};
use crate::marketplace::live::LiveUpdatePublisher;
use crate::marketplace::repository::{MarketplaceStore, RepositoryError};
use crate::marketplace::service::payments::CardInput;
use crate::marketplace::views::UserProfile;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub saved_card: Option<CardInput>,
}

/// Self-service profile changes. Role is fixed at registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub specialties: Option<Vec<String>>,
    pub saved_card: Option<CardInput>,
}

fn normalize_email(raw: &str) -> Result<String, MarketplaceError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(MarketplaceError::Validation(format!(
            "'{raw}' is not a valid e-mail address"
        )));
    }
    Ok(email)
}

fn required(field: &str, value: &str) -> Result<String, MarketplaceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MarketplaceError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn check_specialties(role: UserRole, specialties: &[String]) -> Result<(), MarketplaceError> {
    if role != UserRole::Professional && !specialties.is_empty() {
        return Err(MarketplaceError::Validation(
            "only professionals can declare specialties".to_string(),
        ));
    }
    Ok(())
}

fn email_conflict(email: &str) -> impl FnOnce(RepositoryError) -> MarketplaceError + '_ {
    move |error| match error {
        RepositoryError::Conflict => {
            MarketplaceError::Conflict(format!("{email} is already registered"))
        }
        other => other.into(),
    }
}

impl<S, L> MarketplaceService<S, L>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    pub fn register(&self, registration: Registration) -> Result<UserProfile, MarketplaceError> {
        let name = required("name", &registration.name)?;
        let email = normalize_email(&registration.email)?;
        check_specialties(registration.role, &registration.specialties)?;
        let saved_card = registration
            .saved_card
            .map(CardInput::into_summary)
            .transpose()?;

        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            name,
            email: email.clone(),
            role: registration.role,
            phone: registration.phone,
            address: registration.address,
            specialties: registration.specialties,
            rating: 0.0,
            completed_jobs: 0,
            saved_card,
            created_at: now,
            updated_at: now,
        };

        let stored = self
            .store
            .insert_user(user)
            .map_err(email_conflict(&email))?;
        tracing::info!(user_id = %stored.id, role = %stored.role, "account registered");
        Ok(UserProfile::new(stored, true))
    }

    pub fn get_user(&self, actor: &Actor, id: &UserId) -> Result<UserProfile, MarketplaceError> {
        let user = self
            .store
            .fetch_user(id)?
            .ok_or_else(|| MarketplaceError::not_found("user", id))?;
        Ok(UserProfile::new(user, &actor.id == id))
    }

    /// Homeowners browse professionals and professionals browse homeowners.
    pub fn list_counterparts(&self, actor: &Actor) -> Result<Vec<UserProfile>, MarketplaceError> {
        let counterpart = match actor.role {
            UserRole::Homeowner => UserRole::Professional,
            UserRole::Professional => UserRole::Homeowner,
        };
        Ok(self
            .store
            .users_with_role(counterpart)?
            .into_iter()
            .map(|user| UserProfile::new(user, false))
            .collect())
    }

    pub fn update_profile(
        &self,
        actor: &Actor,
        id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, MarketplaceError> {
        if &actor.id != id {
            return Err(MarketplaceError::Forbidden(
                "profiles can only be edited by their owner".to_string(),
            ));
        }
        let mut user = self
            .store
            .fetch_user(id)?
            .ok_or_else(|| MarketplaceError::not_found("user", id))?;

        if let Some(name) = update.name {
            user.name = required("name", &name)?;
        }
        if let Some(email) = update.email {
            user.email = normalize_email(&email)?;
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(address) = update.address {
            user.address = Some(address);
        }
        if let Some(specialties) = update.specialties {
            check_specialties(user.role, &specialties)?;
            user.specialties = specialties;
        }
        if let Some(card) = update.saved_card {
            user.saved_card = Some(card.into_summary()?);
        }
        user.updated_at = Utc::now();

        let email = user.email.clone();
        let stored = self
            .store
            .update_user(user)
            .map_err(email_conflict(&email))?;
        tracing::info!(user_id = %stored.id, "profile updated");
        Ok(UserProfile::new(stored, true))
    }
}
