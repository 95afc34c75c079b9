use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde_json::{json, Value};

use super::{created, SharedService};
use crate::marketplace::domain::{Reminder, ReminderCategory, ReminderId};
use crate::marketplace::live::LiveUpdatePublisher;
use crate::marketplace::repository::MarketplaceStore;
use crate::marketplace::service::{
    Actor, MarketplaceError, NewReminder, ReminderSuggestion, ReminderUpdate,
};

pub(crate) async fn suggestion_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(category): Path<ReminderCategory>,
) -> Result<Json<ReminderSuggestion>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.reminder_suggestion(&actor, category).map(Json)
}

pub(crate) async fn list_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
) -> Result<Json<Vec<Reminder>>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.list_reminders(&actor).map(Json)
}

pub(crate) async fn create_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Json(request): Json<NewReminder>,
) -> Result<Response, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.create_reminder(&actor, request).map(created)
}

pub(crate) async fn update_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(reminder_id): Path<ReminderId>,
    Json(update): Json<ReminderUpdate>,
) -> Result<Json<Reminder>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service
        .update_reminder(&actor, &reminder_id, update)
        .map(Json)
}

pub(crate) async fn delete_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(reminder_id): Path<ReminderId>,
) -> Result<Json<Value>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.delete_reminder(&actor, &reminder_id)?;
    Ok(Json(json!({ "id": reminder_id, "deleted": true })))
}
