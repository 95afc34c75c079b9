use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use super::SharedService;
use crate::marketplace::domain::NotificationId;
use crate::marketplace::live::LiveUpdatePublisher;
use crate::marketplace::repository::MarketplaceStore;
use crate::marketplace::service::{Actor, MarketplaceError};
use crate::marketplace::views::NotificationView;

pub(crate) async fn list_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
) -> Result<Json<Vec<NotificationView>>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.list_notifications(&actor).map(Json)
}

pub(crate) async fn unread_count_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
) -> Result<Json<Value>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    let count = service.unread_notifications(&actor)?;
    Ok(Json(json!({ "count": count })))
}

pub(crate) async fn mark_read_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(notification_id): Path<NotificationId>,
) -> Result<Json<NotificationView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service
        .mark_notification_read(&actor, &notification_id)
        .map(Json)
}

pub(crate) async fn mark_all_read_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
) -> Result<Json<Value>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    let updated = service.mark_all_notifications_read(&actor)?;
    Ok(Json(json!({ "updated": updated })))
}
