use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};

use super::{created, SharedService};
use crate::marketplace::domain::UserId;
use crate::marketplace::live::LiveUpdatePublisher;
use crate::marketplace::repository::MarketplaceStore;
use crate::marketplace::service::{Actor, MarketplaceError, ProfileUpdate, Registration};
use crate::marketplace::views::UserProfile;

/// Open endpoint: no identity headers are needed to create an account.
pub(crate) async fn register_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    Json(registration): Json<Registration>,
) -> Result<Response, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.register(registration).map(created)
}

pub(crate) async fn list_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
) -> Result<Json<Vec<UserProfile>>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.list_counterparts(&actor).map(Json)
}

pub(crate) async fn get_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserProfile>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.get_user(&actor, &user_id).map(Json)
}

pub(crate) async fn update_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(user_id): Path<UserId>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.update_profile(&actor, &user_id, update).map(Json)
}
