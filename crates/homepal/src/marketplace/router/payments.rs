use axum::{extract::State, response::Response, Json};

use super::{created, SharedService};
use crate::marketplace::live::LiveUpdatePublisher;
use crate::marketplace::repository::MarketplaceStore;
use crate::marketplace::service::{Actor, MarketplaceError, PaymentRequest};
use crate::marketplace::views::PaymentView;

pub(crate) async fn list_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
) -> Result<Json<Vec<PaymentView>>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.list_payments(&actor).map(Json)
}

pub(crate) async fn pay_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Json(request): Json<PaymentRequest>,
) -> Result<Response, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.pay(&actor, request).map(created)
}
