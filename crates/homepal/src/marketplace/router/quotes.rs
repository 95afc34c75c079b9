use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;

use super::{created, SharedService};
use crate::marketplace::domain::{JobId, QuoteId};
use crate::marketplace::live::LiveUpdatePublisher;
use crate::marketplace::repository::MarketplaceStore;
use crate::marketplace::service::{Actor, MarketplaceError, NewQuote};
use crate::marketplace::views::QuoteView;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuoteFilter {
    #[serde(default)]
    job_id: Option<JobId>,
}

pub(crate) async fn list_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Query(filter): Query<QuoteFilter>,
) -> Result<Json<Vec<QuoteView>>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service
        .list_quotes(&actor, filter.job_id.as_ref())
        .map(Json)
}

pub(crate) async fn submit_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Json(request): Json<NewQuote>,
) -> Result<Response, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.submit_quote(&actor, request).map(created)
}

pub(crate) async fn get_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(quote_id): Path<QuoteId>,
) -> Result<Json<QuoteView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.get_quote(&actor, &quote_id).map(Json)
}

pub(crate) async fn accept_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(quote_id): Path<QuoteId>,
) -> Result<Json<QuoteView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.accept_quote(&actor, &quote_id).map(Json)
}

pub(crate) async fn reject_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(quote_id): Path<QuoteId>,
) -> Result<Json<QuoteView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.reject_quote(&actor, &quote_id).map(Json)
}
