use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Deserialize;

use super::{created, SharedService};
use crate::marketplace::domain::JobId;
use crate::marketplace::live::LiveUpdatePublisher;
use crate::marketplace::repository::{JobEdits, MarketplaceStore};
use crate::marketplace::service::{Actor, MarketplaceError, NewJob};
use crate::marketplace::views::JobView;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompletionNotes {
    #[serde(default)]
    notes: Option<String>,
}

pub(crate) async fn list_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
) -> Result<Json<Vec<JobView>>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.list_jobs(&actor).map(Json)
}

pub(crate) async fn create_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Json(request): Json<NewJob>,
) -> Result<Response, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.create_job(&actor, request).map(created)
}

pub(crate) async fn get_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    _actor: Actor,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.get_job(&job_id).map(Json)
}

pub(crate) async fn update_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(job_id): Path<JobId>,
    Json(edits): Json<JobEdits>,
) -> Result<Json<JobView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.update_job(&actor, &job_id, edits).map(Json)
}

pub(crate) async fn accept_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.accept_job(&actor, &job_id).map(Json)
}

pub(crate) async fn start_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.start_job(&actor, &job_id).map(Json)
}

/// The body is optional; a bare `PUT` completes without notes.
pub(crate) async fn complete_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(job_id): Path<JobId>,
    body: Option<Json<CompletionNotes>>,
) -> Result<Json<JobView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    let notes = body.and_then(|Json(body)| body.notes);
    service.complete_job(&actor, &job_id, notes).map(Json)
}

pub(crate) async fn cancel_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobView>, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    service.cancel_job(&actor, &job_id).map(Json)
}
