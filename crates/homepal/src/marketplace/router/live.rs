use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use super::SharedService;
use crate::marketplace::domain::User;
use crate::marketplace::live::{Audience, LiveUpdate, LiveUpdatePublisher};
use crate::marketplace::repository::MarketplaceStore;
use crate::marketplace::service::{Actor, MarketplaceError, MarketplaceService};

/// Upgrade to a WebSocket that streams the caller's live updates.
pub(crate) async fn live_handler<S, L>(
    State(service): State<SharedService<S, L>>,
    actor: Actor,
    ws: WebSocketUpgrade,
) -> Result<Response, MarketplaceError>
where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    let (subscriber, updates) = service.subscribe(&actor)?;
    Ok(ws.on_upgrade(move |socket| forward_updates(socket, service, subscriber, updates)))
}

/// Specialty-scoped events are filtered against the stored profile, so a
/// specialty edit applies to an open socket without reconnecting.
pub(crate) fn refresh_subscriber<S, L>(
    service: &MarketplaceService<S, L>,
    subscriber: &mut User,
    update: &LiveUpdate,
) where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    if !matches!(update.audience, Audience::Professionals(_)) {
        return;
    }
    match service.profile_of(&subscriber.id) {
        Ok(profile) => *subscriber = profile,
        Err(error) => {
            tracing::debug!(user = %subscriber.id, %error, "keeping cached live profile")
        }
    }
}

/// Text frame for `subscriber`, or `None` when the event is addressed elsewhere.
pub(crate) fn frame_for(update: &LiveUpdate, subscriber: &User) -> Option<String> {
    update
        .audience
        .includes(subscriber)
        .then(|| update.frame().to_string())
}

async fn forward_updates<S, L>(
    socket: WebSocket,
    service: SharedService<S, L>,
    mut subscriber: User,
    mut updates: broadcast::Receiver<LiveUpdate>,
) where
    S: MarketplaceStore + 'static,
    L: LiveUpdatePublisher + 'static,
{
    let user_id = subscriber.id.clone();
    tracing::info!(user = %user_id, "live subscriber connected");

    let (mut sink, mut stream) = socket.split();

    let sender_user = user_id.clone();
    let send_task = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    refresh_subscriber(&service, &mut subscriber, &update);
                    let Some(frame) = frame_for(&update, &subscriber) else {
                        continue;
                    };
                    if sink.send(Message::Text(frame)).await.is_err() {
                        tracing::debug!(user = %sender_user, "live sink closed");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(user = %sender_user, skipped, "live subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Inbound frames are ignored; only close and errors matter.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(user = %user_id, %error, "live receive error");
                break;
            }
        }
    }

    send_task.abort();
    tracing::info!(user = %user_id, "live subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketplaceConfig;
    use crate::marketplace::domain::{JobCategory, UserId, UserRole};
    use crate::marketplace::live::{LiveEventKind, NoopLiveUpdates};
    use crate::marketplace::memory::InMemoryMarketplaceStore;
    use crate::marketplace::service::{ProfileUpdate, Registration};
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    fn plumber() -> User {
        let now = Utc::now();
        User {
            id: UserId::from("pro-1"),
            name: "Usta Ali".to_string(),
            email: "ali@example.com".to_string(),
            role: UserRole::Professional,
            phone: None,
            address: None,
            specialties: vec!["tesisat".to_string()],
            rating: 4.5,
            completed_jobs: 12,
            saved_card: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn frames_only_reach_the_audience() {
        let subscriber = plumber();
        let matching = LiveUpdate::new(
            LiveEventKind::NewJob,
            Audience::Professionals(JobCategory::Plumbing),
            json!({ "id": "job-1" }),
        );
        let frame = frame_for(&matching, &subscriber).expect("plumber sees plumbing jobs");
        let parsed: serde_json::Value = serde_json::from_str(&frame).expect("json frame");
        assert_eq!(parsed["event"], json!("new-job"));
        assert_eq!(parsed["payload"]["id"], json!("job-1"));

        let other = LiveUpdate::new(
            LiveEventKind::NewJob,
            Audience::Professionals(JobCategory::Paint),
            json!({ "id": "job-2" }),
        );
        assert!(frame_for(&other, &subscriber).is_none());
    }

    #[test]
    fn specialty_edits_reach_open_subscriptions() {
        let service = MarketplaceService::new(
            Arc::new(InMemoryMarketplaceStore::new()),
            Arc::new(NoopLiveUpdates),
            MarketplaceConfig::default(),
        );
        let registered = service
            .register(Registration {
                name: "Usta Ali".to_string(),
                email: "ali@example.com".to_string(),
                role: UserRole::Professional,
                phone: None,
                address: None,
                specialties: vec!["tesisat".to_string()],
                saved_card: None,
            })
            .expect("registers");
        let actor = Actor::professional(registered.id.as_str());
        let mut subscriber = service.profile_of(&actor.id).expect("stored profile");

        service
            .update_profile(
                &actor,
                &actor.id,
                ProfileUpdate {
                    specialties: Some(vec!["boya".to_string()]),
                    ..ProfileUpdate::default()
                },
            )
            .expect("specialties changed");

        let paint_job = LiveUpdate::new(
            LiveEventKind::NewJob,
            Audience::Professionals(JobCategory::Paint),
            json!({ "id": "job-3" }),
        );
        assert!(frame_for(&paint_job, &subscriber).is_none());

        refresh_subscriber(&service, &mut subscriber, &paint_job);
        assert_eq!(subscriber.specialties, vec!["boya".to_string()]);
        assert!(frame_for(&paint_job, &subscriber).is_some());

        let plumbing_job = LiveUpdate::new(
            LiveEventKind::NewJob,
            Audience::Professionals(JobCategory::Plumbing),
            json!({ "id": "job-4" }),
        );
        refresh_subscriber(&service, &mut subscriber, &plumbing_job);
        assert!(frame_for(&plumbing_job, &subscriber).is_none());
    }
}
