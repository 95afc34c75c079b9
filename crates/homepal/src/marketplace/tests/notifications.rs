use super::common::*;
use std::sync::Arc;

use crate::config::MarketplaceConfig;
use crate::marketplace::domain::{JobStatus, NotificationId, NotificationKind, QuoteStatus};
use crate::marketplace::live::{LiveEventKind, RecordingLiveUpdates};
use crate::marketplace::memory::InMemoryMarketplaceStore;
use crate::marketplace::service::{MarketplaceError, MarketplaceService};

#[test]
fn listing_is_newest_first_with_the_job_title() {
    let (service, _, _) = build_service();
    let (homeowner, professional, job, _) = accepted_job(&service);
    service
        .complete_job(&professional, &job.id, None)
        .expect("complete");

    let inbox = service
        .list_notifications(&homeowner)
        .expect("notifications");
    let kinds: Vec<NotificationKind> = inbox.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![NotificationKind::JobCompleted, NotificationKind::QuoteReceived]
    );
    let related = inbox[0].related_job.as_ref().expect("job reference");
    assert_eq!(related.id, job.id);
    assert_eq!(related.title, "Leaking kitchen tap");
    assert!(inbox.iter().all(|n| !n.read));
}

#[test]
fn listing_is_capped_by_the_page_size() {
    let store = Arc::new(InMemoryMarketplaceStore::new());
    let live = Arc::new(RecordingLiveUpdates::default());
    let service = MarketplaceService::new(
        store,
        live,
        MarketplaceConfig {
            notification_page_size: 2,
            ..MarketplaceConfig::default()
        },
    );
    let homeowner = register_homeowner(&service, "Ayse");
    let job = post_plumbing_job(&service, &homeowner);
    for name in ["Usta Mehmet", "Usta Kemal", "Usta Hasan"] {
        let professional = register_professional(&service, name, &[]);
        service
            .submit_quote(&professional, quote(&job.id, 1_000))
            .expect("quote");
    }

    assert_eq!(service.list_notifications(&homeowner).expect("page").len(), 2);
    assert_eq!(service.unread_notifications(&homeowner).expect("count"), 3);
}

#[test]
fn marking_read_is_per_user() {
    let (service, _, _) = build_service();
    let (homeowner, professional, job, _) = accepted_job(&service);
    service
        .complete_job(&professional, &job.id, None)
        .expect("complete");

    assert_eq!(service.unread_notifications(&homeowner).expect("count"), 2);
    let inbox = service.list_notifications(&homeowner).expect("inbox");

    let read = service
        .mark_notification_read(&homeowner, &inbox[1].id)
        .expect("mark one");
    assert!(read.read);
    assert_eq!(service.unread_notifications(&homeowner).expect("count"), 1);

    assert!(matches!(
        service.mark_notification_read(&professional, &inbox[0].id),
        Err(MarketplaceError::NotFound { .. })
    ));
    assert!(matches!(
        service.mark_notification_read(&homeowner, &NotificationId::from("missing")),
        Err(MarketplaceError::NotFound { .. })
    ));

    let professional_unread = service
        .unread_notifications(&professional)
        .expect("count");
    assert_eq!(
        service
            .mark_all_notifications_read(&homeowner)
            .expect("mark all"),
        1
    );
    assert_eq!(
        service
            .mark_all_notifications_read(&homeowner)
            .expect("mark all again"),
        0
    );
    assert_eq!(service.unread_notifications(&homeowner).expect("count"), 0);
    assert_eq!(
        service
            .unread_notifications(&professional)
            .expect("count"),
        professional_unread
    );
}

#[test]
fn state_changes_survive_a_failing_outbox() {
    let store = Arc::new(FailingOutbox::default());
    let live = Arc::new(RecordingLiveUpdates::default());
    let service = MarketplaceService::new(store, live.clone(), MarketplaceConfig::default());
    let homeowner = register_homeowner(&service, "Ayse");
    let professional = register_professional(&service, "Usta Mehmet", &[]);
    let job = post_plumbing_job(&service, &homeowner);

    let submitted = service
        .submit_quote(&professional, quote(&job.id, 1_200))
        .expect("quote stored without notification");
    let accepted = service
        .accept_quote(&homeowner, &submitted.id)
        .expect("quote accepted without notification");
    assert_eq!(accepted.status, QuoteStatus::Accepted);

    let completed = service
        .complete_job(&professional, &job.id, None)
        .expect("completion");
    assert_eq!(completed.status, JobStatus::Completed);

    assert!(service
        .list_notifications(&homeowner)
        .expect("empty inbox")
        .is_empty());
    let kinds = live.kinds();
    assert!(kinds.contains(&LiveEventKind::QuoteAccepted));
    assert!(kinds.contains(&LiveEventKind::JobCompleted));
}
