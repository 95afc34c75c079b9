use super::common::*;

use crate::marketplace::domain::{JobId, JobStatus, NotificationKind, QuoteId, QuoteStatus};
use crate::marketplace::live::LiveEventKind;
use crate::marketplace::service::{Actor, MarketplaceError};

#[test]
fn quotes_must_fall_inside_the_band() {
    let (service, _, _) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let low = register_professional(&service, "Usta Mehmet", &[]);
    let high = register_professional(&service, "Usta Kemal", &[]);
    let job = post_plumbing_job(&service, &homeowner);

    for price in [299, 5_001] {
        match service.submit_quote(&low, quote(&job.id, price)) {
            Err(MarketplaceError::OutOfRange(message)) => {
                assert!(message.contains("300-5000"), "{message}")
            }
            other => panic!("expected out of range for {price}, got {other:?}"),
        }
    }

    let floor = service
        .submit_quote(&low, quote(&job.id, 300))
        .expect("lower bound accepted");
    let ceiling = service
        .submit_quote(&high, quote(&job.id, 5_000))
        .expect("upper bound accepted");
    assert_eq!(floor.status, QuoteStatus::Pending);
    assert_eq!(ceiling.price, 5_000);
    assert_eq!(ceiling.job.id, job.id);
}

#[test]
fn submitting_notifies_the_homeowner() {
    let (service, store, live) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let professional = register_professional(&service, "Usta Mehmet", &[]);
    let job = post_plumbing_job(&service, &homeowner);

    let submitted = service
        .submit_quote(&professional, quote(&job.id, 750))
        .expect("quote submitted");

    let inbox = notifications_for(&store, &homeowner.id);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::QuoteReceived);
    assert_eq!(inbox[0].related_quote.as_ref(), Some(&submitted.id));
    assert!(inbox[0].message.contains("750"));
    assert!(live.kinds().contains(&LiveEventKind::NewQuote));
}

#[test]
fn one_active_quote_per_professional_and_job() {
    let (service, _, _) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let professional = register_professional(&service, "Usta Mehmet", &[]);
    let job = post_plumbing_job(&service, &homeowner);

    let first = service
        .submit_quote(&professional, quote(&job.id, 900))
        .expect("first quote");
    assert!(matches!(
        service.submit_quote(&professional, quote(&job.id, 800)),
        Err(MarketplaceError::Conflict(_))
    ));

    service
        .reject_quote(&homeowner, &first.id)
        .expect("homeowner declines");
    let second = service
        .submit_quote(&professional, quote(&job.id, 800))
        .expect("re-bid after rejection");
    assert_ne!(second.id, first.id);
}

#[test]
fn submission_guards() {
    let (service, _, _) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let professional = register_professional(&service, "Usta Mehmet", &[]);

    assert!(matches!(
        service.submit_quote(&homeowner, quote(&JobId::from("any"), 500)),
        Err(MarketplaceError::Forbidden(_))
    ));
    assert!(matches!(
        service.submit_quote(&professional, quote(&JobId::from("missing"), 500)),
        Err(MarketplaceError::NotFound { .. })
    ));

    let job = post_plumbing_job(&service, &homeowner);
    service
        .cancel_job(&homeowner, &job.id)
        .expect("job withdrawn");
    assert!(matches!(
        service.submit_quote(&professional, quote(&job.id, 500)),
        Err(MarketplaceError::InvalidState(_))
    ));
}

#[test]
fn accepting_settles_the_job_and_rejects_competitors() {
    let (service, store, live) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let winner = register_professional(&service, "Usta Mehmet", &[]);
    let runner_up = register_professional(&service, "Usta Kemal", &[]);
    let third = register_professional(&service, "Usta Hasan", &[]);
    let job = post_plumbing_job(&service, &homeowner);

    let winning = service
        .submit_quote(&winner, quote(&job.id, 1_200))
        .expect("winning bid");
    let losing = service
        .submit_quote(&runner_up, quote(&job.id, 1_500))
        .expect("losing bid");
    let withdrawn = service
        .submit_quote(&third, quote(&job.id, 2_000))
        .expect("third bid");
    service
        .reject_quote(&homeowner, &withdrawn.id)
        .expect("third bid declined");

    let accepted = service
        .accept_quote(&homeowner, &winning.id)
        .expect("quote accepted");
    assert_eq!(accepted.status, QuoteStatus::Accepted);

    let settled = service.get_job(&job.id).expect("job reloads");
    assert_eq!(settled.status, JobStatus::Accepted);
    assert_eq!(settled.price, Some(1_200));
    assert_eq!(
        settled.professional.map(|pro| pro.id),
        Some(winner.id.clone())
    );

    assert_eq!(quote_status(&store, &losing.id), QuoteStatus::Rejected);
    assert_eq!(quote_status(&store, &withdrawn.id), QuoteStatus::Rejected);

    let accepted_count = service
        .list_quotes(&homeowner, Some(&job.id))
        .expect("quotes listed")
        .iter()
        .filter(|quote| quote.status == QuoteStatus::Accepted)
        .count();
    assert_eq!(accepted_count, 1);

    let winner_inbox = notifications_for(&store, &winner.id);
    assert_eq!(winner_inbox.len(), 1);
    assert_eq!(winner_inbox[0].kind, NotificationKind::QuoteAccepted);
    assert!(notifications_for(&store, &runner_up.id).is_empty());

    let kinds = live.kinds();
    assert!(kinds.contains(&LiveEventKind::QuoteAccepted));
    assert!(kinds.contains(&LiveEventKind::JobAccepted));
}

#[test]
fn a_settled_job_refuses_further_acceptance() {
    let (service, _, _) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let first = register_professional(&service, "Usta Mehmet", &[]);
    let second = register_professional(&service, "Usta Kemal", &[]);
    let job = post_plumbing_job(&service, &homeowner);

    let a = service
        .submit_quote(&first, quote(&job.id, 1_000))
        .expect("first bid");
    let b = service
        .submit_quote(&second, quote(&job.id, 1_100))
        .expect("second bid");

    assert!(matches!(
        service.accept_quote(&first, &a.id),
        Err(MarketplaceError::Forbidden(_))
    ));

    service.accept_quote(&homeowner, &a.id).expect("accepted");
    assert!(matches!(
        service.accept_quote(&homeowner, &a.id),
        Err(MarketplaceError::InvalidState(_))
    ));
    assert!(matches!(
        service.accept_quote(&homeowner, &b.id),
        Err(MarketplaceError::InvalidState(_))
    ));
    assert!(matches!(
        service.accept_quote(&homeowner, &QuoteId::from("missing")),
        Err(MarketplaceError::NotFound { .. })
    ));
}

#[test]
fn direct_assignment_leaves_waiting_quotes_untouched() {
    let (service, store, _) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let bidder = register_professional(&service, "Usta Mehmet", &[]);
    let taker = register_professional(&service, "Usta Kemal", &[]);
    let job = post_plumbing_job(&service, &homeowner);

    let bid = service
        .submit_quote(&bidder, quote(&job.id, 1_000))
        .expect("bid placed");
    service.accept_job(&taker, &job.id).expect("direct accept");

    assert!(matches!(
        service.accept_quote(&homeowner, &bid.id),
        Err(MarketplaceError::InvalidState(_))
    ));
    assert_eq!(quote_status(&store, &bid.id), QuoteStatus::Pending);

    let job = service.get_job(&job.id).expect("job reloads");
    assert_eq!(job.price, None);
    assert_eq!(job.professional.map(|pro| pro.id), Some(taker.id));
}

#[test]
fn rejecting_is_idempotent_but_not_after_acceptance() {
    let (service, store, _) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let first = register_professional(&service, "Usta Mehmet", &[]);
    let second = register_professional(&service, "Usta Kemal", &[]);
    let job = post_plumbing_job(&service, &homeowner);

    let declined = service
        .submit_quote(&first, quote(&job.id, 1_000))
        .expect("first bid");
    let chosen = service
        .submit_quote(&second, quote(&job.id, 1_100))
        .expect("second bid");

    let rejected = service
        .reject_quote(&homeowner, &declined.id)
        .expect("declined");
    assert_eq!(rejected.status, QuoteStatus::Rejected);
    assert_eq!(notifications_for(&store, &first.id).len(), 1);

    let again = service
        .reject_quote(&homeowner, &declined.id)
        .expect("second decline is a no-op");
    assert_eq!(again.status, QuoteStatus::Rejected);
    assert_eq!(notifications_for(&store, &first.id).len(), 1);

    assert!(matches!(
        service.reject_quote(&second, &chosen.id),
        Err(MarketplaceError::Forbidden(_))
    ));

    service
        .accept_quote(&homeowner, &chosen.id)
        .expect("accepted");
    assert!(matches!(
        service.reject_quote(&homeowner, &chosen.id),
        Err(MarketplaceError::InvalidState(_))
    ));
}

#[test]
fn quotes_are_visible_to_their_parties_only() {
    let (service, _, _) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let neighbour = register_homeowner(&service, "Zeynep");
    let professional = register_professional(&service, "Usta Mehmet", &[]);
    let rival = register_professional(&service, "Usta Kemal", &[]);
    let job = post_plumbing_job(&service, &homeowner);

    let bid = service
        .submit_quote(&professional, quote(&job.id, 1_000))
        .expect("bid placed");

    let view = service.get_quote(&homeowner, &bid.id).expect("owner view");
    assert_eq!(view.professional.name, "Usta Mehmet");
    assert_eq!(view.homeowner.name, "Ayse");
    assert_eq!(view.job.title, "Leaking kitchen tap");
    assert!(service.get_quote(&professional, &bid.id).is_ok());
    assert!(matches!(
        service.get_quote(&rival, &bid.id),
        Err(MarketplaceError::Forbidden(_))
    ));

    assert_eq!(service.list_quotes(&professional, None).expect("own").len(), 1);
    assert!(service.list_quotes(&rival, None).expect("rival").is_empty());
    assert!(service.list_quotes(&neighbour, None).expect("neighbour").is_empty());
    assert!(service
        .list_quotes(&homeowner, Some(&JobId::from("other")))
        .expect("filtered")
        .is_empty());
}

#[test]
fn unregistered_callers_leave_quotes_untouched() {
    let (service, store, _) = build_service();
    let homeowner = register_homeowner(&service, "Ayse");
    let professional = register_professional(&service, "Usta Mehmet", &[]);
    let job = post_plumbing_job(&service, &homeowner);
    let bid = service
        .submit_quote(&professional, quote(&job.id, 1_000))
        .expect("bid placed");

    assert!(matches!(
        service.submit_quote(&Actor::professional("not-registered"), quote(&job.id, 1_500)),
        Err(MarketplaceError::NotFound { .. })
    ));
    assert!(matches!(
        service.accept_quote(&Actor::homeowner("not-registered"), &bid.id),
        Err(MarketplaceError::NotFound { .. })
    ));
    assert!(matches!(
        service.reject_quote(&Actor::homeowner(professional.id.as_str()), &bid.id),
        Err(MarketplaceError::Forbidden(_))
    ));

    assert_eq!(quote_status(&store, &bid.id), QuoteStatus::Pending);
    let listed = service
        .list_quotes(&homeowner, None)
        .expect("owner listing resolves");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, bid.id);
    assert_eq!(service.get_job(&job.id).expect("job").status, JobStatus::Pending);
}
