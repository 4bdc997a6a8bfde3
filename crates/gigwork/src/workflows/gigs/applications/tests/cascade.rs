use super::common::*;
use crate::workflows::gigs::applications::domain::{
    Actor, ApplicationStatus, ConfirmDecision,
};
use crate::workflows::gigs::applications::repository::NotificationKind;

fn worker() -> Actor {
    Actor::worker("worker-1")
}

fn employer() -> Actor {
    Actor::employer("employer-1")
}

/// Scenario: the worker holds pending confirmations for an overlapping and a
/// non-overlapping gig; accepting the first cancels only the overlap.
#[test]
fn confirming_sweeps_overlapping_pending_holds_only() {
    let (service, gigs, applications, _) = build_service();
    gigs.insert(gig(
        "g1",
        "employer-1",
        "Morning shift",
        monday(),
        time(9, 0),
        time(17, 0),
    ));
    gigs.insert(gig(
        "g2",
        "employer-2",
        "Afternoon shift",
        monday(),
        time(12, 0),
        time(20, 0),
    ));
    gigs.insert(gig(
        "g3",
        "employer-3",
        "Tuesday shift",
        tuesday(),
        time(9, 0),
        time(17, 0),
    ));

    let target = approved_application(&service, &worker(), &employer(), "g1");
    let overlapping =
        approved_application(&service, &worker(), &Actor::employer("employer-2"), "g2");
    let unrelated =
        approved_application(&service, &worker(), &Actor::employer("employer-3"), "g3");

    let receipt = service
        .confirm(&worker(), &target, ConfirmDecision::Accept)
        .expect("accept succeeds");

    assert_eq!(receipt.status, ApplicationStatus::WorkerConfirmed);
    assert_eq!(receipt.cascaded_cancellations, 1);
    assert_eq!(
        applications.status_of(&overlapping),
        Some(ApplicationStatus::SystemCancelled)
    );
    assert_eq!(
        applications.status_of(&unrelated),
        Some(ApplicationStatus::PendingWorkerConfirmation),
        "non-overlapping hold is untouched"
    );
}

#[test]
fn cascade_notifies_worker_and_each_swept_employer() {
    let (service, gigs, _, dispatcher) = build_service();
    gigs.insert(gig(
        "g1",
        "employer-1",
        "Morning shift",
        monday(),
        time(9, 0),
        time(17, 0),
    ));
    gigs.insert(gig(
        "g2",
        "employer-2",
        "Afternoon shift",
        monday(),
        time(12, 0),
        time(20, 0),
    ));

    let target = approved_application(&service, &worker(), &employer(), "g1");
    let swept = approved_application(&service, &worker(), &Actor::employer("employer-2"), "g2");

    service
        .confirm(&worker(), &target, ConfirmDecision::Accept)
        .expect("accept succeeds");

    let conflict_events: Vec<_> = dispatcher
        .events()
        .into_iter()
        .filter(|event| event.kind == NotificationKind::ScheduleConflict)
        .collect();
    assert_eq!(conflict_events.len(), 2, "worker and employer each notified");

    let to_worker = conflict_events
        .iter()
        .find(|event| event.receiver_id == "worker-1")
        .expect("worker notified");
    assert_eq!(to_worker.resource_id, swept);

    let to_employer = conflict_events
        .iter()
        .find(|event| event.receiver_id == "employer-2")
        .expect("swept employer notified");
    assert!(to_employer.message.contains("worker-1"));
    assert!(to_employer.message.contains("work time"));
}

/// Scenario: the worker already confirmed overlapping work, then tries to
/// accept another offer. The accepting application cancels itself and the
/// confirmed one is untouched.
#[test]
fn accept_against_confirmed_work_self_cancels() {
    let (service, gigs, applications, dispatcher) = build_service();
    gigs.insert(gig(
        "g1",
        "employer-1",
        "Morning shift",
        monday(),
        time(9, 0),
        time(17, 0),
    ));
    gigs.insert(gig(
        "g4",
        "employer-2",
        "Late shift",
        monday(),
        time(16, 0),
        time(18, 0),
    ));

    let confirmed = approved_application(&service, &worker(), &employer(), "g1");
    service
        .confirm(&worker(), &confirmed, ConfirmDecision::Accept)
        .expect("initial accept succeeds");

    let late = approved_application(&service, &worker(), &Actor::employer("employer-2"), "g4");
    let receipt = service
        .confirm(&worker(), &late, ConfirmDecision::Accept)
        .expect("self-cancellation is a success-path outcome");

    assert_eq!(receipt.status, ApplicationStatus::SystemCancelled);
    assert_eq!(receipt.conflicts.len(), 1);
    assert_eq!(receipt.conflicts[0].gig_id.0, "g1");
    assert_eq!(receipt.conflicts[0].title, "Morning shift");

    assert_eq!(
        applications.status_of(&late),
        Some(ApplicationStatus::SystemCancelled)
    );
    assert_eq!(
        applications.status_of(&confirmed),
        Some(ApplicationStatus::WorkerConfirmed),
        "the confirmed commitment is untouched"
    );

    let conflict_events: Vec<_> = dispatcher
        .events()
        .into_iter()
        .filter(|event| event.kind == NotificationKind::ScheduleConflict)
        .collect();
    assert_eq!(conflict_events.len(), 2, "both parties told why");
}

#[test]
fn cascade_counts_every_swept_hold() {
    let (service, gigs, _, _) = build_service();
    gigs.insert(gig(
        "g1",
        "employer-1",
        "All-day shift",
        monday(),
        time(8, 0),
        time(20, 0),
    ));
    for (id, employer_id, start, end) in [
        ("g2", "employer-2", (9, 0), (12, 0)),
        ("g3", "employer-3", (13, 0), (16, 0)),
        ("g4", "employer-4", (17, 0), (19, 0)),
    ] {
        gigs.insert(gig(
            id,
            employer_id,
            "Overlapping shift",
            monday(),
            time(start.0, start.1),
            time(end.0, end.1),
        ));
    }

    let target = approved_application(&service, &worker(), &employer(), "g1");
    for (id, employer_id) in [
        ("g2", "employer-2"),
        ("g3", "employer-3"),
        ("g4", "employer-4"),
    ] {
        approved_application(&service, &worker(), &Actor::employer(employer_id), id);
    }

    let receipt = service
        .confirm(&worker(), &target, ConfirmDecision::Accept)
        .expect("accept succeeds");
    assert_eq!(receipt.cascaded_cancellations, 3);
}

/// Declined, rejected, and cancelled rows are terminal history; the sweep
/// must never touch them.
#[test]
fn cascade_ignores_terminal_rows() {
    let (service, gigs, applications, _) = build_service();
    gigs.insert(gig(
        "g1",
        "employer-1",
        "Morning shift",
        monday(),
        time(9, 0),
        time(17, 0),
    ));
    gigs.insert(gig(
        "g2",
        "employer-2",
        "Overlapping declined",
        monday(),
        time(10, 0),
        time(12, 0),
    ));

    let declined = approved_application(&service, &worker(), &Actor::employer("employer-2"), "g2");
    service
        .confirm(&worker(), &declined, ConfirmDecision::Decline)
        .expect("decline succeeds");

    let target = approved_application(&service, &worker(), &employer(), "g1");
    let receipt = service
        .confirm(&worker(), &target, ConfirmDecision::Accept)
        .expect("accept succeeds");

    assert_eq!(receipt.cascaded_cancellations, 0);
    assert_eq!(
        applications.status_of(&declined),
        Some(ApplicationStatus::WorkerDeclined)
    );
}
