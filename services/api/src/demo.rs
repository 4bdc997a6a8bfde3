use crate::infra::{
    parse_date, seeded_gig, InMemoryApplicationRepository, InMemoryGigDirectory,
    RecordingDispatcher,
};
use chrono::{Duration, Local, NaiveDate, NaiveTime};
use clap::Args;
use gigwork::error::AppError;
use gigwork::workflows::gigs::applications::{
    Actor, ConfirmDecision, GigApplicationService, GigId, ReviewDecision,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// First workday of the seeded gigs (YYYY-MM-DD). Defaults to a week out.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Print every notification the walk-through produced.
    #[arg(long)]
    pub(crate) show_notifications: bool,
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid demo time")
}

/// Seed three overlapping gigs and walk a worker through the whole
/// lifecycle: clean confirmation, cascade sweep, and a blocked accept.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let start = args
        .start_date
        .unwrap_or_else(|| Local::now().date_naive() + Duration::days(7));
    let next_day = start + Duration::days(1);

    let gigs = Arc::new(InMemoryGigDirectory::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = GigApplicationService::new(gigs.clone(), applications, dispatcher.clone());

    gigs.insert(seeded_gig(
        "gig-day",
        "employer-cafe",
        "Counter service, day shift",
        start,
        start,
        hm(9, 0),
        hm(17, 0),
    ));
    gigs.insert(seeded_gig(
        "gig-late",
        "employer-bar",
        "Bar support, late shift",
        start,
        start,
        hm(12, 0),
        hm(20, 0),
    ));
    gigs.insert(seeded_gig(
        "gig-next",
        "employer-depot",
        "Parcel sorting",
        next_day,
        next_day,
        hm(9, 0),
        hm(17, 0),
    ));

    let worker = Actor::worker("worker-demo");
    println!("Gig application lifecycle demo (workday {start})");

    println!("\n1. Worker applies to all three gigs");
    let day = service.apply(&worker, &GigId("gig-day".to_string()))?;
    let late = service.apply(&worker, &GigId("gig-late".to_string()))?;
    let next = service.apply(&worker, &GigId("gig-next".to_string()))?;
    for receipt in [&day, &late, &next] {
        println!(
            "   {} -> {}",
            receipt.application_id.0,
            receipt.status.label()
        );
    }

    println!("\n2. Each employer approves");
    service.review(
        &Actor::employer("employer-cafe"),
        &day.application_id,
        ReviewDecision::Approve,
    )?;
    service.review(
        &Actor::employer("employer-bar"),
        &late.application_id,
        ReviewDecision::Approve,
    )?;
    service.review(
        &Actor::employer("employer-depot"),
        &next.application_id,
        ReviewDecision::Approve,
    )?;
    println!("   all three applications now pending worker confirmation");

    println!("\n3. Worker accepts the day shift");
    let confirmed = service.confirm(&worker, &day.application_id, ConfirmDecision::Accept)?;
    println!(
        "   {} -> {} ({} overlapping hold(s) swept)",
        confirmed.application_id.0,
        confirmed.status.label(),
        confirmed.cascaded_cancellations,
    );

    println!("\n4. Remaining statuses");
    for (label, receipt) in [("late shift", &late), ("next day", &next)] {
        let view = service.status(&worker, &receipt.application_id)?;
        println!("   {label}: {}", view.status);
    }

    if args.show_notifications {
        println!("\nNotification log");
        for event in dispatcher.events() {
            println!(
                "   [{:?}] to {} ({:?}): {} - {}",
                event.kind, event.receiver_id, event.role, event.title, event.message
            );
        }
    }

    Ok(())
}
