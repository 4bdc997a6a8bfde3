use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::workflows::gigs::applications::domain::{
    Actor, ApplicationId, ApplicationRow, ApplicationStatus, EmployerId, GigId, GigSnapshot,
    ReviewDecision, WorkerId,
};
use crate::workflows::gigs::applications::repository::{
    ApplicationRepository, GigDirectory, Notification, NotificationDispatcher, NotifyError,
    RepositoryError,
};
use crate::workflows::gigs::applications::service::GigApplicationService;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

/// Fixture gigs live far in the future so expiry checks against the real
/// clock never trip.
pub(super) fn gig(
    id: &str,
    employer: &str,
    title: &str,
    day: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> GigSnapshot {
    GigSnapshot {
        id: GigId(id.to_string()),
        employer_id: EmployerId(employer.to_string()),
        title: title.to_string(),
        date_start: day,
        date_end: day,
        time_start: start,
        time_end: end,
        is_active: true,
        published_at: Some(DateTime::<Utc>::from_timestamp(0, 0).expect("epoch")),
        unlisted_at: None,
    }
}

pub(super) fn monday() -> NaiveDate {
    date(2099, 6, 1)
}

pub(super) fn tuesday() -> NaiveDate {
    date(2099, 6, 2)
}

#[derive(Default, Clone)]
pub(super) struct MemoryGigs {
    gigs: Arc<Mutex<HashMap<GigId, GigSnapshot>>>,
}

impl MemoryGigs {
    pub(super) fn insert(&self, gig: GigSnapshot) {
        self.gigs
            .lock()
            .expect("gig mutex poisoned")
            .insert(gig.id.clone(), gig);
    }
}

impl GigDirectory for MemoryGigs {
    fn fetch(&self, id: &GigId) -> Result<Option<GigSnapshot>, RepositoryError> {
        let guard = self.gigs.lock().expect("gig mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    rows: Arc<Mutex<HashMap<ApplicationId, ApplicationRow>>>,
}

impl MemoryApplications {
    pub(super) fn status_of(&self, id: &ApplicationId) -> Option<ApplicationStatus> {
        let guard = self.rows.lock().expect("application mutex poisoned");
        guard.get(id).map(|row| row.status)
    }

    pub(super) fn all(&self) -> Vec<ApplicationRow> {
        let guard = self.rows.lock().expect("application mutex poisoned");
        guard.values().cloned().collect()
    }
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, row: ApplicationRow) -> Result<ApplicationRow, RepositoryError> {
        let mut guard = self.rows.lock().expect("application mutex poisoned");
        if guard.contains_key(&row.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRow>, RepositoryError> {
        let guard = self.rows.lock().expect("application mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.rows.lock().expect("application mutex poisoned");
        let row = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if row.status != expected {
            return Err(RepositoryError::Conflict);
        }
        row.status = next;
        row.updated_at = updated_at;
        Ok(())
    }

    fn find_for_gig(
        &self,
        worker_id: &WorkerId,
        gig_id: &GigId,
        statuses: &[ApplicationStatus],
    ) -> Result<Option<ApplicationRow>, RepositoryError> {
        let guard = self.rows.lock().expect("application mutex poisoned");
        Ok(guard
            .values()
            .find(|row| {
                row.worker_id == *worker_id
                    && row.gig_id == *gig_id
                    && statuses.contains(&row.status)
            })
            .cloned())
    }

    fn find_by_worker(
        &self,
        worker_id: &WorkerId,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<ApplicationRow>, RepositoryError> {
        let guard = self.rows.lock().expect("application mutex poisoned");
        Ok(guard
            .values()
            .filter(|row| row.worker_id == *worker_id && statuses.contains(&row.status))
            .cloned()
            .collect())
    }

    fn cancel_all(
        &self,
        ids: &[ApplicationId],
        updated_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.rows.lock().expect("application mutex poisoned");
        let mut cancelled = 0;
        for id in ids {
            let row = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
            if row.status != ApplicationStatus::PendingWorkerConfirmation {
                continue;
            }
            row.status = ApplicationStatus::SystemCancelled;
            row.updated_at = updated_at;
            cancelled += 1;
        }
        Ok(cancelled)
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingDispatcher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingDispatcher {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("dispatch mutex poisoned").clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("dispatch mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Dispatcher that always fails, for asserting transitions survive transport
/// outages.
pub(super) struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("push gateway offline".to_string()))
    }
}

pub(super) type TestService =
    GigApplicationService<MemoryGigs, MemoryApplications, RecordingDispatcher>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryGigs>,
    Arc<MemoryApplications>,
    Arc<RecordingDispatcher>,
) {
    let gigs = Arc::new(MemoryGigs::default());
    let applications = Arc::new(MemoryApplications::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = Arc::new(GigApplicationService::new(
        gigs.clone(),
        applications.clone(),
        dispatcher.clone(),
    ));
    (service, gigs, applications, dispatcher)
}

/// Walk an application through apply + employer approval so tests start from
/// `pending_worker_confirmation`.
pub(super) fn approved_application(
    service: &TestService,
    worker: &Actor,
    employer: &Actor,
    gig_id: &str,
) -> ApplicationId {
    let receipt = service
        .apply(worker, &GigId(gig_id.to_string()))
        .expect("apply succeeds");
    service
        .review(employer, &receipt.application_id, ReviewDecision::Approve)
        .expect("approval succeeds");
    receipt.application_id
}
