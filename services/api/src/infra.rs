use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use gigwork::workflows::gigs::applications::{
    ApplicationId, ApplicationRepository, ApplicationRow, ApplicationStatus, EmployerId,
    GigDirectory, GigId, GigSnapshot, Notification, NotificationDispatcher, NotifyError,
    RepositoryError, WorkerId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Gig lookup backed by a seeded map. The real deployment fronts the listing
/// service's read replica; the lifecycle core only ever reads.
#[derive(Default, Clone)]
pub(crate) struct InMemoryGigDirectory {
    gigs: Arc<Mutex<HashMap<GigId, GigSnapshot>>>,
}

impl InMemoryGigDirectory {
    pub(crate) fn insert(&self, gig: GigSnapshot) {
        let mut guard = self.gigs.lock().expect("gig mutex poisoned");
        guard.insert(gig.id.clone(), gig);
    }
}

impl GigDirectory for InMemoryGigDirectory {
    fn fetch(&self, id: &GigId) -> Result<Option<GigSnapshot>, RepositoryError> {
        let guard = self.gigs.lock().expect("gig mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    rows: Arc<Mutex<HashMap<ApplicationId, ApplicationRow>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, row: ApplicationRow) -> Result<ApplicationRow, RepositoryError> {
        let mut guard = self.rows.lock().expect("repository mutex poisoned");
        if guard.contains_key(&row.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRow>, RepositoryError> {
        let guard = self.rows.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.rows.lock().expect("repository mutex poisoned");
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
        let guard = self.rows.lock().expect("repository mutex poisoned");
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
        let guard = self.rows.lock().expect("repository mutex poisoned");
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
        let mut guard = self.rows.lock().expect("repository mutex poisoned");
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

/// Records notifications instead of delivering them; the demo prints the log
/// and tests assert on it. Production wires the push/e-mail gateway here.
#[derive(Default, Clone)]
pub(crate) struct RecordingDispatcher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingDispatcher {
    pub(crate) fn events(&self) -> Vec<Notification> {
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn seeded_gig(
    id: &str,
    employer: &str,
    title: &str,
    date_start: NaiveDate,
    date_end: NaiveDate,
    time_start: NaiveTime,
    time_end: NaiveTime,
) -> GigSnapshot {
    GigSnapshot {
        id: GigId(id.to_string()),
        employer_id: EmployerId(employer.to_string()),
        title: title.to_string(),
        date_start,
        date_end,
        time_start,
        time_end,
        is_active: true,
        published_at: Some(Utc::now()),
        unlisted_at: None,
    }
}
