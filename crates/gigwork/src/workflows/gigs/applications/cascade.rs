use chrono::Utc;
use tracing::warn;

use super::conflicts::ConflictChecker;
use super::domain::{ActorRole, GigId, WorkerId};
use super::repository::{
    ApplicationRepository, GigDirectory, Notification, NotificationDispatcher, NotificationKind,
};
use super::LifecycleError;

/// Sweeps a worker's other pending-confirmation holds once a conflicting
/// commitment is confirmed.
///
/// Only `pending_worker_confirmation` rows are swept; terminal rows are
/// immutable and confirmed rows were already validated against. Cancelling a
/// hold never cascades further.
pub struct CascadeCanceller<'a, G, R, N> {
    gigs: &'a G,
    applications: &'a R,
    notifier: &'a N,
}

impl<'a, G, R, N> CascadeCanceller<'a, G, R, N>
where
    G: GigDirectory,
    R: ApplicationRepository,
    N: NotificationDispatcher,
{
    pub fn new(gigs: &'a G, applications: &'a R, notifier: &'a N) -> Self {
        Self {
            gigs,
            applications,
            notifier,
        }
    }

    /// Cancel every other pending hold of `worker_id` whose gig overlaps
    /// `confirmed_gig_id`, notifying the worker and each hold's employer.
    /// Returns the number of cascaded cancellations.
    pub fn cascade_on_confirm(
        &self,
        worker_id: &WorkerId,
        confirmed_gig_id: &GigId,
    ) -> Result<usize, LifecycleError> {
        let checker = ConflictChecker::new(self.gigs, self.applications);
        let holds = checker.find_conflicting_holds(worker_id, confirmed_gig_id)?;
        if holds.is_empty() {
            return Ok(0);
        }

        let ids: Vec<_> = holds.iter().map(|hold| hold.application_id.clone()).collect();
        let cancelled = self.applications.cancel_all(&ids, Utc::now())?;

        for hold in &holds {
            self.dispatch(Notification {
                receiver_id: worker_id.0.clone(),
                role: ActorRole::Worker,
                title: "Application cancelled".to_string(),
                message: format!(
                    "Your application for '{}' was cancelled because it conflicts with work you just confirmed ({} {}).",
                    hold.gig.title,
                    hold.gig.date_range(),
                    hold.gig.time_range(),
                ),
                kind: NotificationKind::ScheduleConflict,
                resource_id: hold.application_id.clone(),
            });

            self.dispatch(Notification {
                receiver_id: hold.employer_id.0.clone(),
                role: ActorRole::Employer,
                title: "Applicant withdrawn".to_string(),
                message: format!(
                    "Worker {} can no longer confirm '{}' due to a conflict with their other work time.",
                    worker_id.0, hold.gig.title,
                ),
                kind: NotificationKind::ScheduleConflict,
                resource_id: hold.application_id.clone(),
            });
        }

        Ok(cancelled)
    }

    fn dispatch(&self, notification: Notification) {
        if let Err(err) = self.notifier.notify(notification) {
            warn!(error = %err, "notification dispatch failed");
        }
    }
}
