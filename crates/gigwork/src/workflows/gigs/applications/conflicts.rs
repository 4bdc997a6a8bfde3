use super::domain::{ApplicationId, ApplicationStatus, EmployerId, GigId, WorkerId};
use super::repository::{ApplicationRepository, GigDirectory};
use super::schedule::ConflictingGig;
use super::LifecycleError;

/// Stateless scan over a worker's commitments for schedule collisions with a
/// candidate gig.
///
/// The two call sites deliberately pass different status sets: the accept
/// path checks against `worker_confirmed` only (hard commitments block a new
/// confirmation), while the cascade sweep checks `pending_worker_confirmation`
/// only (a worker may hold several overlapping non-binding offers, but
/// confirming one makes the rest moot).
pub struct ConflictChecker<'a, G, R> {
    gigs: &'a G,
    applications: &'a R,
}

impl<'a, G, R> ConflictChecker<'a, G, R>
where
    G: GigDirectory,
    R: ApplicationRepository,
{
    pub fn new(gigs: &'a G, applications: &'a R) -> Self {
        Self { gigs, applications }
    }

    /// Return the worker's commitments in `against` statuses whose schedule
    /// window overlaps the candidate gig's. The candidate gig itself is
    /// always excluded, as are gigs that are no longer active.
    pub fn find_conflicts(
        &self,
        worker_id: &WorkerId,
        gig_id: &GigId,
        against: &[ApplicationStatus],
    ) -> Result<Vec<ConflictingGig>, LifecycleError> {
        let candidate = self
            .gigs
            .fetch(gig_id)?
            .ok_or_else(|| LifecycleError::NotFound("gig does not exist".to_string()))?;
        let window = candidate.window();

        let mut conflicts = Vec::new();
        for row in self.applications.find_by_worker(worker_id, against)? {
            if row.gig_id == *gig_id {
                continue;
            }

            let other = match self.gigs.fetch(&row.gig_id)? {
                Some(gig) if gig.is_active => gig,
                _ => continue,
            };

            if window.overlaps(&other.window()) {
                conflicts.push(ConflictingGig::from_gig(&other));
            }
        }

        Ok(conflicts)
    }

    /// Variant of [`Self::find_conflicts`] that also reports the application ids of
    /// the conflicting rows, used by the cascade sweep to bulk-cancel them.
    pub fn find_conflicting_holds(
        &self,
        worker_id: &WorkerId,
        gig_id: &GigId,
    ) -> Result<Vec<ConflictingHold>, LifecycleError> {
        let candidate = self
            .gigs
            .fetch(gig_id)?
            .ok_or_else(|| LifecycleError::NotFound("gig does not exist".to_string()))?;
        let window = candidate.window();

        let statuses = [ApplicationStatus::PendingWorkerConfirmation];
        let mut holds = Vec::new();
        for row in self.applications.find_by_worker(worker_id, &statuses)? {
            if row.gig_id == *gig_id {
                continue;
            }

            let other = match self.gigs.fetch(&row.gig_id)? {
                Some(gig) if gig.is_active => gig,
                _ => continue,
            };

            if window.overlaps(&other.window()) {
                holds.push(ConflictingHold {
                    application_id: row.id,
                    employer_id: other.employer_id.clone(),
                    gig: ConflictingGig::from_gig(&other),
                });
            }
        }

        Ok(holds)
    }
}

/// A pending hold that collides with a newly confirmed commitment.
#[derive(Debug, Clone)]
pub struct ConflictingHold {
    pub application_id: ApplicationId,
    pub employer_id: EmployerId,
    pub gig: ConflictingGig,
}
