use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::cascade::CascadeCanceller;
use super::conflicts::ConflictChecker;
use super::domain::{
    Actor, ActorRole, ApplicationId, ApplicationRow, ApplicationStatus, ConfirmDecision, GigId,
    GigSnapshot, ReviewDecision, WorkerId,
};
use super::repository::{
    ApplicationRepository, GigDirectory, Notification, NotificationDispatcher, NotificationKind,
    RepositoryError,
};
use super::schedule::ConflictingGig;

/// Terminal, caller-visible outcomes of a lifecycle action. None of these are
/// retried internally; a detected schedule conflict is a business outcome,
/// not a transient failure.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("{0}")]
    NotFound(String),
    #[error("action not permitted while application is {found}")]
    InvalidState { found: &'static str },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
            LifecycleError::InvalidState { .. } | LifecycleError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            LifecycleError::Forbidden(_) => StatusCode::FORBIDDEN,
            LifecycleError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LifecycleError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result of a lifecycle action, returned to the HTTP layer for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ActionReceipt {
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictingGig>,
    pub cascaded_cancellations: usize,
}

impl ActionReceipt {
    fn plain(application_id: ApplicationId, status: ApplicationStatus) -> Self {
        Self {
            application_id,
            status,
            conflicts: Vec::new(),
            cascaded_cancellations: 0,
        }
    }
}

/// Pure confirm-time verdict, computed from a snapshot of the worker's
/// confirmed commitments before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    SelfCancelled(Vec<ConflictingGig>),
}

/// Decide what accepting an offer does, given the conflicts found against
/// already-confirmed work. Separated from the commit so the conflict math is
/// testable without a store.
pub fn decide_confirmation(conflicts: Vec<ConflictingGig>) -> ConfirmOutcome {
    if conflicts.is_empty() {
        ConfirmOutcome::Confirmed
    } else {
        ConfirmOutcome::SelfCancelled(conflicts)
    }
}

/// Sanitized status projection for polling clients.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub gig_id: GigId,
    pub status: &'static str,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Advisory locks keyed on worker id. The accept check-then-write and the
/// cascade sweep run under one guard so two concurrent accepts for the same
/// worker on mutually-conflicting gigs cannot both succeed. A multi-instance
/// deployment would back this with a store-side advisory lock.
#[derive(Default)]
struct WorkerLockRegistry {
    locks: Mutex<HashMap<WorkerId, Arc<Mutex<()>>>>,
}

impl WorkerLockRegistry {
    fn lock_for(&self, worker_id: &WorkerId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("worker lock registry poisoned");
        locks
            .entry(worker_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// The application state machine: owns every legal transition of an
/// application row, enforcing actor permissions and gig-validity guards
/// before each one.
pub struct GigApplicationService<G, R, N> {
    gigs: Arc<G>,
    applications: Arc<R>,
    notifier: Arc<N>,
    worker_locks: WorkerLockRegistry,
}

impl<G, R, N> GigApplicationService<G, R, N>
where
    G: GigDirectory + 'static,
    R: ApplicationRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(gigs: Arc<G>, applications: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            gigs,
            applications,
            notifier,
            worker_locks: WorkerLockRegistry::default(),
        }
    }

    /// Worker applies to a gig. Schedule conflicts are deliberately not
    /// checked here; only a duplicate active application is blocked.
    pub fn apply(&self, actor: &Actor, gig_id: &GigId) -> Result<ActionReceipt, LifecycleError> {
        let worker_id = require_worker(actor)?;
        let now = Utc::now();
        let gig = self.available_gig(gig_id, now)?;

        let existing =
            self.applications
                .find_for_gig(&worker_id, gig_id, &ApplicationStatus::ACTIVE)?;
        if existing.is_some() {
            return Err(LifecycleError::Conflict(
                "an active application for this gig already exists".to_string(),
            ));
        }

        let row = ApplicationRow {
            id: next_application_id(),
            worker_id: worker_id.clone(),
            gig_id: gig_id.clone(),
            status: ApplicationStatus::PendingEmployerReview,
            submitted_at: now,
            updated_at: now,
        };
        let stored = self.applications.insert(row)?;

        self.dispatch(Notification {
            receiver_id: gig.employer_id.0.clone(),
            role: ActorRole::Employer,
            title: "New application".to_string(),
            message: format!("Worker {} applied to '{}'.", worker_id.0, gig.title),
            kind: NotificationKind::ApplicationReceived,
            resource_id: stored.id.clone(),
        });

        Ok(ActionReceipt::plain(stored.id, stored.status))
    }

    /// Employer approves or rejects a pending application on their own gig.
    pub fn review(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        decision: ReviewDecision,
    ) -> Result<ActionReceipt, LifecycleError> {
        if actor.role != ActorRole::Employer {
            return Err(LifecycleError::Forbidden(
                "only employers may review applications".to_string(),
            ));
        }

        let row = self.existing_application(application_id)?;
        let gig = self.existing_gig(&row.gig_id)?;
        if gig.employer_id.0 != actor.id {
            return Err(LifecycleError::Forbidden(
                "application belongs to another employer's gig".to_string(),
            ));
        }

        ensure_status(&row, ApplicationStatus::PendingEmployerReview)?;
        self.ensure_gig_open(&gig, Utc::now())?;

        let (next, title, message) = match decision {
            ReviewDecision::Approve => (
                ApplicationStatus::PendingWorkerConfirmation,
                "Application approved",
                format!(
                    "Your application for '{}' was approved. Please confirm or decline.",
                    gig.title
                ),
            ),
            ReviewDecision::Reject => (
                ApplicationStatus::EmployerRejected,
                "Application rejected",
                format!("Your application for '{}' was not accepted.", gig.title),
            ),
        };

        self.transition(application_id, ApplicationStatus::PendingEmployerReview, next)?;

        self.dispatch(Notification {
            receiver_id: row.worker_id.0.clone(),
            role: ActorRole::Worker,
            title: title.to_string(),
            message,
            kind: NotificationKind::ReviewResult,
            resource_id: application_id.clone(),
        });

        Ok(ActionReceipt::plain(application_id.clone(), next))
    }

    /// Worker withdraws an application that the employer has not yet
    /// reviewed. Any later status is too late to cancel.
    pub fn cancel(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
    ) -> Result<ActionReceipt, LifecycleError> {
        let worker_id = require_worker(actor)?;
        let row = self.existing_application(application_id)?;
        if row.worker_id != worker_id {
            return Err(LifecycleError::Forbidden(
                "application belongs to another worker".to_string(),
            ));
        }

        ensure_status(&row, ApplicationStatus::PendingEmployerReview)?;

        self.transition(
            application_id,
            ApplicationStatus::PendingEmployerReview,
            ApplicationStatus::WorkerCancelled,
        )?;

        Ok(ActionReceipt::plain(
            application_id.clone(),
            ApplicationStatus::WorkerCancelled,
        ))
    }

    /// Worker accepts or declines an approved offer. Accepting re-validates
    /// against confirmed work: on conflict the accepting application itself
    /// is system-cancelled; on success it is confirmed and the worker's other
    /// now-conflicting pending holds are swept.
    pub fn confirm(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
        decision: ConfirmDecision,
    ) -> Result<ActionReceipt, LifecycleError> {
        let worker_id = require_worker(actor)?;
        let row = self.existing_application(application_id)?;
        if row.worker_id != worker_id {
            return Err(LifecycleError::Forbidden(
                "application belongs to another worker".to_string(),
            ));
        }

        ensure_status(&row, ApplicationStatus::PendingWorkerConfirmation)?;
        let gig = self.existing_gig(&row.gig_id)?;
        self.ensure_gig_open(&gig, Utc::now())?;

        match decision {
            ConfirmDecision::Decline => self.apply_decline(&row, &gig),
            ConfirmDecision::Accept => self.apply_accept(&row, &gig),
        }
    }

    /// Status projection for polling clients. Workers see their own
    /// applications; the owning employer sees applications on their gigs.
    pub fn status(
        &self,
        actor: &Actor,
        application_id: &ApplicationId,
    ) -> Result<ApplicationStatusView, LifecycleError> {
        let row = self.existing_application(application_id)?;

        let visible = match actor.role {
            ActorRole::Worker => row.worker_id.0 == actor.id,
            ActorRole::Employer => {
                let gig = self.existing_gig(&row.gig_id)?;
                gig.employer_id.0 == actor.id
            }
            ActorRole::System => true,
        };
        if !visible {
            return Err(LifecycleError::Forbidden(
                "application is not visible to this actor".to_string(),
            ));
        }

        Ok(ApplicationStatusView {
            application_id: row.id,
            gig_id: row.gig_id,
            status: row.status.label(),
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
        })
    }

    fn apply_decline(
        &self,
        row: &ApplicationRow,
        gig: &GigSnapshot,
    ) -> Result<ActionReceipt, LifecycleError> {
        self.transition(
            &row.id,
            ApplicationStatus::PendingWorkerConfirmation,
            ApplicationStatus::WorkerDeclined,
        )?;

        self.dispatch(Notification {
            receiver_id: gig.employer_id.0.clone(),
            role: ActorRole::Employer,
            title: "Offer declined".to_string(),
            message: format!("Worker {} declined '{}'.", row.worker_id.0, gig.title),
            kind: NotificationKind::ConfirmationResult,
            resource_id: row.id.clone(),
        });

        Ok(ActionReceipt::plain(
            row.id.clone(),
            ApplicationStatus::WorkerDeclined,
        ))
    }

    fn apply_accept(
        &self,
        row: &ApplicationRow,
        gig: &GigSnapshot,
    ) -> Result<ActionReceipt, LifecycleError> {
        // Serialize the check-then-write and the cascade per worker; without
        // this, two accepts on mutually-conflicting gigs can both pass the
        // conflict scan.
        let lock = self.worker_locks.lock_for(&row.worker_id);
        let _guard = lock.lock().expect("worker advisory lock poisoned");

        // The status read above happened outside the lock; a cascade from a
        // concurrent accept may have swept this hold while we waited.
        let fresh = self.existing_application(&row.id)?;
        ensure_status(&fresh, ApplicationStatus::PendingWorkerConfirmation)?;
        let row = &fresh;

        let checker = ConflictChecker::new(self.gigs.as_ref(), self.applications.as_ref());
        let conflicts = checker.find_conflicts(
            &row.worker_id,
            &row.gig_id,
            &[ApplicationStatus::WorkerConfirmed],
        )?;

        match decide_confirmation(conflicts) {
            ConfirmOutcome::SelfCancelled(conflicts) => {
                self.transition(
                    &row.id,
                    ApplicationStatus::PendingWorkerConfirmation,
                    ApplicationStatus::SystemCancelled,
                )?;

                let listing = conflicts
                    .iter()
                    .map(|other| {
                        format!(
                            "'{}' ({} {})",
                            other.title,
                            other.date_range(),
                            other.time_range()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");

                self.dispatch(Notification {
                    receiver_id: row.worker_id.0.clone(),
                    role: ActorRole::Worker,
                    title: "Confirmation failed".to_string(),
                    message: format!(
                        "'{}' could not be confirmed: it conflicts with {}. The application was cancelled.",
                        gig.title, listing,
                    ),
                    kind: NotificationKind::ScheduleConflict,
                    resource_id: row.id.clone(),
                });
                self.dispatch(Notification {
                    receiver_id: gig.employer_id.0.clone(),
                    role: ActorRole::Employer,
                    title: "Applicant withdrawn".to_string(),
                    message: format!(
                        "Worker {} could not confirm '{}' due to a conflict with their other work time.",
                        row.worker_id.0, gig.title,
                    ),
                    kind: NotificationKind::ScheduleConflict,
                    resource_id: row.id.clone(),
                });

                Ok(ActionReceipt {
                    application_id: row.id.clone(),
                    status: ApplicationStatus::SystemCancelled,
                    conflicts,
                    cascaded_cancellations: 0,
                })
            }
            ConfirmOutcome::Confirmed => {
                self.transition(
                    &row.id,
                    ApplicationStatus::PendingWorkerConfirmation,
                    ApplicationStatus::WorkerConfirmed,
                )?;

                self.dispatch(Notification {
                    receiver_id: gig.employer_id.0.clone(),
                    role: ActorRole::Employer,
                    title: "Worker confirmed".to_string(),
                    message: format!("Worker {} confirmed '{}'.", row.worker_id.0, gig.title),
                    kind: NotificationKind::ConfirmationResult,
                    resource_id: row.id.clone(),
                });

                let canceller = CascadeCanceller::new(
                    self.gigs.as_ref(),
                    self.applications.as_ref(),
                    self.notifier.as_ref(),
                );
                let cascaded = canceller.cascade_on_confirm(&row.worker_id, &row.gig_id)?;

                Ok(ActionReceipt {
                    application_id: row.id.clone(),
                    status: ApplicationStatus::WorkerConfirmed,
                    conflicts: Vec::new(),
                    cascaded_cancellations: cascaded,
                })
            }
        }
    }

    /// Conditional status write. Paths that do not hold the worker advisory
    /// lock (review, cancel, decline) rely on the store rejecting a stale
    /// `expected`, so a row a concurrent cascade already cancelled can never
    /// be revived.
    fn transition(
        &self,
        application_id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<(), LifecycleError> {
        match self
            .applications
            .update_status(application_id, expected, next, Utc::now())
        {
            Err(RepositoryError::Conflict) => {
                let row = self.existing_application(application_id)?;
                Err(LifecycleError::InvalidState {
                    found: row.status.label(),
                })
            }
            result => Ok(result?),
        }
    }

    fn existing_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRow, LifecycleError> {
        self.applications
            .fetch(application_id)?
            .ok_or_else(|| LifecycleError::NotFound("application does not exist".to_string()))
    }

    fn existing_gig(&self, gig_id: &GigId) -> Result<GigSnapshot, LifecycleError> {
        self.gigs
            .fetch(gig_id)?
            .ok_or_else(|| LifecycleError::NotFound("gig does not exist".to_string()))
    }

    /// Apply-time availability: active, unexpired, and currently listed.
    fn available_gig(
        &self,
        gig_id: &GigId,
        now: chrono::DateTime<Utc>,
    ) -> Result<GigSnapshot, LifecycleError> {
        let gig = self.existing_gig(gig_id)?;
        self.ensure_gig_open(&gig, now)?;
        if !gig.is_listed(now) {
            return Err(LifecycleError::NotFound(
                "gig is not currently listed".to_string(),
            ));
        }
        Ok(gig)
    }

    /// Review/confirm-time validity: the gig may be unlisted by then, but it
    /// must still be active and not past its date range.
    fn ensure_gig_open(
        &self,
        gig: &GigSnapshot,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        if !gig.is_active {
            return Err(LifecycleError::NotFound(
                "gig is no longer active".to_string(),
            ));
        }
        if gig.is_expired(now.date_naive()) {
            return Err(LifecycleError::NotFound("gig has already ended".to_string()));
        }
        Ok(())
    }

    fn dispatch(&self, notification: Notification) {
        if let Err(err) = self.notifier.notify(notification) {
            warn!(error = %err, "notification dispatch failed");
        }
    }
}

fn require_worker(actor: &Actor) -> Result<WorkerId, LifecycleError> {
    if actor.role != ActorRole::Worker {
        return Err(LifecycleError::Forbidden(
            "only workers may perform this action".to_string(),
        ));
    }
    Ok(WorkerId(actor.id.clone()))
}

fn ensure_status(row: &ApplicationRow, expected: ApplicationStatus) -> Result<(), LifecycleError> {
    if row.status != expected {
        return Err(LifecycleError::InvalidState {
            found: row.status.label(),
        });
    }
    Ok(())
}
