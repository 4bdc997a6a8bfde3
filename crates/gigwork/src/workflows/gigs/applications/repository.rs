use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ActorRole, ApplicationId, ApplicationRow, ApplicationStatus, GigId, GigSnapshot, WorkerId,
};

/// Read-only lookup over gig rows. Mutation belongs to the listing CRUD
/// layer, which also guarantees a gig's window is frozen once applications
/// exist in non-terminal states.
pub trait GigDirectory: Send + Sync {
    fn fetch(&self, id: &GigId) -> Result<Option<GigSnapshot>, RepositoryError>;
}

/// Storage abstraction for application rows so the lifecycle core can be
/// exercised against in-memory fakes.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, row: ApplicationRow) -> Result<ApplicationRow, RepositoryError>;

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRow>, RepositoryError>;

    /// Transition `id` from `expected` to `next` in one guarded write.
    /// Returns `Conflict` and leaves the row untouched when the stored status
    /// no longer matches `expected`.
    fn update_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Find a worker's application for a specific gig in any of the given
    /// statuses. Backs the duplicate-active-application guard at apply time.
    fn find_for_gig(
        &self,
        worker_id: &WorkerId,
        gig_id: &GigId,
        statuses: &[ApplicationStatus],
    ) -> Result<Option<ApplicationRow>, RepositoryError>;

    /// All of a worker's applications in any of the given statuses. Feeds the
    /// conflict scan and the cascade sweep.
    fn find_by_worker(
        &self,
        worker_id: &WorkerId,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<ApplicationRow>, RepositoryError>;

    /// Bulk transition to `system_cancelled`. Rows that already left
    /// `pending_worker_confirmation` are skipped rather than overwritten;
    /// returns the number of rows actually cancelled. A transactional adapter
    /// keeps this in the same transaction as the confirmation write that
    /// caused it.
    fn cancel_all(
        &self,
        ids: &[ApplicationId],
        updated_at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound side-channel message. Delivery mechanics (push, e-mail) live
/// behind the trait; failures never roll back a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub receiver_id: String,
    pub role: ActorRole,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub resource_id: ApplicationId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApplicationReceived,
    ReviewResult,
    ConfirmationResult,
    ScheduleConflict,
}

/// Fire-and-forget dispatch hook.
pub trait NotificationDispatcher: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
