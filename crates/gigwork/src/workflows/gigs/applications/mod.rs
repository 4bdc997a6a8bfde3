//! Gig application lifecycle: state machine, schedule-conflict checking, and
//! cascade cancellation.
//!
//! An application moves from `pending_employer_review` through employer
//! review and worker confirmation. Accepting an offer re-validates the gig's
//! schedule window against the worker's confirmed work; on success the
//! worker's other pending holds that now conflict are swept to
//! `system_cancelled`, each sweep notifying both affected parties.

pub(crate) mod cascade;
pub(crate) mod conflicts;
pub mod domain;
pub mod repository;
pub mod router;
pub mod schedule;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, ActorRole, ApplicationId, ApplicationRow, ApplicationStatus, ConfirmDecision,
    EmployerId, GigId, GigSnapshot, ReviewDecision, WorkerId,
};
pub use repository::{
    ApplicationRepository, GigDirectory, Notification, NotificationDispatcher, NotificationKind,
    NotifyError, RepositoryError,
};
pub use router::application_router;
pub use schedule::{ConflictingGig, ScheduleWindow, WindowError};
pub use service::{
    decide_confirmation, ActionReceipt, ApplicationStatusView, ConfirmOutcome,
    GigApplicationService, LifecycleError,
};
