use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::ScheduleWindow;

/// Identifier wrapper for employer-posted gigs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GigId(pub String);

/// Identifier wrapper for worker accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

/// Identifier wrapper for employer accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployerId(pub String);

/// Identifier wrapper for gig applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Lifecycle status of an application. The set is closed: unknown labels are
/// rejected at the boundary rather than carried as loose strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    PendingEmployerReview,
    PendingWorkerConfirmation,
    WorkerConfirmed,
    WorkerDeclined,
    WorkerCancelled,
    EmployerRejected,
    SystemCancelled,
}

impl ApplicationStatus {
    /// Statuses that count as a live claim on the (worker, gig) pair. At most
    /// one application per pair may hold one of these at a time.
    pub const ACTIVE: [Self; 3] = [
        Self::PendingEmployerReview,
        Self::PendingWorkerConfirmation,
        Self::WorkerConfirmed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingEmployerReview => "pending_employer_review",
            Self::PendingWorkerConfirmation => "pending_worker_confirmation",
            Self::WorkerConfirmed => "worker_confirmed",
            Self::WorkerDeclined => "worker_declined",
            Self::WorkerCancelled => "worker_cancelled",
            Self::EmployerRejected => "employer_rejected",
            Self::SystemCancelled => "system_cancelled",
        }
    }

    /// Terminal statuses are retained as history and permit no further
    /// transition.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::WorkerConfirmed
                | Self::WorkerDeclined
                | Self::WorkerCancelled
                | Self::EmployerRejected
                | Self::SystemCancelled
        )
    }
}

/// Read-only view of a gig as the lifecycle core sees it. Gig rows are owned
/// by the listing CRUD layer; this core never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GigSnapshot {
    pub id: GigId,
    pub employer_id: EmployerId,
    pub title: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub is_active: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub unlisted_at: Option<DateTime<Utc>>,
}

impl GigSnapshot {
    pub fn window(&self) -> ScheduleWindow {
        ScheduleWindow {
            date_start: self.date_start,
            date_end: self.date_end,
            time_start: self.time_start,
            time_end: self.time_end,
        }
    }

    /// A gig is publicly listed once published and until `unlisted_at` passes.
    pub fn is_listed(&self, now: DateTime<Utc>) -> bool {
        if self.published_at.is_none() {
            return false;
        }
        match self.unlisted_at {
            Some(unlisted_at) => unlisted_at > now,
            None => true,
        }
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.date_end < today
    }
}

/// One worker's bid for one gig. Rows are never physically deleted; terminal
/// statuses remain as the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRow {
    pub id: ApplicationId,
    pub worker_id: WorkerId,
    pub gig_id: GigId,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller's identity, resolved once at request entry. The lifecycle core
/// needs nothing beyond id and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Worker,
    Employer,
    System,
}

impl ActorRole {
    pub fn parse_label(value: &str) -> Option<Self> {
        match value {
            "worker" => Some(Self::Worker),
            "employer" => Some(Self::Employer),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl Actor {
    pub fn worker(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::Worker,
        }
    }

    pub fn employer(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::Employer,
        }
    }
}

/// Employer verdict on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Worker verdict on an approved application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmDecision {
    Accept,
    Decline,
}
