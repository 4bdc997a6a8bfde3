//! Gig marketplace backend core.
//!
//! The interesting machinery lives in [`workflows::gigs::applications`]: the
//! application lifecycle state machine, the schedule-conflict checker, and the
//! cascade canceller that sweeps a worker's other pending holds once a
//! conflicting commitment is confirmed.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
