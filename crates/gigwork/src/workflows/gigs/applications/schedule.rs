use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::domain::{GigId, GigSnapshot};

/// A gig's bookable interval: a calendar-date range plus a daily time-of-day
/// range. Copied from the gig at evaluation time, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
}

/// Validation errors for schedule windows arriving from the boundary.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("date_end {end} precedes date_start {start}")]
    InvertedDates { start: NaiveDate, end: NaiveDate },
    #[error("time_end {end} must be later than time_start {start}")]
    InvertedTimes { start: NaiveTime, end: NaiveTime },
}

impl ScheduleWindow {
    pub fn new(
        date_start: NaiveDate,
        date_end: NaiveDate,
        time_start: NaiveTime,
        time_end: NaiveTime,
    ) -> Result<Self, WindowError> {
        if date_end < date_start {
            return Err(WindowError::InvertedDates {
                start: date_start,
                end: date_end,
            });
        }
        if time_end <= time_start {
            return Err(WindowError::InvertedTimes {
                start: time_start,
                end: time_end,
            });
        }

        Ok(Self {
            date_start,
            date_end,
            time_start,
            time_end,
        })
    }

    /// Two windows conflict when their date ranges intersect (inclusive on
    /// both ends) and their daily time ranges intersect (half-open, so a shift
    /// ending at 17:00 does not collide with one starting at 17:00).
    pub fn overlaps(&self, other: &ScheduleWindow) -> bool {
        let dates_intersect =
            self.date_start <= other.date_end && self.date_end >= other.date_start;
        let times_intersect =
            self.time_start < other.time_end && self.time_end > other.time_start;

        dates_intersect && times_intersect
    }
}

/// Caller-facing diagnostic naming another commitment that blocks (or swept
/// away) a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingGig {
    pub gig_id: GigId,
    pub title: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
}

impl ConflictingGig {
    pub fn from_gig(gig: &GigSnapshot) -> Self {
        Self {
            gig_id: gig.id.clone(),
            title: gig.title.clone(),
            date_start: gig.date_start,
            date_end: gig.date_end,
            time_start: gig.time_start,
            time_end: gig.time_end,
        }
    }

    pub fn date_range(&self) -> String {
        if self.date_start == self.date_end {
            self.date_start.format("%Y-%m-%d").to_string()
        } else {
            format!(
                "{} ~ {}",
                self.date_start.format("%Y-%m-%d"),
                self.date_end.format("%Y-%m-%d")
            )
        }
    }

    pub fn time_range(&self) -> String {
        format!(
            "{} ~ {}",
            self.time_start.format("%H:%M"),
            self.time_end.format("%H:%M")
        )
    }
}
