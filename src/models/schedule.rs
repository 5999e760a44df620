use crate::error::AppError;
use crate::models::NormalizedEvent;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// The ordered events of one pipeline run plus the index of the active one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schedule {
    pub events: Vec<NormalizedEvent>,
    pub active_index: Option<usize>,
}

impl Schedule {
    pub fn active(&self) -> Option<&NormalizedEvent> {
        self.active_index.and_then(|i| self.events.get(i))
    }

    /// The same events seen from another instant.
    pub fn at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Schedule {
        crate::normalize::relabel(self, now)
    }
}

/// The only value handed to rendering and transport layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleResult {
    Loaded(Schedule),
    Failed { error: String },
}

impl ScheduleResult {
    pub fn is_error(&self) -> bool {
        matches!(self, ScheduleResult::Failed { .. })
    }

    /// Events of a loaded schedule; a failed run has none.
    pub fn events(&self) -> &[NormalizedEvent] {
        match self {
            ScheduleResult::Loaded(schedule) => &schedule.events,
            ScheduleResult::Failed { .. } => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ScheduleResult::Loaded(_) => None,
            ScheduleResult::Failed { error } => Some(error),
        }
    }
}

impl From<AppError> for ScheduleResult {
    fn from(error: AppError) -> Self {
        ScheduleResult::Failed { error: error.to_string() }
    }
}

impl From<Schedule> for ScheduleResult {
    fn from(schedule: Schedule) -> Self {
        ScheduleResult::Loaded(schedule)
    }
}
