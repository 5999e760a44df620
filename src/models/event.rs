use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

/// A display-ready occurrence.
///
/// Built once per pipeline run and never mutated; a later instant gets a new
/// value through [`crate::normalize::relabel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub join_url: Option<String>,
    pub native_url: Option<String>,
    pub relative_label: String,
    pub is_active: bool,
}

impl NormalizedEvent {
    pub fn has_join_link(&self) -> bool {
        self.join_url.is_some()
    }

    /// `start <= now < end`
    pub fn is_happening_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.start <= *now && *now < self.end
    }

    /// The URL a join action should open: the native deep link when one
    /// exists, else the web link.
    pub fn preferred_join_url(&self) -> Option<&str> {
        self.native_url.as_deref().or(self.join_url.as_deref())
    }
}
