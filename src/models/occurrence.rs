use chrono::{DateTime, FixedOffset};

/// One concrete occurrence pulled out of a feed, before normalization.
///
/// Text fields are decoded from ICS escaping but otherwise untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOccurrence {
    pub uid: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<FixedOffset>,
    pub end: Option<DateTime<FixedOffset>>,
}

impl RawOccurrence {
    pub fn new(title: impl Into<String>, start: DateTime<FixedOffset>) -> Self {
        Self {
            uid: None,
            title: title.into(),
            description: None,
            location: None,
            start,
            end: None,
        }
    }

    pub fn with_end(mut self, end: DateTime<FixedOffset>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
