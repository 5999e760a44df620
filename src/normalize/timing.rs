use chrono::{DateTime, FixedOffset, TimeZone};
use std::fmt;

/// Where an event sits relative to an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTiming {
    /// Minutes until start, rounded up and never below 1
    Upcoming { minutes: i64 },
    Current,
    /// Whole minutes since end
    Ended { minutes: i64 },
}

impl RelativeTiming {
    pub fn between<Tz: TimeZone>(
        start: &DateTime<FixedOffset>,
        end: &DateTime<FixedOffset>,
        now: &DateTime<Tz>,
    ) -> Self {
        let now = now.fixed_offset();
        if now < *start {
            let millis = start.signed_duration_since(now).num_milliseconds();
            let minutes = (millis + 59_999) / 60_000;
            RelativeTiming::Upcoming { minutes: minutes.max(1) }
        } else if now < *end {
            RelativeTiming::Current
        } else {
            let minutes = now.signed_duration_since(*end).num_minutes();
            RelativeTiming::Ended { minutes: minutes.max(0) }
        }
    }
}

impl fmt::Display for RelativeTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeTiming::Upcoming { minutes } => write!(f, "in {} mins", minutes),
            RelativeTiming::Current => write!(f, "current"),
            RelativeTiming::Ended { minutes } => write!(f, "ended {} mins ago", minutes),
        }
    }
}

pub fn relative_label<Tz: TimeZone>(
    start: &DateTime<FixedOffset>,
    end: &DateTime<FixedOffset>,
    now: &DateTime<Tz>,
) -> String {
    RelativeTiming::between(start, end, now).to_string()
}

/// Index of the span containing `now`; overlapping spans resolve to the
/// earliest start, then the lowest index.
pub fn select_active<'a, Tz, I>(spans: I, now: &DateTime<Tz>) -> Option<usize>
where
    Tz: TimeZone,
    I: IntoIterator<Item = (&'a DateTime<FixedOffset>, &'a DateTime<FixedOffset>)>,
{
    spans
        .into_iter()
        .enumerate()
        .filter(|(_, (start, end))| **start <= *now && *now < **end)
        .min_by_key(|(index, (start, _))| (**start, *index))
        .map(|(index, _)| index)
}
