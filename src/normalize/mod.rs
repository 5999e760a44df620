//! Event normalization.
//!
//! Turns raw occurrences into display-ready events for one instant: text is
//! collapsed, missing or inverted ends get a default length, times move to
//! the caller's zone, a join link is extracted and resolved, and each event
//! gets a relative label. Every call builds new values; nothing is cached.

use crate::links::{resolve_join_target, LinkRules};
use crate::models::{JoinTarget, NormalizedEvent, RawOccurrence, Schedule};
use crate::utils::{collapse_optional, normalize_title};
use chrono::{DateTime, Duration, FixedOffset, TimeZone};

pub mod timing;

pub use timing::{relative_label, select_active, RelativeTiming};

/// Length given to events without a usable end.
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 30;

// Instant-independent part of an event
struct EventDraft {
    title: String,
    description: Option<String>,
    location: Option<String>,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    join: Option<JoinTarget>,
}

/// `end` if it is strictly after `start`, else `start` plus the default
/// length.
pub fn resolve_end(start: &DateTime<FixedOffset>, end: Option<&DateTime<FixedOffset>>) -> DateTime<FixedOffset> {
    match end {
        Some(end) if end > start => *end,
        _ => *start + Duration::minutes(DEFAULT_EVENT_DURATION_MINUTES),
    }
}

fn draft<Tz: TimeZone>(occurrence: &RawOccurrence, zone: &Tz, rules: &LinkRules) -> EventDraft {
    let end = resolve_end(&occurrence.start, occurrence.end.as_ref());
    if occurrence.end.is_some_and(|raw_end| raw_end != end) {
        log::debug!(
            "Event '{}' ends at or before its start, using {} minute default",
            occurrence.title,
            DEFAULT_EVENT_DURATION_MINUTES
        );
    }

    let join = rules.extract(occurrence).map(|link| resolve_join_target(&link.url));

    EventDraft {
        title: normalize_title(&occurrence.title),
        description: collapse_optional(occurrence.description.as_deref()),
        location: collapse_optional(occurrence.location.as_deref()),
        start: occurrence.start.with_timezone(zone).fixed_offset(),
        end: end.with_timezone(zone).fixed_offset(),
        join,
    }
}

/// Normalize a batch of occurrences as seen at `now`.
///
/// Events come out in start order (stable for equal starts), with times in
/// `now`'s zone. At most one event is active.
pub fn build_schedule<Tz: TimeZone>(raw: &[RawOccurrence], now: &DateTime<Tz>, rules: &LinkRules) -> Schedule {
    let zone = now.timezone();
    let mut drafts: Vec<EventDraft> = raw.iter().map(|occurrence| draft(occurrence, &zone, rules)).collect();
    drafts.sort_by_key(|d| d.start);

    let active_index = select_active(drafts.iter().map(|d| (&d.start, &d.end)), now);

    let events = drafts
        .into_iter()
        .enumerate()
        .map(|(index, d)| {
            let (join_url, native_url) = match d.join {
                Some(target) => (Some(target.web_url), target.deep_link.map(|link| link.url)),
                None => (None, None),
            };

            NormalizedEvent {
                id: format!("{}-{}", d.start.timestamp(), index),
                relative_label: relative_label(&d.start, &d.end, now),
                is_active: active_index == Some(index),
                title: d.title,
                description: d.description,
                location: d.location,
                start: d.start,
                end: d.end,
                join_url,
                native_url,
            }
        })
        .collect();

    Schedule { events, active_index }
}

/// Recompute labels and the active event of an existing schedule for `now`.
pub fn relabel<Tz: TimeZone>(schedule: &Schedule, now: &DateTime<Tz>) -> Schedule {
    let active_index = select_active(schedule.events.iter().map(|e| (&e.start, &e.end)), now);

    let events = schedule
        .events
        .iter()
        .enumerate()
        .map(|(index, event)| NormalizedEvent {
            relative_label: relative_label(&event.start, &event.end, now),
            is_active: active_index == Some(index),
            ..event.clone()
        })
        .collect();

    Schedule { events, active_index }
}
