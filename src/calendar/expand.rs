//! ICS expansion.
//!
//! Turns feed text into the concrete occurrences whose start falls inside an
//! [`ExpansionWindow`], expanding RRULE/RDATE sets, dropping EXDATEs and
//! substituting RECURRENCE-ID overrides.

use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use icalendar::parser::{read_calendar, unfold, Component, Property};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use log::{debug, warn};
use rrule::RRuleSet;

use crate::calendar::common::{parse_ics_duration, parse_tzid, resolve_ical_datetime, unescape_text, wall_time_in};
use crate::error::{AppError, AppResult};
use crate::models::RawOccurrence;

/// Upper bound on instances generated from one rule per run.
const MAX_OCCURRENCES_PER_RULE: u16 = 20_000;

/// Wall-clock instances can sit a zone offset plus a DST hour away from
/// their UTC reading.
const WALL_CLOCK_PADDING_HOURS: i64 = 15;

/// Half-open range `[start, end)` an occurrence's start must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExpansionWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        self.start <= *instant && *instant < self.end
    }
}

/// A VEVENT reduced to what expansion needs.
#[derive(Debug)]
struct FeedEvent {
    uid: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    dtstart: DatePerhapsTime,
    start: DateTime<FixedOffset>,
    length: Option<Duration>,
    rrule: Option<String>,
    rdates: Vec<DateTime<FixedOffset>>,
    exdates: Vec<DateTime<FixedOffset>>,
    recurrence_id: Option<DateTime<Utc>>,
}

impl FeedEvent {
    fn is_recurring(&self) -> bool {
        self.recurrence_id.is_none() && (self.rrule.is_some() || !self.rdates.is_empty())
    }

    fn occurrence_at(&self, start: DateTime<FixedOffset>) -> RawOccurrence {
        RawOccurrence {
            uid: self.uid.clone(),
            title: self.summary.clone().unwrap_or_default(),
            description: self.description.clone(),
            location: self.location.clone(),
            start,
            end: self.length.map(|length| start + length),
        }
    }

    fn display_name(&self) -> &str {
        self.summary.as_deref().or(self.uid.as_deref()).unwrap_or("untitled event")
    }
}

/// Expand `ics` into chronologically ordered occurrences inside `window`.
///
/// Floating and date-only values are read in `local`. Content that is not
/// an iCalendar feed fails as a whole; a single bad VEVENT or rule only
/// degrades that event.
pub fn expand_feed<Tz: TimeZone>(ics: &str, window: &ExpansionWindow, local: &Tz) -> AppResult<Vec<RawOccurrence>> {
    if !ics.contains("BEGIN:VCALENDAR") {
        return Err(AppError::feed_parse(
            "content is not an iCalendar feed (no BEGIN:VCALENDAR found)",
        ));
    }

    let unfolded = unfold(ics);
    let calendar = read_calendar(&unfolded).map_err(|e| AppError::feed_parse(e.to_string()))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let events: Vec<FeedEvent> = vevents
        .into_iter()
        .filter_map(|vevent| parse_vevent(vevent, local))
        .collect();
    debug!("Parsed {} VEVENTs from feed", events.len());

    let overridden: HashSet<(&str, DateTime<Utc>)> = events
        .iter()
        .filter_map(|event| Some((event.uid.as_deref()?, event.recurrence_id?)))
        .collect();

    let mut occurrences = Vec::new();
    for event in &events {
        if !event.is_recurring() {
            if window.contains(&event.start) {
                occurrences.push(event.occurrence_at(event.start));
            }
            continue;
        }

        for start in occurrence_starts(event, window, local) {
            if !window.contains(&start) {
                continue;
            }
            let replaced = event
                .uid
                .as_deref()
                .map(|uid| overridden.contains(&(uid, start.with_timezone(&Utc))))
                .unwrap_or(false);
            if !replaced {
                occurrences.push(event.occurrence_at(start));
            }
        }
    }

    occurrences.sort_by(|a, b| a.start.cmp(&b.start));
    Ok(occurrences)
}

fn collect_vevents<'c, 'a>(components: &'c [Component<'a>], out: &mut Vec<&'c Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

fn parse_vevent<Tz: TimeZone>(vevent: &Component, local: &Tz) -> Option<FeedEvent> {
    let text = |name: &str| vevent.find_prop(name).map(|p| unescape_text(p.val.as_ref()));

    let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
    let summary = text("SUMMARY");

    let Some(dtstart) = vevent
        .find_prop("DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
    else {
        warn!("Skipping event '{}' without a usable DTSTART", summary.as_deref().unwrap_or("untitled event"));
        return None;
    };
    let Some(start) = resolve_ical_datetime(&dtstart, local) else {
        warn!("Skipping event '{}': DTSTART could not be placed in time", summary.as_deref().unwrap_or("untitled event"));
        return None;
    };

    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .and_then(|dt| resolve_ical_datetime(&dt, local));
    let length = match end {
        Some(end) => Some(end - start),
        None => vevent
            .find_prop("DURATION")
            .and_then(|p| parse_ics_duration(p.val.as_ref())),
    };

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .and_then(|dt| resolve_ical_datetime(&dt, local))
        .map(|dt| dt.with_timezone(&Utc));

    let dates_of = |name: &str| -> Vec<DateTime<FixedOffset>> {
        vevent
            .properties
            .iter()
            .filter(|p| p.name == name)
            .flat_map(|p| parse_date_list(p, local))
            .collect()
    };

    Some(FeedEvent {
        uid,
        summary,
        description: text("DESCRIPTION"),
        location: text("LOCATION"),
        dtstart,
        start,
        length,
        rrule: vevent.find_prop("RRULE").map(|p| p.val.to_string()),
        rdates: dates_of("RDATE"),
        exdates: dates_of("EXDATE"),
        recurrence_id,
    })
}

/// Parse an EXDATE/RDATE property, which may carry TZID or VALUE=DATE and
/// a comma-separated list. PERIOD values are skipped.
fn parse_date_list<Tz: TimeZone>(prop: &Property, local: &Tz) -> Vec<DateTime<FixedOffset>> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            let value = if is_date {
                DatePerhapsTime::Date(NaiveDate::parse_from_str(s, "%Y%m%d").ok()?)
            } else if let Some(stripped) = s.strip_suffix('Z') {
                let naive = NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S").ok()?;
                DatePerhapsTime::DateTime(CalendarDateTime::Utc(naive.and_utc()))
            } else {
                let naive = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
                match &tzid {
                    Some(tzid) => DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone {
                        date_time: naive,
                        tzid: tzid.clone(),
                    }),
                    None => DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)),
                }
            };
            resolve_ical_datetime(&value, local)
        })
        .collect()
}

fn occurrence_starts<Tz: TimeZone>(event: &FeedEvent, window: &ExpansionWindow, local: &Tz) -> Vec<DateTime<FixedOffset>> {
    let mut starts = match &event.rrule {
        Some(rule) => expand_rrule(event, rule, window, local).unwrap_or_else(|e| {
            warn!(
                "Could not expand RRULE for '{}' ({}); using its first occurrence only",
                event.display_name(),
                e
            );
            vec![event.start]
        }),
        None => vec![event.start],
    };

    starts.extend(event.rdates.iter().cloned());
    starts.retain(|start| !event.exdates.contains(start));
    starts.sort();
    starts.dedup();
    starts
}

/// Run the event's RRULE through the rrule crate.
///
/// Rules anchored to floating, date-only or unknown-zone starts are
/// expanded on wall-clock time (written as UTC) and each instance is then
/// placed in `local`, so a daily 09:00 stays 09:00 across DST changes.
fn expand_rrule<Tz: TimeZone>(
    event: &FeedEvent,
    rule: &str,
    window: &ExpansionWindow,
    local: &Tz,
) -> Result<Vec<DateTime<FixedOffset>>, String> {
    let (dtstart_line, zone, wall_clock) = match &event.dtstart {
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => {
            (format!("DTSTART:{}", dt.format("%Y%m%dT%H%M%SZ")), None, false)
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            match parse_tzid(tzid) {
                Some(zone) => (
                    format!("DTSTART;TZID={}:{}", zone.name(), date_time.format("%Y%m%dT%H%M%S")),
                    Some(zone),
                    false,
                ),
                None => (format!("DTSTART:{}Z", date_time.format("%Y%m%dT%H%M%S")), None, true),
            }
        }
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(date_time)) => {
            (format!("DTSTART:{}Z", date_time.format("%Y%m%dT%H%M%S")), None, true)
        }
        DatePerhapsTime::Date(date) => (format!("DTSTART:{}T000000Z", date.format("%Y%m%d")), None, true),
    };

    let rule = rewrite_until(rule, zone.as_ref());
    let rrule_set = format!("{}\nRRULE:{}", dtstart_line, rule)
        .parse::<RRuleSet>()
        .map_err(|e| e.to_string())?;

    // Only wall-clock rules need padding; their instances move once placed
    // in the local zone. The second keeps boundary instances either way.
    let padding = if wall_clock {
        Duration::hours(WALL_CLOCK_PADDING_HOURS)
    } else {
        Duration::seconds(1)
    };
    let tz: rrule::Tz = Utc.into();
    let after = (window.start - padding).with_timezone(&tz);
    let before = (window.end + padding).with_timezone(&tz);
    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES_PER_RULE);
    if result.limited {
        warn!(
            "RRULE for '{}' has more than {} instances in the window; later ones are dropped",
            event.display_name(),
            MAX_OCCURRENCES_PER_RULE
        );
    }

    Ok(result
        .dates
        .iter()
        .filter_map(|occurrence| {
            if wall_clock {
                wall_time_in(local, &occurrence.naive_utc())
            } else {
                Some(occurrence.fixed_offset())
            }
        })
        .collect())
}

/// The rrule crate wants UNTIL in UTC whenever DTSTART is; feeds often
/// write it as floating or date-only.
fn rewrite_until(rule: &str, zone: Option<&chrono_tz::Tz>) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") && !value.ends_with('Z') => {
                let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok().or_else(|| {
                    NaiveDate::parse_from_str(value, "%Y%m%d")
                        .ok()
                        .and_then(|date| date.and_hms_opt(23, 59, 59))
                });
                match naive {
                    Some(naive) => {
                        let utc = zone
                            .and_then(|zone| zone.from_local_datetime(&naive).earliest())
                            .map(|dt| dt.naive_utc())
                            .unwrap_or(naive);
                        format!("UNTIL={}", utc.format("%Y%m%dT%H%M%SZ"))
                    }
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}
