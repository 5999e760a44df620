use crate::error::{AppError, AppResult};
use crate::http_config::HttpConfig;
use crate::utils::logging;
use crate::utils::retry::retry_with_exponential_backoff;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, TimeZone};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use url::Url;

/// Fetch ICS data over HTTP(S), retrying transient failures.
pub async fn fetch_ics_data(url: &Url, http: &HttpConfig) -> AppResult<String> {
    let client = http.build_client()?;
    let retry_config = http.to_retry_config();

    retry_with_exponential_backoff(&retry_config, || {
        let client = client.clone();
        let url = url.clone();

        async move {
            let response = client.get(url.as_str()).send().await.map_err(|e| {
                logging::log_network_error("ICS fetch", &e);
                if e.is_timeout() {
                    AppError::feed_fetch(format!("request to {} timed out", url))
                } else if e.is_connect() {
                    AppError::feed_fetch(format!("connection to {} failed: {}", url, e))
                } else {
                    AppError::feed_fetch(format!("request to {} failed: {}", url, e))
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::feed_fetch(format!("HTTP {} from {}", status, url)));
            }

            let content = response.text().await
                .map_err(|e| AppError::feed_fetch(format!("failed to read response body: {}", e)))?;

            // Catch share-page URLs that serve the calendar's web view
            let head = content.trim_start();
            if head.starts_with("<!DOCTYPE") || head.starts_with("<!doctype") || head.starts_with("<html") {
                return Err(AppError::feed_fetch(
                    "the server returned HTML instead of a calendar file; use the calendar's ICS (iCal) address rather than its web page",
                ));
            }

            Ok(content)
        }
    }).await
}

/// Resolve an ICS date or date-time to an instant with offset.
///
/// Floating times and date-only values are read as wall time in `local`;
/// a TZID chrono-tz does not know is treated the same way.
pub fn resolve_ical_datetime<Tz: TimeZone>(dt: &DatePerhapsTime, local: &Tz) -> Option<DateTime<FixedOffset>> {
    match dt {
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(dt.fixed_offset()),

        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => wall_time_in(local, naive),

        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            match parse_tzid(tzid) {
                Some(zone) => wall_time_in(&zone, date_time),
                None => {
                    log::warn!("Unrecognized timezone '{}', treating as local time", tzid);
                    wall_time_in(local, date_time)
                }
            }
        }

        DatePerhapsTime::Date(date) => wall_time_in(local, &date.and_time(NaiveTime::MIN)),
    }
}

pub fn parse_tzid(tzid: &str) -> Option<chrono_tz::Tz> {
    tzid.trim().trim_matches('"').parse::<chrono_tz::Tz>().ok()
}

// Ambiguous wall times take the earlier instant; times skipped by a DST
// jump move forward an hour.
pub(crate) fn wall_time_in<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(*naive + Duration::hours(1))).earliest())
        .map(|dt| dt.fixed_offset())
}

/// Decode RFC 5545 TEXT escapes: `\,` `\;` `\\` `\n`.
pub fn unescape_text(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(',') => {
                    result.push(',');
                    chars.next();
                }
                Some(';') => {
                    result.push(';');
                    chars.next();
                }
                Some('\\') => {
                    result.push('\\');
                    chars.next();
                }
                Some('n') | Some('N') => {
                    result.push('\n');
                    chars.next();
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Parse a DURATION value (`PT45M`, `P1D`, `+PT1H`). Negative durations
/// cannot describe an event length and yield `None`.
pub fn parse_ics_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.starts_with('-') {
        return None;
    }
    let parsed = iso8601::duration(value.trim_start_matches('+')).ok()?;
    let std_duration: std::time::Duration = parsed.into();
    Duration::from_std(std_duration).ok()
}
