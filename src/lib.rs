// meetwidget library
// Calendar feed -> normalized meeting list with join links and relative labels

pub mod calendar;
pub mod config;
pub mod error;
pub mod http_config;
pub mod links;
pub mod models;
pub mod normalize;
pub mod utils;

// Re-export commonly used types
pub use calendar::expand::{expand_feed, ExpansionWindow};
pub use calendar::{load_feed, FeedSource};
pub use config::{validate_config, WidgetConfig, WindowSpec};
pub use error::{AppError, AppResult};
pub use links::{canonicalize_join_url, resolve_deep_link, resolve_join_target, LinkRules};
pub use models::*;
pub use normalize::{build_schedule, relabel};

use chrono::{DateTime, TimeZone};
use http_config::HttpConfig;
use log::{debug, error, warn};
use std::time::Instant;

/// Expand and normalize ICS text already in memory. No I/O.
pub fn schedule_from_ics<Tz: TimeZone>(ics: &str, now: &DateTime<Tz>, config: &WidgetConfig) -> AppResult<Schedule> {
    let window = config.window.resolve(now);
    debug!("Expanding feed for {} .. {}", window.start, window.end);

    let occurrences = expand_feed(ics, &window, &now.timezone())?;
    Ok(build_schedule(&occurrences, now, &LinkRules::from_config(config)))
}

/// Resolve, fetch, expand and normalize one feed.
pub async fn try_load_schedule<Tz: TimeZone>(
    source: &str,
    now: &DateTime<Tz>,
    config: &WidgetConfig,
) -> AppResult<Schedule> {
    let started = Instant::now();
    let feed = FeedSource::resolve(source)?;
    let ics = load_feed(&feed, &HttpConfig::from_widget_config(config)).await?;
    let schedule = schedule_from_ics(&ics, now, config)?;

    utils::logging::log_feed_loaded(&feed.describe(), schedule.events.len(), started.elapsed().as_millis() as u64);
    Ok(schedule)
}

/// Like [`try_load_schedule`], but any failure becomes an error result with
/// no events.
pub async fn load_schedule<Tz: TimeZone>(source: &str, now: &DateTime<Tz>, config: &WidgetConfig) -> ScheduleResult {
    match try_load_schedule(source, now, config).await {
        Ok(schedule) => ScheduleResult::Loaded(schedule),
        Err(e) => {
            if e.is_pipeline_failure() {
                warn!("Schedule unavailable: {}", e);
            } else {
                error!("Schedule unavailable: {}", e);
            }
            ScheduleResult::from(e)
        }
    }
}
