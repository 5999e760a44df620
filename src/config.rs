//! Configuration module
//!
//! Widget settings come from an optional TOML file, then environment
//! overrides, then validation. Everything has a default so a bare run with
//! a source argument needs no file at all.

use crate::calendar::expand::ExpansionWindow;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_SOURCE: &str = "MEETWIDGET_SOURCE";
pub const ENV_FETCH_TIMEOUT: &str = "MEETWIDGET_FETCH_TIMEOUT_SECS";

/// Longest span either side of `now` a rolling window may cover.
pub const MAX_WINDOW_HOURS: i64 = 24 * 366;

/// Which occurrences the expander materializes, relative to `now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WindowSpec {
    /// The local calendar day containing `now`
    #[default]
    Today,
    /// A span around `now`
    Rolling { hours_before: i64, hours_ahead: i64 },
}

impl WindowSpec {
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> ExpansionWindow {
        match self {
            WindowSpec::Today => {
                let tz = now.timezone();
                let today = now.date_naive();
                let tomorrow = today.succ_opt().unwrap_or(NaiveDate::MAX);
                ExpansionWindow::new(local_midnight(&tz, today), local_midnight(&tz, tomorrow))
            }
            WindowSpec::Rolling { hours_before, hours_ahead } => {
                // Unvalidated spans are clamped rather than allowed to overflow
                let now = now.with_timezone(&Utc);
                let before = Duration::hours((*hours_before).clamp(0, MAX_WINDOW_HOURS));
                let ahead = Duration::hours((*hours_ahead).clamp(0, MAX_WINDOW_HOURS));
                ExpansionWindow::new(
                    now.checked_sub_signed(before).unwrap_or(DateTime::<Utc>::MIN_UTC),
                    now.checked_add_signed(ahead).unwrap_or(DateTime::<Utc>::MAX_UTC),
                )
            }
        }
    }
}

// A midnight skipped by a DST jump falls back to reading the wall time as UTC.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Feed used when no source is passed explicitly
    pub source: Option<String>,
    pub window: WindowSpec,
    /// Host suffixes accepted as join links; empty accepts any http(s) URL
    pub meeting_hosts: Vec<String>,
    pub fetch_timeout_secs: u64,
    pub fetch_retries: u32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            source: None,
            window: WindowSpec::Today,
            meeting_hosts: Vec::new(),
            fetch_timeout_secs: 30,
            fetch_retries: 2,
        }
    }
}

impl WidgetConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("meetwidget").join("config.toml"))
    }

    /// Loads `path` if given, else the default location when it exists, then
    /// applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::config(format!("invalid config file: {}", e)))
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(source) = lookup(ENV_SOURCE).filter(|s| !s.trim().is_empty()) {
            self.source = Some(source);
        }

        if let Some(raw) = lookup(ENV_FETCH_TIMEOUT) {
            self.fetch_timeout_secs = raw.trim().parse().map_err(|_| {
                AppError::config(format!("{} must be a whole number of seconds, got '{}'", ENV_FETCH_TIMEOUT, raw))
            })?;
        }

        Ok(())
    }

    /// Picks the explicit source if one was given, else the configured one.
    pub fn source_or(&self, explicit: Option<&str>) -> AppResult<String> {
        explicit
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| self.source.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::source_resolution(format!(
                    "no calendar source given; pass one as an argument, set `source` in the config file, or set {}",
                    ENV_SOURCE
                ))
            })
    }
}

/// Validates the loaded configuration
pub fn validate_config(config: &WidgetConfig) -> AppResult<()> {
    if config.fetch_timeout_secs == 0 {
        return Err(AppError::config("fetch_timeout_secs must be greater than zero"));
    }

    if let WindowSpec::Rolling { hours_before, hours_ahead } = config.window {
        if hours_before < 0 || hours_ahead < 0 {
            return Err(AppError::config("rolling window hours cannot be negative"));
        }
        if hours_before > MAX_WINDOW_HOURS || hours_ahead > MAX_WINDOW_HOURS {
            return Err(AppError::config(format!(
                "rolling window hours cannot exceed {} on either side",
                MAX_WINDOW_HOURS
            )));
        }
        if hours_before + hours_ahead == 0 {
            return Err(AppError::config("rolling window must span at least one hour"));
        }
    }

    if config.meeting_hosts.iter().any(|host| host.trim().is_empty()) {
        return Err(AppError::config("meeting_hosts cannot contain blank entries"));
    }

    info!("Configuration validated ({:?} window)", config.window);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_defaults_pass_validation() {
        assert!(validate_config(&WidgetConfig::default()).is_ok());
    }

    #[test]
    fn test_parse_rolling_window_from_toml() {
        let config = WidgetConfig::from_toml_str(
            r#"
source = "webcal://example.com/team.ics"
meeting_hosts = ["zoom.us"]

[window]
mode = "rolling"
hours_before = 2
hours_ahead = 24
"#,
        )
        .unwrap();

        assert_eq!(config.source.as_deref(), Some("webcal://example.com/team.ics"));
        assert_eq!(config.window, WindowSpec::Rolling { hours_before: 2, hours_ahead: 24 });
        assert_eq!(config.meeting_hosts, vec!["zoom.us".to_string()]);
        assert_eq!(config.fetch_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = WidgetConfig::from_toml_str("window = 7").unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_timeout = WidgetConfig { fetch_timeout_secs: 0, ..WidgetConfig::default() };
        assert!(validate_config(&zero_timeout).is_err());

        let negative = WidgetConfig {
            window: WindowSpec::Rolling { hours_before: -1, hours_ahead: 4 },
            ..WidgetConfig::default()
        };
        assert!(validate_config(&negative).is_err());

        let huge = WidgetConfig {
            window: WindowSpec::Rolling { hours_before: 1, hours_ahead: i64::MAX / 2 },
            ..WidgetConfig::default()
        };
        let err = validate_config(&huge).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error: rolling window hours cannot exceed"));

        let blank_host = WidgetConfig { meeting_hosts: vec![" ".to_string()], ..WidgetConfig::default() };
        assert!(validate_config(&blank_host).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = WidgetConfig::default();
        config
            .apply_env(|key| match key {
                ENV_SOURCE => Some("/tmp/cal.ics".to_string()),
                ENV_FETCH_TIMEOUT => Some("12".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.source.as_deref(), Some("/tmp/cal.ics"));
        assert_eq!(config.fetch_timeout_secs, 12);

        let err = config
            .apply_env(|key| (key == ENV_FETCH_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_FETCH_TIMEOUT));
    }

    #[test]
    fn test_source_or_prefers_explicit() {
        let config = WidgetConfig { source: Some("https://a.example/cal.ics".to_string()), ..WidgetConfig::default() };
        assert_eq!(config.source_or(Some("/tmp/b.ics")).unwrap(), "/tmp/b.ics");
        assert_eq!(config.source_or(Some("  ")).unwrap(), "https://a.example/cal.ics");

        let err = WidgetConfig::default().source_or(None).unwrap_err();
        assert!(matches!(err, AppError::SourceResolution(_)));
    }

    #[test]
    fn test_oversized_rolling_window_is_clamped() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let window = WindowSpec::Rolling { hours_before: i64::MAX, hours_ahead: i64::MAX / 2 }.resolve(&now);

        assert_eq!(window.start, now - Duration::hours(MAX_WINDOW_HOURS));
        assert_eq!(window.end, now + Duration::hours(MAX_WINDOW_HOURS));
    }

    #[test]
    fn test_today_window_spans_local_day() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2025, 3, 10, 9, 20, 0).unwrap();

        let window = WindowSpec::Today.resolve(&now);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 9, 22, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 10, 22, 0, 0).unwrap());
    }

    #[test]
    fn test_rolling_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let window = WindowSpec::Rolling { hours_before: 1, hours_ahead: 3 }.resolve(&now);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap());
    }
}
