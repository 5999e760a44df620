// Calendar feed loading
// Resolves a source string once into HTTP or file form, then fetches the ICS text

use crate::error::{AppError, AppResult};
use crate::http_config::HttpConfig;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::Url;

pub mod common;
pub mod expand;

/// Where a feed comes from. `webcal`/`webcals` sources are rewritten to
/// `https` before they get here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Http(Url),
    File(PathBuf),
}

impl FeedSource {
    /// Accepts `http(s)://`, `webcal(s)://`, `file://` and bare paths
    /// (`~` expands to the home directory).
    pub fn resolve(source: &str) -> AppResult<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(AppError::source_resolution("calendar source is empty"));
        }

        match Url::parse(source) {
            // Single-letter schemes are Windows drive letters, not URLs
            Ok(url) if url.scheme().len() > 1 => Self::from_url(url, source),
            _ => Ok(FeedSource::File(expand_home(source))),
        }
    }

    fn from_url(url: Url, original: &str) -> AppResult<Self> {
        match url.scheme() {
            "http" | "https" => Ok(FeedSource::Http(url)),
            "webcal" | "webcals" => {
                let rewritten = format!("https{}", &original[url.scheme().len()..]);
                Url::parse(&rewritten)
                    .map(FeedSource::Http)
                    .map_err(|e| AppError::source_resolution(format!("invalid webcal URL '{}': {}", original, e)))
            }
            "file" => url
                .to_file_path()
                .map(FeedSource::File)
                .map_err(|_| AppError::source_resolution(format!("invalid file URL '{}'", original))),
            other => Err(AppError::source_resolution(format!(
                "unsupported source scheme '{}' in '{}'; use http(s), webcal, file or a local path",
                other, original
            ))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FeedSource::Http(url) => url.to_string(),
            FeedSource::File(path) => path.display().to_string(),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Fetch the raw ICS text for a resolved source.
pub async fn load_feed(source: &FeedSource, http: &HttpConfig) -> AppResult<String> {
    match source {
        FeedSource::Http(url) => common::fetch_ics_data(url, http).await,
        FeedSource::File(path) => read_feed_file(path).await,
    }
}

async fn read_feed_file(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::feed_fetch(format!("calendar file not found: {}", path.display())),
        ErrorKind::PermissionDenied => {
            AppError::feed_fetch(format!("permission denied reading {}", path.display()))
        }
        _ => AppError::feed_fetch(format!("cannot read {}: {}", path.display(), e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_http_sources() {
        let source = FeedSource::resolve("https://calendar.example.com/team.ics").unwrap();
        assert_eq!(source, FeedSource::Http(Url::parse("https://calendar.example.com/team.ics").unwrap()));

        let plain = FeedSource::resolve("http://intranet.example.com/cal.ics").unwrap();
        assert!(matches!(plain, FeedSource::Http(url) if url.scheme() == "http"));
    }

    #[test]
    fn test_resolve_webcal_rewrites_to_https() {
        let source = FeedSource::resolve("webcal://p01-calendars.icloud.com/published/2/abc").unwrap();
        assert_eq!(source.describe(), "https://p01-calendars.icloud.com/published/2/abc");

        let secure = FeedSource::resolve("webcals://example.com/feed.ics").unwrap();
        assert_eq!(secure.describe(), "https://example.com/feed.ics");
    }

    #[test]
    fn test_resolve_file_url_decodes_path() {
        let source = FeedSource::resolve("file:///tmp/my%20calendar.ics").unwrap();
        assert_eq!(source, FeedSource::File(PathBuf::from("/tmp/my calendar.ics")));
    }

    #[test]
    fn test_resolve_bare_paths() {
        assert_eq!(
            FeedSource::resolve("/var/cal/team.ics").unwrap(),
            FeedSource::File(PathBuf::from("/var/cal/team.ics"))
        );
        assert_eq!(
            FeedSource::resolve("calendars/team.ics").unwrap(),
            FeedSource::File(PathBuf::from("calendars/team.ics"))
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(FeedSource::resolve("~/team.ics").unwrap(), FeedSource::File(home.join("team.ics")));
        }
    }

    #[test]
    fn test_resolve_rejects_empty_and_unknown_schemes() {
        let err = FeedSource::resolve("   ").unwrap_err();
        assert!(matches!(err, AppError::SourceResolution(_)));

        let err = FeedSource::resolve("ftp://example.com/cal.ics").unwrap_err();
        assert!(err.to_string().contains("unsupported source scheme 'ftp'"));
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let source = FeedSource::File(PathBuf::from("/definitely/not/here/cal.ics"));
        let err = load_feed(&source, &HttpConfig::ics_fetch()).await.unwrap_err();
        assert!(matches!(err, AppError::FeedFetch(_)));
        assert!(err.to_string().contains("calendar file not found"));
    }
}
