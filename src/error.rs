use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Could not determine calendar source: {0}")]
    SourceResolution(String),

    #[error("Failed to fetch calendar feed: {0}")]
    FeedFetch(String),

    #[error("Failed to parse calendar feed: {0}")]
    FeedParse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn source_resolution<S: Into<String>>(msg: S) -> Self {
        Self::SourceResolution(msg.into())
    }

    pub fn feed_fetch<S: Into<String>>(msg: S) -> Self {
        Self::FeedFetch(msg.into())
    }

    pub fn feed_parse<S: Into<String>>(msg: S) -> Self {
        Self::FeedParse(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether retrying the same fetch could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::FeedFetch(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("connection")
                    || msg.contains("network")
                    || msg.contains("temporary")
                    || msg.contains("too many requests")
                    || msg.contains("service unavailable")
                    || msg.contains("bad gateway")
                    || msg.contains("gateway timeout")
                    || msg.contains("429")
                    || msg.contains("502")
                    || msg.contains("503")
                    || msg.contains("504")
            }
            Self::SourceResolution(_) | Self::FeedParse(_) | Self::Config(_) => false,
        }
    }

    /// Errors that end a pipeline run and are shown to the user as-is.
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(
            self,
            Self::SourceResolution(_) | Self::FeedFetch(_) | Self::FeedParse(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_prefixed_by_kind() {
        let err = AppError::feed_fetch("HTTP 404 Not Found");
        assert_eq!(err.to_string(), "Failed to fetch calendar feed: HTTP 404 Not Found");

        let err = AppError::feed_parse("missing VCALENDAR");
        assert_eq!(err.to_string(), "Failed to parse calendar feed: missing VCALENDAR");

        let err = AppError::source_resolution("no source configured");
        assert!(err.to_string().starts_with("Could not determine calendar source"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::feed_fetch("Request failed: connection reset").is_transient());
        assert!(AppError::feed_fetch("HTTP 503 Service Unavailable").is_transient());
        assert!(!AppError::feed_fetch("HTTP 404 Not Found").is_transient());
        assert!(!AppError::feed_parse("timeout in text").is_transient());
    }

    #[test]
    fn test_pipeline_failure_kinds() {
        assert!(AppError::source_resolution("x").is_pipeline_failure());
        assert!(AppError::feed_fetch("x").is_pipeline_failure());
        assert!(AppError::feed_parse("x").is_pipeline_failure());
        assert!(!AppError::config("x").is_pipeline_failure());
    }
}
