use serde::{Deserialize, Serialize};

/// A meeting link found in an event's text fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMeetingInfo {
    pub platform: String,
    /// Canonical web URL, always carrying an http(s) scheme
    pub url: String,
}

impl VideoMeetingInfo {
    pub fn new(platform: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            url: url.into(),
        }
    }
}

/// How a web meeting URL named the meeting it joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeepLinkKind {
    /// `/j/<id>`
    JoinById,
    /// `/w/<id>`
    WebinarById,
    /// `?confno=<id>`
    JoinByConfno,
}

/// A native-app URL equivalent to a web meeting URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub kind: DeepLinkKind,
    pub meeting_id: String,
    pub password: Option<String>,
    pub url: String,
}

/// What a join action opens: the deep link if the web URL had a
/// recognizable shape, otherwise the web URL itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTarget {
    pub web_url: String,
    pub deep_link: Option<DeepLink>,
}

impl JoinTarget {
    pub fn preferred_url(&self) -> &str {
        self.deep_link
            .as_ref()
            .map(|link| link.url.as_str())
            .unwrap_or(&self.web_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_target_prefers_deep_link() {
        let target = JoinTarget {
            web_url: "https://zoom.us/j/123".to_string(),
            deep_link: Some(DeepLink {
                kind: DeepLinkKind::JoinById,
                meeting_id: "123".to_string(),
                password: None,
                url: "zoommtg://zoom.us/join?action=join&confno=123".to_string(),
            }),
        };
        assert_eq!(target.preferred_url(), "zoommtg://zoom.us/join?action=join&confno=123");

        let fallback = JoinTarget { deep_link: None, ..target };
        assert_eq!(fallback.preferred_url(), "https://zoom.us/j/123");
    }
}
