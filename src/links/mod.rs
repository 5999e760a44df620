//! Meeting link extraction.
//!
//! Fields are scanned in a fixed priority order (location, then title, then
//! description) and the first field yielding a usable link wins. Within a
//! field, matches are tried left to right.

use crate::config::WidgetConfig;
use crate::models::{RawOccurrence, VideoMeetingInfo};
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

pub mod deeplink;

pub use deeplink::{resolve_deep_link, resolve_join_target};

lazy_static! {
    /// Any http(s) URL, or a scheme-less link on a known meeting host.
    static ref MEETING_LINK_RE: Option<Regex> = Regex::new(
        r#"(?i)(https?://[^\s<>"]+|\b(?:[a-z0-9-]+\.)*(?:zoom\.us|zoomgov\.com|meet\.google\.com|teams\.microsoft\.com|teams\.live\.com|webex\.com|whereby\.com|meet\.jit\.si|gotomeeting\.com|bluejeans\.com)/[^\s<>"]+)"#
    )
    .ok();

    /// A scheme at the very start; `://` later in a query does not count.
    static ref LEADING_SCHEME_RE: Option<Regex> = Regex::new(r"(?i)^[a-z][a-z0-9+.-]*://").ok();
}

const TRAILING_PUNCTUATION: &[char] = &[')', '.', ',', ';'];

const KNOWN_PROVIDERS: &[(&str, &str)] = &[
    ("zoom.us", "Zoom"),
    ("zoomgov.com", "Zoom"),
    ("meet.google.com", "Google Meet"),
    ("teams.microsoft.com", "Teams"),
    ("teams.live.com", "Teams"),
    ("webex.com", "Webex"),
    ("meet.jit.si", "Jitsi"),
    ("whereby.com", "Whereby"),
    ("gotomeeting.com", "GoToMeeting"),
    ("bluejeans.com", "BlueJeans"),
];

/// An event field a link may be pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    Location,
    Summary,
    Description,
}

/// Scan order; earlier fields win.
pub const FIELD_PRIORITY: [LinkField; 3] = [LinkField::Location, LinkField::Summary, LinkField::Description];

impl LinkField {
    pub fn text_of<'a>(&self, occurrence: &'a RawOccurrence) -> Option<&'a str> {
        match self {
            LinkField::Location => occurrence.location.as_deref(),
            LinkField::Summary => Some(occurrence.title.as_str()),
            LinkField::Description => occurrence.description.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRules {
    /// Host suffixes a link must match; empty accepts any host
    allowed_hosts: Vec<String>,
}

impl LinkRules {
    pub fn new<I, S>(allowed_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|host| host.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|host| !host.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &WidgetConfig) -> Self {
        Self::new(&config.meeting_hosts)
    }

    /// First usable link across the occurrence's fields, in priority order.
    pub fn extract(&self, occurrence: &RawOccurrence) -> Option<VideoMeetingInfo> {
        FIELD_PRIORITY
            .iter()
            .filter_map(|field| field.text_of(occurrence))
            .find_map(|text| self.first_link_in(text))
    }

    pub fn first_link_in(&self, text: &str) -> Option<VideoMeetingInfo> {
        MEETING_LINK_RE
            .as_ref()?
            .find_iter(text)
            .find_map(|m| self.canonicalize(m.as_str()))
            .map(|url| VideoMeetingInfo::new(platform_for_url(&url), url))
    }

    /// Clean a candidate and give it a scheme; `None` if it is not an
    /// http(s) link on an accepted host.
    pub fn canonicalize(&self, candidate: &str) -> Option<String> {
        canonicalize_join_url(candidate, self.allowed_hosts.as_slice())
    }
}

pub fn canonicalize_join_url<S: AsRef<str>>(candidate: &str, allowed_hosts: &[S]) -> Option<String> {
    let cleaned = candidate.trim().trim_end_matches(TRAILING_PUNCTUATION);
    if cleaned.is_empty() {
        return None;
    }

    let has_scheme = LEADING_SCHEME_RE.as_ref().is_some_and(|re| re.is_match(cleaned));
    let url = if has_scheme {
        cleaned.to_string()
    } else {
        format!("https://{}", cleaned)
    };

    let parsed = Url::parse(&url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let host = parsed.host_str()?.to_lowercase();
    if !allowed_hosts.is_empty() && !allowed_hosts.iter().any(|suffix| host_matches(&host, suffix.as_ref())) {
        log::debug!("Ignoring link on non-meeting host {}", host);
        return None;
    }

    Some(url)
}

pub(crate) fn host_matches(host: &str, suffix: &str) -> bool {
    let suffix = suffix.trim().trim_start_matches('.');
    host.eq_ignore_ascii_case(suffix)
        || (host.len() > suffix.len()
            && host.to_lowercase().ends_with(&format!(".{}", suffix.to_lowercase())))
}

pub fn platform_for_url(url: &str) -> &'static str {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            let host = parsed.host_str()?.to_string();
            KNOWN_PROVIDERS
                .iter()
                .find(|(suffix, _)| host_matches(&host, suffix))
                .map(|(_, platform)| *platform)
        })
        .unwrap_or("Meeting")
}
