//! Web meeting URL to native `zoommtg://` deep link.
//!
//! Recognized shapes, in order: `/j/<id>`, `/w/<id>`, `?confno=<id>`. The
//! deep link carries the web URL percent-encoded in its `fallback`
//! parameter so the client can open it directly if no native handler is
//! installed. Anything else keeps the web URL as the join target.
//!
//! Zoom's `join` action accepts meeting and webinar ids alike, so all three
//! shapes produce the same deep link form; [`DeepLinkKind`] only records
//! which shape the web URL had.

use crate::links::host_matches;
use crate::models::{DeepLink, DeepLinkKind, JoinTarget};
use url::{form_urlencoded, Url};

const DEEP_LINK_SCHEME: &str = "zoommtg";
const NATIVE_HOSTS: &[&str] = &["zoom.us", "zoomgov.com"];

pub fn resolve_deep_link(web_url: &str) -> Option<DeepLink> {
    let url = Url::parse(web_url).ok()?;
    let host = url.host_str()?.to_lowercase();
    if !NATIVE_HOSTS.iter().any(|native| host_matches(&host, native)) {
        return None;
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let param = |name: &str| {
        query
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let (kind, meeting_id) = segment_after(&segments, "j")
        .map(|id| (DeepLinkKind::JoinById, id))
        .or_else(|| segment_after(&segments, "w").map(|id| (DeepLinkKind::WebinarById, id)))
        .or_else(|| param("confno").map(|id| (DeepLinkKind::JoinByConfno, id)))?;
    let password = param("pwd");

    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair("action", "join");
    params.append_pair("confno", &meeting_id);
    if let Some(password) = &password {
        params.append_pair("pwd", password);
    }
    params.append_pair("fallback", web_url);

    Some(DeepLink {
        kind,
        url: format!("{}://{}/join?{}", DEEP_LINK_SCHEME, host, params.finish()),
        meeting_id,
        password,
    })
}

/// Pair a web URL with its deep link, if it has one.
pub fn resolve_join_target(web_url: &str) -> JoinTarget {
    JoinTarget {
        web_url: web_url.to_string(),
        deep_link: resolve_deep_link(web_url),
    }
}

fn segment_after(segments: &[&str], marker: &str) -> Option<String> {
    segments
        .windows(2)
        .find(|pair| pair[0].eq_ignore_ascii_case(marker) && is_meeting_id(pair[1]))
        .map(|pair| pair[1].to_string())
}

fn is_meeting_id(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
