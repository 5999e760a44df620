pub mod retry;
pub mod logging;

/// Collapses every run of whitespace (newlines included) into one space and
/// trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapsed text, or `None` when nothing but whitespace remains.
pub fn collapse_optional(text: Option<&str>) -> Option<String> {
    text.map(collapse_whitespace).filter(|s| !s.is_empty())
}

pub fn normalize_title(title: &str) -> String {
    let collapsed = collapse_whitespace(title);
    if collapsed.is_empty() {
        "No title".to_string()
    } else {
        collapsed
    }
}
