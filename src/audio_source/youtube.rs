//! YouTube video references.

use crate::error::{Result, SvarError};
use regex::Regex;
use std::sync::OnceLock;

fn safe_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"))
}

/// Extract the video ID from a YouTube URL or bare ID.
///
/// Watch URLs take everything after the last `v=` up to the next `&` or `#`.
/// Short links (`youtu.be/<id>`), `/shorts/<id>`, `/embed/<id>` and bare IDs are
/// also accepted. The result is used as a cache file name, so only
/// `[A-Za-z0-9_-]` characters are allowed.
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    let candidate = if let Some(pos) = input.rfind("v=") {
        let rest = &input[pos + 2..];
        rest.split(['&', '#']).next().unwrap_or_default().to_string()
    } else if let Some(id) = id_from_path(input) {
        id
    } else {
        input.to_string()
    };

    if candidate.is_empty() || !safe_id_regex().is_match(&candidate) {
        return Err(SvarError::InvalidInput(format!(
            "Could not extract a YouTube video ID from: {}",
            input
        )));
    }

    Ok(candidate)
}

/// Video ID from path-style URLs.
fn id_from_path(input: &str) -> Option<String> {
    let parsed = url::Url::parse(input).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.").to_string();
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    match host.as_str() {
        "youtu.be" => segments.next().map(str::to_string),
        h if h.ends_with("youtube.com") => {
            let kind = segments.next()?;
            match kind {
                "shorts" | "embed" | "v" | "live" => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
