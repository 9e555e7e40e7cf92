pub mod completion;
pub mod config;
pub mod prompt;
pub mod search;
pub mod server;
pub mod summary;
pub mod youtube;

#[cfg(test)]
pub(crate) mod test_http;

use std::sync::LazyLock;

use regex::Regex;

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// A single search hit, possibly lacking a video id (channels, playlists)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoCandidate {
    pub video_id: Option<String>,
    pub title: String,
    pub channel_title: String,
}

impl VideoCandidate {
    /// The video id, if present and non-empty
    pub fn usable_id(&self) -> Option<&str> {
        self.video_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Metadata attached to a fetched transcript
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub source: String,
    pub language: String,
    pub title: String,
}

/// Raw transcript text for one video
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptDocument {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

/// Pick the first candidate that carries a usable video id, in provider order
pub fn select_candidate(candidates: &[VideoCandidate]) -> Option<&VideoCandidate> {
    candidates.iter().find(|c| c.usable_id().is_some())
}

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL_PREFIX}{video_id}")
}

static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Bare 11-character video ID
        r"^([a-zA-Z0-9_-]{11})$",
        r"youtube\.com/watch\?.*v=([a-zA-Z0-9_-]{11})",
        r"youtu\.be/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}
