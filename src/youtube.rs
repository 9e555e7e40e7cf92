use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::{DocumentMetadata, TranscriptDocument};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("not a YouTube video URL: {0:?}")]
    InvalidUrl(String),

    #[error("transcript unavailable for {video_id}: {reason}")]
    Unavailable { video_id: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Transcript text source for a video URL, restricted to one language
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    async fn fetch(&self, video_url: &str, language: &str) -> Result<Vec<TranscriptDocument>, TranscriptError>;
}

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

/// Transcripts from YouTube's built-in captions via the InnerTube API
pub struct CaptionTranscripts {
    client: reqwest::Client,
    base_url: String,
}

impl CaptionTranscripts {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TranscriptProvider for CaptionTranscripts {
    async fn fetch(&self, video_url: &str, language: &str) -> Result<Vec<TranscriptDocument>, TranscriptError> {
        let video_id =
            crate::extract_video_id(video_url).ok_or_else(|| TranscriptError::InvalidUrl(video_url.to_string()))?;

        let watch_url = format!("{}/watch?v={video_id}", self.base_url);
        debug!("Fetching watch page: {watch_url}");

        let page_html = self
            .client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        let player_url = format!("{}/youtubei/v1/player?key={api_key}&prettyPrint=false", self.base_url);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": language,
                    "gl": "BR",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let player_body = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let resp: InnerTubePlayerResponse = serde_json::from_str(&player_body)
            .map_err(|e| TranscriptError::Malformed(format!("invalid player response: {e}")))?;

        let Some((track_url, title)) = select_track(resp, &video_id, language)? else {
            debug!("No caption tracks for {video_id}");
            return Ok(Vec::new());
        };
        debug!("Using caption track: video={video_id} lang={language}");

        let caption_xml = self
            .client
            .get(&track_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let page_content = parse_caption_xml(&caption_xml)?;

        Ok(vec![TranscriptDocument {
            page_content,
            metadata: DocumentMetadata {
                source: video_id,
                language: language.to_string(),
                title,
            },
        }])
    }
}

/// Find the caption track for exactly `language`; no fallback to other tracks.
/// `None` when the video has no captions at all.
fn select_track(
    resp: InnerTubePlayerResponse,
    video_id: &str,
    language: &str,
) -> Result<Option<(String, String)>, TranscriptError> {
    let unavailable = |reason: String| TranscriptError::Unavailable {
        video_id: video_id.to_string(),
        reason,
    };

    if let Some(status) = &resp.playability_status {
        let state = status.status.as_deref().unwrap_or("OK");
        if state != "OK" {
            let reason = status.reason.clone().unwrap_or_else(|| state.to_string());
            return Err(unavailable(format!("video not playable: {reason}")));
        }
    }

    let title = resp
        .video_details
        .as_ref()
        .and_then(|vd| vd.title.clone())
        .unwrap_or_default();

    let tracks = resp
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Ok(None);
    }

    let track = tracks.into_iter().find(|t| t.language_code == language).ok_or_else(|| {
        unavailable(format!("no caption track in language {language:?}"))
    })?;

    Ok(Some((track.base_url, title)))
}

fn extract_api_key(html: &str) -> Result<String, TranscriptError> {
    let patterns = [r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#, r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#];

    for pattern in patterns {
        let re = Regex::new(pattern).map_err(|e| TranscriptError::Malformed(e.to_string()))?;
        if let Some(caps) = re.captures(html) {
            return Ok(caps[1].to_string());
        }
    }

    Err(TranscriptError::Malformed(
        "could not extract InnerTube API key from watch page".to_string(),
    ))
}

/// Parse timed-text XML into a single space-joined transcript string
fn parse_caption_xml(xml: &str) -> Result<String, TranscriptError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut pieces: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                in_text = true;
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                in_text = false;
            }
            Ok(Event::Text(ref e)) if in_text => {
                let raw_text = e.unescape().unwrap_or_default().to_string();
                let text = html_escape::decode_html_entities(&raw_text).trim().to_string();
                if !text.is_empty() {
                    pieces.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TranscriptError::Malformed(format!("error parsing caption XML: {e}"))),
            _ => {}
        }
    }

    Ok(pieces.join(" "))
}
