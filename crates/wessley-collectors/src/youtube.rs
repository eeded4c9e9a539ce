//! YouTube collector (§4.4): `source = "youtube"`.
//!
//! Scrapes the public watch-page innertube payload for caption tracks,
//! prefers non-ASR English, falls back to ASR English, then any language,
//! and cleans the fetched transcript before emitting a document.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;
use wessley_core::{Context, Error, Result, RetryOptions};
use wessley_domain::{DocumentMetadata, ScrapedDocument};

use crate::harness::CollectorHttp;
use crate::Collector;

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    #[serde(rename = "kind", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsRenderer {
    #[serde(rename = "captionTracks", default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
struct CaptionsContainer {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: CaptionsRenderer,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: String,
    author: String,
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    captions: Option<CaptionsContainer>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

fn player_response_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"var ytInitialPlayerResponse\s*=\s*(\{.+?\});").unwrap()
    })
}

fn bracket_noise_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)\[(music|applause|laughter|cheering|inaudible)\]").unwrap()
    })
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"\s+").unwrap()
    })
}

/// Picks the best caption track: non-ASR English, then ASR English, then
/// the first available track of any language (§4.4).
fn select_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language_code.starts_with("en") && t.kind.as_deref() != Some("asr"))
        .or_else(|| tracks.iter().find(|t| t.language_code.starts_with("en")))
        .or_else(|| tracks.first())
}

fn parse_transcript_xml(xml: &str) -> Vec<String> {
    use quick_xml::events::Event;
    use quick_xml::reader::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut texts = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => {
                if let Ok(text) = e.unescape() {
                    let decoded = html_escape::decode_html_entities(&text).to_string();
                    if !decoded.trim().is_empty() {
                        texts.push(decoded);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    texts
}

fn clean_transcript(raw_segments: &[String]) -> String {
    let joined = raw_segments.join(" ");
    let no_brackets = bracket_noise_regex().replace_all(&joined, "");
    whitespace_regex().replace_all(no_brackets.trim(), " ").to_string()
}

pub struct YouTubeCollector {
    http: CollectorHttp,
    video_ids: Vec<String>,
}

impl YouTubeCollector {
    pub fn new(video_ids: Vec<String>) -> Result<Self> {
        let http = CollectorHttp::new(
            "wessley-bot/0.1 (automotive repair knowledge collector)",
            Duration::from_millis(2000),
            RetryOptions {
                max_attempts: 2,
                initial_wait: Duration::from_secs(5),
                max_wait: Duration::from_secs(20),
                jitter: true,
            },
        )?;
        Ok(YouTubeCollector { http, video_ids })
    }

    async fn fetch_video(&self, ctx: &Context, video_id: &str) -> Result<ScrapedDocument> {
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        let html = self.http.get_text(ctx, &watch_url).await?;

        let captured = player_response_regex()
            .captures(&html)
            .ok_or_else(|| Error::TerminalIo(format!("no player response found for {video_id}")))?;
        let json_text = &captured[1];
        let player_response: PlayerResponse = serde_json::from_str(json_text)
            .map_err(|e| Error::TerminalIo(format!("parse player response for {video_id}: {e}")))?;

        let captions = player_response
            .captions
            .ok_or_else(|| Error::TerminalIo(format!("video {video_id} has no captions available")))?;
        let track = select_track(&captions.player_captions_tracklist_renderer.caption_tracks)
            .ok_or_else(|| Error::TerminalIo(format!("video {video_id} has no usable caption track")))?;

        let xml = self.http.get_text(ctx, &track.base_url).await?;
        let segments = parse_transcript_xml(&xml);
        let content = clean_transcript(&segments);

        let title = player_response
            .video_details
            .as_ref()
            .map(|d| d.title.clone())
            .unwrap_or_else(|| video_id.to_string());
        let author = player_response.video_details.map(|d| d.author);

        Ok(ScrapedDocument {
            source: "youtube".to_string(),
            source_id: video_id.to_string(),
            title,
            content,
            author,
            url: Some(watch_url),
            published_at: None,
            scraped_at: Utc::now(),
            metadata: DocumentMetadata::default(),
        })
    }
}

#[async_trait]
impl Collector for YouTubeCollector {
    async fn fetch_all(&self, ctx: &Context) -> Result<Vec<ScrapedDocument>> {
        let mut docs = Vec::new();
        for video_id in &self.video_ids {
            ctx.check()?;
            match self.fetch_video(ctx, video_id).await {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!(video_id, error = %e, "skipping video after transcript fetch failure"),
            }
        }
        Ok(docs)
    }
}
