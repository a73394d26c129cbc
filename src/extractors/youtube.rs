use async_trait::async_trait;
use reqwest::{Client, Proxy};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::process::Command;

use super::{
    classify_error_text, ChannelId, SourceError, StatsProvider, TrackKind, TranscriptFragment,
    TranscriptListing, TranscriptSource, TranscriptTrack, VideoEntry, VideoId, VideoLister,
    VideoStats,
};
use crate::Result;

/// Caption format requested from YouTube's timed-text endpoint
const CAPTION_FORMAT: &str = "json3";

type SourceResult<T> = std::result::Result<T, SourceError>;

/// YouTube transcript source, channel lister and stats provider backed by yt-dlp
pub struct YoutubeClient {
    yt_dlp_path: String,
    http: Client,
    timeout: Duration,
    /// Netscape cookies file handed to every yt-dlp call
    cookies: Option<PathBuf>,
    /// Counters parsed from metadata fetched while listing, consumed by `video_stats`
    stats_cache: Mutex<HashMap<VideoId, VideoStats>>,
}

impl YoutubeClient {
    pub fn new(yt_dlp_path: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            yt_dlp_path: yt_dlp_path.into(),
            http,
            timeout,
            cookies: None,
            stats_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Authenticate yt-dlp requests with an exported browser cookies file
    pub fn with_cookies(mut self, cookies: PathBuf) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Run yt-dlp and return its stdout, classifying stderr on failure
    async fn run_yt_dlp(&self, args: &[&str], proxy: Option<&str>) -> SourceResult<String> {
        let mut command = Command::new(&self.yt_dlp_path);
        command.args(args);
        if let Some(cookies) = &self.cookies {
            command.arg("--cookies").arg(cookies);
        }
        if let Some(proxy) = proxy {
            command.args(["--proxy", proxy]);
        }

        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                SourceError::Other(format!("failed to run {}: {}", self.yt_dlp_path, e))
            })?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(classify_error_text(&error, proxy.is_some()));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| SourceError::Other(format!("yt-dlp produced invalid UTF-8: {}", e)))
    }

    /// Get the full metadata document of one video
    async fn video_info(&self, video_id: &VideoId, proxy: Option<&str>) -> SourceResult<Value> {
        tracing::debug!("Fetching video info for: {}", video_id);

        let url = video_id.watch_url();
        let stdout = self
            .run_yt_dlp(
                &["--dump-json", "--skip-download", "--no-playlist", "--no-warnings", &url],
                proxy,
            )
            .await?;

        serde_json::from_str(&stdout)
            .map_err(|e| SourceError::Other(format!("failed to parse yt-dlp output: {}", e)))
    }

    /// HTTP client for a request, routed through `proxy` when given
    fn http_client(&self, proxy: Option<&str>) -> SourceResult<Client> {
        match proxy {
            None => Ok(self.http.clone()),
            Some(uri) => {
                let proxy = Proxy::all(uri).map_err(|e| {
                    SourceError::Connection(format!("invalid proxy {}: {}", uri, e))
                })?;
                Client::builder()
                    .timeout(self.timeout)
                    .proxy(proxy)
                    .build()
                    .map_err(|e| SourceError::Other(e.to_string()))
            }
        }
    }

    fn take_cached_stats(&self, video_id: &VideoId) -> Option<VideoStats> {
        self.stats_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(video_id)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeClient {
    async fn list_transcripts(
        &self,
        video_id: &VideoId,
        proxy: Option<String>,
    ) -> SourceResult<TranscriptListing> {
        let info = self.video_info(video_id, proxy.as_deref()).await?;
        let listing = parse_listing(&info)?;

        self.stats_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(video_id.clone(), parse_stats(&info));

        Ok(listing)
    }

    async fn fetch(
        &self,
        track: &TranscriptTrack,
        proxy: Option<String>,
    ) -> SourceResult<Vec<TranscriptFragment>> {
        tracing::debug!("Fetching {} transcript track", track.language_code);

        let proxied = proxy.is_some();
        let client = self.http_client(proxy.as_deref())?;

        let response = client
            .get(&track.url)
            .send()
            .await
            .map_err(|e| classify_error_text(&e.to_string(), proxied))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_error_text(&format!("HTTP {}", status), proxied));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_error_text(&e.to_string(), proxied))?;

        parse_json3(&body)
    }

    fn source_name(&self) -> &'static str {
        "YouTube"
    }
}

#[async_trait]
impl VideoLister for YoutubeClient {
    async fn list_videos(
        &self,
        channel: &ChannelId,
        limit: Option<usize>,
    ) -> Result<Vec<VideoEntry>> {
        let url = channel.videos_url();
        tracing::debug!("Listing videos from: {}", url);

        let playlist_end = limit.map(|n| n.to_string());
        let mut args = vec!["--flat-playlist", "--dump-json", "--no-warnings"];
        if let Some(end) = playlist_end.as_deref() {
            args.extend(["--playlist-end", end]);
        }
        args.push(&url);

        let stdout = self
            .run_yt_dlp(&args, None)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list videos for {}: {}", channel, e))?;

        let mut videos = parse_flat_playlist(&stdout);
        if let Some(limit) = limit {
            videos.truncate(limit);
        }
        Ok(videos)
    }
}

/// Counters come from the metadata document already fetched for the listing, so a
/// saved video costs one yt-dlp call and that call used the same proxy.
#[async_trait]
impl StatsProvider for YoutubeClient {
    async fn video_stats(&self, video_id: &VideoId) -> Option<VideoStats> {
        if let Some(stats) = self.take_cached_stats(video_id) {
            return Some(stats);
        }

        match self.video_info(video_id, None).await {
            Ok(info) => Some(parse_stats(&info)),
            Err(e) => {
                tracing::debug!("Could not fetch stats for {}: {}", video_id, e);
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CaptionFormat {
    ext: String,
    url: String,
    name: Option<String>,
}

/// Build a listing from yt-dlp's `subtitles` (manual) and `automatic_captions` (generated)
pub fn parse_listing(info: &Value) -> SourceResult<TranscriptListing> {
    let mut tracks = collect_tracks(&info["subtitles"], TrackKind::Manual)?;
    tracks.extend(collect_tracks(&info["automatic_captions"], TrackKind::Generated)?);

    if tracks.is_empty() {
        return Err(SourceError::TranscriptsDisabled);
    }

    Ok(TranscriptListing::new(tracks))
}

fn collect_tracks(section: &Value, kind: TrackKind) -> SourceResult<Vec<TranscriptTrack>> {
    let Some(languages) = section.as_object() else {
        return Ok(Vec::new());
    };

    let mut tracks: Vec<TranscriptTrack> = Vec::new();
    for (code, formats) in languages {
        if code == "live_chat" {
            continue;
        }

        let formats: Vec<CaptionFormat> =
            serde_json::from_value(formats.clone()).map_err(|e| {
                SourceError::Other(format!("malformed caption formats for {}: {}", code, e))
            })?;

        // Machine translations of the generated track carry a `tlang` parameter
        let Some(format) = formats
            .into_iter()
            .filter(|f| kind == TrackKind::Manual || !f.url.contains("tlang="))
            .find(|f| f.ext == CAPTION_FORMAT)
        else {
            continue;
        };

        let language_code = code.strip_suffix("-orig").unwrap_or(code).to_string();
        if tracks.iter().any(|t| t.language_code == language_code) {
            continue;
        }

        tracks.push(TranscriptTrack {
            language_code,
            language_name: format.name,
            kind,
            url: format.url,
        });
    }

    Ok(tracks)
}

/// Parse YouTube's json3 timed-text document into fragments ordered by start time
pub fn parse_json3(body: &str) -> SourceResult<Vec<TranscriptFragment>> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::Other(format!("failed to parse transcript: {}", e)))?;

    let mut fragments: Vec<TranscriptFragment> = document["events"]
        .as_array()
        .map(|events| {
            events
                .iter()
                .filter_map(|event| {
                    let text: String = event["segs"]
                        .as_array()?
                        .iter()
                        .filter_map(|seg| seg["utf8"].as_str())
                        .collect();

                    if text.trim().is_empty() {
                        return None;
                    }

                    Some(TranscriptFragment {
                        text,
                        start: event["tStartMs"].as_f64().unwrap_or(0.0) / 1000.0,
                        duration: event["dDurationMs"].as_f64().unwrap_or(0.0) / 1000.0,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    fragments.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(fragments)
}

/// Parse yt-dlp `--flat-playlist --dump-json` output, one JSON object per line
pub fn parse_flat_playlist(stdout: &str) -> Vec<VideoEntry> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unparseable playlist entry: {}", e);
                None
            }
        })
        .filter_map(|entry| {
            let id = entry["id"].as_str()?.to_string();
            let title = entry["title"]
                .as_str()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(&id)
                .to_string();
            Some(VideoEntry {
                video_id: VideoId::new(id),
                title,
            })
        })
        .collect()
}

/// Extract engagement counters from a yt-dlp metadata document
pub fn parse_stats(info: &Value) -> VideoStats {
    VideoStats {
        view_count: info["view_count"].as_u64(),
        like_count: info["like_count"].as_u64(),
        favorite_count: info["favorite_count"].as_u64(),
        comment_count: info["comment_count"].as_u64(),
    }
}
