use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod channel;
pub mod classify;
pub mod youtube;

pub use channel::ChannelId;
pub use classify::{classify_error_text, SourceError};
pub use youtube::YoutubeClient;

use crate::TranscriptsError;

/// Opaque identifier of a single video
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public watch page for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A video as reported by a channel listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub video_id: VideoId,
    pub title: String,
}

/// Public engagement counters of a video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub favorite_count: Option<u64>,
    pub comment_count: Option<u64>,
}

/// Ordered language tags; the first one available wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePreference(Vec<String>);

impl LanguagePreference {
    pub fn new<I, S>(languages: I) -> Result<Self, TranscriptsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let languages: Vec<String> = languages
            .into_iter()
            .map(Into::into)
            .map(|lang: String| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect();

        if languages.is_empty() {
            return Err(TranscriptsError::InvalidConfig(
                "at least one transcript language is required".to_string(),
            ));
        }

        Ok(Self(languages))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// Whether a caption track was uploaded by a person or produced by speech recognition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Manual,
    Generated,
}

/// A single caption track that can be fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTrack {
    pub language_code: String,
    pub language_name: Option<String>,
    pub kind: TrackKind,
    /// Location of the track content, interpreted by the source that listed it
    pub url: String,
}

/// All caption tracks available for a video
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptListing {
    tracks: Vec<TranscriptTrack>,
}

impl TranscriptListing {
    pub fn new(tracks: Vec<TranscriptTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[TranscriptTrack] {
        &self.tracks
    }

    /// First manually authored track in preference order
    pub fn find_manual(&self, languages: &LanguagePreference) -> Option<&TranscriptTrack> {
        self.find(languages, TrackKind::Manual)
    }

    /// First generated track in preference order
    pub fn find_generated(&self, languages: &LanguagePreference) -> Option<&TranscriptTrack> {
        self.find(languages, TrackKind::Generated)
    }

    fn find(&self, languages: &LanguagePreference, kind: TrackKind) -> Option<&TranscriptTrack> {
        languages.iter().find_map(|lang| {
            self.tracks
                .iter()
                .find(|track| track.kind == kind && track.language_code == lang)
        })
    }
}

/// One timed piece of caption text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    /// Start offset in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
}

/// Source of caption tracks for individual videos
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// List the caption tracks of a video, optionally through a proxy
    async fn list_transcripts(
        &self,
        video_id: &VideoId,
        proxy: Option<String>,
    ) -> Result<TranscriptListing, SourceError>;

    /// Download the fragments of a listed track, optionally through a proxy
    async fn fetch(
        &self,
        track: &TranscriptTrack,
        proxy: Option<String>,
    ) -> Result<Vec<TranscriptFragment>, SourceError>;

    /// Name of the service the tracks come from, for logs
    fn source_name(&self) -> &'static str;
}

/// Lists the videos of a channel, newest first
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoLister: Send + Sync {
    async fn list_videos(
        &self,
        channel: &ChannelId,
        limit: Option<usize>,
    ) -> crate::Result<Vec<VideoEntry>>;
}

/// Looks up engagement counters; `None` when they cannot be retrieved
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn video_stats(&self, video_id: &VideoId) -> Option<VideoStats>;
}
