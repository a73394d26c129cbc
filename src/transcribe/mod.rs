use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::extractors::{
    LanguagePreference, SourceError, TranscriptFragment, TranscriptSource, VideoId,
};
use crate::utils::truncate_chars;

pub mod pipeline;
pub mod proxy;
pub mod retry;

pub use pipeline::{ChannelRun, RunOptions, RunSummary, VideoOutcome};
pub use proxy::ProxyPool;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};

/// Longest error message kept in [`FailureKind::Other`]
pub const MAX_ERROR_MESSAGE_LEN: usize = 80;

/// Why no transcript could be obtained for a video
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Only generated captions exist and manual-only mode is on
    NoManualTranscript,
    /// No track in any preferred language
    NoTranscriptInLanguage,
    TranscriptsDisabled,
    /// Private, deleted or region-locked
    VideoUnavailable,
    /// The video has no transcript at all
    NoTranscript,
    /// Blocked by the source with no proxy to rotate to
    RateLimited,
    MaxRetriesExceeded,
    Other(String),
}

impl FailureKind {
    /// Short machine-friendly code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoManualTranscript => "no_manual_transcript",
            Self::NoTranscriptInLanguage => "no_transcript_in_language",
            Self::TranscriptsDisabled => "transcripts_disabled",
            Self::VideoUnavailable => "video_unavailable",
            Self::NoTranscript => "no_transcript",
            Self::RateLimited => "rate_limited",
            Self::MaxRetriesExceeded => "max_retries_exceeded",
            Self::Other(_) => "error",
        }
    }

    /// Whether this outcome signals that the source is throttling the whole run
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited | Self::MaxRetriesExceeded)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoManualTranscript => write!(f, "Only auto-generated (skipped)"),
            Self::NoTranscriptInLanguage => write!(f, "No transcript in preferred language"),
            Self::TranscriptsDisabled => write!(f, "Transcripts disabled"),
            Self::VideoUnavailable => write!(f, "Video unavailable"),
            Self::NoTranscript => write!(f, "No transcript available"),
            Self::RateLimited => write!(f, "Rate limited (try again later)"),
            Self::MaxRetriesExceeded => write!(f, "Max retries exceeded"),
            Self::Other(message) => write!(f, "error: {}", message),
        }
    }
}

/// Outcome of acquiring one video's transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptResult {
    Success { text: String },
    Failure { kind: FailureKind },
}

impl TranscriptResult {
    fn failure(kind: FailureKind) -> Self {
        Self::Failure { kind }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success { text } => Some(text),
            Self::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<&FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind } => Some(kind),
        }
    }
}

/// How a single attempt ended when it did not produce text
enum AttemptError {
    Terminal(FailureKind),
    Retryable(SourceError),
}

impl AttemptError {
    fn from_source(error: SourceError, proxied: bool) -> Self {
        if error.is_retryable(proxied) {
            return Self::Retryable(error);
        }

        let kind = match error {
            SourceError::TranscriptsDisabled => FailureKind::TranscriptsDisabled,
            SourceError::VideoUnavailable(_) => FailureKind::VideoUnavailable,
            SourceError::NoTranscriptFound => FailureKind::NoTranscript,
            SourceError::RateLimited | SourceError::Blocked => FailureKind::RateLimited,
            SourceError::Connection(message) | SourceError::Other(message) => {
                FailureKind::Other(truncate_chars(&message, MAX_ERROR_MESSAGE_LEN))
            }
        };
        Self::Terminal(kind)
    }
}

/// Join fragment texts in order with single spaces, dropping empty fragments
pub fn join_fragments(fragments: &[TranscriptFragment]) -> String {
    fragments
        .iter()
        .map(|fragment| fragment.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Obtains the best available transcript for a video.
///
/// Manual tracks in preference order are tried before generated ones. Rate limits
/// are retried up to the policy's attempt budget: with exponential backoff when no
/// proxy pool is configured, or immediately through the next proxy when one is.
pub struct TranscriptAcquirer {
    source: Arc<dyn TranscriptSource>,
    policy: RetryPolicy,
    proxies: Option<Arc<ProxyPool>>,
    sleeper: Arc<dyn Sleeper>,
}

impl TranscriptAcquirer {
    pub fn new(source: Arc<dyn TranscriptSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            proxies: None,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_proxy_pool(mut self, proxies: Arc<ProxyPool>) -> Self {
        self.proxies = Some(proxies);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Acquire the transcript of `video_id`
    pub async fn acquire(
        &self,
        video_id: &VideoId,
        languages: &LanguagePreference,
        manual_only: bool,
    ) -> TranscriptResult {
        if video_id.as_str().trim().is_empty() {
            return TranscriptResult::failure(FailureKind::Other("empty video id".to_string()));
        }

        let attempts = self.policy.attempts();
        for attempt in 0..attempts {
            let proxy = self.proxies.as_deref().map(ProxyPool::next);

            let error = match self.attempt(video_id, languages, manual_only, proxy).await {
                Ok(text) => return TranscriptResult::Success { text },
                Err(AttemptError::Terminal(kind)) => {
                    tracing::debug!("{}: {}", video_id, kind);
                    return TranscriptResult::failure(kind);
                }
                Err(AttemptError::Retryable(error)) => error,
            };

            if attempt + 1 >= attempts {
                tracing::warn!("{}: {} (giving up after {} attempts)", video_id, error, attempts);
                break;
            }

            let wait = self.policy.backoff_delay(attempt, proxy.is_some());
            match proxy {
                Some(proxy) => tracing::warn!(
                    "{}: {} via {}, switching proxy in {:.0}s (retry {}/{})",
                    video_id,
                    error,
                    proxy,
                    wait.as_secs_f64(),
                    attempt + 2,
                    attempts
                ),
                None => tracing::warn!(
                    "{}: {}. Waiting {:.0}s (retry {}/{})",
                    video_id,
                    error,
                    wait.as_secs_f64(),
                    attempt + 2,
                    attempts
                ),
            }
            self.sleeper.sleep(wait).await;
        }

        TranscriptResult::failure(FailureKind::MaxRetriesExceeded)
    }

    async fn attempt(
        &self,
        video_id: &VideoId,
        languages: &LanguagePreference,
        manual_only: bool,
        proxy: Option<&str>,
    ) -> Result<String, AttemptError> {
        let proxied = proxy.is_some();
        let to_attempt_error = |e: SourceError| AttemptError::from_source(e, proxied);

        let listing = self
            .source
            .list_transcripts(video_id, proxy.map(str::to_string))
            .await
            .map_err(to_attempt_error)?;

        let track = match listing.find_manual(languages) {
            Some(track) => track,
            None if manual_only => {
                return Err(AttemptError::Terminal(FailureKind::NoManualTranscript))
            }
            None => listing
                .find_generated(languages)
                .ok_or(AttemptError::Terminal(FailureKind::NoTranscriptInLanguage))?,
        };

        tracing::debug!(
            "{}: using {:?} {} transcript in {} ({})",
            video_id,
            track.kind,
            self.source.source_name(),
            track.language_code,
            track.language_name.as_deref().unwrap_or("unnamed")
        );

        let fragments = self
            .source
            .fetch(track, proxy.map(str::to_string))
            .await
            .map_err(to_attempt_error)?;

        Ok(join_fragments(&fragments))
    }
}
