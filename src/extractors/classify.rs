//! Structured failures of a transcript source, and the one place where free-form
//! error text from the underlying tooling is turned into them.

use regex::Regex;
use std::sync::LazyLock;

static TOO_MANY_REQUESTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b429\b|too many requests").unwrap());

const BOT_CHECK_PATTERNS: &[&str] = &["confirm you're not a bot", "confirm you’re not a bot"];

const DISABLED_PATTERNS: &[&str] = &["subtitles are disabled", "transcripts disabled"];

const UNAVAILABLE_PATTERNS: &[&str] = &[
    "private video",
    "video unavailable",
    "this video has been removed",
    "not available in your country",
    "members-only",
];

const NOT_FOUND_PATTERNS: &[&str] = &["no transcript", "no subtitles"];

const CONNECTION_PATTERNS: &[&str] = &[
    "proxy",
    "tunnel connection failed",
    "connection refused",
    "connection reset",
    "timed out",
];

/// Failure reported by a transcript source
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("No transcript found")]
    NoTranscriptFound,

    #[error("Too many requests")]
    RateLimited,

    /// The egress address has been flagged by bot detection
    #[error("Blocked by bot detection")]
    Blocked,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    /// Whether another attempt can succeed. Blocks and connection failures are tied
    /// to the egress address, so they are only worth retrying through another proxy.
    pub fn is_retryable(&self, proxied: bool) -> bool {
        match self {
            Self::RateLimited => true,
            Self::Blocked | Self::Connection(_) => proxied,
            _ => false,
        }
    }
}

/// Classify an error message produced by yt-dlp or the HTTP layer.
///
/// Matching is case-insensitive and checked in this order:
///
/// | pattern | result |
/// |---|---|
/// | `429`, `too many requests` | [`SourceError::RateLimited`] |
/// | `confirm you're not a bot` | [`SourceError::Blocked`] |
/// | `subtitles are disabled`, `transcripts disabled` | [`SourceError::TranscriptsDisabled`] |
/// | `private video`, `video unavailable` | [`SourceError::VideoUnavailable`] |
/// | `this video has been removed` | [`SourceError::VideoUnavailable`] |
/// | `not available in your country`, `members-only` | [`SourceError::VideoUnavailable`] |
/// | `no transcript`, `no subtitles` | [`SourceError::NoTranscriptFound`] |
/// | `proxy`, `tunnel connection failed`, `connection refused` | [`SourceError::Connection`] |
/// | `connection reset`, `timed out` | [`SourceError::Connection`] |
///
/// The connection patterns only apply when `proxied`.
///
/// Anything else becomes [`SourceError::Other`] carrying the trimmed text.
pub fn classify_error_text(text: &str, proxied: bool) -> SourceError {
    let message = text.trim();
    let lower = message.to_lowercase();
    let contains_any = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

    if TOO_MANY_REQUESTS.is_match(&lower) {
        SourceError::RateLimited
    } else if contains_any(BOT_CHECK_PATTERNS) {
        SourceError::Blocked
    } else if contains_any(DISABLED_PATTERNS) {
        SourceError::TranscriptsDisabled
    } else if contains_any(UNAVAILABLE_PATTERNS) {
        SourceError::VideoUnavailable(message.to_string())
    } else if contains_any(NOT_FOUND_PATTERNS) {
        SourceError::NoTranscriptFound
    } else if proxied && contains_any(CONNECTION_PATTERNS) {
        SourceError::Connection(message.to_string())
    } else {
        SourceError::Other(message.to_string())
    }
}
