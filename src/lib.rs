//! Channel Transcripts - A Rust CLI tool for downloading YouTube channel transcripts
//!
//! This library lists the videos of a channel, acquires the best available transcript
//! for each one (manual captions first, generated captions as a fallback), backs off
//! or rotates proxies when the source rate-limits, and writes one cleaned text file
//! per video. It also provides word/sentence/reading-time analysis over those files.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use extractors::{ChannelId, SourceError, StatsProvider, TranscriptSource, VideoLister};
pub use transcribe::{FailureKind, ProxyPool, RetryPolicy, TranscriptAcquirer, TranscriptResult};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the transcript downloader
#[derive(thiserror::Error, Debug)]
pub enum TranscriptsError {
    #[error(
        "Could not parse channel URL: {0}\nSupported formats:\n  \
         - https://www.youtube.com/@ChannelName\n  \
         - https://www.youtube.com/channel/UCxxxxxx\n  \
         - https://www.youtube.com/c/CustomName\n  \
         - https://www.youtube.com/user/Username\n  \
         - @ChannelName"
    )]
    InvalidChannel(String),

    #[error("Proxy pool is empty")]
    EmptyProxyPool,

    #[error("Invalid proxy URI on line {line}: {uri}")]
    InvalidProxy { line: usize, uri: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
