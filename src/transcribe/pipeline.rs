use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressFinish, ProgressStyle};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::retry::{jitter, Sleeper, TokioSleeper};
use super::{FailureKind, TranscriptAcquirer, TranscriptResult};
use crate::extractors::{ChannelId, LanguagePreference, StatsProvider, VideoEntry, VideoLister};
use crate::output::{self, clean_transcript, TranscriptDocument};
use crate::Result;

/// Printed when the rate-limit breaker stops a run
pub const RATE_LIMIT_ADVICE: &str = "\n⚠️  Too many rate limits. Consider:
   1. Wait 1-2 hours before trying again
   2. Use --cookies with a cookies file exported from a signed-in browser
   3. Use --proxies with a list of proxy servers
   4. Use a VPN to change your IP address";

/// Settings of one channel download run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub languages: LanguagePreference,
    pub manual_only: bool,
    pub limit: Option<usize>,
    /// Base pause between videos
    pub delay: Duration,
    pub delay_jitter_min: Duration,
    pub delay_jitter_max: Duration,
    /// Rate-limited videos tolerated before the run stops
    pub rate_limit_threshold: u32,
    pub show_progress: bool,
}

/// What happened to one video
#[derive(Debug, Clone, PartialEq)]
pub enum VideoOutcome {
    Saved(PathBuf),
    /// A file for this video already exists
    Skipped(PathBuf),
    Failed(FailureKind),
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: BTreeMap<&'static str, usize>,
    pub stopped_early: bool,
    pub output_dir: PathBuf,
}

impl RunSummary {
    fn record(&mut self, outcome: &VideoOutcome) {
        match outcome {
            VideoOutcome::Saved(_) => self.downloaded += 1,
            VideoOutcome::Skipped(_) => self.skipped += 1,
            VideoOutcome::Failed(kind) => {
                self.failed += 1;
                *self.failures.entry(kind.code()).or_insert(0) += 1;
            }
        }
    }

    /// Print the end-of-run report
    pub fn display(&self) {
        println!("\n{}", "=".repeat(50));
        println!("✨ Done! Results:");
        println!("    ✅ Downloaded: {}", style(self.downloaded).green());
        println!("    ⏭️  Skipped (existing): {}", self.skipped);
        println!("    ❌ Failed: {}", style(self.failed).red());
        for (code, count) in &self.failures {
            println!("       • {}: {}", code, count);
        }
        if self.stopped_early {
            println!("    ⚠️  Stopped early after repeated rate limiting");
        }
        println!("📁 Files saved to: {}", self.output_dir.display());
    }
}

/// Stops a run once the source has throttled too many separate videos
#[derive(Debug)]
struct RateLimitBreaker {
    threshold: u32,
    count: u32,
}

impl RateLimitBreaker {
    fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            count: 0,
        }
    }

    /// Record a failure; returns true once the breaker has tripped
    fn record(&mut self, kind: &FailureKind) -> bool {
        if kind.is_rate_limit() {
            self.count += 1;
        }
        self.count >= self.threshold
    }
}

/// Downloads every listed video of a channel, one after another
pub struct ChannelRun {
    acquirer: TranscriptAcquirer,
    lister: Arc<dyn VideoLister>,
    stats: Option<Arc<dyn StatsProvider>>,
    sleeper: Arc<dyn Sleeper>,
    options: RunOptions,
}

impl ChannelRun {
    pub fn new(
        acquirer: TranscriptAcquirer,
        lister: Arc<dyn VideoLister>,
        options: RunOptions,
    ) -> Self {
        Self {
            acquirer,
            lister,
            stats: None,
            sleeper: Arc::new(TokioSleeper),
            options,
        }
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatsProvider>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// List the channel and process its videos
    pub async fn run(&self, channel: &ChannelId) -> Result<RunSummary> {
        println!("📺 Fetching videos from channel: {}", channel.name());
        let videos = self.lister.list_videos(channel, self.options.limit).await?;
        println!("📊 Found {} videos to process\n", videos.len());

        if videos.is_empty() {
            println!("❌ No videos found. Check the channel URL.");
        }

        self.process_videos(&videos).await
    }

    /// Process already listed videos in order
    pub async fn process_videos(&self, videos: &[VideoEntry]) -> Result<RunSummary> {
        let output_dir = &self.options.output_dir;
        fs_err::create_dir_all(output_dir).context("Failed to create output directory")?;

        let mut summary = RunSummary {
            total: videos.len(),
            output_dir: output_dir.clone(),
            ..RunSummary::default()
        };
        let mut breaker = RateLimitBreaker::new(self.options.rate_limit_threshold);
        let progress = self.progress_bar(videos.len());

        for (index, video) in videos.iter().enumerate() {
            progress.set_message(truncate_title(&video.title));

            let outcome = self.process_video(video).await?;
            summary.record(&outcome);
            progress.inc(1);

            match &outcome {
                VideoOutcome::Saved(path) => {
                    tracing::info!("Saved {}", path.display());
                }
                VideoOutcome::Skipped(path) => {
                    tracing::info!("Skipping (exists): {}", path.display());
                    continue;
                }
                VideoOutcome::Failed(kind) => {
                    tracing::warn!("{} ({}): {}", video.title, video.video_id, kind);
                    if breaker.record(kind) {
                        summary.stopped_early = true;
                        progress.println(RATE_LIMIT_ADVICE);
                        break;
                    }
                }
            }

            if index + 1 < videos.len() {
                let pause = self.options.delay
                    + jitter(self.options.delay_jitter_min, self.options.delay_jitter_max);
                self.sleeper.sleep(pause).await;
            }
        }

        progress.finish_and_clear();
        Ok(summary)
    }

    /// Acquire, clean and save one video's transcript
    pub async fn process_video(&self, video: &VideoEntry) -> Result<VideoOutcome> {
        let filename = output::transcript_filename(&video.title, &video.video_id);
        let path = self.options.output_dir.join(filename);

        if path.exists() {
            return Ok(VideoOutcome::Skipped(path));
        }

        let result = self
            .acquirer
            .acquire(&video.video_id, &self.options.languages, self.options.manual_only)
            .await;

        let text = match result {
            TranscriptResult::Success { text } => text,
            TranscriptResult::Failure { kind } => return Ok(VideoOutcome::Failed(kind)),
        };

        let stats = match &self.stats {
            Some(provider) => provider.video_stats(&video.video_id).await,
            None => None,
        };

        let document = TranscriptDocument {
            video: video.clone(),
            stats,
            body: clean_transcript(&text),
        };
        output::save_to_file(&document, &path)?;

        Ok(VideoOutcome::Saved(path))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }

        styled_progress_bar(len, ProgressDrawTarget::stderr())
    }
}

/// Bar that erases its line when finished, and also when dropped by a cancelled run
fn styled_progress_bar(len: usize, target: ProgressDrawTarget) -> ProgressBar {
    let progress = ProgressBar::with_draw_target(Some(len as u64), target)
        .with_finish(ProgressFinish::AndClear);
    progress.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress
}

fn truncate_title(title: &str) -> String {
    crate::utils::truncate_chars(title, 50)
}
