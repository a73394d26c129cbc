use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::extractors::LanguagePreference;
use crate::transcribe::RetryPolicy;
use crate::TranscriptsError;

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backoff and attempt budget per video
    pub retry: RetryConfig,

    /// Channel run settings
    pub run: RunConfig,

    /// External tools
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per video
    pub max_retries: u32,

    /// First backoff step when retrying without proxies
    pub initial_delay_secs: f64,

    pub jitter_min_secs: f64,
    pub jitter_max_secs: f64,

    /// Pause before retrying through the next proxy
    pub proxy_retry_delay_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Preferred transcript languages, best first
    pub languages: Vec<String>,

    pub output_dir: PathBuf,

    /// Pause between videos
    pub delay_secs: f64,
    pub delay_jitter_min_secs: f64,
    pub delay_jitter_max_secs: f64,

    /// Rate-limited videos tolerated before a run stops
    pub rate_limit_threshold: u32,

    /// Add view/like/comment counts to saved transcripts
    pub fetch_stats: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub yt_dlp_path: String,

    /// Browser cookies (Netscape format) passed to yt-dlp; signed-in requests are throttled less
    pub cookies_file: Option<PathBuf>,

    /// Timeout for caption downloads
    pub request_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_secs: 15.0,
            jitter_min_secs: 1.0,
            jitter_max_secs: 10.0,
            proxy_retry_delay_secs: 1.0,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            output_dir: PathBuf::from("transcripts"),
            delay_secs: 3.0,
            delay_jitter_min_secs: 1.0,
            delay_jitter_max_secs: 3.0,
            rate_limit_threshold: 3,
            fetch_stats: true,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            cookies_file: None,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from `explicit`, or the first config file found, or defaults.
    ///
    /// Never writes anything; use [`Config::save`] to create a file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        let Some(path) = path else {
            tracing::debug!("No config file found, using defaults");
            return Ok(Self::default());
        };

        let content = fs_err::read_to_string(&path).context("Failed to read config file")?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML; missing keys take their defaults
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Per-user configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("channel-transcripts").join(CONFIG_FILE_NAME))
    }

    fn discover() -> Option<PathBuf> {
        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Some(local_config);
        }

        Self::default_path().ok().filter(|path| path.exists())
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), TranscriptsError> {
        let invalid = |message: &str| Err(TranscriptsError::InvalidConfig(message.to_string()));

        if self.retry.max_retries < 1 {
            return invalid("retry.max_retries must be at least 1");
        }

        let retry_secs = [
            self.retry.initial_delay_secs,
            self.retry.jitter_min_secs,
            self.retry.jitter_max_secs,
            self.retry.proxy_retry_delay_secs,
        ];
        let run_secs = [
            self.run.delay_secs,
            self.run.delay_jitter_min_secs,
            self.run.delay_jitter_max_secs,
        ];
        if retry_secs.iter().chain(run_secs.iter()).any(|secs| !secs.is_finite() || *secs < 0.0) {
            return invalid("delays must be non-negative numbers of seconds");
        }

        if self.retry.jitter_min_secs > self.retry.jitter_max_secs {
            return invalid("retry.jitter_min_secs must not exceed retry.jitter_max_secs");
        }
        if self.run.delay_jitter_min_secs > self.run.delay_jitter_max_secs {
            return invalid("run.delay_jitter_min_secs must not exceed run.delay_jitter_max_secs");
        }

        if self.run.languages.iter().all(|lang| lang.trim().is_empty()) {
            return invalid("run.languages must name at least one language");
        }

        if self.run.rate_limit_threshold < 1 {
            return invalid("run.rate_limit_threshold must be at least 1");
        }

        if self.tools.yt_dlp_path.trim().is_empty() {
            return invalid("tools.yt_dlp_path must not be empty");
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    pub fn languages(&self) -> std::result::Result<LanguagePreference, TranscriptsError> {
        LanguagePreference::new(self.run.languages.iter().cloned())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.request_timeout_secs)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Max Retries: {}", self.retry.max_retries);
        println!(
            "  Backoff: {}s initial, {}-{}s jitter, {}s between proxies",
            self.retry.initial_delay_secs,
            self.retry.jitter_min_secs,
            self.retry.jitter_max_secs,
            self.retry.proxy_retry_delay_secs
        );
        println!("  Languages: {}", self.run.languages.join(", "));
        println!("  Output Directory: {}", self.run.output_dir.display());
        println!(
            "  Delay Between Videos: {}s (+{}-{}s jitter)",
            self.run.delay_secs, self.run.delay_jitter_min_secs, self.run.delay_jitter_max_secs
        );
        println!("  Rate Limit Threshold: {}", self.run.rate_limit_threshold);
        println!("  Fetch Stats: {}", self.run.fetch_stats);
        println!("  yt-dlp: {}", self.tools.yt_dlp_path);
        if let Some(cookies) = &self.tools.cookies_file {
            println!("  Cookies: {}", cookies.display());
        }
    }
}
