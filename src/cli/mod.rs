use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "transcripts",
    about = "Channel Transcripts - Download every transcript of a YouTube channel",
    version,
    long_about = "Lists the videos of a YouTube channel and saves one cleaned transcript file \
                  per video. Manual captions are preferred over generated ones, rate limits are \
                  retried with backoff or through a rotating proxy list, and existing files are \
                  skipped so interrupted runs can be resumed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./config.yaml, then the user config directory)
    #[arg(long, global = true, value_name = "FILE", env = "TRANSCRIPTS_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download transcripts for every video of a channel
    Download {
        /// Channel URL or handle (youtube.com/@name, /channel/UC..., /c/name, /user/name, @name)
        #[arg(value_name = "CHANNEL")]
        channel: String,

        /// Output directory (default from config: transcripts)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Process at most this many videos, newest first
        #[arg(short, long, value_name = "COUNT")]
        limit: Option<usize>,

        /// Preferred transcript languages, best first
        #[arg(long, value_name = "LANG", num_args = 1..)]
        languages: Option<Vec<String>>,

        /// Base pause between videos in seconds
        #[arg(short, long, value_name = "SECONDS")]
        delay: Option<f64>,

        /// File with one proxy URI per line; retries rotate through them
        #[arg(short, long, value_name = "FILE")]
        proxies: Option<PathBuf>,

        /// Cookies file exported from a signed-in browser (Netscape format)
        #[arg(short, long, value_name = "FILE")]
        cookies: Option<PathBuf>,

        /// Only accept manually created transcripts
        #[arg(long)]
        manual_only: bool,

        /// Do not add view/like/comment counts to saved files
        #[arg(long)]
        skip_stats: bool,

        /// Total attempts per video
        #[arg(long, value_name = "COUNT")]
        max_retries: Option<u32>,
    },

    /// Word, sentence and reading-time statistics over saved transcripts
    Analyze {
        /// Directories searched recursively for .md and .txt transcripts
        #[arg(value_name = "DIR", required = true)]
        dirs: Vec<PathBuf>,

        /// Reading speed in words per minute
        #[arg(long, default_value = "250")]
        wpm: f64,
    },

    /// Show or create the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_download_flags() {
        let cli = Cli::try_parse_from([
            "transcripts",
            "download",
            "@somechannel",
            "--languages",
            "de",
            "en",
            "--limit",
            "10",
            "--manual-only",
            "-p",
            "proxies.txt",
            "-c",
            "cookies.txt",
        ])
        .unwrap();

        match cli.command {
            Commands::Download {
                channel,
                languages,
                limit,
                manual_only,
                proxies,
                cookies,
                skip_stats,
                ..
            } => {
                assert_eq!(channel, "@somechannel");
                assert_eq!(languages, Some(vec!["de".to_string(), "en".to_string()]));
                assert_eq!(limit, Some(10));
                assert!(manual_only);
                assert!(!skip_stats);
                assert_eq!(proxies, Some(PathBuf::from("proxies.txt")));
                assert_eq!(cookies, Some(PathBuf::from("cookies.txt")));
            }
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn test_analyze_requires_a_directory() {
        assert!(Cli::try_parse_from(["transcripts", "analyze"]).is_err());

        let cli =
            Cli::try_parse_from(["transcripts", "analyze", "a", "b", "--wpm", "200"]).unwrap();
        match cli.command {
            Commands::Analyze { dirs, wpm } => {
                assert_eq!(dirs.len(), 2);
                assert_eq!(wpm, 200.0);
            }
            _ => panic!("expected analyze"),
        }
    }
}
