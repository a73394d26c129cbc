use anyhow::{Context, Result};
use clap::Parser;
use console::Term;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use channel_transcripts::extractors::{LanguagePreference, YoutubeClient};
use channel_transcripts::transcribe::{ChannelRun, RunOptions};
use channel_transcripts::{
    analysis, utils, ChannelId, Cli, Commands, Config, ProxyPool, TranscriptAcquirer,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("channel_transcripts={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Download {
            channel,
            output,
            limit,
            languages,
            delay,
            proxies,
            cookies,
            manual_only,
            skip_stats,
            max_retries,
        } => {
            // An unusable channel is fatal before anything else happens
            let channel = ChannelId::parse(&channel)?;

            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(max_retries) = max_retries {
                config.retry.max_retries = max_retries;
            }
            if let Some(delay) = delay {
                config.run.delay_secs = delay;
            }
            if let Some(output) = output {
                config.run.output_dir = output;
            }
            if skip_stats {
                config.run.fetch_stats = false;
            }
            if let Some(cookies) = cookies {
                config.tools.cookies_file = Some(cookies);
            }
            config.validate()?;

            let languages = match languages {
                Some(languages) => LanguagePreference::new(languages)?,
                None => config.languages()?,
            };

            let missing_deps = utils::check_dependencies(&config.tools.yt_dlp_path).await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            let proxy_pool = proxies
                .as_deref()
                .map(ProxyPool::load)
                .transpose()?
                .map(Arc::new);

            let run = build_run(&config, languages, manual_only, limit, proxy_pool, !cli.quiet)?;
            let started = Instant::now();

            tokio::select! {
                summary = run.run(&channel) => {
                    let summary = summary?;
                    summary.display();
                    let elapsed = started.elapsed().as_secs_f64();
                    println!("⏱️  Elapsed: {}", utils::format_duration(elapsed));
                }
                _ = tokio::signal::ctrl_c() => {
                    // The dropped run has erased its bar; this clears the echoed ^C
                    let _ = Term::stdout().clear_line();
                    println!("\n⏹️  Cancelled by user.");
                }
            }
        }
        Commands::Analyze { dirs, wpm } => {
            let report = analysis::analyze_dirs(&dirs, wpm)?;
            report.display();
        }
        Commands::Config { show, init } => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if init {
                init_config(&path)?;
            }
            if show || !init {
                let explicit = path.exists().then_some(path.as_path());
                let config = Config::load(explicit)?;
                config.display();
            }
        }
    }

    Ok(())
}

fn build_run(
    config: &Config,
    languages: LanguagePreference,
    manual_only: bool,
    limit: Option<usize>,
    proxy_pool: Option<Arc<ProxyPool>>,
    show_progress: bool,
) -> Result<ChannelRun> {
    let client = YoutubeClient::new(config.tools.yt_dlp_path.clone(), config.request_timeout())?;

    let client = match config.tools.cookies_file.as_deref() {
        Some(path) => match utils::validate_cookie_file(path) {
            Some(cookies) => client.with_cookies(cookies),
            None => client,
        },
        None => client,
    };
    let client = Arc::new(client);

    let mut acquirer = TranscriptAcquirer::new(client.clone(), config.retry_policy());
    if let Some(pool) = proxy_pool {
        println!("🔄 Rotating through {} proxies", pool.len());
        acquirer = acquirer.with_proxy_pool(pool);
    }

    let options = RunOptions {
        output_dir: config.run.output_dir.clone(),
        languages,
        manual_only,
        limit,
        delay: Duration::from_secs_f64(config.run.delay_secs),
        delay_jitter_min: Duration::from_secs_f64(config.run.delay_jitter_min_secs),
        delay_jitter_max: Duration::from_secs_f64(config.run.delay_jitter_max_secs),
        rate_limit_threshold: config.run.rate_limit_threshold,
        show_progress,
    };

    let mut run = ChannelRun::new(acquirer, client.clone(), options);
    if config.run.fetch_stats {
        run = run.with_stats(client);
    }
    Ok(run)
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    Config::default()
        .save(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
