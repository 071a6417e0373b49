//! job-aggregator CLI
//!
//! Runs the aggregation pipeline and prints the result. `watch` re-runs it
//! on the configured refresh interval.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use job_aggregator::{
    error::{AppError, Result},
    models::{AggregateResult, Config, SourceKind},
    pipeline,
};

/// job-aggregator - PHP job postings from boards and feeds
#[derive(Parser, Debug)]
#[command(
    name = "job-aggregator",
    version,
    about = "Aggregates job postings from HTML boards and RSS/Atom feeds"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "job-aggregator.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate once and print the listings
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Aggregate repeatedly on the refresh interval
    Watch {
        #[command(flatten)]
        overrides: Overrides,

        /// Override refresh_interval_secs
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// List configured sources
    Sources,

    /// Validate the configuration file
    Validate,
}

#[derive(clap::Args, Debug)]
struct Overrides {
    /// Override target_keyword
    #[arg(short, long)]
    keyword: Option<String>,

    /// Only run these sources (repeatable)
    #[arg(short, long = "source")]
    sources: Vec<String>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(keyword) = self.keyword {
            config.target_keyword = keyword;
        }
        if !self.sources.is_empty() {
            config.enabled_sources = self.sources;
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_result(result: &AggregateResult) {
    for (i, listing) in result.listings.iter().enumerate() {
        let mut line = format!("{:>3}. {}", i + 1, listing.title);
        if let Some(employer) = &listing.employer {
            line.push_str(&format!(" @ {employer}"));
        }
        println!("{line}");
        let template = if listing.published_at.is_some() {
            "     [{source}] {date} {url}"
        } else {
            "     [{source}] {url}"
        };
        println!("{}", listing.format(template));
    }

    for (name, reason) in result.failed_sources() {
        println!("! {name} unavailable ({reason})");
    }
    println!(
        "{} listings, {} of {} sources ok",
        result.listings.len(),
        result.statuses.len() - result.stats.failed_sources,
        result.statuses.len()
    );
}

fn checked(config: Config) -> Result<Config> {
    config.validate()?;
    if config.active_sources().is_empty() {
        return Err(AppError::NoSources);
    }
    Ok(config)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Run { overrides, json } => {
            overrides.apply(&mut config);
            let config = checked(config)?;
            let result = pipeline::run_aggregation(&config).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }

        Command::Watch {
            overrides,
            interval_secs,
        } => {
            overrides.apply(&mut config);
            if let Some(secs) = interval_secs {
                config.refresh_interval_secs = secs;
            }
            let config = checked(config)?;
            let period = config.refresh_interval().max(Duration::from_secs(1));
            log::info!("Refreshing every {}s (Ctrl-C to stop)", period.as_secs());

            let mut ticker = tokio::time::interval(period);
            let shutdown = tokio::signal::ctrl_c();
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = &mut shutdown => break,
                }
                // Adapters and transport are rebuilt every run.
                tokio::select! {
                    result = pipeline::run_aggregation(&config) => match result {
                        Ok(result) => print_result(&result),
                        Err(e) => log::error!("Aggregation failed: {e}"),
                    },
                    _ = &mut shutdown => break,
                }
            }
            log::info!("Stopping");
        }

        Command::Sources => {
            let active: Vec<_> = config
                .active_sources()
                .iter()
                .map(|s| s.name.clone())
                .collect();
            for source in &config.sources {
                let mode = match (&source.kind, &source.selectors) {
                    (SourceKind::Feed, _) => "feed",
                    (_, Some(_)) => "html/selectors",
                    (_, None) => "html/anchor-scan",
                };
                let mark = if active.contains(&source.name) { "*" } else { " " };
                println!("{mark} {:<16} {:<18} {}", source.name, mode, source.url);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} sources, keyword '{}')",
                config.sources.len(),
                config.target_keyword
            );
        }
    }

    Ok(())
}
