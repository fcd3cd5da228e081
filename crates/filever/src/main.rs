//! filever - streaming file version history.
//!
//! Replays recorded update streams into a version store and reports the
//! resulting history.

mod render;
mod replay;

use clap::{Parser, Subcommand};
use filever_util::{LogConfig, LogLevel};
use filever_versions::VersionsConfig;
use replay::ReplayOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "filever")]
#[command(author, version, about = "Streaming file version history", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(long, global = true, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Use this configuration file instead of the discovered ones
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON Lines stream of file updates
    Replay {
        /// Input file, one update message per line
        input: PathBuf,
        /// Switch every file to this version afterwards
        #[arg(short, long)]
        switch: Option<u32>,
        /// Show the diff of each file's current version
        #[arg(short, long)]
        diff: bool,
        /// Clean up history, keeping this many versions plus the original
        /// (defaults to the configured keep_versions)
        #[arg(short, long, num_args = 0..=1)]
        cleanup: Option<Option<usize>>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
        /// Only print the summary
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show configuration
    Config,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    let (config, sources) = load_config(cli.config.as_deref(), &cwd).await?;
    init_logging(cli.verbose, cli.log_level, &config);
    debug!(sources = sources.len(), "Configuration loaded");

    match cli.command {
        Commands::Replay {
            input,
            switch,
            diff,
            cleanup,
            json,
            quiet,
        } => {
            let options = ReplayOptions {
                switch_to: switch,
                diff,
                cleanup,
                quiet: quiet || json,
            };
            let report = replay::replay(&input, config, &options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render_text());
            }
            Ok(())
        }
        Commands::Config => show_config(&config, &sources),
        Commands::Version => {
            println!("filever {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn load_config(
    explicit: Option<&Path>,
    cwd: &Path,
) -> anyhow::Result<(VersionsConfig, Vec<PathBuf>)> {
    match explicit {
        Some(path) => {
            let config = VersionsConfig::load_file(path).await?;
            Ok((config, vec![path.to_path_buf()]))
        }
        None => Ok(VersionsConfig::load(Some(cwd)).await?),
    }
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    LogLevel::parse(s).ok_or_else(|| format!("unknown log level: {s}"))
}

/// Logs go to stderr; `--verbose` wins over `--log-level`, which wins over
/// the configured level.
fn init_logging(verbose: bool, level: Option<LogLevel>, config: &VersionsConfig) {
    let log_config = if verbose {
        LogConfig::verbose()
    } else {
        LogConfig {
            level: level.or(config.log_level).unwrap_or(LogLevel::Warn),
            ..LogConfig::default()
        }
    };
    filever_util::log::init(&log_config);
}

fn show_config(config: &VersionsConfig, sources: &[PathBuf]) -> anyhow::Result<()> {
    println!("Configuration sources:");
    if sources.is_empty() {
        println!("  (none)");
    } else {
        for source in sources {
            println!("  {}", source.display());
        }
    }
    println!();

    println!("Current configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);

    Ok(())
}
