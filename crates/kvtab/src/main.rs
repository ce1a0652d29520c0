//! kvtab - Structured key=value log lines from the command line
//!
//! # Usage
//!
//! ```bash
//! # Write one record
//! kvtab emit --level INFO --obj START --info "start done" --field cost=3
//!
//! # Log every stdin line as info=<line>
//! tail -f app.out | kvtab pipe --level WARN --obj APP
//!
//! # Use a config file for paths, rotation and thresholds
//! kvtab --config configs/kvtab.toml emit --obj INIT --info ready
//! ```

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kvtab_config::{Config, DiagnosticFormat, DiagnosticsConfig};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// kvtab - Structured key=value log lines
#[derive(Parser, Debug)]
#[command(name = "kvtab")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Diagnostic level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one record
    Emit(cmd::emit::EmitArgs),

    /// Write one record per stdin line
    Pipe(cmd::pipe::PipeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_diagnostics(&config.diagnostics, cli.log_level.as_deref())?;

    match cli.command {
        Command::Emit(args) => cmd::emit::run(args, &config).await,
        Command::Pipe(args) => cmd::pipe::run(args, &config).await,
    }
}

/// Load the config file, or defaults when none is given
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let config = Config::default();
            config.validate().context("invalid default configuration")?;
            Ok(config)
        }
    }
}

/// Initialize the tracing subscriber for kvtab's own diagnostics
///
/// Diagnostics go to stderr so they never mix with piped data.
fn init_diagnostics(config: &DiagnosticsConfig, cli_level: Option<&str>) -> Result<()> {
    let level = cli_level.unwrap_or(config.level.as_str());
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("warn"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match config.format {
        DiagnosticFormat::Console => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .with(filter)
            .init(),
        DiagnosticFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    Ok(())
}
