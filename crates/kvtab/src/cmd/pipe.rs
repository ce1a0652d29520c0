//! Pipe command - One record per stdin line
//!
//! Every line read from stdin becomes `obj=<OBJ>\tinfo=<line>` at the given
//! severity. Stops at end of input, then drains and syncs.

use anyhow::{Context, Result};
use clap::Args;
use kvtab_config::Config;
use kvtab_protocol::{Field, Severity};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Pipe command arguments
#[derive(Args, Debug)]
pub struct PipeArgs {
    /// Severity of every line
    #[arg(long, default_value = "INFO")]
    level: Severity,

    /// Origin tag written as obj=
    #[arg(long)]
    obj: String,
}

/// Run the pipe command
pub async fn run(args: PipeArgs, config: &Config) -> Result<()> {
    let logger = super::open_logger(config)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut written = 0u64;
    let mut failed = 0u64;

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match logger.emit(args.level, args.obj.clone(), line, Vec::<Field>::new()) {
            Ok(_) => written += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(error = %e, "failed to write line");
            }
        }
    }

    tracing::debug!(written, failed, "stdin closed");
    super::close_logger(logger).await?;

    if failed > 0 {
        anyhow::bail!("{failed} of {} lines could not be written", written + failed);
    }
    Ok(())
}
