//! Command implementations for the kvtab CLI

pub mod emit;
pub mod pipe;

use anyhow::{Context, Result};
use kvtab_config::Config;
use kvtab_pipeline::Logger;

/// Open the log files described by `config`
pub fn open_logger(config: &Config) -> Result<Logger> {
    Logger::from_config(&config.log).with_context(|| {
        format!(
            "failed to open log files in {}",
            config.log.log_dir.display()
        )
    })
}

/// Drain and sync; fails if any sink failed or discarded lines
pub async fn close_logger(logger: Logger) -> Result<()> {
    match logger.shutdown().await {
        Ok(reports) => {
            let discarded: u64 = reports.iter().map(|r| r.report.discarded).sum();
            if discarded > 0 {
                anyhow::bail!("{discarded} log lines discarded during shutdown");
            }
            Ok(())
        }
        Err(e) => {
            let discarded: u64 = e
                .sink_failures()
                .iter()
                .filter_map(|f| f.error.drain_report())
                .map(|r| r.discarded)
                .sum();
            Err(e).with_context(|| {
                format!("failed to shut down logger ({discarded} log lines discarded)")
            })
        }
    }
}
