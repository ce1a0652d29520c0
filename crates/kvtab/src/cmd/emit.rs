//! Emit command - Write a single record
//!
//! # Usage
//!
//! ```bash
//! kvtab emit --level ERROR --obj DB --info "query failed" --field err=timeout
//! ```

use anyhow::{Context, Result};
use clap::Args;
use kvtab_config::Config;
use kvtab_protocol::{Field, Severity};

/// Emit command arguments
#[derive(Args, Debug)]
pub struct EmitArgs {
    /// Severity: DEBUG, INFO, WARN, ERROR or FATAL (brackets optional)
    #[arg(long, default_value = "INFO")]
    level: Severity,

    /// Origin tag written as obj=
    #[arg(long)]
    obj: String,

    /// Message written as info=
    #[arg(long, default_value = "")]
    info: String,

    /// Extra key=value field, repeatable; written in the given order
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

/// Run the emit command
pub async fn run(args: EmitArgs, config: &Config) -> Result<()> {
    let logger = super::open_logger(config)?;

    let fields: Vec<Field> = args
        .fields
        .into_iter()
        .map(|(key, value)| Field::string(key, value))
        .collect();

    let delivered = logger
        .emit(args.level, args.obj, args.info, fields)
        .context("failed to write record")?;
    tracing::debug!(level = %args.level, sinks = delivered, "record emitted");

    super::close_logger(logger).await
}

/// Split `key=value` at the first `=`
pub(crate) fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
