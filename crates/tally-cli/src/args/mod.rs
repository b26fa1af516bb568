// Commands are grouped by what they touch: `replay` and `monitor` feed the
// aggregator, `records` reads the store, `config` manages config.toml.

mod commands;

pub use commands::*;

use crate::types::{LogLevel, OutputFormat};
use clap::Parser;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Turn noisy per-frame object counts into presence sessions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (falls back to $TALLY_PATH, then the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    /// Log level for stderr diagnostics; RUST_LOG takes precedence
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}
