//! # CLI Interface
//!
//! Command-line arguments for `gavel-node`, defined with `clap` derive.
//! Four subcommands: `init`, `run`, `status` and `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Gavel local devnet node.
///
/// Runs custody-guarded auctions described by a JSON scenario against an
/// in-memory ledger, and keeps the resulting snapshots and receipts on disk.
#[derive(Parser, Debug)]
#[command(
    name = "gavel-node",
    about = "Gavel local devnet node",
    version,
    propagate_version = true
)]
pub struct GavelNodeCli {
    /// Log output format.
    #[arg(long, global = true, env = "GAVEL_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and write the reference scenario into it.
    Init(InitArgs),
    /// Execute a scenario and persist the result.
    Run(RunArgs),
    /// Summarise the latest persisted run.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Data directory to initialize.
    #[arg(long, short = 'd', env = "GAVEL_DATA_DIR", default_value = ".gavel")]
    pub data_dir: PathBuf,

    /// Overwrite an existing scenario file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Data directory holding the ledger database.
    #[arg(long, short = 'd', env = "GAVEL_DATA_DIR", default_value = ".gavel")]
    pub data_dir: PathBuf,

    /// Scenario file (JSON). Defaults to `scenario.json` in the data directory.
    #[arg(long, short = 's', env = "GAVEL_SCENARIO")]
    pub scenario: Option<PathBuf>,

    /// Print the Prometheus text exposition after the run.
    #[arg(long)]
    pub metrics: bool,
}

impl RunArgs {
    pub fn scenario_path(&self) -> PathBuf {
        self.scenario
            .clone()
            .unwrap_or_else(|| self.data_dir.join(crate::SCENARIO_FILE))
    }
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Data directory holding the ledger database.
    #[arg(long, short = 'd', env = "GAVEL_DATA_DIR", default_value = ".gavel")]
    pub data_dir: PathBuf,
}
