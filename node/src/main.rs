// Copyright (c) 2026 Gavel Contributors. MIT License.
// See LICENSE for details.

//! # Gavel Node
//!
//! Local devnet binary. Funds accounts, deploys auctions and title realms,
//! and plays a JSON scenario against the in-memory ledger. Every step's
//! outcome is printed; snapshots and receipts are kept in a sled database
//! under the data directory.
//!
//! ## Usage
//!
//! ```bash
//! # Write the reference scenario into ./.gavel
//! gavel-node init
//!
//! # Run it and print the metrics afterwards
//! gavel-node run --metrics
//!
//! # Inspect what the last run left behind
//! gavel-node status
//! ```

mod cli;
mod logging;
mod metrics;
mod scenario;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use gavel_protocol::storage::LedgerDb;
use serde_json::json;

use cli::{Commands, GavelNodeCli, InitArgs, RunArgs};
use logging::DEFAULT_FILTER;
use metrics::NodeMetrics;
use scenario::{RunReport, Scenario, ScenarioRunner};

/// Scenario file name inside the data directory.
pub const SCENARIO_FILE: &str = "scenario.json";

/// Database directory inside the data directory.
const LEDGER_DIR: &str = "ledger";

fn main() -> Result<()> {
    let cli = GavelNodeCli::parse();

    logging::init_logging(DEFAULT_FILTER, cli.log_format.into());

    match cli.command {
        Commands::Init(args) => {
            let path = init_data_dir(&args)?;
            println!("Scenario written to {}", path.display());
            println!("Run it with: gavel-node run --data-dir {}", args.data_dir.display());
        }
        Commands::Run(args) => {
            let metrics = NodeMetrics::new().context("failed to create metrics registry")?;
            let report = run_scenario(&args, &metrics)?;
            let output = json!({
                "finished_at": chrono::Utc::now().to_rfc3339(),
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            if args.metrics {
                print!("{}", metrics.encode()?);
            }
        }
        Commands::Status(args) => {
            let summary = status_summary(&args.data_dir)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Version => print_version(),
    }
    Ok(())
}

/// Create the data directory and write the reference scenario.
fn init_data_dir(args: &InitArgs) -> Result<PathBuf> {
    let data_dir = &args.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let path = data_dir.join(SCENARIO_FILE);
    if path.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Scenario::reference().save(&path)?;
    tracing::info!(data_dir = %data_dir.display(), "data directory initialized");
    Ok(path)
}

/// Play the scenario into a fresh ledger database.
fn run_scenario(args: &RunArgs, metrics: &NodeMetrics) -> Result<RunReport> {
    let scenario_path = args.scenario_path();
    let scenario = Scenario::load(&scenario_path)?;

    let db_path = args.data_dir.join(LEDGER_DIR);
    if db_path.exists() {
        tracing::info!(path = %db_path.display(), "replacing previous run");
        std::fs::remove_dir_all(&db_path)
            .with_context(|| format!("failed to clear {}", db_path.display()))?;
    }
    let db = LedgerDb::open(&db_path)
        .with_context(|| format!("failed to open ledger database at {}", db_path.display()))?;

    tracing::info!(
        scenario = %scenario_path.display(),
        steps = scenario.steps.len(),
        start_round = scenario.start_round,
        "running scenario"
    );
    let report = ScenarioRunner::prepare(&scenario, &db, metrics)?.run(&scenario.steps)?;
    tracing::info!(
        accepted = report.accepted(),
        rejected = report.rejected(),
        final_round = report.final_round,
        "scenario finished"
    );
    Ok(report)
}

/// Summary of the latest persisted snapshot.
fn status_summary(data_dir: &Path) -> Result<serde_json::Value> {
    let db_path = data_dir.join(LEDGER_DIR);
    if !db_path.exists() {
        anyhow::bail!("no run found under {}; try `gavel-node run`", data_dir.display());
    }
    let db = LedgerDb::open(&db_path)
        .with_context(|| format!("failed to open ledger database at {}", db_path.display()))?;
    let snapshot = db
        .latest_snapshot()?
        .context("ledger database holds no snapshot")?;
    let receipts = db.receipts()?;

    let applications: Vec<_> = snapshot
        .applications
        .iter()
        .map(|(app_id, app)| {
            json!({
                "app_id": app_id,
                "name": app.name,
                "creator": app.creator,
                "version": app.state.version,
                "state": app.state,
            })
        })
        .collect();

    Ok(json!({
        "round": snapshot.round,
        "accounts": snapshot.accounts.len(),
        "assets": snapshot.assets.len(),
        "receipts": receipts.len(),
        "last_commit": receipts.last().map(|r| r.committed_at),
        "applications": applications,
    }))
}

fn print_version() {
    println!("gavel-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol   {}", gavel_protocol::config::PROTOCOL_VERSION);
}
