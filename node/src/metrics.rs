//! # Prometheus Metrics
//!
//! Counters and gauges for a scenario run, kept in a dedicated
//! [`prometheus::Registry`] with the `gavel` prefix. `run --metrics` prints
//! the text exposition once the run finishes.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

/// Metric handles for one node process.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Groups handed to the ledger.
    pub groups_submitted_total: IntCounter,
    /// Groups the ledger committed.
    pub groups_accepted_total: IntCounter,
    /// Groups the ledger rejected.
    pub groups_rejected_total: IntCounter,
    /// Current ledger round.
    pub ledger_round: IntGauge,
    /// Highest bid recorded by the auction contract.
    pub highest_bid: IntGauge,
    /// Time spent inside `Ledger::submit`, accepted or not.
    pub group_validation_seconds: Histogram,
}

impl NodeMetrics {
    /// Create and register all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("gavel".into()), None)?;

        let groups_submitted_total =
            IntCounter::new("groups_submitted_total", "Transaction groups submitted to the ledger")?;
        registry.register(Box::new(groups_submitted_total.clone()))?;

        let groups_accepted_total =
            IntCounter::new("groups_accepted_total", "Transaction groups committed by the ledger")?;
        registry.register(Box::new(groups_accepted_total.clone()))?;

        let groups_rejected_total =
            IntCounter::new("groups_rejected_total", "Transaction groups rejected by the ledger")?;
        registry.register(Box::new(groups_rejected_total.clone()))?;

        let ledger_round = IntGauge::new("ledger_round", "Current ledger round")?;
        registry.register(Box::new(ledger_round.clone()))?;

        let highest_bid = IntGauge::new("highest_bid", "Highest bid recorded by the auction")?;
        registry.register(Box::new(highest_bid.clone()))?;

        let group_validation_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "group_validation_seconds",
                "Time to validate and apply one transaction group",
            )
            .buckets(vec![0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05]),
        )?;
        registry.register(Box::new(group_validation_seconds.clone()))?;

        Ok(Self {
            registry,
            groups_submitted_total,
            groups_accepted_total,
            groups_rejected_total,
            ledger_round,
            highest_bid,
            group_validation_seconds,
        })
    }

    /// Encode all registered metrics in the Prometheus text format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
