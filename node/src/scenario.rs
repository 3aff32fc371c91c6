//! # Scenario Runner
//!
//! A scenario is a JSON document describing a devnet run: the accounts to
//! fund, an auction and/or a title realm to deploy, and an ordered list of
//! steps. The runner drives each step the way a client would, reading the
//! current contract state to build the next group, and records every outcome.
//!
//! Rejected groups are ordinary outcomes, not errors. The runner only fails
//! when the scenario itself is inconsistent (unknown account, a `bid` step
//! without an auction) or when deployment or persistence fails.
//!
//! ```json
//! {
//!   "start_round": 100,
//!   "creator": "alice",
//!   "accounts": [{ "name": "alice", "balance": 20000000 }],
//!   "auction": { "unit_name": "LOT", "asset_name": "Lot", "seller": "seller", "duration": 150 },
//!   "steps": [{ "advance_to": { "round": 120 } }, { "bid": { "bidder": "bob", "amount": 3000000 } }]
//! }
//! ```

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use gavel_contracts::deployment::{
    deploy_auction, deploy_title_realm, AssetNames, AuctionDeployment, AuctionParams, RealmParams,
    TitleRealmDeployment,
};
use gavel_contracts::groups::{bid_group, claim_group, payout_group, Claim};
use gavel_contracts::{AuctionState, Title, TitleState};
use gavel_protocol::config::DEFAULT_AUCTION_DURATION;
use gavel_protocol::identity::Address;
use gavel_protocol::ledger::{Ledger, LedgerError};
use gavel_protocol::storage::LedgerDb;
use gavel_protocol::transaction::SignedGroup;
use serde::{Deserialize, Serialize};

use crate::metrics::NodeMetrics;

// ---------------------------------------------------------------------------
// Scenario Document
// ---------------------------------------------------------------------------

/// A complete devnet run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Round the ledger starts at. Contracts are created in this round.
    pub start_round: u64,
    /// Account that deploys everything and initially holds every asset.
    pub creator: String,
    pub accounts: Vec<AccountSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auction: Option<AuctionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<RealmSpec>,
    pub steps: Vec<Step>,
}

/// A genesis-funded account. Its address is derived from `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    pub name: String,
    pub balance: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSpec {
    pub unit_name: String,
    pub asset_name: String,
    /// Account name of the seller receiving the payout.
    pub seller: String,
    #[serde(default = "default_duration")]
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmSpec {
    pub founder: String,
    /// Account name of the rewards pool.
    pub pool: String,
    pub crown: AssetNames,
    pub sceptre: AssetNames,
}

/// One action against the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Move the round clock forward.
    AdvanceTo { round: u64 },
    /// Outbid the current owner.
    Bid { bidder: String, amount: u64 },
    /// Pay the seller. Without `amount` the current highest bid is paid.
    Payout {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<u64>,
    },
    /// Donate for a title.
    Claim {
        donor: String,
        title: Title,
        holder_name: String,
        donation: u64,
    },
}

fn default_duration() -> u64 {
    DEFAULT_AUCTION_DURATION
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Write the scenario as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("failed to write scenario {}", path.display()))
    }

    /// The reference auction: created at round 100 with a 150-round window,
    /// two accepted bids, one late bid, and the payout.
    pub fn reference() -> Self {
        Self {
            start_round: 100,
            creator: "alice".into(),
            accounts: vec![
                AccountSpec {
                    name: "alice".into(),
                    balance: 20_000_000,
                },
                AccountSpec {
                    name: "bob".into(),
                    balance: 20_000_000,
                },
            ],
            auction: Some(AuctionSpec {
                unit_name: "LOT".into(),
                asset_name: "Reference lot".into(),
                seller: "seller".into(),
                duration: 150,
            }),
            realm: None,
            steps: vec![
                Step::AdvanceTo { round: 120 },
                Step::Bid {
                    bidder: "bob".into(),
                    amount: 3_000_000,
                },
                Step::AdvanceTo { round: 130 },
                Step::Bid {
                    bidder: "alice".into(),
                    amount: 5_000_000,
                },
                Step::AdvanceTo { round: 260 },
                Step::Bid {
                    bidder: "bob".into(),
                    amount: 5_000_005,
                },
                Step::Payout { amount: None },
            ],
        }
    }

    fn known(&self, name: &str) -> bool {
        self.accounts.iter().any(|a| a.name == name)
    }
}

/// Devnet address of a named account.
pub fn account_address(name: &str) -> Address {
    Address::derive(name.as_bytes())
}

// ---------------------------------------------------------------------------
// Run Report
// ---------------------------------------------------------------------------

/// What happened to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub round: u64,
    pub step: Step,
    pub accepted: bool,
    /// Rejection cause, when rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub final_round: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction: Option<AuctionDeployment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_state: Option<AuctionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<TitleRealmDeployment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm_state: Option<TitleState>,
    pub outcomes: Vec<StepOutcome>,
}

impl RunReport {
    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.accepted).count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.accepted).count()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Executes a scenario against a fresh in-memory ledger, persisting a
/// snapshot after every step and a receipt for every committed group.
pub struct ScenarioRunner<'a> {
    ledger: Ledger,
    db: &'a LedgerDb,
    metrics: &'a NodeMetrics,
    auction: Option<AuctionDeployment>,
    realm: Option<TitleRealmDeployment>,
}

impl<'a> ScenarioRunner<'a> {
    /// Fund the accounts and deploy what the scenario declares.
    pub fn prepare(scenario: &Scenario, db: &'a LedgerDb, metrics: &'a NodeMetrics) -> Result<Self> {
        validate(scenario)?;

        let mut ledger = Ledger::new(scenario.start_round);
        for account in &scenario.accounts {
            ledger
                .fund(&account_address(&account.name), account.balance)
                .with_context(|| format!("failed to fund {}", account.name))?;
        }
        let creator = account_address(&scenario.creator);

        let auction = match &scenario.auction {
            Some(spec) => {
                let params = AuctionParams {
                    asset: AssetNames::new(spec.unit_name.clone(), spec.asset_name.clone()),
                    seller: account_address(&spec.seller),
                    duration: spec.duration,
                };
                let deployed = deploy_auction(&mut ledger, &creator, &params).context("auction deployment failed")?;
                for account in scenario.accounts.iter().filter(|a| a.name != scenario.creator) {
                    deployed
                        .opt_in(&mut ledger, &account_address(&account.name))
                        .with_context(|| format!("{} could not opt in to the lot", account.name))?;
                }
                Some(deployed)
            }
            None => None,
        };

        let realm = match &scenario.realm {
            Some(spec) => {
                let params = RealmParams {
                    founder: spec.founder.clone(),
                    pool: account_address(&spec.pool),
                    crown: spec.crown.clone(),
                    sceptre: spec.sceptre.clone(),
                };
                let deployed =
                    deploy_title_realm(&mut ledger, &creator, &params).context("title realm deployment failed")?;
                for account in scenario.accounts.iter().filter(|a| a.name != scenario.creator) {
                    deployed
                        .opt_in(&mut ledger, &account_address(&account.name))
                        .with_context(|| format!("{} could not opt in to the titles", account.name))?;
                }
                Some(deployed)
            }
            None => None,
        };

        db.put_snapshot(&ledger.snapshot())?;
        metrics.ledger_round.set(gauge_value(ledger.round()));

        Ok(Self {
            ledger,
            db,
            metrics,
            auction,
            realm,
        })
    }

    /// Run every step in order and report the outcomes.
    pub fn run(mut self, steps: &[Step]) -> Result<RunReport> {
        let mut outcomes = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let outcome = self.execute(index, step)?;
            match &outcome.reason {
                Some(reason) => tracing::warn!(index, round = outcome.round, %reason, "step rejected"),
                None => tracing::info!(index, round = outcome.round, "step accepted"),
            }
            outcomes.push(outcome);
            self.db.put_snapshot(&self.ledger.snapshot())?;
        }
        self.db.flush()?;

        let auction_state = match &self.auction {
            Some(auction) => Some(auction.state(&self.ledger)?),
            None => None,
        };
        let realm_state = match &self.realm {
            Some(realm) => Some(realm.state(&self.ledger)?),
            None => None,
        };
        Ok(RunReport {
            final_round: self.ledger.round(),
            auction: self.auction,
            auction_state,
            realm: self.realm,
            realm_state,
            outcomes,
        })
    }

    fn execute(&mut self, index: usize, step: &Step) -> Result<StepOutcome> {
        let group = match step {
            Step::AdvanceTo { round } => {
                let result = self.ledger.advance_to(*round);
                self.metrics.ledger_round.set(gauge_value(self.ledger.round()));
                return Ok(StepOutcome {
                    index,
                    round: self.ledger.round(),
                    step: step.clone(),
                    accepted: result.is_ok(),
                    reason: result.err().map(|e| e.to_string()),
                    group_id: None,
                });
            }
            Step::Bid { bidder, amount } => {
                let auction = self.auction.context("bid step without an auction")?;
                let state = auction.state(&self.ledger)?;
                let owner = state.current_owner.unwrap_or(auction.creator);
                bid_group(&auction, account_address(bidder), *amount, state.highest_bid, owner)?
            }
            Step::Payout { amount } => {
                let auction = self.auction.context("payout step without an auction")?;
                let highest = auction.state(&self.ledger)?.highest_bid;
                payout_group(&auction, amount.unwrap_or(highest))?
            }
            Step::Claim {
                donor,
                title,
                holder_name,
                donation,
            } => {
                let realm = self.realm.context("claim step without a title realm")?;
                let current_holder = realm
                    .holder_of(&self.ledger, *title)
                    .with_context(|| format!("nobody holds the {title}"))?;
                let claim = Claim {
                    donor: account_address(donor),
                    title: *title,
                    holder_name: holder_name.clone(),
                    donation: *donation,
                    current_holder,
                };
                claim_group(&realm, &claim)?
            }
        };

        let result = self.submit(&group)?;
        Ok(StepOutcome {
            index,
            round: self.ledger.round(),
            step: step.clone(),
            accepted: result.is_ok(),
            group_id: result.as_ref().ok().cloned(),
            reason: result.err().map(|e| e.to_string()),
        })
    }

    /// Submit one group. The outer `Result` is a persistence failure; the
    /// inner one is the ledger's verdict.
    fn submit(&mut self, group: &SignedGroup) -> Result<std::result::Result<String, LedgerError>> {
        self.metrics.groups_submitted_total.inc();
        let started = Instant::now();
        let verdict = self.ledger.submit(group);
        self.metrics
            .group_validation_seconds
            .observe(started.elapsed().as_secs_f64());

        match verdict {
            Ok(receipt) => {
                self.metrics.groups_accepted_total.inc();
                self.db.append_receipt(&receipt)?;
                if let Some(auction) = &self.auction {
                    let state = auction.state(&self.ledger)?;
                    self.metrics.highest_bid.set(gauge_value(state.highest_bid));
                }
                Ok(Ok(receipt.group_id))
            }
            Err(err) => {
                self.metrics.groups_rejected_total.inc();
                Ok(Err(err))
            }
        }
    }
}

fn validate(scenario: &Scenario) -> Result<()> {
    if !scenario.known(&scenario.creator) {
        bail!("creator {} is not a funded account", scenario.creator);
    }
    for step in &scenario.steps {
        let actor = match step {
            Step::Bid { bidder, .. } => bidder,
            Step::Claim { donor, .. } => donor,
            Step::AdvanceTo { .. } | Step::Payout { .. } => continue,
        };
        if !scenario.known(actor) {
            bail!("step refers to unknown account {actor}");
        }
    }
    Ok(())
}

fn gauge_value(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
