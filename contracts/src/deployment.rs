//! # Deployment
//!
//! Brings a contract, its assets and its escrows to life on a ledger in the
//! order the pieces depend on each other:
//!
//! 1. Create the application. Its id is needed to derive the guards.
//! 2. Create the unique asset(s), frozen by default, clawback = creator.
//! 3. Derive and register the custody guards.
//! 4. Fund each escrow with enough to pay its own fees.
//! 5. Hand the asset clawback over to the custody escrow.
//! 6. Send the one-time configuration call.
//!
//! The creator pays for every step and must already hold funds.

use std::sync::Arc;

use gavel_protocol::config::{ESCROW_FEE_FLOAT, UNIQUE_ASSET_TOTAL};
use gavel_protocol::identity::Address;
use gavel_protocol::ledger::{AssetConfig, GroupReceipt, Ledger, LedgerError};
use gavel_protocol::storage::{ContractState, StateError};
use gavel_protocol::transaction::{SignedGroup, SignedTransaction, TransactionBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auction::{AuctionContract, AuctionState, AuctionTerms};
use crate::custody::{AssetCustody, FundsCustody, TitleCustody};
use crate::groups::{configure_call, promulgate_call};
use crate::title_claim::{Title, TitleClaimContract, TitleState};

/// Names of a unique asset to mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetNames {
    pub unit_name: String,
    pub name: String,
}

impl AssetNames {
    pub fn new(unit_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            name: name.into(),
        }
    }

    fn unique(&self, creator: &Address) -> AssetConfig {
        AssetConfig {
            total: UNIQUE_ASSET_TOTAL,
            decimals: 0,
            unit_name: self.unit_name.clone(),
            name: self.name.clone(),
            manager: Some(*creator),
            clawback: Some(*creator),
            default_frozen: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Auction
// ---------------------------------------------------------------------------

/// What the auction creator decides up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    pub asset: AssetNames,
    pub seller: Address,
    /// Bidding window length in rounds.
    pub duration: u64,
}

/// Handles to a deployed auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionDeployment {
    pub app_id: u64,
    pub asset_id: u64,
    /// Creator and initial owner of the asset.
    pub creator: Address,
    pub asset_custody: Address,
    pub funds_custody: Address,
    pub seller: Address,
    pub start_round: u64,
    pub end_round: u64,
}

impl AuctionDeployment {
    /// Current typed state of the auction.
    pub fn state(&self, ledger: &Ledger) -> Result<AuctionState, StateError> {
        match ledger.global_state(self.app_id) {
            Some(global) => AuctionState::load(global),
            None => Err(StateError::Malformed {
                key: format!("app:{}", self.app_id),
                reason: "application not found".into(),
            }),
        }
    }

    /// Let `bidder` receive the asset.
    pub fn opt_in(&self, ledger: &mut Ledger, bidder: &Address) -> Result<GroupReceipt, LedgerError> {
        ledger.opt_in_asset(bidder, self.asset_id)
    }
}

/// Deploy and configure an auction. The creator holds the asset and is the
/// initial owner.
pub fn deploy_auction(
    ledger: &mut Ledger,
    creator: &Address,
    params: &AuctionParams,
) -> Result<AuctionDeployment, LedgerError> {
    let start_round = ledger.round();
    let app_id = ledger.create_application(creator, Arc::new(AuctionContract::auction()))?;
    let asset_id = ledger.create_asset(creator, params.asset.unique(creator))?;

    let asset_guard = AssetCustody::new(app_id, asset_id);
    let funds_guard = FundsCustody::new(app_id);
    let asset_custody = ledger.register_program(Arc::new(asset_guard));
    let funds_custody = ledger.register_program(Arc::new(funds_guard));

    fund_escrow(ledger, creator, &asset_custody)?;
    fund_escrow(ledger, creator, &funds_custody)?;
    ledger.set_asset_clawback(creator, asset_id, Some(asset_custody))?;

    let terms = AuctionTerms {
        asset_custody,
        funds_custody,
        initial_owner: *creator,
        duration: params.duration,
        seller: params.seller,
    };
    ledger.submit(&configure_call(*creator, app_id, &terms)?)?;

    let end_round = start_round.checked_add(params.duration).ok_or(LedgerError::Overflow)?;
    info!(
        app_id,
        asset_id,
        asset_custody = %asset_custody.short(),
        funds_custody = %funds_custody.short(),
        start_round,
        end_round,
        "auction deployed"
    );

    Ok(AuctionDeployment {
        app_id,
        asset_id,
        creator: *creator,
        asset_custody,
        funds_custody,
        seller: params.seller,
        start_round,
        end_round,
    })
}

// ---------------------------------------------------------------------------
// Title realm
// ---------------------------------------------------------------------------

/// What the realm creator decides up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmParams {
    /// Name recorded as the first holder of both titles.
    pub founder: String,
    /// Account that receives every donation.
    pub pool: Address,
    pub crown: AssetNames,
    pub sceptre: AssetNames,
}

/// Handles to a deployed title realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRealmDeployment {
    pub app_id: u64,
    pub crown_id: u64,
    pub sceptre_id: u64,
    pub creator: Address,
    pub custody: Address,
    pub pool: Address,
}

impl TitleRealmDeployment {
    /// Asset id backing `title`.
    pub fn asset_for(&self, title: Title) -> u64 {
        match title {
            Title::Crown => self.crown_id,
            Title::Sceptre => self.sceptre_id,
        }
    }

    /// Current typed state of the realm.
    pub fn state(&self, ledger: &Ledger) -> Result<TitleState, StateError> {
        match ledger.global_state(self.app_id) {
            Some(global) => TitleState::load(global),
            None => Err(StateError::Malformed {
                key: format!("app:{}", self.app_id),
                reason: "application not found".into(),
            }),
        }
    }

    /// Account currently holding the unit of `title`, if any.
    pub fn holder_of(&self, ledger: &Ledger, title: Title) -> Option<Address> {
        let asset_id = self.asset_for(title);
        ledger
            .snapshot()
            .accounts
            .into_iter()
            .find(|(_, account)| account.holdings.get(&asset_id).map(|h| h.amount) == Some(UNIQUE_ASSET_TOTAL))
            .map(|(address, _)| address)
    }

    /// Let `donor` receive both titles.
    pub fn opt_in(&self, ledger: &mut Ledger, donor: &Address) -> Result<(), LedgerError> {
        ledger.opt_in_asset(donor, self.crown_id)?;
        ledger.opt_in_asset(donor, self.sceptre_id)?;
        Ok(())
    }
}

/// Deploy a title realm and promulgate its custody escrow.
pub fn deploy_title_realm(
    ledger: &mut Ledger,
    creator: &Address,
    params: &RealmParams,
) -> Result<TitleRealmDeployment, LedgerError> {
    let contract = TitleClaimContract::realm(params.founder.clone());
    let app_id = ledger.create_application(creator, Arc::new(contract))?;
    let crown_id = ledger.create_asset(creator, params.crown.unique(creator))?;
    let sceptre_id = ledger.create_asset(creator, params.sceptre.unique(creator))?;

    let guard = TitleCustody::new(app_id, params.pool, crown_id, sceptre_id);
    let custody = ledger.register_program(Arc::new(guard));

    fund_escrow(ledger, creator, &custody)?;
    ledger.set_asset_clawback(creator, crown_id, Some(custody))?;
    ledger.set_asset_clawback(creator, sceptre_id, Some(custody))?;
    ledger.submit(&promulgate_call(*creator, app_id, custody)?)?;

    info!(app_id, crown_id, sceptre_id, custody = %custody.short(), "title realm deployed");

    Ok(TitleRealmDeployment {
        app_id,
        crown_id,
        sceptre_id,
        creator: *creator,
        custody,
        pool: params.pool,
    })
}

/// Pay [`ESCROW_FEE_FLOAT`] from `funder` so the escrow can cover fees.
fn fund_escrow(ledger: &mut Ledger, funder: &Address, escrow: &Address) -> Result<GroupReceipt, LedgerError> {
    let payment = TransactionBuilder::payment(*funder, *escrow, ESCROW_FEE_FLOAT).build();
    let group = SignedGroup::assemble(vec![SignedTransaction::signed(payment)])?;
    ledger.submit(&group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_protocol::program::LogicProgram;

    fn creator() -> Address {
        Address::derive(b"creator")
    }

    fn funded_ledger(round: u64) -> Ledger {
        let mut ledger = Ledger::new(round);
        ledger.fund(&creator(), 10_000_000).unwrap();
        ledger
    }

    #[test]
    fn auction_deployment_wires_everything() {
        let mut ledger = funded_ledger(100);
        let params = AuctionParams {
            asset: AssetNames::new("LOT", "Lot 1"),
            seller: Address::derive(b"seller"),
            duration: 150,
        };
        let d = deploy_auction(&mut ledger, &creator(), &params).unwrap();

        assert_eq!((d.start_round, d.end_round), (100, 250));
        assert_eq!(AssetCustody::new(d.app_id, d.asset_id).address(), d.asset_custody);
        assert_eq!(FundsCustody::new(d.app_id).address(), d.funds_custody);
        assert_eq!(ledger.balance(&d.funds_custody), ESCROW_FEE_FLOAT);
        assert_eq!(ledger.balance(&d.asset_custody), ESCROW_FEE_FLOAT);

        let params_on_ledger = ledger.asset_params(d.asset_id).unwrap();
        assert_eq!(params_on_ledger.clawback, Some(d.asset_custody));
        assert!(params_on_ledger.default_frozen);
        assert_eq!(
            ledger.asset_holding(&creator(), d.asset_id).map(|h| h.amount),
            Some(1)
        );

        let state = d.state(&ledger).unwrap();
        assert_eq!(state.end_round, Some(250));
        assert_eq!(state.current_owner, Some(creator()));
        assert_eq!(state.seller, Some(params.seller));
        assert_eq!(state.highest_bid, 0);
    }

    #[test]
    fn deployment_needs_a_funded_creator() {
        let mut ledger = Ledger::new(0);
        let params = AuctionParams {
            asset: AssetNames::new("LOT", "Lot 1"),
            seller: Address::derive(b"seller"),
            duration: 10,
        };
        assert!(matches!(
            deploy_auction(&mut ledger, &creator(), &params),
            Err(LedgerError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn realm_deployment_gives_founder_both_titles() {
        let mut ledger = funded_ledger(0);
        let params = RealmParams {
            founder: "Silvio".into(),
            pool: Address::derive(b"pool"),
            crown: AssetNames::new("CROWN", "Crown of Entropy"),
            sceptre: AssetNames::new("SCEPTRE", "Sceptre of Proof"),
        };
        let realm = deploy_title_realm(&mut ledger, &creator(), &params).unwrap();

        let state = realm.state(&ledger).unwrap();
        assert_eq!(state.custody, Some(realm.custody));
        assert_eq!(state.crown.holder, "Silvio");
        assert_eq!(realm.holder_of(&ledger, Title::Crown), Some(creator()));
        assert_eq!(realm.holder_of(&ledger, Title::Sceptre), Some(creator()));
        assert_ne!(realm.crown_id, realm.sceptre_id);
    }
}
