//! # Ascending-Bid Auction
//!
//! An auction for a single unique asset. Bids are paid into the funds
//! escrow, the previous highest bidder is refunded from it in the same
//! group, and the asset is clawed back to the new leader by the asset
//! escrow. After the window closes the seller can collect the winning bid.
//!
//! ## State
//!
//! | Key             | Type  | Written by                |
//! |-----------------|-------|---------------------------|
//! | `highest_bid`   | uint  | creation, every bid       |
//! | `start_round`   | uint  | creation                  |
//! | `end_round`     | uint  | configuration (once)      |
//! | `owner`         | bytes | configuration, every bid  |
//! | `asset_custody` | bytes | configuration (once)      |
//! | `funds_custody` | bytes | configuration (once)      |
//! | `seller`        | bytes | configuration (once)      |
//!
//! ## Bid group
//!
//! ```text
//! [0] app call       bidder        -> contract
//! [1] payment        bidder        -> funds escrow   amount > highest_bid
//! [2] payment        funds escrow  -> owner          amount == highest_bid
//! [3] asset transfer asset escrow  -> bidder         (clawback from owner)
//! ```
//!
//! The bidding window `start_round..=end_round` is inclusive at both ends.
//! A bid equal to the current record never displaces it; the leader may
//! raise their own bid.

use gavel_protocol::config::{
    AUCTION_NUM_BYTE_SLICES, AUCTION_NUM_UINTS, BID_GROUP_SIZE as BID_SIZE, PAYOUT_GROUP_SIZE as PAYOUT_SIZE,
};
use gavel_protocol::identity::Address;
use gavel_protocol::program::CallContext;
use gavel_protocol::storage::{ContractState, GlobalState, StateError, StateSchema};
use gavel_protocol::transaction::TransactionType;
use serde::{Deserialize, Serialize};

use crate::error::AuctionError;
use crate::guarded::{AuctionRules, GuardedAuction};
use crate::validation::{
    decode_address_arg, decode_uint_arg, ensure, expect_asset_transfer, expect_payment, itob,
};

const HIGHEST_BID: &str = "highest_bid";
const START_ROUND: &str = "start_round";
const END_ROUND: &str = "end_round";
const OWNER: &str = "owner";
const ASSET_CUSTODY: &str = "asset_custody";
const FUNDS_CUSTODY: &str = "funds_custody";
const SELLER: &str = "seller";

/// Number of arguments the configuration call carries.
pub const CONFIGURE_ARG_COUNT: usize = 5;

/// Arguments of the one-time configuration call, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionTerms {
    pub asset_custody: Address,
    pub funds_custody: Address,
    pub initial_owner: Address,
    /// Length of the bidding window in rounds.
    pub duration: u64,
    pub seller: Address,
}

impl AuctionTerms {
    /// Encode as call arguments. The duration is 8 bytes big-endian.
    pub fn to_args(&self) -> Vec<Vec<u8>> {
        vec![
            self.asset_custody.as_bytes().to_vec(),
            self.funds_custody.as_bytes().to_vec(),
            self.initial_owner.as_bytes().to_vec(),
            itob(self.duration),
            self.seller.as_bytes().to_vec(),
        ]
    }

    /// Decode call arguments. Extra arguments are rejected.
    pub fn from_args(args: &[Vec<u8>]) -> Result<Self, AuctionError> {
        ensure(
            args.len() <= CONFIGURE_ARG_COUNT,
            AuctionError::MalformedArgument {
                index: CONFIGURE_ARG_COUNT,
                reason: format!("configuration takes {CONFIGURE_ARG_COUNT} arguments"),
            },
        )?;
        Ok(Self {
            asset_custody: decode_address_arg(args, 0)?,
            funds_custody: decode_address_arg(args, 1)?,
            initial_owner: decode_address_arg(args, 2)?,
            duration: decode_uint_arg(args, 3)?,
            seller: decode_address_arg(args, 4)?,
        })
    }
}

/// Typed auction state. Fields written by configuration are `None` until
/// then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionState {
    pub highest_bid: u64,
    pub start_round: u64,
    pub end_round: Option<u64>,
    pub current_owner: Option<Address>,
    pub asset_custody: Option<Address>,
    pub funds_custody: Option<Address>,
    pub seller: Option<Address>,
}

impl AuctionState {
    /// Returns `true` once the one-time configuration has run.
    pub fn is_configured(&self) -> bool {
        self.asset_custody.is_some() || self.funds_custody.is_some()
    }

    /// Returns `true` if a bid at `round` falls inside the window.
    pub fn is_open_at(&self, round: u64) -> bool {
        matches!(self.end_round, Some(end) if round >= self.start_round && round <= end)
    }

    /// Returns `true` if the seller may collect at `round`.
    pub fn has_ended_at(&self, round: u64) -> bool {
        matches!(self.end_round, Some(end) if round > end)
    }

    fn configured(&self) -> Result<Configured, AuctionError> {
        match (
            self.end_round,
            self.current_owner,
            self.asset_custody,
            self.funds_custody,
            self.seller,
        ) {
            (Some(end_round), Some(owner), Some(asset_custody), Some(funds_custody), Some(seller)) => {
                Ok(Configured {
                    end_round,
                    owner,
                    asset_custody,
                    funds_custody,
                    seller,
                })
            }
            _ => Err(AuctionError::NotConfigured),
        }
    }
}

/// The configured fields, all present.
struct Configured {
    end_round: u64,
    owner: Address,
    asset_custody: Address,
    funds_custody: Address,
    seller: Address,
}

impl ContractState for AuctionState {
    fn load(state: &GlobalState) -> Result<Self, StateError> {
        Ok(Self {
            highest_bid: state.read_uint(HIGHEST_BID)?.unwrap_or(0),
            start_round: state.read_uint(START_ROUND)?.unwrap_or(0),
            end_round: state.read_uint(END_ROUND)?,
            current_owner: state.read_address(OWNER)?,
            asset_custody: state.read_address(ASSET_CUSTODY)?,
            funds_custody: state.read_address(FUNDS_CUSTODY)?,
            seller: state.read_address(SELLER)?,
        })
    }

    fn store(&self, state: &mut GlobalState) -> Result<(), StateError> {
        state.write_uint(HIGHEST_BID, self.highest_bid)?;
        state.write_uint(START_ROUND, self.start_round)?;
        if let Some(end) = self.end_round {
            state.write_uint(END_ROUND, end)?;
        }
        let addresses = [
            (OWNER, self.current_owner),
            (ASSET_CUSTODY, self.asset_custody),
            (FUNDS_CUSTODY, self.funds_custody),
            (SELLER, self.seller),
        ];
        for (key, value) in addresses {
            if let Some(addr) = value {
                state.write_address(key, &addr)?;
            }
        }
        Ok(())
    }
}

/// Rules of the ascending-bid auction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BidRules;

impl AuctionRules for BidRules {
    type State = AuctionState;

    const NAME: &'static str = "auction";
    const SCHEMA: StateSchema = StateSchema::new(AUCTION_NUM_UINTS, AUCTION_NUM_BYTE_SLICES);
    const BID_GROUP_SIZE: usize = BID_SIZE;
    const PAYOUT_GROUP_SIZE: Option<usize> = Some(PAYOUT_SIZE);

    fn initialize(&self, round: u64) -> AuctionState {
        AuctionState {
            highest_bid: 0,
            start_round: round,
            end_round: None,
            current_owner: None,
            asset_custody: None,
            funds_custody: None,
            seller: None,
        }
    }

    fn configure(&self, state: &mut AuctionState, ctx: &CallContext<'_>) -> Result<(), AuctionError> {
        ensure(!state.is_configured(), AuctionError::ConfigurationAlreadySet)?;
        let terms = AuctionTerms::from_args(ctx.args())?;

        state.end_round = Some(
            state
                .start_round
                .checked_add(terms.duration)
                .ok_or(AuctionError::Overflow)?,
        );
        state.asset_custody = Some(terms.asset_custody);
        state.funds_custody = Some(terms.funds_custody);
        state.current_owner = Some(terms.initial_owner);
        state.seller = Some(terms.seller);
        Ok(())
    }

    fn accept_bid(&self, state: &mut AuctionState, ctx: &CallContext<'_>) -> Result<(), AuctionError> {
        let cfg = state.configured()?;
        let round = ctx.round();
        ensure(
            state.is_open_at(round),
            AuctionError::AuctionWindowClosed {
                round,
                start_round: state.start_round,
                end_round: cfg.end_round,
            },
        )?;

        let group = ctx.group();
        let bidder = ctx.sender().ok_or(AuctionError::WrongTransactionType {
            index: 0,
            expected: TransactionType::ApplicationCall,
        })?;

        let deposit = expect_payment(group, 1)?;
        ensure(
            deposit.amount > state.highest_bid,
            AuctionError::AmountTooLow {
                offered: deposit.amount,
                highest: state.highest_bid,
            },
        )?;
        ensure(
            deposit.sender == bidder,
            AuctionError::SenderMismatch {
                index: 1,
                expected: bidder,
                found: deposit.sender,
            },
        )?;
        ensure(
            deposit.receiver == cfg.funds_custody,
            AuctionError::ReceiverMismatch {
                index: 1,
                expected: cfg.funds_custody,
                found: deposit.receiver,
            },
        )?;

        let refund = expect_payment(group, 2)?;
        ensure(
            refund.sender == cfg.funds_custody,
            AuctionError::SenderMismatch {
                index: 2,
                expected: cfg.funds_custody,
                found: refund.sender,
            },
        )?;
        ensure(
            refund.receiver == cfg.owner,
            AuctionError::ReceiverMismatch {
                index: 2,
                expected: cfg.owner,
                found: refund.receiver,
            },
        )?;
        ensure(
            refund.amount == state.highest_bid,
            AuctionError::RefundMismatch {
                expected: state.highest_bid,
                found: refund.amount,
            },
        )?;

        let handover = expect_asset_transfer(group, 3)?;
        ensure(
            handover.sender == cfg.asset_custody,
            AuctionError::SenderMismatch {
                index: 3,
                expected: cfg.asset_custody,
                found: handover.sender,
            },
        )?;
        ensure(
            handover.receiver == deposit.sender,
            AuctionError::ReceiverMismatch {
                index: 3,
                expected: deposit.sender,
                found: handover.receiver,
            },
        )?;

        state.highest_bid = deposit.amount;
        state.current_owner = Some(deposit.sender);
        Ok(())
    }

    fn accept_payout(&self, state: &AuctionState, ctx: &CallContext<'_>) -> Result<(), AuctionError> {
        let cfg = state.configured()?;
        let round = ctx.round();
        ensure(
            state.has_ended_at(round),
            AuctionError::AuctionNotYetEnded {
                round,
                end_round: cfg.end_round,
            },
        )?;

        let payout = expect_payment(ctx.group(), 1)?;
        ensure(
            payout.sender == cfg.funds_custody,
            AuctionError::SenderMismatch {
                index: 1,
                expected: cfg.funds_custody,
                found: payout.sender,
            },
        )?;
        ensure(
            payout.receiver == cfg.seller,
            AuctionError::ReceiverMismatch {
                index: 1,
                expected: cfg.seller,
                found: payout.receiver,
            },
        )?;
        ensure(
            payout.amount == state.highest_bid,
            AuctionError::PayoutMismatch {
                expected: state.highest_bid,
                found: payout.amount,
            },
        )
    }
}

/// The deployable auction contract.
pub type AuctionContract = GuardedAuction<BidRules>;

impl AuctionContract {
    pub fn auction() -> Self {
        GuardedAuction::new(BidRules)
    }
}
