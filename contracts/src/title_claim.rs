//! # Title Claims
//!
//! The second guarded-auction flavour: a realm with two honorary titles,
//! each backed by a unique asset. Anyone may take a title by donating more
//! than its current record to the rewards pool; the custody escrow then
//! claws the title asset over to the donor. There is no seller and no
//! payout.
//!
//! ```text
//! [0] app call       donor        -> contract   args: [title, new holder name]
//! [1] payment        donor        -> rewards pool
//! [2] asset transfer title escrow -> donor      (clawback from holder)
//! ```

use std::fmt;
use std::str::FromStr;

use gavel_protocol::config::{CLAIM_GROUP_SIZE, MAX_STATE_VALUE_LENGTH, TITLE_NUM_BYTE_SLICES, TITLE_NUM_UINTS};
use gavel_protocol::identity::Address;
use gavel_protocol::program::CallContext;
use gavel_protocol::storage::{ContractState, GlobalState, StateError, StateSchema};
use serde::{Deserialize, Serialize};

use crate::error::AuctionError;
use crate::guarded::{AuctionRules, GuardedAuction};
use crate::validation::{decode_address_arg, ensure, expect_asset_transfer, expect_payment};

const CROWN_HOLDER: &str = "crown_holder";
const CROWN_DONATION: &str = "crown_donation";
const SCEPTRE_HOLDER: &str = "sceptre_holder";
const SCEPTRE_DONATION: &str = "sceptre_donation";
const CUSTODY: &str = "custody";

/// Number of arguments a claim call carries.
pub const CLAIM_ARG_COUNT: usize = 2;

/// The two titles of the realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Title {
    Crown,
    Sceptre,
}

impl Title {
    pub const ALL: [Title; 2] = [Title::Crown, Title::Sceptre];

    /// The exact bytes a claim call carries as its first argument.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crown => "Crown",
            Self::Sceptre => "Sceptre",
        }
    }

    /// Decode a claim argument.
    pub fn from_arg(arg: &[u8]) -> Result<Self, AuctionError> {
        match arg {
            b"Crown" => Ok(Self::Crown),
            b"Sceptre" => Ok(Self::Sceptre),
            other => Err(AuctionError::UnknownTitle(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Title {
    type Err = AuctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_arg(s.as_bytes())
    }
}

/// Current holder and record donation of one title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    pub holder: String,
    pub donation: u64,
}

/// Typed realm state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleState {
    pub crown: TitleRecord,
    pub sceptre: TitleRecord,
    /// Title escrow address. Set once.
    pub custody: Option<Address>,
}

impl TitleState {
    pub fn record(&self, title: Title) -> &TitleRecord {
        match title {
            Title::Crown => &self.crown,
            Title::Sceptre => &self.sceptre,
        }
    }

    fn record_mut(&mut self, title: Title) -> &mut TitleRecord {
        match title {
            Title::Crown => &mut self.crown,
            Title::Sceptre => &mut self.sceptre,
        }
    }
}

fn read_name(state: &GlobalState, key: &str) -> Result<String, StateError> {
    match state.read_bytes(key)? {
        None => Ok(String::new()),
        Some(bytes) => String::from_utf8(bytes.to_vec()).map_err(|e| StateError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        }),
    }
}

impl ContractState for TitleState {
    fn load(state: &GlobalState) -> Result<Self, StateError> {
        Ok(Self {
            crown: TitleRecord {
                holder: read_name(state, CROWN_HOLDER)?,
                donation: state.read_uint(CROWN_DONATION)?.unwrap_or(0),
            },
            sceptre: TitleRecord {
                holder: read_name(state, SCEPTRE_HOLDER)?,
                donation: state.read_uint(SCEPTRE_DONATION)?.unwrap_or(0),
            },
            custody: state.read_address(CUSTODY)?,
        })
    }

    fn store(&self, state: &mut GlobalState) -> Result<(), StateError> {
        state.write_bytes(CROWN_HOLDER, self.crown.holder.as_bytes())?;
        state.write_uint(CROWN_DONATION, self.crown.donation)?;
        state.write_bytes(SCEPTRE_HOLDER, self.sceptre.holder.as_bytes())?;
        state.write_uint(SCEPTRE_DONATION, self.sceptre.donation)?;
        if let Some(custody) = self.custody {
            state.write_address(CUSTODY, &custody)?;
        }
        Ok(())
    }
}

/// Rules of the title realm. Both titles start with `founder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRules {
    pub founder: String,
}

impl TitleRules {
    pub fn new(founder: impl Into<String>) -> Self {
        Self {
            founder: founder.into(),
        }
    }
}

impl AuctionRules for TitleRules {
    type State = TitleState;

    const NAME: &'static str = "title-realm";
    const SCHEMA: StateSchema = StateSchema::new(TITLE_NUM_UINTS, TITLE_NUM_BYTE_SLICES);
    const BID_GROUP_SIZE: usize = CLAIM_GROUP_SIZE;
    const PAYOUT_GROUP_SIZE: Option<usize> = None;

    fn initialize(&self, _round: u64) -> TitleState {
        let founding = TitleRecord {
            holder: self.founder.clone(),
            donation: 0,
        };
        TitleState {
            crown: founding.clone(),
            sceptre: founding,
            custody: None,
        }
    }

    /// Promulgates the title escrow address. Argument 0 is the address.
    fn configure(&self, state: &mut TitleState, ctx: &CallContext<'_>) -> Result<(), AuctionError> {
        ensure(state.custody.is_none(), AuctionError::ConfigurationAlreadySet)?;
        state.custody = Some(decode_address_arg(ctx.args(), 0)?);
        Ok(())
    }

    fn accept_bid(&self, state: &mut TitleState, ctx: &CallContext<'_>) -> Result<(), AuctionError> {
        let custody = state.custody.ok_or(AuctionError::NotConfigured)?;
        let args = ctx.args();
        ensure(
            args.len() == CLAIM_ARG_COUNT,
            AuctionError::MalformedArgument {
                index: 0,
                reason: format!("claim takes {CLAIM_ARG_COUNT} arguments"),
            },
        )?;
        let title = Title::from_arg(&args[0])?;
        let new_holder = String::from_utf8(args[1].clone()).map_err(|e| AuctionError::MalformedArgument {
            index: 1,
            reason: e.to_string(),
        })?;
        ensure(
            new_holder.len() <= MAX_STATE_VALUE_LENGTH,
            AuctionError::MalformedArgument {
                index: 1,
                reason: format!("holder name exceeds {MAX_STATE_VALUE_LENGTH} bytes"),
            },
        )?;

        let donation = expect_payment(ctx.group(), 1)?;
        let handover = expect_asset_transfer(ctx.group(), 2)?;
        ensure(
            handover.sender == custody,
            AuctionError::SenderMismatch {
                index: 2,
                expected: custody,
                found: handover.sender,
            },
        )?;

        let record = state.record_mut(title);
        ensure(
            donation.amount > record.donation,
            AuctionError::AmountTooLow {
                offered: donation.amount,
                highest: record.donation,
            },
        )?;
        record.holder = new_holder;
        record.donation = donation.amount;
        Ok(())
    }
}

/// The deployable title realm contract.
pub type TitleClaimContract = GuardedAuction<TitleRules>;

impl TitleClaimContract {
    pub fn realm(founder: impl Into<String>) -> Self {
        GuardedAuction::new(TitleRules::new(founder))
    }
}
