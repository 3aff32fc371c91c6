//! Asset custody guard.

use gavel_protocol::config::UNIQUE_ASSET_TOTAL;
use gavel_protocol::program::{GuardContext, LogicProgram, ProgramError};

use super::{bound_escrow_spend, encode_program};
use crate::error::AuctionError;
use crate::validation::{ensure, expect_asset_transfer};

/// Guard over the account that holds clawback rights on the auctioned asset.
///
/// It authorizes only asset transfers of exactly one unit of `asset_id`, in
/// a group opened by a call to `app_id`. Who receives the unit is the
/// contract's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetCustody {
    pub app_id: u64,
    pub asset_id: u64,
}

impl AssetCustody {
    pub fn new(app_id: u64, asset_id: u64) -> Self {
        Self { app_id, asset_id }
    }

    fn check(&self, ctx: &GuardContext<'_>) -> Result<(), AuctionError> {
        bound_escrow_spend(ctx, self.app_id)?;
        let xfer = expect_asset_transfer(ctx.group(), ctx.index())?;
        ensure(
            xfer.asset_id == self.asset_id,
            AuctionError::AssetMismatch {
                field: "id",
                expected: self.asset_id,
                found: xfer.asset_id,
            },
        )?;
        ensure(
            xfer.amount == UNIQUE_ASSET_TOTAL,
            AuctionError::AssetMismatch {
                field: "amount",
                expected: UNIQUE_ASSET_TOTAL,
                found: xfer.amount,
            },
        )
    }
}

impl LogicProgram for AssetCustody {
    fn name(&self) -> &str {
        "asset-custody"
    }

    fn program_bytes(&self) -> Vec<u8> {
        encode_program(b"gavel/asset-custody/v1", &[self.app_id, self.asset_id])
    }

    fn evaluate(&self, ctx: &GuardContext<'_>) -> Result<(), ProgramError> {
        self.check(ctx).map_err(ProgramError::from)
    }
}
