//! Title custody guard.

use gavel_protocol::config::{CLAIM_GROUP_SIZE, UNIQUE_ASSET_TOTAL};
use gavel_protocol::identity::Address;
use gavel_protocol::program::{GuardContext, LogicProgram, ProgramError};
use gavel_protocol::transaction::{TransactionKind, TransactionType};

use super::{bound_escrow_spend, encode_program};
use crate::error::AuctionError;
use crate::title_claim::{Title, CLAIM_ARG_COUNT};
use crate::validation::{ensure, expect_app_call, expect_asset_transfer, expect_payment};

/// Guard over the account holding clawback rights on both title assets.
///
/// Unlike the auction guards it checks the whole claim shape: the donation
/// must come from the caller and go to `pool`, and the title asset must go
/// to the donor. The asset moved must be the one backing the title named in
/// the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleCustody {
    pub app_id: u64,
    pub pool: Address,
    pub crown_id: u64,
    pub sceptre_id: u64,
}

impl TitleCustody {
    pub fn new(app_id: u64, pool: Address, crown_id: u64, sceptre_id: u64) -> Self {
        Self {
            app_id,
            pool,
            crown_id,
            sceptre_id,
        }
    }

    /// Asset id backing `title`.
    pub fn asset_for(&self, title: Title) -> u64 {
        match title {
            Title::Crown => self.crown_id,
            Title::Sceptre => self.sceptre_id,
        }
    }

    fn check(&self, ctx: &GuardContext<'_>) -> Result<(), AuctionError> {
        let group = ctx.group();
        ensure(
            group.group_size() == CLAIM_GROUP_SIZE,
            AuctionError::UnexpectedGroupSize(group.group_size()),
        )?;
        ensure(
            ctx.index() == 2,
            AuctionError::WrongTransactionType {
                index: ctx.index(),
                expected: TransactionType::AssetTransfer,
            },
        )?;
        bound_escrow_spend(ctx, self.app_id)?;

        let call = expect_app_call(group, 0, self.app_id)?;
        let donation = expect_payment(group, 1)?;
        ensure(
            donation.sender == call.sender,
            AuctionError::SenderMismatch {
                index: 1,
                expected: call.sender,
                found: donation.sender,
            },
        )?;
        ensure(
            donation.receiver == self.pool,
            AuctionError::ReceiverMismatch {
                index: 1,
                expected: self.pool,
                found: donation.receiver,
            },
        )?;

        let handover = expect_asset_transfer(group, 2)?;
        ensure(
            handover.receiver == donation.sender,
            AuctionError::ReceiverMismatch {
                index: 2,
                expected: donation.sender,
                found: handover.receiver,
            },
        )?;

        let title_arg = match group.get(0).map(|tx| &tx.kind) {
            Some(TransactionKind::ApplicationCall { args, .. }) if args.len() == CLAIM_ARG_COUNT => &args[0],
            _ => {
                return Err(AuctionError::MalformedArgument {
                    index: 0,
                    reason: format!("claim takes {CLAIM_ARG_COUNT} arguments"),
                })
            }
        };
        let expected = self.asset_for(Title::from_arg(title_arg)?);
        ensure(
            handover.asset_id == expected,
            AuctionError::AssetMismatch {
                field: "id",
                expected,
                found: handover.asset_id,
            },
        )?;
        ensure(
            handover.amount == UNIQUE_ASSET_TOTAL,
            AuctionError::AssetMismatch {
                field: "amount",
                expected: UNIQUE_ASSET_TOTAL,
                found: handover.amount,
            },
        )
    }
}

impl LogicProgram for TitleCustody {
    fn name(&self) -> &str {
        "title-custody"
    }

    fn program_bytes(&self) -> Vec<u8> {
        let mut bytes = encode_program(b"gavel/title-custody/v1", &[self.app_id, self.crown_id, self.sceptre_id]);
        bytes.extend_from_slice(self.pool.as_bytes());
        bytes
    }

    fn evaluate(&self, ctx: &GuardContext<'_>) -> Result<(), ProgramError> {
        self.check(ctx).map_err(ProgramError::from)
    }
}
