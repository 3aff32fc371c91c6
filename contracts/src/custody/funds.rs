//! Funds custody guard.

use gavel_protocol::program::{GuardContext, LogicProgram, ProgramError};
use gavel_protocol::transaction::TransactionType;

use super::{bound_escrow_spend, encode_program};
use crate::error::AuctionError;

/// Guard over the account that receives bids and pays refunds and the
/// seller.
///
/// It authorizes payments, plus the opening application call itself when
/// the escrow sends it (the payout group). Amounts and recipients are left
/// to the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundsCustody {
    pub app_id: u64,
}

impl FundsCustody {
    pub fn new(app_id: u64) -> Self {
        Self { app_id }
    }

    fn check(&self, ctx: &GuardContext<'_>) -> Result<(), AuctionError> {
        let tx = bound_escrow_spend(ctx, self.app_id)?;
        match tx.tx_type() {
            TransactionType::Payment => Ok(()),
            TransactionType::ApplicationCall if ctx.index() == 0 => Ok(()),
            _ => Err(AuctionError::WrongTransactionType {
                index: ctx.index(),
                expected: TransactionType::Payment,
            }),
        }
    }
}

impl LogicProgram for FundsCustody {
    fn name(&self) -> &str {
        "funds-custody"
    }

    fn program_bytes(&self) -> Vec<u8> {
        encode_program(b"gavel/funds-custody/v1", &[self.app_id])
    }

    fn evaluate(&self, ctx: &GuardContext<'_>) -> Result<(), ProgramError> {
        self.check(ctx).map_err(ProgramError::from)
    }
}
