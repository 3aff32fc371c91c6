//! Rejection causes shared by the auction contracts and the custody guards.
//!
//! The ledger only distinguishes "approved" from "rejected". These variants
//! exist so the node, the logs and the tests can tell *why* a group was
//! rejected; on the way out they collapse into [`ProgramError`].

use gavel_protocol::identity::Address;
use gavel_protocol::program::ProgramError;
use gavel_protocol::storage::StateError;
use gavel_protocol::transaction::{OnCompletion, TransactionType};
use thiserror::Error;

/// Why an auction contract or custody guard refused a group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    /// The custody addresses were already written by an earlier call.
    #[error("auction is already configured")]
    ConfigurationAlreadySet,

    /// A payout was attempted while the auction is still open.
    #[error("auction ends at round {end_round}; current round is {round}")]
    AuctionNotYetEnded { round: u64, end_round: u64 },

    /// A bid arrived outside the inclusive active window.
    #[error("round {round} is outside the bidding window {start_round}..={end_round}")]
    AuctionWindowClosed {
        round: u64,
        start_round: u64,
        end_round: u64,
    },

    /// The offer does not strictly exceed the current record.
    #[error("offer {offered} does not exceed current highest {highest}")]
    AmountTooLow { offered: u64, highest: u64 },

    /// A bid, claim or payout arrived before the one-time configuration.
    #[error("auction is not configured")]
    NotConfigured,

    /// The group shape matches no operation of the contract.
    #[error("unexpected group size {0}")]
    UnexpectedGroupSize(usize),

    /// Only plain no-op calls are accepted.
    #[error("on-completion {0} is not accepted")]
    UnsupportedOnCompletion(OnCompletion),

    /// A group member has the wrong kind, or is missing.
    #[error("transaction {index} must be a {expected}")]
    WrongTransactionType {
        index: usize,
        expected: TransactionType,
    },

    /// A group member was sent by the wrong account.
    #[error("transaction {index} must be sent by {expected}, not {found}")]
    SenderMismatch {
        index: usize,
        expected: Address,
        found: Address,
    },

    /// A group member pays or transfers to the wrong account.
    #[error("transaction {index} must go to {expected}, not {found}")]
    ReceiverMismatch {
        index: usize,
        expected: Address,
        found: Address,
    },

    /// The refund to the previous owner is not the previous highest bid.
    #[error("refund must be exactly {expected}, got {found}")]
    RefundMismatch { expected: u64, found: u64 },

    /// The seller payout is not the final highest bid.
    #[error("payout must be exactly {expected}, got {found}")]
    PayoutMismatch { expected: u64, found: u64 },

    /// Wrong asset id or wrong number of units.
    #[error("asset {field} must be {expected}, got {found}")]
    AssetMismatch {
        field: &'static str,
        expected: u64,
        found: u64,
    },

    /// A call argument is missing or cannot be decoded.
    #[error("argument {index}: {reason}")]
    MalformedArgument { index: usize, reason: String },

    /// A title claim names a title the realm does not have.
    #[error("unknown title '{0}'")]
    UnknownTitle(String),

    /// An escrow-originated transaction pays more than the fee ceiling.
    #[error("escrow fee {fee} exceeds ceiling {max}")]
    EscrowFeeTooHigh { fee: u64, max: u64 },

    /// An escrow-originated transaction would close the escrow account.
    #[error("escrow transaction sets a close-to address")]
    EscrowCloseTo,

    /// An escrow-originated transaction would rekey the escrow account.
    #[error("escrow transaction sets a rekey target")]
    EscrowRekey,

    /// The group's first transaction does not call the bound application.
    #[error("group must open with a call to application {expected}")]
    WrongApplication { expected: u64, found: Option<u64> },

    /// Arithmetic overflow while computing a round.
    #[error("arithmetic overflow")]
    Overflow,

    /// Global state could not be read or written.
    #[error(transparent)]
    State(#[from] StateError),
}

impl From<AuctionError> for ProgramError {
    fn from(err: AuctionError) -> Self {
        match err {
            AuctionError::State(e) => ProgramError::State(e),
            other => ProgramError::Rejected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_become_rejections() {
        let err: ProgramError = AuctionError::AmountTooLow {
            offered: 5,
            highest: 5,
        }
        .into();
        assert_eq!(
            err,
            ProgramError::Rejected("offer 5 does not exceed current highest 5".into())
        );
    }

    #[test]
    fn state_errors_stay_state_errors() {
        let state = StateError::TypeMismatch {
            key: "highest_bid".into(),
            expected: "uint",
        };
        let err: ProgramError = AuctionError::State(state.clone()).into();
        assert_eq!(err, ProgramError::State(state));
    }
}
