//! Core type definitions for Gavel transactions.
//!
//! These types are small and `Copy` so the per-group validation path never
//! allocates just to inspect what kind of transaction it is looking at.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// Programs dispatch on this before touching any kind-specific field, so a
/// payment can never be mistaken for an asset transfer with the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Native currency transfer between two accounts.
    Payment,
    /// Transfer of units of a registered asset, optionally via clawback.
    AssetTransfer,
    /// Call into a deployed application.
    ApplicationCall,
}

impl TransactionType {
    /// Single-byte tag used in the canonical encoding.
    pub fn tag(self) -> u8 {
        match self {
            Self::Payment => 0x01,
            Self::AssetTransfer => 0x02,
            Self::ApplicationCall => 0x03,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payment => write!(f, "Payment"),
            Self::AssetTransfer => write!(f, "AssetTransfer"),
            Self::ApplicationCall => write!(f, "ApplicationCall"),
        }
    }
}

// ---------------------------------------------------------------------------
// OnCompletion
// ---------------------------------------------------------------------------

/// The side effect an application call requests after the program approves.
///
/// The Gavel contracts only ever accept [`OnCompletion::NoOp`]; the other
/// variants exist because the ledger carries them and the contracts must be
/// able to refuse them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OnCompletion {
    /// Plain call, no lifecycle effect.
    #[default]
    NoOp,
    /// Allocate local state for the sender.
    OptIn,
    /// Release the sender's local state.
    CloseOut,
    /// Force-release local state regardless of program outcome.
    ClearState,
    /// Replace the application's program.
    UpdateApplication,
    /// Remove the application.
    DeleteApplication,
}

impl OnCompletion {
    /// Single-byte tag used in the canonical encoding.
    pub fn tag(self) -> u8 {
        match self {
            Self::NoOp => 0,
            Self::OptIn => 1,
            Self::CloseOut => 2,
            Self::ClearState => 3,
            Self::UpdateApplication => 4,
            Self::DeleteApplication => 5,
        }
    }
}

impl fmt::Display for OnCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => write!(f, "NoOp"),
            Self::OptIn => write!(f, "OptIn"),
            Self::CloseOut => write!(f, "CloseOut"),
            Self::ClearState => write!(f, "ClearState"),
            Self::UpdateApplication => write!(f, "UpdateApplication"),
            Self::DeleteApplication => write!(f, "DeleteApplication"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_tags_are_unique() {
        let tags = [
            TransactionType::Payment.tag(),
            TransactionType::AssetTransfer.tag(),
            TransactionType::ApplicationCall.tag(),
        ];
        assert_ne!(tags[0], tags[1]);
        assert_ne!(tags[1], tags[2]);
        assert_ne!(tags[0], tags[2]);
    }

    #[test]
    fn on_completion_defaults_to_noop() {
        assert_eq!(OnCompletion::default(), OnCompletion::NoOp);
        assert_eq!(OnCompletion::NoOp.tag(), 0);
    }

    #[test]
    fn display_names() {
        assert_eq!(TransactionType::ApplicationCall.to_string(), "ApplicationCall");
        assert_eq!(OnCompletion::DeleteApplication.to_string(), "DeleteApplication");
    }
}
