//! Structural verification of submitted groups.
//!
//! [`verify_group`] runs before any account is touched. It only looks at the
//! group itself: sizes, ids, fees and validity windows. Authorization and
//! balance checks need ledger state and live in [`crate::ledger`].
//!
//! Checks are ordered cheapest first so malformed groups are dropped before
//! any hashing happens.

use thiserror::Error;

use super::group::{compute_group_id, SignedGroup};
use crate::config::{MAX_GROUP_SIZE, MIN_TXN_FEE};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Structural defects of a transaction group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    /// The group is empty or larger than the ledger allows.
    #[error("invalid group size {size} (must be 1..={max})")]
    InvalidSize { size: usize, max: usize },

    /// Authorizations and transactions are not index-aligned.
    #[error("group has {txns} transactions but {auths} authorizations")]
    AuthorizationCount { txns: usize, auths: usize },

    /// A member's stored id does not match its contents.
    #[error("transaction {index} id mismatch: expected {expected}, got {actual}")]
    IdMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    /// A member carries no group id or a different one.
    #[error("transaction {index} is not stamped with the group id")]
    GroupIdMismatch { index: usize },

    /// A member pays less than the minimum fee.
    #[error("transaction {index} fee {fee} below minimum {min}")]
    FeeTooLow { index: usize, fee: u64, min: u64 },

    /// A member's validity window is empty.
    #[error("transaction {index} has first_valid {first} > last_valid {last}")]
    InvalidValidityWindow { index: usize, first: u64, last: u64 },
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verifies a signed group for structural correctness.
///
/// The checks, in order:
///
/// 1. **Size**: between 1 and [`MAX_GROUP_SIZE`].
/// 2. **Authorization count**: one per transaction.
/// 3. **Per member**: fee at least [`MIN_TXN_FEE`], `first_valid <=
///    last_valid`, stored id matches the recomputed id.
/// 4. **Group id**: every member carries the id recomputed from the
///    ordered member ids.
///
/// # Errors
///
/// Returns the first failing check as a [`GroupError`].
pub fn verify_group(signed: &SignedGroup) -> Result<(), GroupError> {
    let group = signed.group();
    let size = group.group_size();

    if size == 0 || size > MAX_GROUP_SIZE {
        return Err(GroupError::InvalidSize {
            size,
            max: MAX_GROUP_SIZE,
        });
    }

    if signed.authorizations().len() != size {
        return Err(GroupError::AuthorizationCount {
            txns: size,
            auths: signed.authorizations().len(),
        });
    }

    for (index, tx) in group.iter().enumerate() {
        if tx.fee < MIN_TXN_FEE {
            return Err(GroupError::FeeTooLow {
                index,
                fee: tx.fee,
                min: MIN_TXN_FEE,
            });
        }
        if tx.first_valid > tx.last_valid {
            return Err(GroupError::InvalidValidityWindow {
                index,
                first: tx.first_valid,
                last: tx.last_valid,
            });
        }
        let expected = tx.compute_id();
        if tx.id != expected {
            return Err(GroupError::IdMismatch {
                index,
                expected,
                actual: tx.id.clone(),
            });
        }
    }

    let expected_group = compute_group_id(group.transactions());
    for (index, tx) in group.iter().enumerate() {
        if tx.group != Some(expected_group) {
            return Err(GroupError::GroupIdMismatch { index });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
