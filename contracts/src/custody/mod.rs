//! # Custody Authorities
//!
//! Stateless guard programs that own the auction's escrow accounts. Nobody
//! holds a key for these accounts; the ledger lets them spend only when the
//! guard approves the whole group.
//!
//! Every guard enforces the same baseline before its own checks:
//!
//! ```text
//! group[0]        is an application call to the bound contract id
//! authorized txn  fee <= MAX_ESCROW_FEE, no close-to, no rekey
//! ```
//!
//! The guards cannot see contract state, so they do not check amounts or
//! recipients against the current auction. The contract does that in the
//! same group; the two layers together make the delegation sound.
//!
//! | Guard            | Controls                          | Extra rule                          |
//! |------------------|-----------------------------------|-------------------------------------|
//! | [`AssetCustody`] | clawback rights over the asset    | exactly one unit of its asset       |
//! | [`FundsCustody`] | bid deposits, refunds, payout     | payments, or the opening call       |
//! | [`TitleCustody`] | clawback rights over both titles  | full claim shape, title/asset match |

pub mod asset;
pub mod funds;
pub mod title;

pub use asset::AssetCustody;
pub use funds::FundsCustody;
pub use title::TitleCustody;

use gavel_protocol::program::GuardContext;
use gavel_protocol::transaction::Transaction;

use crate::error::AuctionError;
use crate::validation::{check_escrow_safety, expect_app_call};

/// Baseline checks shared by every guard. Returns the transaction being
/// authorized.
fn bound_escrow_spend<'a>(ctx: &GuardContext<'a>, app_id: u64) -> Result<&'a Transaction, AuctionError> {
    expect_app_call(ctx.group(), 0, app_id)?;
    let tx = ctx
        .txn()
        .ok_or(AuctionError::UnexpectedGroupSize(ctx.group().group_size()))?;
    check_escrow_safety(tx)?;
    Ok(tx)
}

/// Canonical program encoding: a tag followed by little-endian parameters.
fn encode_program(tag: &[u8], params: &[u64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(tag.len() + params.len() * 8);
    bytes.extend_from_slice(tag);
    for p in params {
        bytes.extend_from_slice(&p.to_le_bytes());
    }
    bytes
}
