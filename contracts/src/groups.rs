//! Builders for the atomic groups the contracts accept.
//!
//! These are pure: they read nothing from the ledger. Callers pass in the
//! current record (highest bid, holder) they intend to displace, and the
//! contract rejects the group if that view is stale.

use gavel_protocol::config::UNIQUE_ASSET_TOTAL;
use gavel_protocol::identity::Address;
use gavel_protocol::transaction::{GroupError, SignedGroup, SignedTransaction, TransactionBuilder};

use crate::auction::AuctionTerms;
use crate::deployment::{AuctionDeployment, TitleRealmDeployment};
use crate::title_claim::Title;

/// Lone configuration call for an auction.
pub fn configure_call(sender: Address, app_id: u64, terms: &AuctionTerms) -> Result<SignedGroup, GroupError> {
    let call = TransactionBuilder::app_call(sender, app_id)
        .args(terms.to_args())
        .build();
    SignedGroup::assemble(vec![SignedTransaction::signed(call)])
}

/// Lone call promulgating the title escrow address.
pub fn promulgate_call(sender: Address, app_id: u64, custody: Address) -> Result<SignedGroup, GroupError> {
    let call = TransactionBuilder::app_call(sender, app_id)
        .arg(custody.as_bytes().to_vec())
        .build();
    SignedGroup::assemble(vec![SignedTransaction::signed(call)])
}

/// Four-transaction bid: call, deposit, refund of `highest_bid` to
/// `current_owner`, and clawback of the asset from `current_owner` to the
/// bidder.
pub fn bid_group(
    auction: &AuctionDeployment,
    bidder: Address,
    amount: u64,
    highest_bid: u64,
    current_owner: Address,
) -> Result<SignedGroup, GroupError> {
    let call = TransactionBuilder::app_call(bidder, auction.app_id).build();
    let deposit = TransactionBuilder::payment(bidder, auction.funds_custody, amount).build();
    let refund = TransactionBuilder::payment(auction.funds_custody, current_owner, highest_bid).build();
    let handover = TransactionBuilder::asset_transfer(
        auction.asset_custody,
        auction.asset_id,
        UNIQUE_ASSET_TOTAL,
        bidder,
    )
    .revocation_target(current_owner)
    .build();

    SignedGroup::assemble(vec![
        SignedTransaction::signed(call),
        SignedTransaction::signed(deposit),
        SignedTransaction::by_program(refund, auction.funds_custody),
        SignedTransaction::by_program(handover, auction.asset_custody),
    ])
}

/// Two-transaction payout, sent entirely by the funds escrow.
pub fn payout_group(auction: &AuctionDeployment, amount: u64) -> Result<SignedGroup, GroupError> {
    let escrow = auction.funds_custody;
    let call = TransactionBuilder::app_call(escrow, auction.app_id).build();
    let payout = TransactionBuilder::payment(escrow, auction.seller, amount).build();
    SignedGroup::assemble(vec![
        SignedTransaction::by_program(call, escrow),
        SignedTransaction::by_program(payout, escrow),
    ])
}

/// One title claim as a client describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub donor: Address,
    pub title: Title,
    /// Name recorded as the new holder.
    pub holder_name: String,
    pub donation: u64,
    /// Account currently holding the title asset.
    pub current_holder: Address,
}

/// Three-transaction title claim.
pub fn claim_group(realm: &TitleRealmDeployment, claim: &Claim) -> Result<SignedGroup, GroupError> {
    let call = TransactionBuilder::app_call(claim.donor, realm.app_id)
        .arg(claim.title.as_str().as_bytes().to_vec())
        .arg(claim.holder_name.as_bytes().to_vec())
        .build();
    let donation = TransactionBuilder::payment(claim.donor, realm.pool, claim.donation).build();
    let handover = TransactionBuilder::asset_transfer(
        realm.custody,
        realm.asset_for(claim.title),
        UNIQUE_ASSET_TOTAL,
        claim.donor,
    )
    .revocation_target(claim.current_holder)
    .build();

    SignedGroup::assemble(vec![
        SignedTransaction::signed(call),
        SignedTransaction::signed(donation),
        SignedTransaction::by_program(handover, realm.custody),
    ])
}
