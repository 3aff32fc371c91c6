//! Integration tests for the custody guards running inside a real ledger.
//!
//! The contract already rejects malformed bids at index 0, so these tests
//! focus on what only the guards can stop: escrow spends outside an auction
//! group, and escrow transactions whose dangerous fields the contract never
//! looks at.

use gavel_contracts::deployment::{deploy_auction, AssetNames, AuctionDeployment, AuctionParams};
use gavel_contracts::AuctionError;
use gavel_protocol::config::MAX_ESCROW_FEE;
use gavel_protocol::identity::Address;
use gavel_protocol::ledger::{GroupReceipt, Ledger, LedgerError};
use gavel_protocol::program::ProgramError;
use gavel_protocol::transaction::{SignedGroup, SignedTransaction, Transaction, TransactionBuilder};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn addr(seed: &str) -> Address {
    Address::derive(seed.as_bytes())
}

fn creator() -> Address {
    addr("creator")
}

fn bidder() -> Address {
    addr("bidder")
}

fn thief() -> Address {
    addr("thief")
}

fn setup() -> (Ledger, AuctionDeployment) {
    let mut ledger = Ledger::new(10);
    ledger.fund(&creator(), 50_000_000).unwrap();
    ledger.fund(&bidder(), 50_000_000).unwrap();
    let params = AuctionParams {
        asset: AssetNames::new("ART", "Artwork"),
        seller: addr("seller"),
        duration: 100,
    };
    let auction = deploy_auction(&mut ledger, &creator(), &params).unwrap();
    auction.opt_in(&mut ledger, &bidder()).unwrap();
    ledger.advance_to(20).unwrap();
    (ledger, auction)
}

/// The four members of an honest opening bid, ready to be tampered with.
fn opening_bid(auction: &AuctionDeployment, amount: u64) -> [TransactionBuilder; 4] {
    [
        TransactionBuilder::app_call(bidder(), auction.app_id),
        TransactionBuilder::payment(bidder(), auction.funds_custody, amount),
        TransactionBuilder::payment(auction.funds_custody, creator(), 0),
        TransactionBuilder::asset_transfer(auction.asset_custody, auction.asset_id, 1, bidder())
            .revocation_target(creator()),
    ]
}

fn assemble(auction: &AuctionDeployment, parts: [TransactionBuilder; 4]) -> SignedGroup {
    let [call, deposit, refund, handover] = parts.map(TransactionBuilder::build);
    SignedGroup::assemble(vec![
        SignedTransaction::signed(call),
        SignedTransaction::signed(deposit),
        SignedTransaction::by_program(refund, auction.funds_custody),
        SignedTransaction::by_program(handover, auction.asset_custody),
    ])
    .unwrap()
}

fn escrow_only(tx: Transaction, escrow: Address) -> SignedGroup {
    SignedGroup::assemble(vec![SignedTransaction::by_program(tx, escrow)]).unwrap()
}

fn assert_guard_rejected(result: Result<GroupReceipt, LedgerError>, guard: &str, expected: AuctionError) {
    match result {
        Err(LedgerError::GuardRejected {
            program,
            source: ProgramError::Rejected(reason),
            ..
        }) => {
            assert_eq!(program, guard);
            assert_eq!(reason, expected.to_string());
        }
        other => panic!("expected {guard} to reject with '{expected}', got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Escrow Binding
// ---------------------------------------------------------------------------

#[test]
fn honest_bid_passes_both_guards() {
    let (mut ledger, auction) = setup();
    ledger
        .submit(&assemble(&auction, opening_bid(&auction, 2_000_000)))
        .unwrap();
    assert_eq!(
        ledger.asset_holding(&bidder(), auction.asset_id).map(|h| h.amount),
        Some(1)
    );
}

#[test]
fn funds_escrow_cannot_pay_outside_an_auction_group() {
    let (mut ledger, auction) = setup();
    let before = ledger.balance(&auction.funds_custody);
    let drain = TransactionBuilder::payment(auction.funds_custody, thief(), 500_000).build();
    assert_guard_rejected(
        ledger.submit(&escrow_only(drain, auction.funds_custody)),
        "funds-custody",
        AuctionError::WrongApplication {
            expected: auction.app_id,
            found: None,
        },
    );
    assert_eq!(ledger.balance(&auction.funds_custody), before);
}

#[test]
fn asset_escrow_cannot_claw_back_outside_an_auction_group() {
    let (mut ledger, auction) = setup();
    let grab = TransactionBuilder::asset_transfer(auction.asset_custody, auction.asset_id, 1, thief())
        .revocation_target(creator())
        .build();
    assert_guard_rejected(
        ledger.submit(&escrow_only(grab, auction.asset_custody)),
        "asset-custody",
        AuctionError::WrongApplication {
            expected: auction.app_id,
            found: None,
        },
    );
}

#[test]
fn escrow_is_bound_to_one_application() {
    let (mut ledger, first) = setup();
    let params = AuctionParams {
        asset: AssetNames::new("ART2", "Second artwork"),
        seller: addr("seller"),
        duration: 100,
    };
    let second = deploy_auction(&mut ledger, &creator(), &params).unwrap();
    assert_ne!(first.funds_custody, second.funds_custody);

    let call = TransactionBuilder::app_call(first.funds_custody, second.app_id).build();
    assert_guard_rejected(
        ledger.submit(&escrow_only(call, first.funds_custody)),
        "funds-custody",
        AuctionError::WrongApplication {
            expected: first.app_id,
            found: Some(second.app_id),
        },
    );
}

#[test]
fn nobody_can_sign_for_an_escrow() {
    let (mut ledger, auction) = setup();
    ledger
        .submit(&assemble(&auction, opening_bid(&auction, 2_000_000)))
        .unwrap();
    let escrow_before = ledger.balance(&auction.funds_custody);

    let drain = TransactionBuilder::payment(auction.funds_custody, thief(), 2_000_000).build();
    let forged = SignedGroup::assemble(vec![SignedTransaction::signed(drain)]).unwrap();
    assert_eq!(
        ledger.submit(&forged),
        Err(LedgerError::ProgramAccount {
            index: 0,
            address: auction.funds_custody,
        })
    );

    let grab = TransactionBuilder::asset_transfer(auction.asset_custody, auction.asset_id, 1, thief())
        .revocation_target(bidder())
        .build();
    let forged = SignedGroup::assemble(vec![SignedTransaction::signed(grab)]).unwrap();
    assert_eq!(
        ledger.submit(&forged),
        Err(LedgerError::ProgramAccount {
            index: 0,
            address: auction.asset_custody,
        })
    );

    assert_eq!(ledger.balance(&auction.funds_custody), escrow_before);
    assert_eq!(ledger.balance(&thief()), 0);
    assert_eq!(
        ledger.asset_holding(&bidder(), auction.asset_id).map(|h| h.amount),
        Some(1)
    );
}

// ---------------------------------------------------------------------------
// Escrow Safety Fields
// ---------------------------------------------------------------------------

#[test]
fn refund_closing_the_escrow_rejected() {
    let (mut ledger, auction) = setup();
    let [call, deposit, refund, handover] = opening_bid(&auction, 2_000_000);
    let parts = [call, deposit, refund.close_to(thief()), handover];
    assert_guard_rejected(
        ledger.submit(&assemble(&auction, parts)),
        "funds-custody",
        AuctionError::EscrowCloseTo,
    );
    assert_eq!(ledger.balance(&thief()), 0);
}

#[test]
fn refund_rekeying_the_escrow_rejected() {
    let (mut ledger, auction) = setup();
    let [call, deposit, refund, handover] = opening_bid(&auction, 2_000_000);
    let parts = [call, deposit, refund.rekey_to(thief()), handover];
    assert_guard_rejected(
        ledger.submit(&assemble(&auction, parts)),
        "funds-custody",
        AuctionError::EscrowRekey,
    );
}

#[test]
fn fee_draining_rejected() {
    let (mut ledger, auction) = setup();
    let [call, deposit, refund, handover] = opening_bid(&auction, 2_000_000);
    let parts = [call, deposit, refund, handover.fee(MAX_ESCROW_FEE * 50)];
    assert_guard_rejected(
        ledger.submit(&assemble(&auction, parts)),
        "asset-custody",
        AuctionError::EscrowFeeTooHigh {
            fee: MAX_ESCROW_FEE * 50,
            max: MAX_ESCROW_FEE,
        },
    );
}

#[test]
fn asset_escrow_rekey_rejected() {
    let (mut ledger, auction) = setup();
    let [call, deposit, refund, handover] = opening_bid(&auction, 2_000_000);
    let parts = [call, deposit, refund, handover.rekey_to(thief())];
    assert_guard_rejected(
        ledger.submit(&assemble(&auction, parts)),
        "asset-custody",
        AuctionError::EscrowRekey,
    );
    let account = ledger.account(&auction.asset_custody).unwrap();
    assert_eq!(account.auth_address, None);
}
