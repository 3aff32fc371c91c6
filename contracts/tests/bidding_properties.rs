//! Ordering and property tests for bidding.
//!
//! - Competing bids built from the same stale view, submitted from several
//!   threads against one shared ledger.
//! - Property tests (proptest) over random bid sequences.

use std::sync::{Arc, Barrier};
use std::thread;

use gavel_contracts::deployment::{deploy_auction, AssetNames, AuctionDeployment, AuctionParams};
use gavel_contracts::groups::{bid_group, payout_group};
use gavel_protocol::identity::Address;
use gavel_protocol::ledger::Ledger;
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const START: u64 = 1_000;
const DURATION: u64 = 50;

fn creator() -> Address {
    Address::derive(b"creator")
}

fn bidder(i: usize) -> Address {
    Address::derive(format!("bidder-{i}").as_bytes())
}

fn setup(bidders: usize) -> (Ledger, AuctionDeployment) {
    let mut ledger = Ledger::new(START);
    ledger.fund(&creator(), 10_000_000).unwrap();
    let params = AuctionParams {
        asset: AssetNames::new("LOT", "Lot"),
        seller: Address::derive(b"seller"),
        duration: DURATION,
    };
    let auction = deploy_auction(&mut ledger, &creator(), &params).unwrap();
    for i in 0..bidders {
        ledger.fund(&bidder(i), 1_000_000_000).unwrap();
        auction.opt_in(&mut ledger, &bidder(i)).unwrap();
    }
    (ledger, auction)
}

// ---------------------------------------------------------------------------
// Serial Ordering
// ---------------------------------------------------------------------------

#[test]
fn stale_competing_bids_commit_exactly_once() {
    const THREADS: usize = 6;
    let (ledger, auction) = setup(THREADS);
    let shared = ledger.into_shared();
    let barrier = Arc::new(Barrier::new(THREADS));
    let winners = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let shared = Arc::clone(&shared);
            let barrier = Arc::clone(&barrier);
            let winners = Arc::clone(&winners);
            thread::spawn(move || {
                // Everyone saw highest_bid = 0, owner = creator.
                let group = bid_group(&auction, bidder(i), 10_000 * (i as u64 + 1), 0, creator()).unwrap();
                barrier.wait();
                if shared.write().submit(&group).is_ok() {
                    winners.lock().push(i);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let winners = winners.lock();
    assert_eq!(winners.len(), 1);
    let ledger = shared.read();
    let state = auction.state(&ledger).unwrap();
    assert_eq!(state.current_owner, Some(bidder(winners[0])));
    assert_eq!(state.highest_bid, 10_000 * (winners[0] as u64 + 1));
}

#[test]
fn rebuilt_bid_succeeds_after_losing_the_race() {
    let (mut ledger, auction) = setup(2);
    let first = bid_group(&auction, bidder(0), 5_000, 0, creator()).unwrap();
    let second = bid_group(&auction, bidder(1), 9_000, 0, creator()).unwrap();
    ledger.submit(&first).unwrap();
    assert!(ledger.submit(&second).is_err());

    let state = auction.state(&ledger).unwrap();
    let retry = bid_group(
        &auction,
        bidder(1),
        9_000,
        state.highest_bid,
        state.current_owner.unwrap(),
    )
    .unwrap();
    ledger.submit(&retry).unwrap();
    assert_eq!(auction.state(&ledger).unwrap().current_owner, Some(bidder(1)));
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

mod properties {
    use super::*;
    use proptest::prelude::*;

    const BIDDERS: usize = 4;

    fn bid() -> impl Strategy<Value = (usize, u64)> {
        (0..BIDDERS, 1u64..=50_000)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Accepted bids strictly raise the record, and the owner is always
        /// the sender of the last accepted deposit.
        #[test]
        fn accepted_bids_strictly_increase(bids in prop::collection::vec(bid(), 1..16)) {
            let (mut ledger, auction) = setup(BIDDERS);
            let mut last_winner = creator();
            let mut record = 0u64;

            for (who, amount) in bids {
                let before = auction.state(&ledger).unwrap();
                let group = bid_group(
                    &auction,
                    bidder(who),
                    amount,
                    before.highest_bid,
                    before.current_owner.unwrap(),
                )
                .unwrap();
                let accepted = ledger.submit(&group).is_ok();
                let after = auction.state(&ledger).unwrap();

                prop_assert_eq!(accepted, amount > record);
                if accepted {
                    prop_assert!(after.highest_bid > before.highest_bid);
                    record = amount;
                    last_winner = bidder(who);
                } else {
                    prop_assert_eq!(&after, &before);
                }
                prop_assert_eq!(after.highest_bid, record);
                prop_assert_eq!(after.current_owner, Some(last_winner));
            }
        }

        /// A matching bid never displaces the leader.
        #[test]
        fn ties_always_rejected(amount in 1u64..=1_000_000, challenger in 1..BIDDERS) {
            let (mut ledger, auction) = setup(BIDDERS);
            ledger.submit(&bid_group(&auction, bidder(0), amount, 0, creator()).unwrap()).unwrap();
            let tie = bid_group(&auction, bidder(challenger), amount, amount, bidder(0)).unwrap();
            prop_assert!(ledger.submit(&tie).is_err());
            prop_assert_eq!(auction.state(&ledger).unwrap().current_owner, Some(bidder(0)));
        }

        /// After the window closes no amount is accepted.
        #[test]
        fn late_bids_always_rejected(amount in 1u64..=100_000_000, late_by in 1u64..=1_000) {
            let (mut ledger, auction) = setup(1);
            ledger.advance_to(START + DURATION + late_by).unwrap();
            let group = bid_group(&auction, bidder(0), amount, 0, creator()).unwrap();
            prop_assert!(ledger.submit(&group).is_err());
            prop_assert_eq!(auction.state(&ledger).unwrap().highest_bid, 0);
        }

        /// Payout succeeds exactly when the window has closed and the amount
        /// matches the record.
        #[test]
        fn payout_iff_closed_and_exact(
            bid_amount in 1u64..=100_000,
            offset in 0u64..=2 * DURATION,
            skew in -2i64..=2,
        ) {
            let (mut ledger, auction) = setup(1);
            ledger.submit(&bid_group(&auction, bidder(0), bid_amount, 0, creator()).unwrap()).unwrap();
            let round = START + offset;
            ledger.advance_to(round).unwrap();

            let paid = bid_amount.saturating_add_signed(skew);
            let accepted = ledger.submit(&payout_group(&auction, paid).unwrap()).is_ok();
            prop_assert_eq!(accepted, round > START + DURATION && paid == bid_amount);
        }
    }
}
