//! # Gavel Contracts
//!
//! Auctions for unique assets, enforced by the ledger instead of an
//! auctioneer. Each auction is one stateful application plus stateless
//! custody guards that own its escrow accounts. No single transaction means
//! anything on its own; a bid is a four-transaction atomic group that
//! either moves money, refund and asset together or does nothing.
//!
//! - **guarded**: The generic custody-guarded auction and its rules trait.
//! - **auction**: Ascending bids, refunds to the outbid owner, seller payout.
//! - **title_claim**: Two donation-backed titles, no seller.
//! - **custody**: The guard programs controlling the escrows.
//! - **validation**: Group predicates shared by contracts and guards.
//! - **groups**: Builders for every group shape the contracts accept.
//! - **deployment**: Create, fund and configure a full auction or realm.
//!
//! ## Design Principles
//!
//! 1. Contracts see state, guards see structure. Neither alone makes an
//!    escrow safe; the ledger runs both against the same group.
//! 2. "Not set yet" is `None`, never a sentinel value.
//! 3. Round arithmetic is checked. A duration that overflows is rejected.
//! 4. Rejections carry a typed cause for logs and tests even though the
//!    ledger only records accept or reject.

pub mod auction;
pub mod custody;
pub mod deployment;
pub mod error;
pub mod groups;
pub mod guarded;
pub mod title_claim;
pub mod validation;

pub use auction::{AuctionContract, AuctionState, AuctionTerms, BidRules};
pub use custody::{AssetCustody, FundsCustody, TitleCustody};
pub use deployment::{
    deploy_auction, deploy_title_realm, AssetNames, AuctionDeployment, AuctionParams, RealmParams,
    TitleRealmDeployment,
};
pub use error::AuctionError;
pub use guarded::{AuctionRules, GuardedAuction};
pub use title_claim::{Title, TitleClaimContract, TitleRules, TitleState};
