// Copyright (c) 2026 Gavel Contributors. MIT License.
// See LICENSE for details.

//! # Gavel Protocol: Ledger Model
//!
//! The ledger that Gavel auctions run on. It is deliberately small: rounds
//! instead of clocks, balances instead of UTXOs, and one primitive that
//! everything else leans on, the atomic transaction group. A group of up to
//! sixteen transactions commits entirely or not at all.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants: fees, group sizes, state schemas.
//! - **crypto**: Hashing for transaction ids, group ids and addresses.
//! - **identity**: 32-byte Bech32 addresses for key holders and escrows.
//! - **transaction**: Transactions, builders, groups, structural checks.
//! - **program**: The traits guard programs and applications implement.
//! - **storage**: Global state, account/asset records, sled persistence.
//! - **ledger**: The in-memory ledger and its all-or-nothing `submit`.
//!
//! ## Design Philosophy
//!
//! 1. Programs see the whole group. A predicate over one transaction is
//!    never enough to make an escrow safe.
//! 2. Rejection has exactly one outcome: nothing happened.
//! 3. No signature cryptography. The ledger trusts the stated signer; the
//!    interesting authorization is the program kind.

pub mod config;
pub mod crypto;
pub mod identity;
pub mod ledger;
pub mod program;
pub mod storage;
pub mod transaction;

pub use identity::Address;
pub use ledger::{AssetConfig, GroupReceipt, Ledger, LedgerError, SharedLedger};
pub use program::{ApplicationProgram, CallContext, GuardContext, LogicProgram, ProgramError};
