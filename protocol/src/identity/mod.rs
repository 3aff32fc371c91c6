//! # Identity Module
//!
//! Account addressing for the Gavel ledger. Key holders and escrow programs
//! share one 32-byte [`Address`] space, separated by a domain prefix at
//! derivation time.

pub mod address;

pub use address::{Address, AddressError};
