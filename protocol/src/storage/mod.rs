//! # Storage Module
//!
//! State types the ledger operates on, and the sled store that keeps a run's
//! history on disk.
//!
//! ## Architecture
//!
//! ```text
//! state.rs  - GlobalState, ContractState, accounts, assets, LedgerSnapshot
//! db.rs     - sled persistence for snapshots and group receipts
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Typed state over raw keys.** Programs read and write their global
//!    state through a [`ContractState`] struct. Raw key access exists for the
//!    struct implementations and for offline inspection.
//!
//! 2. **Bincode on disk, JSON at the edges.** Snapshots are stored with
//!    bincode; the node prints them as JSON.

pub mod db;
pub mod state;

pub use db::{DbError, LedgerDb};
pub use state::{
    AccountState, ApplicationSnapshot, AssetHolding, AssetParams, ContractState, GlobalState,
    LedgerSnapshot, StateError, StateSchema, StateValue,
};
