//! # Transaction Module
//!
//! Construction, grouping and structural verification of Gavel ledger
//! transactions. Nothing on the ledger happens outside a transaction, and no
//! transaction is submitted outside a group: a lone transaction is simply a
//! group of one.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        - TransactionType and OnCompletion discriminants
//! builder.rs      - Transaction, TransactionKind and the fluent TransactionBuilder
//! group.rs        - TransactionGroup, Authorization, SignedTransaction, SignedGroup
//! verification.rs - verify_group: size, id, fee and validity-window checks
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] assembles each transaction.
//! 2. **Authorize**: wrap it as a [`SignedTransaction`], signed or
//!    program-authorized.
//! 3. **Group**: [`SignedGroup::assemble`] stamps the group id.
//! 4. **Submit**: the ledger runs [`verify_group`], then authorization,
//!    then applies the group atomically.
//!
//! ## Design Decisions
//!
//! - Transaction ids are `double_sha256` of the canonical bytes, excluding
//!   the id and the group id.
//! - All amounts are `u64` in micro-units. No floating point.
//! - Validity is expressed in rounds, never in wall-clock time.

pub mod builder;
pub mod group;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder, TransactionKind};
pub use group::{Authorization, SignedGroup, SignedTransaction, TransactionGroup};
pub use types::{OnCompletion, TransactionType};
pub use verification::{verify_group, GroupError};
