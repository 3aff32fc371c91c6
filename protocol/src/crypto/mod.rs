//! # Hashing Primitives
//!
//! Thin wrappers over `sha2` and `blake3`. Gavel consumes a ledger that
//! already provides signatures, so this module only derives identifiers.

pub mod hash;

pub use hash::{blake3_hash_multi, domain_separated_hash, double_sha256};
