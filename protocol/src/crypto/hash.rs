//! # Hashing Utilities
//!
//! Gavel needs hashes in exactly three places, and each has its own function:
//!
//! - **Transaction ids**: `double_sha256` over the canonical transaction
//!   bytes, hex-encoded by the caller.
//! - **Group ids**: `domain_separated_hash` over the ordered member ids, so a
//!   group id can never collide with any other BLAKE3 digest in the system.
//! - **Addresses**: `blake3_hash_multi` over a prefix and a seed or program
//!   encoding.
//!
//! Nothing here is a signature primitive. Signing is the ledger client's job.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data as a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// Used for transaction ids. The outer hash shields the id from
/// length-extension games on the canonical encoding.
///
/// # Example
///
/// ```
/// use gavel_protocol::crypto::double_sha256;
///
/// let tx_id = double_sha256(b"raw transaction bytes");
/// assert_eq!(tx_id.len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256_array(&sha256_array(data))
}

/// Hash multiple byte slices together without concatenating them first.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Compute a domain-separated hash using BLAKE3's `derive_key` mode.
///
/// `domain_separated_hash("a", x)` and `domain_separated_hash("b", x)` never
/// collide, because the context string selects a different internal IV.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}
