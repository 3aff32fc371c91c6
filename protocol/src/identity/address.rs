//! # Addresses
//!
//! An [`Address`] is a 32-byte account identifier rendered as Bech32 with the
//! `gvl` prefix:
//!
//! ```text
//! seed bytes     -> BLAKE3("Account" || seed)  -> 32 bytes -> gvl1...
//! program bytes  -> BLAKE3("Program" || bytes) -> 32 bytes -> gvl1...
//! ```
//!
//! Escrow accounts have no key holder. Their address is the hash of the guard
//! program that controls them, so anyone can recompute it from the program's
//! parameters and nobody can sign for it.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ADDRESS_HRP, ADDRESS_LENGTH, PROGRAM_ADDRESS_PREFIX};
use crate::crypto::blake3_hash_multi;

/// Domain prefix for seed-derived (key holder) accounts.
const ACCOUNT_ADDRESS_PREFIX: &[u8] = b"Account";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while decoding an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The address carries a different human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp { expected: String, got: String },

    /// The payload is not exactly 32 bytes.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A ledger account address.
///
/// # Examples
///
/// ```
/// use gavel_protocol::identity::Address;
///
/// let alice = Address::derive(b"alice");
/// let encoded = alice.to_string();
/// assert!(encoded.starts_with("gvl1"));
/// assert_eq!(encoded.parse::<Address>().unwrap(), alice);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Never owned by anyone; used as the "unset"
    /// marker wherever the ledger encoding has no optional type.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic key-holder address from a seed.
    pub fn derive(seed: &[u8]) -> Self {
        Self(blake3_hash_multi(&[ACCOUNT_ADDRESS_PREFIX, seed]))
    }

    /// Address of the escrow account controlled by the given program bytes.
    pub fn for_program(program_bytes: &[u8]) -> Self {
        Self(blake3_hash_multi(&[PROGRAM_ADDRESS_PREFIX, program_bytes]))
    }

    /// Raw bytes of this address.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Returns `true` for [`Address::ZERO`].
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Encode as a Bech32 string.
    pub fn to_bech32(&self) -> String {
        // The HRP is a compile-time constant and the payload is 32 bytes, so
        // neither call can fail; fall back to hex rather than panic anyway.
        Hrp::parse(ADDRESS_HRP)
            .ok()
            .and_then(|hrp| bech32::encode::<Bech32>(hrp, &self.0).ok())
            .unwrap_or_else(|| hex::encode(self.0))
    }

    /// Decode a Bech32 string, validating prefix, checksum and length.
    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        let (hrp, data) = bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        if hrp.as_str() != ADDRESS_HRP {
            return Err(AddressError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        Self::try_from(data.as_slice())
    }

    /// Short form for log lines: prefix and the first few payload characters.
    pub fn short(&self) -> String {
        let full = self.to_bech32();
        full.chars().take(12).collect()
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = AddressError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LENGTH,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bech32())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_bech32())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_bech32(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Address::try_from(bytes.as_slice()).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bech32_roundtrip() {
        let addr = Address::derive(b"alice");
        let encoded = addr.to_bech32();
        assert!(encoded.starts_with("gvl1"));
        assert_eq!(Address::from_bech32(&encoded).unwrap(), addr);
    }

    #[test]
    fn derive_is_deterministic_and_distinct() {
        assert_eq!(Address::derive(b"alice"), Address::derive(b"alice"));
        assert_ne!(Address::derive(b"alice"), Address::derive(b"bob"));
    }

    #[test]
    fn program_and_account_domains_do_not_overlap() {
        assert_ne!(Address::derive(b"x"), Address::for_program(b"x"));
    }

    #[test]
    fn zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::derive(b"alice").is_zero());
    }

    #[test]
    fn wrong_length_rejected() {
        let err = Address::try_from(&[1u8; 31][..]).unwrap_err();
        assert_eq!(
            err,
            AddressError::InvalidLength {
                expected: 32,
                got: 31
            }
        );
    }

    #[test]
    fn foreign_prefix_rejected() {
        let hrp = Hrp::parse("other").unwrap();
        let foreign = bech32::encode::<Bech32>(hrp, &[7u8; 32]).unwrap();
        assert!(matches!(
            Address::from_bech32(&foreign),
            Err(AddressError::InvalidHrp { .. })
        ));
    }

    #[test]
    fn json_uses_bech32_string() {
        let addr = Address::derive(b"carol");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn bincode_uses_raw_bytes() {
        let addr = Address::derive(b"dave");
        let bytes = bincode::serialize(&addr).unwrap();
        let back: Address = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, addr);
    }
}
