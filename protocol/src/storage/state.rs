//! # Ledger State
//!
//! Account balances, asset registry entries and application global state.
//!
//! ## Global State
//!
//! Every application owns one [`GlobalState`]: a small key/value store whose
//! shape is fixed at creation by a [`StateSchema`] (how many integer keys and
//! how many byte-string keys it may ever hold). Programs do not poke at keys
//! directly; they define a typed struct implementing [`ContractState`] and
//! load/store it as a whole. A key that was never written loads as `None`,
//! which is how "configured yet?" is answered.
//!
//! ```text
//! GlobalState { version: 3, values: { "highest_bid": Uint(5000000), ... } }
//!        │                                  ▲
//!   load │                                  │ store
//!        ▼                                  │
//! AuctionState { highest_bid: 5000000, owner: Some(A), ... }
//! ```
//!
//! `version` counts committed groups that changed the state. The ledger
//! bumps it, programs never do.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::{MAX_STATE_KEY_LENGTH, MAX_STATE_VALUE_LENGTH};
use crate::identity::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by global state reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Key longer than [`MAX_STATE_KEY_LENGTH`].
    #[error("state key '{key}' exceeds {max} bytes")]
    KeyTooLong { key: String, max: usize },

    /// Byte value longer than [`MAX_STATE_VALUE_LENGTH`].
    #[error("value for '{key}' is {len} bytes (max {max})")]
    ValueTooLong { key: String, len: usize, max: usize },

    /// The write would hold more keys of a type than the schema declares.
    #[error("schema allows {limit} {kind} keys; write to '{key}' exceeds it")]
    SchemaExceeded {
        key: String,
        kind: &'static str,
        limit: u64,
    },

    /// The key holds a value of the other type.
    #[error("state key '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// A stored byte value could not be decoded as the expected type.
    #[error("state key '{key}' holds malformed data: {reason}")]
    Malformed { key: String, reason: String },
}

// ---------------------------------------------------------------------------
// StateValue / StateSchema
// ---------------------------------------------------------------------------

/// A single global state value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

impl StateValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Uint(_) => "uint",
            Self::Bytes(_) => "byte-slice",
        }
    }
}

/// Declared capacity of an application's global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

impl StateSchema {
    pub const fn new(num_uints: u64, num_byte_slices: u64) -> Self {
        Self {
            num_uints,
            num_byte_slices,
        }
    }
}

// ---------------------------------------------------------------------------
// GlobalState
// ---------------------------------------------------------------------------

/// Key/value state of one application, bounded by its schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalState {
    /// Number of committed groups that changed this state.
    pub version: u64,
    schema: StateSchema,
    values: BTreeMap<String, StateValue>,
}

impl GlobalState {
    /// Empty state with the given schema.
    pub fn new(schema: StateSchema) -> Self {
        Self {
            version: 0,
            schema,
            values: BTreeMap::new(),
        }
    }

    /// Declared schema.
    pub fn schema(&self) -> StateSchema {
        self.schema
    }

    /// Raw value at `key`, or `None` if it was never written.
    pub fn read(&self, key: &str) -> Option<&StateValue> {
        self.values.get(key)
    }

    /// Integer at `key`.
    pub fn read_uint(&self, key: &str) -> Result<Option<u64>, StateError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(StateValue::Uint(v)) => Ok(Some(*v)),
            Some(StateValue::Bytes(_)) => Err(StateError::TypeMismatch {
                key: key.to_string(),
                expected: "uint",
            }),
        }
    }

    /// Byte string at `key`.
    pub fn read_bytes(&self, key: &str) -> Result<Option<&[u8]>, StateError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(StateValue::Bytes(v)) => Ok(Some(v.as_slice())),
            Some(StateValue::Uint(_)) => Err(StateError::TypeMismatch {
                key: key.to_string(),
                expected: "byte-slice",
            }),
        }
    }

    /// Address stored as a 32-byte string at `key`.
    pub fn read_address(&self, key: &str) -> Result<Option<Address>, StateError> {
        match self.read_bytes(key)? {
            None => Ok(None),
            Some(bytes) => Address::try_from(bytes)
                .map(Some)
                .map_err(|e| StateError::Malformed {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// Write `value` at `key`, enforcing key/value limits and the schema.
    pub fn write(&mut self, key: &str, value: StateValue) -> Result<(), StateError> {
        if key.len() > MAX_STATE_KEY_LENGTH {
            return Err(StateError::KeyTooLong {
                key: key.to_string(),
                max: MAX_STATE_KEY_LENGTH,
            });
        }
        if let StateValue::Bytes(ref bytes) = value {
            if bytes.len() > MAX_STATE_VALUE_LENGTH {
                return Err(StateError::ValueTooLong {
                    key: key.to_string(),
                    len: bytes.len(),
                    max: MAX_STATE_VALUE_LENGTH,
                });
            }
        }

        let replaces_same_kind = self
            .values
            .get(key)
            .map(|old| old.kind() == value.kind())
            .unwrap_or(false);

        if !replaces_same_kind {
            let (used, limit) = match value {
                StateValue::Uint(_) => (self.count("uint"), self.schema.num_uints),
                StateValue::Bytes(_) => (self.count("byte-slice"), self.schema.num_byte_slices),
            };
            if used + 1 > limit {
                return Err(StateError::SchemaExceeded {
                    key: key.to_string(),
                    kind: value.kind(),
                    limit,
                });
            }
        }

        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Write an integer.
    pub fn write_uint(&mut self, key: &str, value: u64) -> Result<(), StateError> {
        self.write(key, StateValue::Uint(value))
    }

    /// Write a byte string.
    pub fn write_bytes(&mut self, key: &str, value: impl Into<Vec<u8>>) -> Result<(), StateError> {
        self.write(key, StateValue::Bytes(value.into()))
    }

    /// Write an address as its 32 raw bytes.
    pub fn write_address(&mut self, key: &str, value: &Address) -> Result<(), StateError> {
        self.write(key, StateValue::Bytes(value.as_bytes().to_vec()))
    }

    /// Returns `true` if the stored values differ from `other`'s.
    /// The version counter is not compared.
    pub fn values_differ(&self, other: &GlobalState) -> bool {
        self.values != other.values
    }

    /// Iterate keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &StateValue)> {
        self.values.iter()
    }

    /// Number of keys currently set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no key has been written.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn count(&self, kind: &str) -> u64 {
        self.values.values().filter(|v| v.kind() == kind).count() as u64
    }
}

// ---------------------------------------------------------------------------
// ContractState
// ---------------------------------------------------------------------------

/// Typed view over an application's [`GlobalState`].
///
/// Implementors map each field to a key. Fields that are only set by a later
/// call are `Option`s and load as `None` until written.
pub trait ContractState: Sized {
    /// Decode the typed state from raw global state.
    fn load(state: &GlobalState) -> Result<Self, StateError>;

    /// Encode every set field back into raw global state.
    fn store(&self, state: &mut GlobalState) -> Result<(), StateError>;
}

// ---------------------------------------------------------------------------
// Accounts and Assets
// ---------------------------------------------------------------------------

/// Holding of one asset inside an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetHolding {
    pub amount: u64,
    /// Frozen holdings cannot send or receive except through clawback.
    pub frozen: bool,
}

/// The ledger state of a single account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountState {
    /// Native balance in micro-units.
    pub balance: u64,
    /// Spending authority after a rekey. `None` means the account itself.
    pub auth_address: Option<Address>,
    /// Asset holdings by asset id. Presence means the account opted in.
    pub holdings: BTreeMap<u64, AssetHolding>,
}

impl AccountState {
    /// New account with the given balance.
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    /// Address that must authorize spending from `owner`.
    pub fn authority(&self, owner: &Address) -> Address {
        self.auth_address.unwrap_or(*owner)
    }
}

/// Registry entry of a custom asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    pub total: u64,
    pub decimals: u32,
    pub unit_name: String,
    pub name: String,
    pub creator: Address,
    /// May reconfigure the asset. `None` makes the asset immutable.
    pub manager: Option<Address>,
    /// May move units out of any holding, frozen or not.
    pub clawback: Option<Address>,
    /// New holdings start frozen.
    pub default_frozen: bool,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Serializable view of one deployed application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSnapshot {
    pub name: String,
    pub creator: Address,
    pub state: GlobalState,
}

/// Serializable view of the whole ledger at one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub round: u64,
    pub accounts: BTreeMap<Address, AccountState>,
    pub assets: BTreeMap<u64, AssetParams>,
    pub applications: BTreeMap<u64, ApplicationSnapshot>,
}

impl LedgerSnapshot {
    /// Global state of application `app_id`, if deployed.
    pub fn global_state(&self, app_id: u64) -> Option<&GlobalState> {
        self.applications.get(&app_id).map(|app| &app.state)
    }

    /// Native balance of `address` (zero if unknown).
    pub fn balance(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|a| a.balance).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
