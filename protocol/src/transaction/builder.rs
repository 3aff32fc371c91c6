//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] has one constructor per transaction kind
//! (`payment`, `asset_transfer`, `app_call`), a set of optional setters, and
//! `.build()`, which returns a [`Transaction`] with a deterministic id.
//!
//! The builder neither groups nor authorizes. Grouping happens in
//! [`super::group`], authorization is attached to the grouped transaction
//! when it is submitted.

use serde::{Deserialize, Serialize};

use super::types::{OnCompletion, TransactionType};
use crate::config::{MIN_TXN_FEE, TRANSACTION_VERSION};
use crate::crypto::hash::double_sha256;
use crate::identity::Address;

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

/// Kind-specific fields of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Native currency transfer.
    Payment {
        receiver: Address,
        amount: u64,
        /// Send the sender's remaining balance here and close the account.
        close_remainder_to: Option<Address>,
    },
    /// Transfer of a registered asset.
    AssetTransfer {
        asset_id: u64,
        amount: u64,
        receiver: Address,
        /// Clawback source. When set, the sender must be the asset's clawback
        /// address and the units are taken from this account instead.
        asset_sender: Option<Address>,
        /// Send the remaining holding here and drop the sender's holding.
        close_to: Option<Address>,
    },
    /// Call into a deployed application.
    ApplicationCall {
        app_id: u64,
        on_completion: OnCompletion,
        args: Vec<Vec<u8>>,
    },
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A Gavel ledger transaction.
///
/// The `id` is the double-SHA-256 of [`Transaction::signable_bytes`], which
/// covers every field except `id` and `group`. Leaving the group id out keeps
/// member ids stable when a transaction is grouped, so the group id can be
/// derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id: `hex(double_sha256(signable_bytes))`.
    pub id: String,

    /// Encoding version.
    pub version: u16,

    /// Account the transaction spends from (fees included).
    pub sender: Address,

    /// Fee debited from the sender.
    pub fee: u64,

    /// First round at which the transaction may commit.
    pub first_valid: u64,

    /// Last round at which the transaction may commit.
    pub last_valid: u64,

    /// Group id, stamped by [`super::group::TransactionGroup::new`].
    pub group: Option<[u8; 32]>,

    /// Hand the sender's spending authority to another address.
    pub rekey_to: Option<Address>,

    /// Free-form note.
    pub note: Option<Vec<u8>>,

    /// Kind-specific fields.
    pub kind: TransactionKind,
}

impl Transaction {
    /// Canonical byte encoding used for id computation.
    ///
    /// Fixed-width little-endian integers, raw 32-byte addresses and
    /// length-prefixed variable fields. Optional fields carry a presence flag.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(192);

        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.push(self.tx_type().tag());
        buf.extend_from_slice(self.sender.as_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());
        buf.extend_from_slice(&self.first_valid.to_le_bytes());
        buf.extend_from_slice(&self.last_valid.to_le_bytes());
        push_optional_address(&mut buf, self.rekey_to.as_ref());
        match self.note {
            Some(ref note) => {
                buf.push(0x01);
                push_bytes(&mut buf, note);
            }
            None => buf.push(0x00),
        }

        match &self.kind {
            TransactionKind::Payment {
                receiver,
                amount,
                close_remainder_to,
            } => {
                buf.extend_from_slice(receiver.as_bytes());
                buf.extend_from_slice(&amount.to_le_bytes());
                push_optional_address(&mut buf, close_remainder_to.as_ref());
            }
            TransactionKind::AssetTransfer {
                asset_id,
                amount,
                receiver,
                asset_sender,
                close_to,
            } => {
                buf.extend_from_slice(&asset_id.to_le_bytes());
                buf.extend_from_slice(&amount.to_le_bytes());
                buf.extend_from_slice(receiver.as_bytes());
                push_optional_address(&mut buf, asset_sender.as_ref());
                push_optional_address(&mut buf, close_to.as_ref());
            }
            TransactionKind::ApplicationCall {
                app_id,
                on_completion,
                args,
            } => {
                buf.extend_from_slice(&app_id.to_le_bytes());
                buf.push(on_completion.tag());
                buf.extend_from_slice(&(args.len() as u32).to_le_bytes());
                for arg in args {
                    push_bytes(&mut buf, arg);
                }
            }
        }

        buf
    }

    /// Computes the transaction id from the current field values.
    pub fn compute_id(&self) -> String {
        hex::encode(double_sha256(&self.signable_bytes()))
    }

    /// Raw 32-byte form of the id, as hashed into the group id.
    pub fn id_bytes(&self) -> [u8; 32] {
        double_sha256(&self.signable_bytes())
    }

    /// The transaction's kind discriminant.
    pub fn tx_type(&self) -> TransactionType {
        match self.kind {
            TransactionKind::Payment { .. } => TransactionType::Payment,
            TransactionKind::AssetTransfer { .. } => TransactionType::AssetTransfer,
            TransactionKind::ApplicationCall { .. } => TransactionType::ApplicationCall,
        }
    }

    /// Receiver of a payment or asset transfer.
    pub fn receiver(&self) -> Option<Address> {
        match self.kind {
            TransactionKind::Payment { receiver, .. }
            | TransactionKind::AssetTransfer { receiver, .. } => Some(receiver),
            TransactionKind::ApplicationCall { .. } => None,
        }
    }

    /// Account-closing recipient, for either payments or asset transfers.
    pub fn close_to(&self) -> Option<Address> {
        match self.kind {
            TransactionKind::Payment {
                close_remainder_to, ..
            } => close_remainder_to,
            TransactionKind::AssetTransfer { close_to, .. } => close_to,
            TransactionKind::ApplicationCall { .. } => None,
        }
    }

    /// Target application of an application call.
    pub fn app_id(&self) -> Option<u64> {
        match self.kind {
            TransactionKind::ApplicationCall { app_id, .. } => Some(app_id),
            _ => None,
        }
    }

    /// Returns `true` if the transaction is valid at `round`.
    pub fn is_valid_at(&self, round: u64) -> bool {
        self.first_valid <= round && round <= self.last_valid
    }
}

fn push_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn push_optional_address(buf: &mut Vec<u8>, address: Option<&Address>) {
    match address {
        Some(addr) => {
            buf.push(0x01);
            buf.extend_from_slice(addr.as_bytes());
        }
        None => buf.push(0x00),
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Transaction`] values.
///
/// # Usage
///
/// ```rust
/// use gavel_protocol::identity::Address;
/// use gavel_protocol::transaction::TransactionBuilder;
///
/// let bidder = Address::derive(b"bidder");
/// let escrow = Address::derive(b"escrow");
///
/// let tx = TransactionBuilder::payment(bidder, escrow, 3_000_000)
///     .fee(1_000)
///     .valid_rounds(100, 1_100)
///     .build();
///
/// assert_eq!(tx.receiver(), Some(escrow));
/// ```
///
/// Defaults: `fee` is [`MIN_TXN_FEE`], the validity window is unbounded
/// (`0..=u64::MAX`), and no group, rekey or note is set.
pub struct TransactionBuilder {
    version: u16,
    sender: Address,
    fee: u64,
    first_valid: u64,
    last_valid: u64,
    rekey_to: Option<Address>,
    note: Option<Vec<u8>>,
    kind: TransactionKind,
}

impl TransactionBuilder {
    fn with_kind(sender: Address, kind: TransactionKind) -> Self {
        Self {
            version: TRANSACTION_VERSION,
            sender,
            fee: MIN_TXN_FEE,
            first_valid: 0,
            last_valid: u64::MAX,
            rekey_to: None,
            note: None,
            kind,
        }
    }

    /// Starts a native currency payment.
    pub fn payment(sender: Address, receiver: Address, amount: u64) -> Self {
        Self::with_kind(
            sender,
            TransactionKind::Payment {
                receiver,
                amount,
                close_remainder_to: None,
            },
        )
    }

    /// Starts an asset transfer.
    pub fn asset_transfer(sender: Address, asset_id: u64, amount: u64, receiver: Address) -> Self {
        Self::with_kind(
            sender,
            TransactionKind::AssetTransfer {
                asset_id,
                amount,
                receiver,
                asset_sender: None,
                close_to: None,
            },
        )
    }

    /// Starts a `NoOp` call into application `app_id` with no arguments.
    pub fn app_call(sender: Address, app_id: u64) -> Self {
        Self::with_kind(
            sender,
            TransactionKind::ApplicationCall {
                app_id,
                on_completion: OnCompletion::NoOp,
                args: Vec::new(),
            },
        )
    }

    /// Overrides the encoding version. Only needed for testing upgrades.
    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    /// Sets the fee.
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the inclusive validity window.
    pub fn valid_rounds(mut self, first_valid: u64, last_valid: u64) -> Self {
        self.first_valid = first_valid;
        self.last_valid = last_valid;
        self
    }

    /// Rekeys the sender to `target` once the transaction commits.
    pub fn rekey_to(mut self, target: Address) -> Self {
        self.rekey_to = Some(target);
        self
    }

    /// Sets the account-closing recipient. No effect on application calls.
    pub fn close_to(mut self, target: Address) -> Self {
        match &mut self.kind {
            TransactionKind::Payment {
                close_remainder_to, ..
            } => *close_remainder_to = Some(target),
            TransactionKind::AssetTransfer { close_to, .. } => *close_to = Some(target),
            TransactionKind::ApplicationCall { .. } => {}
        }
        self
    }

    /// Turns an asset transfer into a clawback from `source`. No effect on
    /// other kinds.
    pub fn revocation_target(mut self, source: Address) -> Self {
        if let TransactionKind::AssetTransfer { asset_sender, .. } = &mut self.kind {
            *asset_sender = Some(source);
        }
        self
    }

    /// Replaces the arguments of an application call.
    pub fn args(mut self, new_args: Vec<Vec<u8>>) -> Self {
        if let TransactionKind::ApplicationCall { args, .. } = &mut self.kind {
            *args = new_args;
        }
        self
    }

    /// Appends one argument to an application call.
    pub fn arg(mut self, arg: impl Into<Vec<u8>>) -> Self {
        if let TransactionKind::ApplicationCall { args, .. } = &mut self.kind {
            args.push(arg.into());
        }
        self
    }

    /// Sets the on-completion action of an application call.
    pub fn on_completion(mut self, action: OnCompletion) -> Self {
        if let TransactionKind::ApplicationCall { on_completion, .. } = &mut self.kind {
            *on_completion = action;
        }
        self
    }

    /// Attaches a note.
    pub fn note(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.note = Some(data.into());
        self
    }

    /// Consumes the builder and produces an ungrouped [`Transaction`].
    pub fn build(self) -> Transaction {
        let mut tx = Transaction {
            id: String::new(),
            version: self.version,
            sender: self.sender,
            fee: self.fee,
            first_valid: self.first_valid,
            last_valid: self.last_valid,
            group: None,
            rekey_to: self.rekey_to,
            note: self.note,
            kind: self.kind,
        };

        tx.id = tx.compute_id();
        tx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
