//! Atomic transaction groups.
//!
//! A [`TransactionGroup`] is an ordered list of 1 to [`MAX_GROUP_SIZE`]
//! transactions that commit together or not at all. Its id is a
//! domain-separated BLAKE3 digest over the ordered member ids and is stamped
//! into every member's `group` field, so a member lifted out of its group no
//! longer verifies.
//!
//! ```text
//! ids:      [id0, id1, id2, id3]
//! group_id: BLAKE3-derive-key("gavel.group.v1", id0 || id1 || id2 || id3)
//! ```
//!
//! A [`SignedGroup`] pairs each member with the [`Authorization`] that lets
//! it spend from its sender: a key holder's signature or a guard program.

use serde::{Deserialize, Serialize};

use super::builder::Transaction;
use super::verification::GroupError;
use crate::config::MAX_GROUP_SIZE;
use crate::crypto::domain_separated_hash;
use crate::identity::Address;

/// Key-derivation context for group ids.
const GROUP_ID_CONTEXT: &str = "gavel.group.v1";

/// Compute the group id for an ordered list of transactions.
pub fn compute_group_id(txns: &[Transaction]) -> [u8; 32] {
    let mut data = Vec::with_capacity(txns.len() * 32);
    for tx in txns {
        data.extend_from_slice(&tx.id_bytes());
    }
    domain_separated_hash(GROUP_ID_CONTEXT, &data)
}

// ---------------------------------------------------------------------------
// TransactionGroup
// ---------------------------------------------------------------------------

/// An ordered, id-stamped set of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionGroup {
    id: [u8; 32],
    txns: Vec<Transaction>,
}

impl TransactionGroup {
    /// Groups `txns`, stamping the computed group id into each one.
    ///
    /// # Errors
    ///
    /// [`GroupError::InvalidSize`] for an empty list or more than
    /// [`MAX_GROUP_SIZE`] members.
    pub fn new(mut txns: Vec<Transaction>) -> Result<Self, GroupError> {
        if txns.is_empty() || txns.len() > MAX_GROUP_SIZE {
            return Err(GroupError::InvalidSize {
                size: txns.len(),
                max: MAX_GROUP_SIZE,
            });
        }

        let id = compute_group_id(&txns);
        for tx in &mut txns {
            tx.group = Some(id);
        }
        Ok(Self { id, txns })
    }

    /// The group id.
    pub fn id(&self) -> [u8; 32] {
        self.id
    }

    /// The group id as lowercase hex.
    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }

    /// Number of transactions in the group.
    pub fn group_size(&self) -> usize {
        self.txns.len()
    }

    /// Transaction at position `index`.
    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.txns.get(index)
    }

    /// Iterate the members in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.txns.iter()
    }

    /// Members as a slice.
    pub fn transactions(&self) -> &[Transaction] {
        &self.txns
    }
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// What allows a transaction to spend from its sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authorization {
    /// Signed by a key holder. Signature cryptography is the ledger client's
    /// concern; the ledger only checks that `signer` holds spending authority.
    Signature { signer: Address },
    /// Approved by the registered guard program at `address`.
    Program { address: Address },
}

impl Authorization {
    /// The address whose authority is claimed.
    pub fn authorizer(&self) -> Address {
        match self {
            Self::Signature { signer } => *signer,
            Self::Program { address } => *address,
        }
    }
}

/// A transaction paired with its authorization, before grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub txn: Transaction,
    pub auth: Authorization,
}

impl SignedTransaction {
    /// Signed by the transaction's own sender.
    pub fn signed(txn: Transaction) -> Self {
        let signer = txn.sender;
        Self {
            txn,
            auth: Authorization::Signature { signer },
        }
    }

    /// Signed by a different key holder (the sender's rekeyed authority).
    pub fn signed_by(txn: Transaction, signer: Address) -> Self {
        Self {
            txn,
            auth: Authorization::Signature { signer },
        }
    }

    /// Authorized by the guard program at `address`.
    pub fn by_program(txn: Transaction, address: Address) -> Self {
        Self {
            txn,
            auth: Authorization::Program { address },
        }
    }
}

// ---------------------------------------------------------------------------
// SignedGroup
// ---------------------------------------------------------------------------

/// The unit submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedGroup {
    group: TransactionGroup,
    auths: Vec<Authorization>,
}

impl SignedGroup {
    /// Groups the transactions and keeps their authorizations aligned.
    pub fn assemble(signed: Vec<SignedTransaction>) -> Result<Self, GroupError> {
        let (txns, auths): (Vec<_>, Vec<_>) =
            signed.into_iter().map(|s| (s.txn, s.auth)).unzip();
        let group = TransactionGroup::new(txns)?;
        Ok(Self { group, auths })
    }

    /// Pairs an already formed group with its authorizations.
    pub fn from_parts(
        group: TransactionGroup,
        auths: Vec<Authorization>,
    ) -> Result<Self, GroupError> {
        if auths.len() != group.group_size() {
            return Err(GroupError::AuthorizationCount {
                txns: group.group_size(),
                auths: auths.len(),
            });
        }
        Ok(Self { group, auths })
    }

    /// The grouped transactions.
    pub fn group(&self) -> &TransactionGroup {
        &self.group
    }

    /// Authorizations, index-aligned with the group.
    pub fn authorizations(&self) -> &[Authorization] {
        &self.auths
    }

    /// Iterate `(index, transaction, authorization)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Transaction, &Authorization)> {
        self.group
            .iter()
            .zip(self.auths.iter())
            .enumerate()
            .map(|(i, (tx, auth))| (i, tx, auth))
    }

    /// Mutable access for tests that tamper with a formed group.
    #[doc(hidden)]
    pub fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        &mut self.group.txns
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
