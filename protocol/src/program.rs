//! # Program Interface
//!
//! The ledger runs two kinds of programs, and this module is the seam
//! between the ledger and the code that implements them.
//!
//! | Trait                  | State | Runs when                                 |
//! |------------------------|-------|-------------------------------------------|
//! | [`LogicProgram`]       | none  | a transaction is authorized by its address |
//! | [`ApplicationProgram`] | global key/value | an application call targets it  |
//!
//! Both see the *whole* atomic group, not just the transaction that
//! triggered them, and both answer with `Ok(())` or a [`ProgramError`].
//! Any error voids the entire group.

use thiserror::Error;

use crate::identity::Address;
use crate::storage::state::{GlobalState, StateError, StateSchema};
use crate::transaction::{OnCompletion, Transaction, TransactionGroup, TransactionKind};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a program refused a group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// The program's predicate failed.
    #[error("rejected: {0}")]
    Rejected(String),

    /// A global state read or write failed.
    #[error("state error: {0}")]
    State(#[from] StateError),
}

impl ProgramError {
    /// Shorthand for [`ProgramError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

// ---------------------------------------------------------------------------
// Guard programs
// ---------------------------------------------------------------------------

/// What a guard program sees: the group and which member it authorizes.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    group: &'a TransactionGroup,
    index: usize,
    round: u64,
}

impl<'a> GuardContext<'a> {
    pub fn new(group: &'a TransactionGroup, index: usize, round: u64) -> Self {
        Self {
            group,
            index,
            round,
        }
    }

    /// The full atomic group.
    pub fn group(&self) -> &'a TransactionGroup {
        self.group
    }

    /// Position of the transaction being authorized.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The transaction being authorized.
    pub fn txn(&self) -> Option<&'a Transaction> {
        self.group.get(self.index)
    }

    /// Round the group is evaluated at.
    pub fn round(&self) -> u64 {
        self.round
    }
}

/// A stateless predicate controlling an escrow account.
///
/// The escrow's address is derived from [`LogicProgram::program_bytes`], so
/// two guards with different parameters control different accounts.
pub trait LogicProgram: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Canonical encoding of the program and its parameters.
    fn program_bytes(&self) -> Vec<u8>;

    /// Address of the escrow account this program controls.
    fn address(&self) -> Address {
        Address::for_program(&self.program_bytes())
    }

    /// Approve or reject spending by the transaction at `ctx.index()`.
    fn evaluate(&self, ctx: &GuardContext<'_>) -> Result<(), ProgramError>;
}

// ---------------------------------------------------------------------------
// Application programs
// ---------------------------------------------------------------------------

/// What an application program sees when it is called.
pub struct CallContext<'a> {
    round: u64,
    app_id: Option<u64>,
    group: &'a TransactionGroup,
    index: usize,
    state: &'a mut GlobalState,
}

impl<'a> CallContext<'a> {
    /// `app_id` is `None` while the application is being created.
    pub fn new(
        round: u64,
        app_id: Option<u64>,
        group: &'a TransactionGroup,
        index: usize,
        state: &'a mut GlobalState,
    ) -> Self {
        Self {
            round,
            app_id,
            group,
            index,
            state,
        }
    }

    /// Current ledger round.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// This application's id, or `None` during creation.
    pub fn app_id(&self) -> Option<u64> {
        self.app_id
    }

    /// Returns `true` for the creation call.
    pub fn is_creation(&self) -> bool {
        self.app_id.is_none()
    }

    /// The full atomic group.
    pub fn group(&self) -> &'a TransactionGroup {
        self.group
    }

    /// Number of transactions in the group.
    pub fn group_size(&self) -> usize {
        self.group.group_size()
    }

    /// Position of this call in the group.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The application call transaction.
    pub fn txn(&self) -> Option<&'a Transaction> {
        self.group.get(self.index)
    }

    /// Sender of the application call.
    pub fn sender(&self) -> Option<Address> {
        self.txn().map(|tx| tx.sender)
    }

    /// Requested on-completion action.
    pub fn on_completion(&self) -> OnCompletion {
        match self.txn().map(|tx| &tx.kind) {
            Some(TransactionKind::ApplicationCall { on_completion, .. }) => *on_completion,
            _ => OnCompletion::NoOp,
        }
    }

    /// Call arguments.
    pub fn args(&self) -> &'a [Vec<u8>] {
        match self.txn().map(|tx| &tx.kind) {
            Some(TransactionKind::ApplicationCall { args, .. }) => args.as_slice(),
            _ => &[],
        }
    }

    /// Read access to global state.
    pub fn state(&self) -> &GlobalState {
        self.state
    }

    /// Write access to global state.
    pub fn state_mut(&mut self) -> &mut GlobalState {
        self.state
    }
}

/// A stateful program deployed as an application.
pub trait ApplicationProgram: Send + Sync {
    /// Human-readable name for logs and snapshots.
    fn name(&self) -> &str;

    /// Global state capacity, fixed at creation.
    fn schema(&self) -> StateSchema;

    /// Approve or reject a call, updating state in place on approval.
    ///
    /// State changes made before an error are discarded with the group.
    fn approve(&self, ctx: &mut CallContext<'_>) -> Result<(), ProgramError>;
}
