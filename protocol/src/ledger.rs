//! # In-Memory Ledger
//!
//! A single-node ledger with exactly the properties the auction protocol
//! relies on: a round clock, native balances, a custom-asset registry,
//! stateful applications, guard-program escrows, and atomic groups.
//!
//! ## Group Commit
//!
//! ```text
//! submit(group)
//!   ├─ verify_group            structure, ids, fees
//!   ├─ clone ledger → scratch
//!   ├─ for each txn, in order:
//!   │    ├─ validity window contains the current round
//!   │    ├─ authorization (signer, or guard program over the full group)
//!   │    ├─ fee, then payment / asset transfer / application call
//!   │    └─ rekey
//!   ├─ bump version of every application whose state changed
//!   └─ swap scratch in → GroupReceipt
//! ```
//!
//! Any error drops the scratch copy. Nothing a rejected group did is ever
//! observable, including state writes an application made before a later
//! transaction in the same group failed.
//!
//! ## Concurrency
//!
//! `Ledger` itself is single-threaded. [`SharedLedger`] puts it behind a
//! `parking_lot::RwLock`; every `submit` holds the write lock, which gives
//! one global serial order of groups.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::MIN_TXN_FEE;
use crate::identity::Address;
use crate::program::{ApplicationProgram, CallContext, GuardContext, LogicProgram, ProgramError};
use crate::storage::state::{
    AccountState, ApplicationSnapshot, AssetHolding, AssetParams, GlobalState, LedgerSnapshot,
};
use crate::transaction::{
    verify_group, Authorization, GroupError, OnCompletion, SignedGroup, SignedTransaction,
    Transaction, TransactionBuilder, TransactionGroup, TransactionKind,
};

/// A ledger shared between threads. Writers are serialized by the lock.
pub type SharedLedger = Arc<RwLock<Ledger>>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why the ledger refused a group or an administrative operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The group is structurally invalid.
    #[error("malformed group: {0}")]
    Group(#[from] GroupError),

    /// A transaction's validity window does not contain the current round.
    #[error("transaction {index} not valid at round {round} (window {first}..={last})")]
    OutsideValidityWindow {
        index: usize,
        round: u64,
        first: u64,
        last: u64,
    },

    /// The authorizer is not the sender's spending authority.
    #[error("transaction {index}: {got} cannot authorize spending from {sender} (authority is {expected})")]
    Unauthorized {
        index: usize,
        sender: Address,
        expected: Address,
        got: Address,
    },

    /// Program authorization names an unregistered program.
    #[error("transaction {index}: no guard program registered at {address}")]
    UnknownProgram { index: usize, address: Address },

    /// The sender is controlled by a guard program, which no signature
    /// can stand in for.
    #[error("transaction {index}: {address} is program-controlled and cannot be signed for")]
    ProgramAccount { index: usize, address: Address },

    /// A guard program rejected the group.
    #[error("transaction {index}: guard '{program}' rejected the group: {source}")]
    GuardRejected {
        index: usize,
        program: String,
        source: ProgramError,
    },

    /// An application program rejected the call.
    #[error("transaction {index}: application {app_id} rejected the call: {source}")]
    ApplicationRejected {
        index: usize,
        app_id: u64,
        source: ProgramError,
    },

    /// The application does not exist.
    #[error("unknown application {0}")]
    UnknownApplication(u64),

    /// The ledger does not implement this lifecycle action.
    #[error("on-completion {0} is not supported")]
    UnsupportedOnCompletion(OnCompletion),

    /// Not enough native balance.
    #[error("{address} has {available}, needs {needed}")]
    InsufficientBalance {
        address: Address,
        needed: u64,
        available: u64,
    },

    /// The asset does not exist.
    #[error("unknown asset {0}")]
    UnknownAsset(u64),

    /// The account holds no slot for the asset.
    #[error("{address} has not opted in to asset {asset_id}")]
    NotOptedIn { address: Address, asset_id: u64 },

    /// The holding is frozen and the transfer is not a clawback.
    #[error("{address} holding of asset {asset_id} is frozen")]
    HoldingFrozen { address: Address, asset_id: u64 },

    /// Not enough units of the asset.
    #[error("{address} holds {available} of asset {asset_id}, needs {needed}")]
    InsufficientAssetBalance {
        address: Address,
        asset_id: u64,
        needed: u64,
        available: u64,
    },

    /// A clawback was sent by someone other than the asset's clawback address.
    #[error("{sender} is not the clawback address of asset {asset_id}")]
    NotClawback { asset_id: u64, sender: Address },

    /// A reconfiguration was sent by someone other than the asset's manager.
    #[error("{sender} is not the manager of asset {asset_id}")]
    NotManager { asset_id: u64, sender: Address },

    /// An account cannot be closed while it still holds assets.
    #[error("{0} cannot close while holding assets")]
    AccountHasHoldings(Address),

    /// The clock cannot run backwards.
    #[error("cannot move to round {target}, ledger is at {current}")]
    RoundInPast { current: u64, target: u64 },

    /// Arithmetic overflow in a balance.
    #[error("balance overflow")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A deployed application: its program and its global state.
#[derive(Clone)]
pub struct AppRecord {
    pub creator: Address,
    pub state: GlobalState,
    program: Arc<dyn ApplicationProgram>,
}

impl AppRecord {
    /// Program name.
    pub fn name(&self) -> &str {
        self.program.name()
    }
}

impl fmt::Debug for AppRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppRecord")
            .field("name", &self.program.name())
            .field("creator", &self.creator)
            .field("state", &self.state)
            .finish()
    }
}

/// Parameters for [`Ledger::create_asset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub total: u64,
    pub decimals: u32,
    pub unit_name: String,
    pub name: String,
    pub manager: Option<Address>,
    pub clawback: Option<Address>,
    pub default_frozen: bool,
}

/// Proof that a group committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReceipt {
    /// Hex group id.
    pub group_id: String,
    /// Round the group committed at.
    pub round: u64,
    /// Member transaction ids, in order.
    pub txn_ids: Vec<String>,
    /// Wall-clock commit time. Informational only.
    pub committed_at: DateTime<Utc>,
    /// New state version of every application the group changed.
    pub app_state_versions: BTreeMap<u64, u64>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The in-memory ledger.
#[derive(Clone)]
pub struct Ledger {
    round: u64,
    accounts: BTreeMap<Address, AccountState>,
    assets: BTreeMap<u64, AssetParams>,
    apps: BTreeMap<u64, AppRecord>,
    programs: HashMap<Address, Arc<dyn LogicProgram>>,
    /// Assets and applications share one id sequence.
    next_id: u64,
    fees_collected: u64,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("round", &self.round)
            .field("accounts", &self.accounts.len())
            .field("assets", &self.assets.len())
            .field("apps", &self.apps.len())
            .field("programs", &self.programs.len())
            .finish()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Ledger {
    /// Empty ledger starting at `round`.
    pub fn new(round: u64) -> Self {
        Self {
            round,
            accounts: BTreeMap::new(),
            assets: BTreeMap::new(),
            apps: BTreeMap::new(),
            programs: HashMap::new(),
            next_id: 1,
            fees_collected: 0,
        }
    }

    /// Wrap in a [`SharedLedger`].
    pub fn into_shared(self) -> SharedLedger {
        Arc::new(RwLock::new(self))
    }

    // -- Clock --------------------------------------------------------------

    /// Current round.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Move the clock forward by `rounds`.
    pub fn advance_rounds(&mut self, rounds: u64) -> Result<u64, LedgerError> {
        self.round = self.round.checked_add(rounds).ok_or(LedgerError::Overflow)?;
        Ok(self.round)
    }

    /// Move the clock to `target`. Staying put is allowed.
    pub fn advance_to(&mut self, target: u64) -> Result<u64, LedgerError> {
        if target < self.round {
            return Err(LedgerError::RoundInPast {
                current: self.round,
                target,
            });
        }
        self.round = target;
        Ok(self.round)
    }

    // -- Queries ------------------------------------------------------------

    /// Native balance (zero for unknown accounts).
    pub fn balance(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|a| a.balance).unwrap_or(0)
    }

    /// Full account record.
    pub fn account(&self, address: &Address) -> Option<&AccountState> {
        self.accounts.get(address)
    }

    /// Holding of `asset_id` in `address`, if opted in.
    pub fn asset_holding(&self, address: &Address, asset_id: u64) -> Option<AssetHolding> {
        self.accounts
            .get(address)
            .and_then(|a| a.holdings.get(&asset_id))
            .copied()
    }

    /// Registry entry of `asset_id`.
    pub fn asset_params(&self, asset_id: u64) -> Option<&AssetParams> {
        self.assets.get(&asset_id)
    }

    /// Global state of `app_id`.
    pub fn global_state(&self, app_id: u64) -> Option<&GlobalState> {
        self.apps.get(&app_id).map(|app| &app.state)
    }

    /// Application record of `app_id`.
    pub fn application(&self, app_id: u64) -> Option<&AppRecord> {
        self.apps.get(&app_id)
    }

    /// Total fees burned so far.
    pub fn fees_collected(&self) -> u64 {
        self.fees_collected
    }

    /// Serializable view of the ledger.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            round: self.round,
            accounts: self.accounts.clone(),
            assets: self.assets.clone(),
            applications: self
                .apps
                .iter()
                .map(|(id, app)| {
                    (
                        *id,
                        ApplicationSnapshot {
                            name: app.name().to_string(),
                            creator: app.creator,
                            state: app.state.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    // -- Administration -----------------------------------------------------

    /// Genesis faucet: credit `amount` to `address`.
    pub fn fund(&mut self, address: &Address, amount: u64) -> Result<u64, LedgerError> {
        self.credit(address, amount)?;
        Ok(self.balance(address))
    }

    /// Register a custom asset. The creator pays [`MIN_TXN_FEE`] and
    /// receives the whole supply in an unfrozen holding.
    pub fn create_asset(&mut self, creator: &Address, config: AssetConfig) -> Result<u64, LedgerError> {
        self.charge_fee(creator, MIN_TXN_FEE)?;

        let asset_id = self.allocate_id();
        self.assets.insert(
            asset_id,
            AssetParams {
                total: config.total,
                decimals: config.decimals,
                unit_name: config.unit_name,
                name: config.name,
                creator: *creator,
                manager: config.manager,
                clawback: config.clawback,
                default_frozen: config.default_frozen,
            },
        );
        self.accounts.entry(*creator).or_default().holdings.insert(
            asset_id,
            AssetHolding {
                amount: config.total,
                frozen: false,
            },
        );

        info!(asset_id, creator = %creator, "asset created");
        Ok(asset_id)
    }

    /// Replace the clawback address. Only the manager may do this.
    pub fn set_asset_clawback(
        &mut self,
        sender: &Address,
        asset_id: u64,
        clawback: Option<Address>,
    ) -> Result<(), LedgerError> {
        let params = self
            .assets
            .get(&asset_id)
            .ok_or(LedgerError::UnknownAsset(asset_id))?;
        if params.manager != Some(*sender) {
            return Err(LedgerError::NotManager {
                asset_id,
                sender: *sender,
            });
        }

        self.charge_fee(sender, MIN_TXN_FEE)?;
        if let Some(params) = self.assets.get_mut(&asset_id) {
            params.clawback = clawback;
        }
        debug!(asset_id, "asset clawback updated");
        Ok(())
    }

    /// Opt `account` in to `asset_id` with a zero-amount self transfer.
    pub fn opt_in_asset(&mut self, account: &Address, asset_id: u64) -> Result<GroupReceipt, LedgerError> {
        let tx = TransactionBuilder::asset_transfer(*account, asset_id, 0, *account).build();
        let group = SignedGroup::assemble(vec![SignedTransaction::signed(tx)])?;
        self.submit(&group)
    }

    /// Make a guard program available for program authorization.
    pub fn register_program(&mut self, program: Arc<dyn LogicProgram>) -> Address {
        let address = program.address();
        debug!(program = program.name(), address = %address, "guard program registered");
        self.programs.insert(address, program);
        address
    }

    /// Deploy an application. The program runs once in creation mode at the
    /// current round and may initialize its state; rejection aborts the
    /// deployment.
    pub fn create_application(
        &mut self,
        creator: &Address,
        program: Arc<dyn ApplicationProgram>,
    ) -> Result<u64, LedgerError> {
        let call = TransactionBuilder::app_call(*creator, 0).build();
        let group = TransactionGroup::new(vec![call])?;

        let mut state = GlobalState::new(program.schema());
        {
            let mut ctx = CallContext::new(self.round, None, &group, 0, &mut state);
            program
                .approve(&mut ctx)
                .map_err(|source| LedgerError::ApplicationRejected {
                    index: 0,
                    app_id: 0,
                    source,
                })?;
        }
        if !state.is_empty() {
            state.version = 1;
        }

        self.charge_fee(creator, MIN_TXN_FEE)?;
        let app_id = self.allocate_id();
        info!(app_id, name = program.name(), round = self.round, "application created");
        self.apps.insert(
            app_id,
            AppRecord {
                creator: *creator,
                state,
                program,
            },
        );
        Ok(app_id)
    }

    // -- Group submission ---------------------------------------------------

    /// Validate and apply an atomic group. All or nothing.
    pub fn submit(&mut self, signed: &SignedGroup) -> Result<GroupReceipt, LedgerError> {
        match self.try_apply(signed) {
            Ok((next, receipt)) => {
                *self = next;
                debug!(
                    group_id = %receipt.group_id,
                    round = receipt.round,
                    size = receipt.txn_ids.len(),
                    "group committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(
                    group_id = %signed.group().id_hex(),
                    round = self.round,
                    error = %e,
                    "group rejected"
                );
                Err(e)
            }
        }
    }

    fn try_apply(&self, signed: &SignedGroup) -> Result<(Ledger, GroupReceipt), LedgerError> {
        verify_group(signed)?;

        let group = signed.group();
        let mut scratch = self.clone();

        for (index, tx, auth) in signed.iter() {
            if !tx.is_valid_at(self.round) {
                return Err(LedgerError::OutsideValidityWindow {
                    index,
                    round: self.round,
                    first: tx.first_valid,
                    last: tx.last_valid,
                });
            }
            scratch.authorize(group, index, tx, auth)?;
            scratch.apply(group, index, tx)?;
        }

        let mut app_state_versions = BTreeMap::new();
        for (app_id, record) in scratch.apps.iter_mut() {
            if let Some(before) = self.apps.get(app_id) {
                if record.state.values_differ(&before.state) {
                    record.state.version = before.state.version + 1;
                    app_state_versions.insert(*app_id, record.state.version);
                }
            }
        }

        let receipt = GroupReceipt {
            group_id: group.id_hex(),
            round: self.round,
            txn_ids: group.iter().map(|tx| tx.id.clone()).collect(),
            committed_at: Utc::now(),
            app_state_versions,
        };
        Ok((scratch, receipt))
    }

    fn authorize(
        &self,
        group: &TransactionGroup,
        index: usize,
        tx: &Transaction,
        auth: &Authorization,
    ) -> Result<(), LedgerError> {
        let expected = self
            .accounts
            .get(&tx.sender)
            .map(|a| a.authority(&tx.sender))
            .unwrap_or(tx.sender);

        if auth.authorizer() != expected {
            return Err(LedgerError::Unauthorized {
                index,
                sender: tx.sender,
                expected,
                got: auth.authorizer(),
            });
        }

        match auth {
            Authorization::Signature { .. } if self.programs.contains_key(&expected) => {
                return Err(LedgerError::ProgramAccount {
                    index,
                    address: expected,
                });
            }
            Authorization::Signature { .. } => {}
            Authorization::Program { address } => {
                let program = self
                    .programs
                    .get(address)
                    .ok_or(LedgerError::UnknownProgram {
                        index,
                        address: *address,
                    })?;
                program
                    .evaluate(&GuardContext::new(group, index, self.round))
                    .map_err(|source| LedgerError::GuardRejected {
                        index,
                        program: program.name().to_string(),
                        source,
                    })?;
            }
        }

        Ok(())
    }

    fn apply(&mut self, group: &TransactionGroup, index: usize, tx: &Transaction) -> Result<(), LedgerError> {
        self.charge_fee(&tx.sender, tx.fee)?;

        match &tx.kind {
            TransactionKind::Payment {
                receiver,
                amount,
                close_remainder_to,
            } => {
                self.debit(&tx.sender, *amount)?;
                self.credit(receiver, *amount)?;
                if let Some(close) = close_remainder_to {
                    self.close_account(&tx.sender, close)?;
                }
            }
            TransactionKind::AssetTransfer {
                asset_id,
                amount,
                receiver,
                asset_sender,
                close_to,
            } => {
                self.transfer_asset(&tx.sender, *asset_id, *amount, receiver, *asset_sender, *close_to)?;
            }
            TransactionKind::ApplicationCall {
                app_id,
                on_completion,
                ..
            } => {
                self.call_application(group, index, *app_id, *on_completion)?;
            }
        }

        if let Some(target) = tx.rekey_to {
            if let Some(account) = self.accounts.get_mut(&tx.sender) {
                account.auth_address = if target == tx.sender { None } else { Some(target) };
            }
        }

        Ok(())
    }

    fn call_application(
        &mut self,
        group: &TransactionGroup,
        index: usize,
        app_id: u64,
        on_completion: OnCompletion,
    ) -> Result<(), LedgerError> {
        let record = self
            .apps
            .get(&app_id)
            .ok_or(LedgerError::UnknownApplication(app_id))?;
        let program = Arc::clone(&record.program);
        let mut state = record.state.clone();

        {
            let mut ctx = CallContext::new(self.round, Some(app_id), group, index, &mut state);
            program
                .approve(&mut ctx)
                .map_err(|source| LedgerError::ApplicationRejected {
                    index,
                    app_id,
                    source,
                })?;
        }

        match on_completion {
            OnCompletion::DeleteApplication => {
                self.apps.remove(&app_id);
            }
            OnCompletion::UpdateApplication => {
                return Err(LedgerError::UnsupportedOnCompletion(on_completion));
            }
            _ => {
                if let Some(record) = self.apps.get_mut(&app_id) {
                    record.state = state;
                }
            }
        }
        Ok(())
    }

    fn transfer_asset(
        &mut self,
        sender: &Address,
        asset_id: u64,
        amount: u64,
        receiver: &Address,
        asset_sender: Option<Address>,
        close_to: Option<Address>,
    ) -> Result<(), LedgerError> {
        let params = self
            .assets
            .get(&asset_id)
            .ok_or(LedgerError::UnknownAsset(asset_id))?;

        if let Some(source) = asset_sender {
            if params.clawback != Some(*sender) {
                return Err(LedgerError::NotClawback {
                    asset_id,
                    sender: *sender,
                });
            }
            return self.move_units(asset_id, &source, receiver, amount, true);
        }

        if amount == 0 && receiver == sender && self.asset_holding(sender, asset_id).is_none() {
            let frozen = params.default_frozen;
            self.accounts
                .entry(*sender)
                .or_default()
                .holdings
                .insert(asset_id, AssetHolding { amount: 0, frozen });
            return Ok(());
        }

        self.move_units(asset_id, sender, receiver, amount, false)?;

        if let Some(close) = close_to {
            let remaining = self
                .asset_holding(sender, asset_id)
                .map(|h| h.amount)
                .unwrap_or(0);
            self.move_units(asset_id, sender, &close, remaining, false)?;
            if let Some(account) = self.accounts.get_mut(sender) {
                account.holdings.remove(&asset_id);
            }
        }
        Ok(())
    }

    fn move_units(
        &mut self,
        asset_id: u64,
        from: &Address,
        to: &Address,
        amount: u64,
        clawback: bool,
    ) -> Result<(), LedgerError> {
        let source = self
            .asset_holding(from, asset_id)
            .ok_or(LedgerError::NotOptedIn {
                address: *from,
                asset_id,
            })?;
        let target = self
            .asset_holding(to, asset_id)
            .ok_or(LedgerError::NotOptedIn {
                address: *to,
                asset_id,
            })?;

        if !clawback {
            if source.frozen {
                return Err(LedgerError::HoldingFrozen {
                    address: *from,
                    asset_id,
                });
            }
            if target.frozen {
                return Err(LedgerError::HoldingFrozen {
                    address: *to,
                    asset_id,
                });
            }
        }
        if source.amount < amount {
            return Err(LedgerError::InsufficientAssetBalance {
                address: *from,
                asset_id,
                needed: amount,
                available: source.amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = target.amount.checked_add(amount).ok_or(LedgerError::Overflow)?;
        if let Some(h) = self.holding_mut(from, asset_id) {
            h.amount = source.amount - amount;
        }
        if let Some(h) = self.holding_mut(to, asset_id) {
            h.amount = credited;
        }
        Ok(())
    }

    fn holding_mut(&mut self, address: &Address, asset_id: u64) -> Option<&mut AssetHolding> {
        self.accounts
            .get_mut(address)
            .and_then(|a| a.holdings.get_mut(&asset_id))
    }

    fn close_account(&mut self, address: &Address, close_to: &Address) -> Result<(), LedgerError> {
        let holds_assets = self
            .accounts
            .get(address)
            .map(|a| !a.holdings.is_empty())
            .unwrap_or(false);
        if holds_assets {
            return Err(LedgerError::AccountHasHoldings(*address));
        }
        if let Some(account) = self.accounts.remove(address) {
            self.credit(close_to, account.balance)?;
        }
        Ok(())
    }

    fn charge_fee(&mut self, address: &Address, fee: u64) -> Result<(), LedgerError> {
        self.debit(address, fee)?;
        self.fees_collected = self.fees_collected.saturating_add(fee);
        Ok(())
    }

    fn debit(&mut self, address: &Address, amount: u64) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let available = self.balance(address);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                address: *address,
                needed: amount,
                available,
            });
        }
        if let Some(account) = self.accounts.get_mut(address) {
            account.balance = available - amount;
        }
        Ok(())
    }

    fn credit(&mut self, address: &Address, amount: u64) -> Result<(), LedgerError> {
        let account = self.accounts.entry(*address).or_default();
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::state::StateSchema;

    fn alice() -> Address {
        Address::derive(b"alice")
    }

    fn bob() -> Address {
        Address::derive(b"bob")
    }

    fn signed_group(txns: Vec<Transaction>) -> SignedGroup {
        SignedGroup::assemble(txns.into_iter().map(SignedTransaction::signed).collect()).unwrap()
    }

    /// Counts calls after creation; rejects any call whose first argument is "no".
    struct Counter;

    impl ApplicationProgram for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn schema(&self) -> StateSchema {
            StateSchema::new(1, 0)
        }

        fn approve(&self, ctx: &mut CallContext<'_>) -> Result<(), ProgramError> {
            if ctx.is_creation() {
                return Ok(());
            }
            if ctx.args().first().map(|a| a.as_slice()) == Some(b"no".as_slice()) {
                return Err(ProgramError::rejected("told no"));
            }
            let n = ctx.state().read_uint("calls")?.unwrap_or(0);
            ctx.state_mut().write_uint("calls", n + 1)?;
            Ok(())
        }
    }

    /// Escrow that only pays out exactly 10 units.
    struct PaysTen;

    impl LogicProgram for PaysTen {
        fn name(&self) -> &str {
            "pays-ten"
        }

        fn program_bytes(&self) -> Vec<u8> {
            b"pays-ten".to_vec()
        }

        fn evaluate(&self, ctx: &GuardContext<'_>) -> Result<(), ProgramError> {
            match ctx.txn().map(|tx| &tx.kind) {
                Some(TransactionKind::Payment { amount: 10, .. }) => Ok(()),
                _ => Err(ProgramError::rejected("only pays ten")),
            }
        }
    }

    #[test]
    fn payment_moves_balance_and_burns_fee() {
        let mut ledger = Ledger::new(1);
        ledger.fund(&alice(), 10_000).unwrap();
        let group = signed_group(vec![TransactionBuilder::payment(alice(), bob(), 4_000).build()]);
        let receipt = ledger.submit(&group).unwrap();

        assert_eq!(ledger.balance(&alice()), 10_000 - 4_000 - MIN_TXN_FEE);
        assert_eq!(ledger.balance(&bob()), 4_000);
        assert_eq!(ledger.fees_collected(), MIN_TXN_FEE);
        assert_eq!(receipt.round, 1);
        assert_eq!(receipt.txn_ids.len(), 1);
    }

    #[test]
    fn failing_member_voids_whole_group() {
        let mut ledger = Ledger::new(1);
        ledger.fund(&alice(), 10_000).unwrap();
        let group = signed_group(vec![
            TransactionBuilder::payment(alice(), bob(), 1_000).build(),
            TransactionBuilder::payment(bob(), alice(), 50_000).build(),
        ]);
        let err = ledger.submit(&group).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance(&alice()), 10_000);
        assert_eq!(ledger.balance(&bob()), 0);
    }

    #[test]
    fn wrong_signer_rejected() {
        let mut ledger = Ledger::new(1);
        ledger.fund(&alice(), 10_000).unwrap();
        let tx = TransactionBuilder::payment(alice(), bob(), 1).build();
        let group = SignedGroup::assemble(vec![SignedTransaction::signed_by(tx, bob())]).unwrap();
        assert!(matches!(
            ledger.submit(&group),
            Err(LedgerError::Unauthorized { index: 0, .. })
        ));
    }

    #[test]
    fn rekey_moves_spending_authority() {
        let mut ledger = Ledger::new(1);
        ledger.fund(&alice(), 10_000).unwrap();
        let rekey = TransactionBuilder::payment(alice(), alice(), 0)
            .rekey_to(bob())
            .build();
        ledger.submit(&signed_group(vec![rekey])).unwrap();

        let by_alice = signed_group(vec![TransactionBuilder::payment(alice(), bob(), 1).build()]);
        assert!(ledger.submit(&by_alice).is_err());

        let tx = TransactionBuilder::payment(alice(), bob(), 1).build();
        let by_bob = SignedGroup::assemble(vec![SignedTransaction::signed_by(tx, bob())]).unwrap();
        assert!(ledger.submit(&by_bob).is_ok());
    }

    #[test]
    fn validity_window_checked_against_round() {
        let mut ledger = Ledger::new(50);
        ledger.fund(&alice(), 10_000).unwrap();
        let late = signed_group(vec![TransactionBuilder::payment(alice(), bob(), 1)
            .valid_rounds(10, 40)
            .build()]);
        assert!(matches!(
            ledger.submit(&late),
            Err(LedgerError::OutsideValidityWindow { round: 50, .. })
        ));
    }

    #[test]
    fn guard_program_authorizes_escrow() {
        let mut ledger = Ledger::new(1);
        let escrow = ledger.register_program(Arc::new(PaysTen));
        ledger.fund(&escrow, 10_000).unwrap();

        let ten = TransactionBuilder::payment(escrow, bob(), 10).build();
        let ok = SignedGroup::assemble(vec![SignedTransaction::by_program(ten, escrow)]).unwrap();
        ledger.submit(&ok).unwrap();
        assert_eq!(ledger.balance(&bob()), 10);

        let eleven = TransactionBuilder::payment(escrow, bob(), 11).build();
        let bad = SignedGroup::assemble(vec![SignedTransaction::by_program(eleven, escrow)]).unwrap();
        assert!(matches!(
            ledger.submit(&bad),
            Err(LedgerError::GuardRejected { .. })
        ));
    }

    #[test]
    fn nobody_can_sign_for_an_escrow() {
        let mut ledger = Ledger::new(1);
        let escrow = ledger.register_program(Arc::new(PaysTen));
        ledger.fund(&escrow, 10_000).unwrap();
        let tx = TransactionBuilder::payment(escrow, bob(), 500).build();
        let forged = SignedGroup::assemble(vec![SignedTransaction::signed_by(tx.clone(), alice())]).unwrap();
        assert!(ledger.submit(&forged).is_err());

        let self_signed = SignedGroup::assemble(vec![SignedTransaction::signed(tx)]).unwrap();
        assert_eq!(
            ledger.submit(&self_signed),
            Err(LedgerError::ProgramAccount {
                index: 0,
                address: escrow
            })
        );
        assert_eq!(ledger.balance(&escrow), 10_000);
    }

    #[test]
    fn application_state_versions_bump_per_group() {
        let mut ledger = Ledger::new(1);
        ledger.fund(&alice(), 100_000).unwrap();
        let app_id = ledger.create_application(&alice(), Arc::new(Counter)).unwrap();
        assert_eq!(ledger.global_state(app_id).unwrap().version, 0);

        let group = signed_group(vec![
            TransactionBuilder::app_call(alice(), app_id).build(),
            TransactionBuilder::app_call(alice(), app_id).note(b"2".to_vec()).build(),
        ]);
        let receipt = ledger.submit(&group).unwrap();
        let state = ledger.global_state(app_id).unwrap();
        assert_eq!(state.read_uint("calls").unwrap(), Some(2));
        assert_eq!(state.version, 1);
        assert_eq!(receipt.app_state_versions.get(&app_id), Some(&1));
    }

    #[test]
    fn rejected_call_discards_earlier_state_writes() {
        let mut ledger = Ledger::new(1);
        ledger.fund(&alice(), 100_000).unwrap();
        let app_id = ledger.create_application(&alice(), Arc::new(Counter)).unwrap();

        let group = signed_group(vec![
            TransactionBuilder::app_call(alice(), app_id).build(),
            TransactionBuilder::app_call(alice(), app_id).arg(b"no".to_vec()).build(),
        ]);
        assert!(matches!(
            ledger.submit(&group),
            Err(LedgerError::ApplicationRejected { index: 1, .. })
        ));
        assert_eq!(ledger.global_state(app_id).unwrap().read_uint("calls").unwrap(), None);
    }

    #[test]
    fn default_frozen_asset_moves_only_by_clawback() {
        let mut ledger = Ledger::new(1);
        let creator = alice();
        ledger.fund(&creator, 100_000).unwrap();
        ledger.fund(&bob(), 100_000).unwrap();
        let asset_id = ledger
            .create_asset(
                &creator,
                AssetConfig {
                    total: 1,
                    decimals: 0,
                    unit_name: "ART".into(),
                    name: "Artwork".into(),
                    manager: Some(creator),
                    clawback: Some(creator),
                    default_frozen: true,
                },
            )
            .unwrap();
        ledger.opt_in_asset(&bob(), asset_id).unwrap();
        assert_eq!(
            ledger.asset_holding(&bob(), asset_id),
            Some(AssetHolding {
                amount: 0,
                frozen: true
            })
        );

        let plain = signed_group(vec![TransactionBuilder::asset_transfer(bob(), asset_id, 0, creator).build()]);
        assert!(ledger.submit(&plain).is_err());

        let claw = signed_group(vec![TransactionBuilder::asset_transfer(creator, asset_id, 1, bob())
            .revocation_target(creator)
            .build()]);
        ledger.submit(&claw).unwrap();
        assert_eq!(ledger.asset_holding(&bob(), asset_id).map(|h| h.amount), Some(1));
    }

    #[test]
    fn clawback_requires_clawback_sender_and_opt_in() {
        let mut ledger = Ledger::new(1);
        ledger.fund(&alice(), 100_000).unwrap();
        ledger.fund(&bob(), 100_000).unwrap();
        let asset_id = ledger
            .create_asset(
                &alice(),
                AssetConfig {
                    total: 1,
                    decimals: 0,
                    unit_name: "ART".into(),
                    name: "Artwork".into(),
                    manager: Some(alice()),
                    clawback: Some(alice()),
                    default_frozen: true,
                },
            )
            .unwrap();

        let not_opted = signed_group(vec![TransactionBuilder::asset_transfer(alice(), asset_id, 1, bob())
            .revocation_target(alice())
            .build()]);
        assert!(matches!(
            ledger.submit(&not_opted),
            Err(LedgerError::NotOptedIn { .. })
        ));

        ledger.opt_in_asset(&bob(), asset_id).unwrap();
        let by_bob = signed_group(vec![TransactionBuilder::asset_transfer(bob(), asset_id, 1, bob())
            .revocation_target(alice())
            .build()]);
        assert!(matches!(
            ledger.submit(&by_bob),
            Err(LedgerError::NotClawback { .. })
        ));
    }

    #[test]
    fn only_manager_moves_clawback() {
        let mut ledger = Ledger::new(1);
        ledger.fund(&alice(), 100_000).unwrap();
        ledger.fund(&bob(), 100_000).unwrap();
        let asset_id = ledger
            .create_asset(
                &alice(),
                AssetConfig {
                    total: 1,
                    decimals: 0,
                    unit_name: "ART".into(),
                    name: "Artwork".into(),
                    manager: Some(alice()),
                    clawback: Some(alice()),
                    default_frozen: false,
                },
            )
            .unwrap();
        assert!(matches!(
            ledger.set_asset_clawback(&bob(), asset_id, Some(bob())),
            Err(LedgerError::NotManager { .. })
        ));
        ledger.set_asset_clawback(&alice(), asset_id, Some(bob())).unwrap();
        assert_eq!(ledger.asset_params(asset_id).unwrap().clawback, Some(bob()));
    }

    #[test]
    fn close_remainder_empties_account() {
        let mut ledger = Ledger::new(1);
        ledger.fund(&alice(), 10_000).unwrap();
        let group = signed_group(vec![TransactionBuilder::payment(alice(), bob(), 1_000)
            .close_to(bob())
            .build()]);
        ledger.submit(&group).unwrap();
        assert!(ledger.account(&alice()).is_none());
        assert_eq!(ledger.balance(&bob()), 10_000 - MIN_TXN_FEE);
    }

    #[test]
    fn clock_only_moves_forward() {
        let mut ledger = Ledger::new(10);
        assert_eq!(ledger.advance_rounds(5).unwrap(), 15);
        assert_eq!(ledger.advance_to(15).unwrap(), 15);
        assert!(matches!(
            ledger.advance_to(14),
            Err(LedgerError::RoundInPast { current: 15, target: 14 })
        ));
    }

    #[test]
    fn snapshot_reflects_applications() {
        let mut ledger = Ledger::new(3);
        ledger.fund(&alice(), 100_000).unwrap();
        let app_id = ledger.create_application(&alice(), Arc::new(Counter)).unwrap();
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.round, 3);
        assert_eq!(snapshot.applications[&app_id].name, "counter");
        assert_eq!(snapshot.balance(&alice()), 100_000 - MIN_TXN_FEE);
    }
}
