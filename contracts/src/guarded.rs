//! # Custody-Guarded Auction
//!
//! The shared skeleton of every contract in this crate. A guarded auction
//! keeps a typed state, accepts one configuration call, and from then on
//! only moves value through escrow accounts its custody guards control.
//! What changes between instantiations is the state layout and the rules
//! for each group shape, supplied by an [`AuctionRules`] implementation.
//!
//! ## Dispatch
//!
//! ```text
//! creation call                  -> rules.initialize(round), store
//! on-completion != NoOp          -> reject
//! call not at group[0]           -> reject
//! group size 1                   -> rules.configure
//! group size BID_GROUP_SIZE      -> rules.accept_bid
//! group size PAYOUT_GROUP_SIZE   -> rules.accept_payout (read-only)
//! anything else                  -> reject
//! ```
//!
//! State is loaded once, mutated in memory by the rules, and stored back
//! only when the rules approve. A rejection leaves the ledger's copy of the
//! state untouched, and the ledger discards the rest of the group with it.

use gavel_protocol::config::CONFIGURE_GROUP_SIZE;
use gavel_protocol::program::{ApplicationProgram, CallContext, ProgramError};
use gavel_protocol::storage::{ContractState, StateSchema};
use gavel_protocol::transaction::OnCompletion;

use crate::error::AuctionError;
use crate::validation::{ensure, expect_app_call};

/// The parameters of one guarded auction flavour.
pub trait AuctionRules: Send + Sync {
    /// Typed view over the contract's global state.
    type State: ContractState;

    /// Program name shown in logs and snapshots.
    const NAME: &'static str;

    /// Global state capacity.
    const SCHEMA: StateSchema;

    /// Size of the group that moves the asset to a new holder.
    const BID_GROUP_SIZE: usize;

    /// Size of the seller payout group, if the flavour has one.
    const PAYOUT_GROUP_SIZE: Option<usize>;

    /// State written by the creation call.
    fn initialize(&self, round: u64) -> Self::State;

    /// One-time configuration from a lone call.
    fn configure(&self, state: &mut Self::State, ctx: &CallContext<'_>) -> Result<(), AuctionError>;

    /// Validate a bid or claim group and record the new holder.
    fn accept_bid(&self, state: &mut Self::State, ctx: &CallContext<'_>) -> Result<(), AuctionError>;

    /// Validate a payout group. Never changes state.
    fn accept_payout(&self, _state: &Self::State, ctx: &CallContext<'_>) -> Result<(), AuctionError> {
        Err(AuctionError::UnexpectedGroupSize(ctx.group_size()))
    }
}

/// An [`ApplicationProgram`] driven by a set of [`AuctionRules`].
#[derive(Debug, Clone, Default)]
pub struct GuardedAuction<R> {
    rules: R,
}

impl<R: AuctionRules> GuardedAuction<R> {
    pub fn new(rules: R) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    fn dispatch(&self, ctx: &mut CallContext<'_>) -> Result<(), AuctionError> {
        let app_id = match ctx.app_id() {
            None => {
                let initial = self.rules.initialize(ctx.round());
                initial.store(ctx.state_mut())?;
                return Ok(());
            }
            Some(id) => id,
        };

        let on_completion = ctx.on_completion();
        ensure(
            on_completion == OnCompletion::NoOp,
            AuctionError::UnsupportedOnCompletion(on_completion),
        )?;
        expect_app_call(ctx.group(), 0, app_id)?;
        ensure(ctx.index() == 0, AuctionError::UnexpectedGroupSize(ctx.group_size()))?;

        let mut state = R::State::load(ctx.state())?;
        let size = ctx.group_size();

        if size == CONFIGURE_GROUP_SIZE {
            self.rules.configure(&mut state, ctx)?;
        } else if size == R::BID_GROUP_SIZE {
            self.rules.accept_bid(&mut state, ctx)?;
        } else if R::PAYOUT_GROUP_SIZE == Some(size) {
            return self.rules.accept_payout(&state, ctx);
        } else {
            return Err(AuctionError::UnexpectedGroupSize(size));
        }

        state.store(ctx.state_mut())?;
        Ok(())
    }
}

impl<R: AuctionRules> ApplicationProgram for GuardedAuction<R> {
    fn name(&self) -> &str {
        R::NAME
    }

    fn schema(&self) -> StateSchema {
        R::SCHEMA
    }

    fn approve(&self, ctx: &mut CallContext<'_>) -> Result<(), ProgramError> {
        self.dispatch(ctx).map_err(ProgramError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_protocol::identity::Address;
    use gavel_protocol::storage::{GlobalState, StateError};
    use gavel_protocol::transaction::{TransactionBuilder, TransactionGroup};

    /// Counts configurations and bids; bids must carry a positive first arg.
    #[derive(Default)]
    struct Tally;

    #[derive(Debug, PartialEq)]
    struct TallyState {
        configured: u64,
        bids: u64,
    }

    impl ContractState for TallyState {
        fn load(state: &GlobalState) -> Result<Self, StateError> {
            Ok(Self {
                configured: state.read_uint("configured")?.unwrap_or(0),
                bids: state.read_uint("bids")?.unwrap_or(0),
            })
        }

        fn store(&self, state: &mut GlobalState) -> Result<(), StateError> {
            state.write_uint("configured", self.configured)?;
            state.write_uint("bids", self.bids)
        }
    }

    impl AuctionRules for Tally {
        type State = TallyState;
        const NAME: &'static str = "tally";
        const SCHEMA: StateSchema = StateSchema::new(2, 0);
        const BID_GROUP_SIZE: usize = 2;
        const PAYOUT_GROUP_SIZE: Option<usize> = None;

        fn initialize(&self, _round: u64) -> TallyState {
            TallyState {
                configured: 0,
                bids: 0,
            }
        }

        fn configure(&self, state: &mut TallyState, _ctx: &CallContext<'_>) -> Result<(), AuctionError> {
            state.configured += 1;
            Ok(())
        }

        fn accept_bid(&self, state: &mut TallyState, ctx: &CallContext<'_>) -> Result<(), AuctionError> {
            ensure(!ctx.args().is_empty(), AuctionError::NotConfigured)?;
            state.bids += 1;
            Ok(())
        }
    }

    const APP: u64 = 3;

    fn caller() -> Address {
        Address::derive(b"caller")
    }

    fn run(group: &TransactionGroup, index: usize, state: &mut GlobalState) -> Result<(), ProgramError> {
        let contract = GuardedAuction::new(Tally);
        let mut ctx = CallContext::new(10, Some(APP), group, index, state);
        contract.approve(&mut ctx)
    }

    fn created() -> GlobalState {
        let contract = GuardedAuction::new(Tally);
        let group = TransactionGroup::new(vec![TransactionBuilder::app_call(caller(), 0).build()]).unwrap();
        let mut state = GlobalState::new(contract.schema());
        let mut ctx = CallContext::new(10, None, &group, 0, &mut state);
        contract.approve(&mut ctx).unwrap();
        state
    }

    #[test]
    fn creation_initializes_state() {
        let state = created();
        assert_eq!(state.read_uint("bids").unwrap(), Some(0));
    }

    #[test]
    fn dispatches_by_group_size() {
        let mut state = created();
        let lone = TransactionGroup::new(vec![TransactionBuilder::app_call(caller(), APP).build()]).unwrap();
        run(&lone, 0, &mut state).unwrap();
        assert_eq!(state.read_uint("configured").unwrap(), Some(1));

        let pair = TransactionGroup::new(vec![
            TransactionBuilder::app_call(caller(), APP).arg(vec![1]).build(),
            TransactionBuilder::payment(caller(), caller(), 0).build(),
        ])
        .unwrap();
        run(&pair, 0, &mut state).unwrap();
        assert_eq!(state.read_uint("bids").unwrap(), Some(1));

        let triple = TransactionGroup::new(vec![
            TransactionBuilder::app_call(caller(), APP).build(),
            TransactionBuilder::payment(caller(), caller(), 0).build(),
            TransactionBuilder::payment(caller(), caller(), 0).build(),
        ])
        .unwrap();
        assert!(run(&triple, 0, &mut state).is_err());
    }

    #[test]
    fn rejected_rules_leave_state_alone() {
        let mut state = created();
        let before = state.clone();
        let pair = TransactionGroup::new(vec![
            TransactionBuilder::app_call(caller(), APP).build(),
            TransactionBuilder::payment(caller(), caller(), 0).build(),
        ])
        .unwrap();
        assert!(run(&pair, 0, &mut state).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn non_noop_calls_rejected() {
        let mut state = created();
        let group = TransactionGroup::new(vec![TransactionBuilder::app_call(caller(), APP)
            .on_completion(OnCompletion::DeleteApplication)
            .build()])
        .unwrap();
        assert_eq!(
            run(&group, 0, &mut state),
            Err(ProgramError::Rejected(
                AuctionError::UnsupportedOnCompletion(OnCompletion::DeleteApplication).to_string()
            ))
        );
    }

    #[test]
    fn call_must_open_the_group() {
        let mut state = created();
        let group = TransactionGroup::new(vec![
            TransactionBuilder::payment(caller(), caller(), 0).build(),
            TransactionBuilder::app_call(caller(), APP).arg(vec![1]).build(),
        ])
        .unwrap();
        assert!(run(&group, 1, &mut state).is_err());
    }
}
