//! Role-guarded counter.
//!
//! The simplest contract that exercises authorization: the deployer is the
//! admin, the admin can appoint operators, and only the admin or an operator
//! may advance the round. Callers are authenticated from their private
//! secret key, so switching actors is enough to change who is calling.

use crate::crypto::derive_public_key;
use circuit_env::{
    Args, CircuitContext, CircuitError, CircuitResults, CodecError, CoinPublicKey,
    ConstructorContext, Contract, ContractState, IdentityScope, InitialState, ProofData,
    StateValue, TransitionTable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const PK_DOMAIN: &str = "counter:pk:";

/// Private state of a counter participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterPrivateState {
    /// Secret the caller's public key is derived from
    pub secret_key: [u8; 32],

    /// Number of successful increments made by this actor
    pub increments: u64,
}

impl CounterPrivateState {
    pub fn new(secret_key: [u8; 32]) -> Self {
        Self {
            secret_key,
            increments: 0,
        }
    }

    /// Public key this participant is known by on the ledger.
    pub fn public_key(&self) -> CoinPublicKey {
        counter_public_key(&self.secret_key)
    }
}

/// Public ledger of the counter contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterLedger {
    pub round: u64,
    pub admin: CoinPublicKey,
    pub operators: BTreeSet<CoinPublicKey>,
}

/// Derives a participant's public key from a secret.
pub fn counter_public_key(secret: &[u8; 32]) -> CoinPublicKey {
    derive_public_key(PK_DOMAIN, secret, 0)
}

/// The counter contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleCounter;

impl Contract for RoleCounter {
    type PrivateState = CounterPrivateState;
    type Ledger = CounterLedger;
    type Constructor = ();

    fn name(&self) -> &str {
        "role-counter"
    }

    fn initial_state(
        &self,
        context: ConstructorContext<CounterPrivateState>,
        _args: (),
    ) -> Result<InitialState<CounterPrivateState>, CircuitError> {
        let ledger = CounterLedger {
            round: 0,
            admin: context.initial_private_state.public_key(),
            operators: BTreeSet::new(),
        };
        Ok(InitialState {
            private_state: context.initial_private_state,
            contract_state: ContractState::new(StateValue::encode(&ledger)?),
            identity: IdentityScope::new(context.caller),
        })
    }

    fn transitions(&self) -> TransitionTable<CounterPrivateState> {
        TransitionTable::new()
            .with("increment", increment)
            .with("add_operator", add_operator)
            .with("remove_operator", remove_operator)
            .with("read", read)
    }

    fn ledger(&self, state: &StateValue) -> Result<CounterLedger, CodecError> {
        state.decode()
    }
}

type Ctx = CircuitContext<CounterPrivateState>;
type Res = Result<CircuitResults<CounterPrivateState>, CircuitError>;

fn require_admin(ledger: &CounterLedger, caller: &CoinPublicKey) -> Result<(), CircuitError> {
    if *caller != ledger.admin {
        return Err(CircuitError::unauthorized("caller is not the counter admin"));
    }
    Ok(())
}

fn increment(ctx: Ctx, _args: &Args) -> Res {
    let mut ledger: CounterLedger = ctx.ledger()?;
    let caller = ctx.current_private_state.public_key();
    if caller != ledger.admin && !ledger.operators.contains(&caller) {
        return Err(CircuitError::unauthorized("caller holds no counter role"));
    }

    ledger.round = ledger
        .round
        .checked_add(1)
        .ok_or_else(|| CircuitError::invalid_state("round overflow"))?;
    let round = ledger.round;

    let mut private = ctx.current_private_state.clone();
    private.increments += 1;

    let results = ctx
        .with_ledger(&ledger)?
        .with_private_state(private)
        .finish(round)?;
    Ok(results.with_proof(ProofData {
        circuit: "increment".to_string(),
        public_inputs: vec![],
        public_output: serde_json::json!(round),
    }))
}

fn add_operator(ctx: Ctx, args: &Args) -> Res {
    let operator: CoinPublicKey = args.get(0)?;
    let mut ledger: CounterLedger = ctx.ledger()?;
    require_admin(&ledger, &ctx.current_private_state.public_key())?;

    if !ledger.operators.insert(operator) {
        return Err(CircuitError::invalid_state("operator already appointed"));
    }
    ctx.with_ledger(&ledger)?.finish(())
}

fn remove_operator(ctx: Ctx, args: &Args) -> Res {
    let operator: CoinPublicKey = args.get(0)?;
    let mut ledger: CounterLedger = ctx.ledger()?;
    require_admin(&ledger, &ctx.current_private_state.public_key())?;

    if !ledger.operators.remove(&operator) {
        return Err(CircuitError::not_found("operator not appointed"));
    }
    ctx.with_ledger(&ledger)?.finish(())
}

fn read(ctx: Ctx, _args: &Args) -> Res {
    let ledger: CounterLedger = ctx.ledger()?;
    ctx.finish(ledger.round)
}
