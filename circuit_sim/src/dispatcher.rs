//! Named-transition dispatch with atomic commit-or-reject.

use crate::context::ContextManager;
use crate::error::SimError;
use crate::registry::PrivateStateRegistry;
use circuit_env::{Args, CoinPublicKey, ProofData, TransitionTable};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Terminal state of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Committed,
    Rejected,
}

/// What a committed call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// Value returned by the transition
    pub result: Value,

    /// Opaque proof artifact, if the transition produced one
    pub proof: Option<ProofData>,

    /// Caller identity the transition saw
    pub caller: CoinPublicKey,
}

/// Invokes named transitions and commits their results.
///
/// Each call runs `Idle -> Dispatching -> {Committed | Rejected} -> Idle`
/// entirely inside [`InvocationDispatcher::invoke`]; `&mut self` keeps a
/// second call from starting before the first is done, so only the
/// terminal [`Outcome`] is observable afterwards.
///
/// The transition receives a clone of the current context; only when it
/// returns successfully are the registry and the current context updated,
/// so a rejected call leaves no trace.
pub struct InvocationDispatcher<P> {
    transitions: TransitionTable<P>,
    last_outcome: Option<Outcome>,
    committed: u64,
    rejected: u64,
}

impl<P: Clone + 'static> InvocationDispatcher<P> {
    pub fn new(transitions: TransitionTable<P>) -> Self {
        Self {
            transitions,
            last_outcome: None,
            committed: 0,
            rejected: 0,
        }
    }

    /// Runs `name` as the actor the context manager is scoped to.
    ///
    /// # Arguments
    /// * `context` - Current context (replaced only on success)
    /// * `registry` - Private states (only the scoped actor's entry is updated)
    /// * `name` - Transition to run
    /// * `args` - Positional arguments
    /// * `caller` - Identity override for this call only
    ///
    /// # Returns
    /// * `Ok(Dispatched)` - Transition succeeded and was committed
    /// * `Err(SimError::RuleViolation)` - Transition rejected, nothing committed
    /// * `Err(SimError::UnknownTransition | InvalidArguments)` - Not dispatched at all
    pub fn invoke(
        &mut self,
        context: &mut ContextManager<P>,
        registry: &mut PrivateStateRegistry<P>,
        name: &str,
        args: &Args,
        caller: Option<CoinPublicKey>,
    ) -> Result<Dispatched, SimError> {
        args.validate()
            .map_err(|e| SimError::InvalidArguments(e.to_string()))?;
        let transition = self
            .transitions
            .get(name)
            .ok_or_else(|| SimError::UnknownTransition(name.to_string()))?;

        // The scoped actor must still be registered before anything runs
        let actor = context.current_actor().clone();
        registry.get(actor.as_str())?;

        let call = context.call_context(caller);
        let caller = call.caller();

        match transition.apply(call, args) {
            Ok(results) => {
                registry.update(actor.as_str(), results.context.current_private_state.clone())?;
                context.commit(results.context);
                self.committed += 1;
                self.last_outcome = Some(Outcome::Committed);
                debug!(actor = %actor, transition = name, seq = self.committed, "commit");
                Ok(Dispatched {
                    result: results.result,
                    proof: results.proof,
                    caller,
                })
            }
            Err(source) => {
                self.rejected += 1;
                self.last_outcome = Some(Outcome::Rejected);
                debug!(actor = %actor, transition = name, "reject: {}", source);
                Err(SimError::RuleViolation {
                    transition: name.to_string(),
                    source,
                })
            }
        }
    }

    /// Outcome of the most recent dispatched call.
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Number of committed calls.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    /// Number of rejected calls.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn has_transition(&self, name: &str) -> bool {
        self.transitions.contains(name)
    }

    /// Registered transition names in sorted order.
    pub fn transition_names(&self) -> impl Iterator<Item = &str> {
        self.transitions.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuit_env::{
        args, Actor, CircuitContext, CircuitError, CircuitResults, ContractAddress, ContractState,
        IdentityScope, QueryContext, StateValue,
    };

    type Ctx = CircuitContext<u64>;

    fn bump(ctx: Ctx, args: &Args) -> Result<CircuitResults<u64>, CircuitError> {
        let by: u64 = args.get(0)?;
        let total: u64 = ctx.ledger()?;
        let private = ctx.current_private_state + 1;
        ctx.with_ledger(&(total + by))?.with_private_state(private).finish(total + by)
    }

    fn refuse(ctx: Ctx, _args: &Args) -> Result<CircuitResults<u64>, CircuitError> {
        // Mutate first, then fail: the mutation must never be observed
        let _scratch = ctx.with_ledger(&999u64)?.with_private_state(999);
        Err(CircuitError::unauthorized("refused"))
    }

    fn whoami(ctx: Ctx, _args: &Args) -> Result<CircuitResults<u64>, CircuitError> {
        let caller = ctx.caller();
        ctx.finish(caller)
    }

    fn setup() -> (InvocationDispatcher<u64>, ContextManager<u64>, PrivateStateRegistry<u64>) {
        let state = StateValue::encode(&0u64).unwrap();
        let context = CircuitContext {
            current_private_state: 0,
            identity: IdentityScope::new(CoinPublicKey::from_bytes([1; 32])),
            original_state: ContractState::new(state.clone()),
            transaction: QueryContext::new(state, ContractAddress::default()),
        };
        let table = TransitionTable::new()
            .with("bump", bump)
            .with("refuse", refuse)
            .with("whoami", whoami);
        let mut registry = PrivateStateRegistry::seeded(Actor::from("admin"), 0);
        registry.register("user", 100);
        (
            InvocationDispatcher::new(table),
            ContextManager::new(Actor::from("admin"), context),
            registry,
        )
    }

    #[test]
    fn test_commit_updates_context_and_scoped_actor_only() {
        let (mut dispatcher, mut context, mut registry) = setup();

        let done = dispatcher
            .invoke(&mut context, &mut registry, "bump", &args![5u64], None)
            .unwrap();

        assert_eq!(done.result, serde_json::json!(5));
        assert_eq!(context.current().ledger::<u64>().unwrap(), 5);
        assert_eq!(registry.get("admin").unwrap(), &1);
        assert_eq!(registry.get("user").unwrap(), &100);
        assert_eq!(dispatcher.committed(), 1);
        assert_eq!(dispatcher.last_outcome(), Some(Outcome::Committed));
    }

    #[test]
    fn test_rejection_leaves_everything_untouched() {
        let (mut dispatcher, mut context, mut registry) = setup();
        let before_ctx = context.current().clone();
        let before_registry = registry.clone();

        let err = dispatcher
            .invoke(&mut context, &mut registry, "refuse", &Args::new(), None)
            .unwrap_err();

        assert!(err.is_rule_violation());
        assert!(matches!(err.violation(), Some(CircuitError::Unauthorized(_))));
        assert_eq!(context.current(), &before_ctx);
        assert_eq!(registry, before_registry);
        assert_eq!(dispatcher.rejected(), 1);
        assert_eq!(dispatcher.last_outcome(), Some(Outcome::Rejected));
    }

    #[test]
    fn test_unknown_transition_not_counted() {
        let (mut dispatcher, mut context, mut registry) = setup();
        let err = dispatcher
            .invoke(&mut context, &mut registry, "nope", &Args::new(), None)
            .unwrap_err();

        assert_eq!(err, SimError::UnknownTransition("nope".to_string()));
        assert_eq!(dispatcher.committed() + dispatcher.rejected(), 0);
        assert_eq!(dispatcher.last_outcome(), None);
    }

    #[test]
    fn test_argument_decode_failure_is_rule_violation() {
        let (mut dispatcher, mut context, mut registry) = setup();
        let err = dispatcher
            .invoke(&mut context, &mut registry, "bump", &args!["five"], None)
            .unwrap_err();
        assert!(matches!(err.violation(), Some(CircuitError::InvalidArgument(_))));
    }

    #[test]
    fn test_caller_override_applies_to_one_call() {
        let (mut dispatcher, mut context, mut registry) = setup();
        let other = CoinPublicKey::from_bytes([2; 32]);

        let first = dispatcher
            .invoke(&mut context, &mut registry, "whoami", &Args::new(), Some(other))
            .unwrap();
        let second = dispatcher
            .invoke(&mut context, &mut registry, "whoami", &Args::new(), None)
            .unwrap();

        assert_eq!(first.caller, other);
        assert_eq!(second.caller, CoinPublicKey::from_bytes([1; 32]));
    }

    #[test]
    fn test_transition_names_sorted() {
        let (dispatcher, _, _) = setup();
        let names: Vec<_> = dispatcher.transition_names().collect();
        assert_eq!(names, vec!["bump", "refuse", "whoami"]);
        assert!(dispatcher.has_transition("bump"));
    }
}
