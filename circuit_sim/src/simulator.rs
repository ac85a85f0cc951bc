//! The harness facade driven by tests.

use crate::bootstrap::Bootstrapper;
use crate::config::SimConfig;
use crate::context::ContextManager;
use crate::dispatcher::InvocationDispatcher;
use crate::error::SimError;
use crate::keys::DeterministicKeyProvider;
use crate::observer::{CommitEvent, CommitObserver, RejectEvent};
use crate::projector::LedgerProjector;
use crate::registry::PrivateStateRegistry;
use circuit_env::{
    Actor, Args, CircuitContext, CoinPublicKey, Contract, ContractAddress, ContractState, ProofData,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

/// Everything a committed call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation<L> {
    /// Ledger view after the commit
    pub ledger: L,

    /// Value returned by the transition
    pub result: Value,

    /// Opaque proof artifact, if any
    pub proof: Option<ProofData>,
}

impl<L> Invocation<L> {
    /// Decodes the transition's result value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, SimError> {
        T::deserialize(&self.result).map_err(|e| SimError::Codec(e.to_string()))
    }
}

/// A deployed contract plus its simulated actors.
///
/// # Usage
///
/// ```ignore
/// let mut sim = Simulator::deploy(RoleCounter, "admin", admin_state, ())?;
/// sim.register("user", user_state);
///
/// let err = sim.as_actor("user")?.invoke("increment", args![]).unwrap_err();
/// assert!(err.is_rule_violation());
///
/// let ledger = sim.as_actor("admin")?.invoke("increment", args![])?;
/// assert_eq!(ledger.round, 1);
/// ```
pub struct Simulator<C: Contract> {
    config: SimConfig,
    keys: DeterministicKeyProvider,
    projector: LedgerProjector<C>,
    registry: PrivateStateRegistry<C::PrivateState>,
    context: ContextManager<C::PrivateState>,
    dispatcher: InvocationDispatcher<C::PrivateState>,
    observer: Option<Box<dyn CommitObserver>>,
}

impl<C: Contract> Simulator<C> {
    /// Deploys `contract` with the default config.
    pub fn deploy(
        contract: C,
        genesis_actor: impl Into<Actor>,
        private_state: C::PrivateState,
        args: C::Constructor,
    ) -> Result<Self, SimError> {
        Self::deploy_with(SimConfig::default(), contract, genesis_actor, private_state, args)
    }

    /// Deploys `contract` with an explicit config.
    pub fn deploy_with(
        config: SimConfig,
        contract: C,
        genesis_actor: impl Into<Actor>,
        private_state: C::PrivateState,
        args: C::Constructor,
    ) -> Result<Self, SimError> {
        Bootstrapper::new(config).deploy(contract, genesis_actor, private_state, args)
    }

    pub(crate) fn from_parts(
        config: SimConfig,
        keys: DeterministicKeyProvider,
        projector: LedgerProjector<C>,
        registry: PrivateStateRegistry<C::PrivateState>,
        context: ContextManager<C::PrivateState>,
        dispatcher: InvocationDispatcher<C::PrivateState>,
    ) -> Self {
        Self {
            config,
            keys,
            projector,
            registry,
            context,
            dispatcher,
            observer: None,
        }
    }

    /// Installs an observer notified after every dispatched call.
    pub fn with_observer(mut self, observer: impl CommitObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Registers (or replaces) an actor's private state.
    ///
    /// Replacing the current actor's state takes effect on the next call.
    pub fn register(&mut self, actor: impl Into<Actor>, private_state: C::PrivateState) {
        let actor = actor.into();
        info!(actor = %actor, "registered actor");
        if self.context.current_actor() == &actor {
            self.context.reload_private_state(private_state.clone());
        }
        self.registry.register(actor, private_state);
    }

    /// Re-scopes the harness to `actor` for the following calls.
    pub fn as_actor(&mut self, actor: &str) -> Result<&mut Self, SimError> {
        self.context.switch_actor(&self.registry, actor)?;
        Ok(self)
    }

    /// Runs a transition as the current actor and returns the new ledger view.
    pub fn invoke(&mut self, name: &str, args: Args) -> Result<C::Ledger, SimError> {
        self.call(name, args, None).map(|i| i.ledger)
    }

    /// Like [`Simulator::invoke`] with a caller identity override for this call.
    pub fn invoke_from(&mut self, name: &str, args: Args, caller: CoinPublicKey) -> Result<C::Ledger, SimError> {
        self.call(name, args, Some(caller)).map(|i| i.ledger)
    }

    /// Runs a transition and decodes its result value.
    pub fn query<T: DeserializeOwned>(&mut self, name: &str, args: Args) -> Result<T, SimError> {
        self.call(name, args, None)?.decode()
    }

    /// Like [`Simulator::query`] with a caller identity override.
    pub fn query_from<T: DeserializeOwned>(
        &mut self,
        name: &str,
        args: Args,
        caller: CoinPublicKey,
    ) -> Result<T, SimError> {
        self.call(name, args, Some(caller))?.decode()
    }

    /// Runs a transition and returns everything it produced.
    ///
    /// Observers hear about a commit before the ledger is projected. If that
    /// projection fails the call has still been committed (and counted), and
    /// the error is returned as `SimError::Codec`.
    pub fn call(
        &mut self,
        name: &str,
        args: Args,
        caller: Option<CoinPublicKey>,
    ) -> Result<Invocation<C::Ledger>, SimError> {
        let outcome = self
            .dispatcher
            .invoke(&mut self.context, &mut self.registry, name, &args, caller);

        match outcome {
            Ok(done) => {
                if let Some(observer) = &self.observer {
                    observer.on_commit(&CommitEvent {
                        sequence: self.dispatcher.committed(),
                        actor: self.context.current_actor().clone(),
                        transition: name.to_string(),
                        caller: done.caller,
                        result: done.result.clone(),
                        proof: done.proof.clone(),
                    });
                }
                Ok(Invocation {
                    ledger: self.view_ledger()?,
                    result: done.result,
                    proof: done.proof,
                })
            }
            Err(err) => {
                if let (Some(observer), Some(reason)) = (&self.observer, err.violation()) {
                    observer.on_reject(&RejectEvent {
                        actor: self.context.current_actor().clone(),
                        transition: name.to_string(),
                        caller: caller.unwrap_or_else(|| self.context.current().caller()),
                        reason: reason.to_string(),
                    });
                }
                Err(err)
            }
        }
    }

    /// Projects the current ledger.
    pub fn view_ledger(&self) -> Result<C::Ledger, SimError> {
        self.projector.project(&self.context.current().transaction.state)
    }

    /// Private state registered for `actor`.
    pub fn private_state_of(&self, actor: &str) -> Result<&C::PrivateState, SimError> {
        self.registry.get(actor)
    }

    /// Private state of the current actor.
    pub fn private_state(&self) -> &C::PrivateState {
        &self.context.current().current_private_state
    }

    pub fn current_actor(&self) -> &Actor {
        self.context.current_actor()
    }

    /// The current execution context. Do not hold across calls.
    pub fn context(&self) -> &CircuitContext<C::PrivateState> {
        self.context.current()
    }

    /// The genesis snapshot.
    pub fn genesis(&self) -> &ContractState {
        self.context.genesis()
    }

    pub fn contract_address(&self) -> ContractAddress {
        self.context.current().transaction.address
    }

    /// Registered actors in sorted order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.registry.actors()
    }

    /// Deterministic caller identity for `actor` under this harness's seed.
    pub fn coin_public_key(&self, actor: &str) -> CoinPublicKey {
        self.keys.coin_public_key(actor)
    }

    /// Deterministic 32-byte secret for `actor` under this harness's seed.
    pub fn actor_secret(&self, actor: &str) -> [u8; 32] {
        self.keys.actor_secret(actor)
    }

    /// Number of committed calls.
    pub fn committed(&self) -> u64 {
        self.dispatcher.committed()
    }

    /// Number of rejected calls.
    pub fn rejected(&self) -> u64 {
        self.dispatcher.rejected()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn contract(&self) -> &C {
        self.projector.contract()
    }
}
