//! The single current execution context and actor switching.

use crate::error::SimError;
use crate::registry::PrivateStateRegistry;
use circuit_env::{Actor, CircuitContext, CoinPublicKey, ContractState, IdentityScope};

/// Owns the current [`CircuitContext`] and the actor it is scoped to.
///
/// Switching actors only swaps the private-state slot. The genesis snapshot
/// and the shared transaction state are never forked or rolled back here;
/// they change only through [`ContextManager::commit`].
#[derive(Debug, Clone)]
pub struct ContextManager<P> {
    /// Actor the current context is scoped to
    actor: Actor,

    /// The current context
    current: CircuitContext<P>,
}

impl<P: Clone> ContextManager<P> {
    /// Creates a manager scoped to `actor`.
    pub fn new(actor: Actor, context: CircuitContext<P>) -> Self {
        Self {
            actor,
            current: context,
        }
    }

    /// Returns the current context.
    pub fn current(&self) -> &CircuitContext<P> {
        &self.current
    }

    /// Returns the actor the current context is scoped to.
    pub fn current_actor(&self) -> &Actor {
        &self.actor
    }

    /// Returns the genesis snapshot.
    pub fn genesis(&self) -> &ContractState {
        &self.current.original_state
    }

    /// Re-scopes the context to `actor`.
    ///
    /// Runs no transition logic. Fails with `UnknownActor` if the actor was
    /// never registered, leaving the current scope untouched.
    pub fn switch_actor(&mut self, registry: &PrivateStateRegistry<P>, actor: &str) -> Result<(), SimError> {
        let key = registry.actor(actor)?.clone();
        let state = registry.get(actor)?.clone();
        self.current.current_private_state = state;
        self.actor = key;
        Ok(())
    }

    /// Replaces the private state of the scoped actor without a switch.
    pub fn reload_private_state(&mut self, state: P) {
        self.current.current_private_state = state;
    }

    /// Builds the context presented to one call.
    ///
    /// Identical to the current context except that a caller override
    /// replaces the identity scope.
    pub fn call_context(&self, caller: Option<CoinPublicKey>) -> CircuitContext<P> {
        let context = self.current.clone();
        match caller {
            Some(key) => context.with_identity(IdentityScope::new(key)),
            None => context,
        }
    }

    /// Adopts the results of a successful call.
    ///
    /// Only the transaction state and the private state are taken from
    /// `returned`. The genesis snapshot, the contract address and the
    /// identity scope of the current context are kept as they were.
    pub fn commit(&mut self, returned: CircuitContext<P>) {
        let CircuitContext {
            current_private_state,
            transaction,
            ..
        } = returned;
        self.current.current_private_state = current_private_state;
        self.current.transaction.state = transaction.state;
    }
}
