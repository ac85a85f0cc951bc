//! Contract engine traits.

use crate::args::Args;
use crate::context::{CircuitContext, CircuitResults, ConstructorContext, InitialState};
use crate::error::{CircuitError, CodecError};
use crate::types::StateValue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single named state transition.
///
/// This is the only capability the dispatcher relies on. Implementations
/// must be deterministic: the same context and arguments always produce the
/// same outcome.
pub trait Transition<P>: Send + Sync {
    /// Name the transition is registered under.
    fn name(&self) -> &str;

    /// Applies the transition.
    ///
    /// # Returns
    /// * `Ok(results)` - The replacement context and the circuit's result
    /// * `Err(CircuitError)` - The transition was rejected; no partial
    ///   context is returned
    fn apply(&self, context: CircuitContext<P>, args: &Args) -> Result<CircuitResults<P>, CircuitError>;
}

/// Signature of a circuit written as a plain function.
pub type CircuitFn<P> = fn(CircuitContext<P>, &Args) -> Result<CircuitResults<P>, CircuitError>;

/// A [`Transition`] backed by a function pointer.
pub struct NamedCircuit<P> {
    name: String,
    circuit: CircuitFn<P>,
}

impl<P> NamedCircuit<P> {
    pub fn new(name: impl Into<String>, circuit: CircuitFn<P>) -> Self {
        Self {
            name: name.into(),
            circuit,
        }
    }
}

impl<P> Transition<P> for NamedCircuit<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, context: CircuitContext<P>, args: &Args) -> Result<CircuitResults<P>, CircuitError> {
        (self.circuit)(context, args)
    }
}

/// Registered set of named transitions.
///
/// Ordered by name so that listing is deterministic.
pub struct TransitionTable<P> {
    handlers: BTreeMap<String, Box<dyn Transition<P>>>,
}

impl<P: 'static> TransitionTable<P> {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registers a function circuit under `name` (builder form).
    pub fn with(mut self, name: &str, circuit: CircuitFn<P>) -> Self {
        self.insert(Box::new(NamedCircuit::new(name, circuit)));
        self
    }

    /// Registers a transition, replacing any previous one with the same name.
    pub fn insert(&mut self, transition: Box<dyn Transition<P>>) -> Option<Box<dyn Transition<P>>> {
        self.handlers.insert(transition.name().to_string(), transition)
    }

    /// Looks up a transition by name.
    pub fn get(&self, name: &str) -> Option<&dyn Transition<P>> {
        self.handlers.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Returns registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<P: 'static> Default for TransitionTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for TransitionTable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// The contract engine consumed by the harness.
///
/// # Implementations
///
/// Each contract supplies its private state shape, its typed ledger view,
/// an initializer and the table of transitions it exposes.
pub trait Contract {
    /// Actor-owned private state
    type PrivateState: Clone + fmt::Debug + PartialEq + 'static;

    /// Typed read projection of the public ledger
    type Ledger: Clone + fmt::Debug + PartialEq + Serialize;

    /// Constructor arguments
    type Constructor;

    /// Human-readable contract name (for logs and traces).
    fn name(&self) -> &str;

    /// Produces the genesis state. Fails fatally on invalid arguments.
    fn initial_state(
        &self,
        context: ConstructorContext<Self::PrivateState>,
        args: Self::Constructor,
    ) -> Result<InitialState<Self::PrivateState>, CircuitError>;

    /// Returns the named transitions this contract exposes.
    fn transitions(&self) -> TransitionTable<Self::PrivateState>;

    /// Decodes raw public state into the typed ledger view.
    ///
    /// Must be pure and deterministic.
    fn ledger(&self, state: &StateValue) -> Result<Self::Ledger, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContractState, IdentityScope, QueryContext};
    use crate::types::{CoinPublicKey, ContractAddress};

    fn noop(ctx: CircuitContext<()>, _args: &Args) -> Result<CircuitResults<()>, CircuitError> {
        ctx.finish(())
    }

    fn reject(_ctx: CircuitContext<()>, _args: &Args) -> Result<CircuitResults<()>, CircuitError> {
        Err(CircuitError::unauthorized("nobody may call this"))
    }

    fn echo(ctx: CircuitContext<()>, args: &Args) -> Result<CircuitResults<()>, CircuitError> {
        let value: u64 = args.get(0)?;
        ctx.finish(value)
    }

    fn context() -> CircuitContext<()> {
        CircuitContext {
            current_private_state: (),
            identity: IdentityScope::new(CoinPublicKey::default()),
            original_state: ContractState::new(StateValue::default()),
            transaction: QueryContext::new(StateValue::default(), ContractAddress::default()),
        }
    }

    #[test]
    fn test_table_lookup_and_sorted_names() {
        let table = TransitionTable::new()
            .with("reject", reject)
            .with("noop", noop)
            .with("echo", echo);

        assert_eq!(table.len(), 3);
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["echo", "noop", "reject"]);
        assert!(table.get("missing").is_none());

        let results = table.get("echo").unwrap().apply(context(), &crate::args![9u64]).unwrap();
        assert_eq!(results.result, serde_json::json!(9));
    }

    #[test]
    fn test_table_insert_replaces_same_name() {
        let mut table = TransitionTable::new().with("op", noop);
        let previous = table.insert(Box::new(NamedCircuit::new("op", reject)));

        assert!(previous.is_some());
        assert_eq!(table.len(), 1);
        assert!(table.get("op").unwrap().apply(context(), &Args::new()).is_err());
    }
}
