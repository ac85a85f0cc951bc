//! Execution contexts passed into and out of circuits.

use crate::error::{CircuitError, CodecError};
use crate::types::{CoinPublicKey, ContractAddress, StateValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Calling identity presented to one circuit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityScope {
    /// Public key of the caller
    pub coin_public_key: CoinPublicKey,
}

impl IdentityScope {
    /// Creates a fresh scope for the given caller.
    pub fn new(coin_public_key: CoinPublicKey) -> Self {
        Self { coin_public_key }
    }
}

/// Contract state as produced by initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractState {
    pub data: StateValue,
}

impl ContractState {
    pub fn new(data: StateValue) -> Self {
        Self { data }
    }
}

/// Live public state threaded through every call, bound to one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    pub state: StateValue,
    pub address: ContractAddress,
}

impl QueryContext {
    pub fn new(state: StateValue, address: ContractAddress) -> Self {
        Self { state, address }
    }
}

/// The full execution context of a circuit call.
///
/// Circuits take this by value and return a replacement; nothing is ever
/// mutated behind the caller's back.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitContext<P> {
    /// Private state of the actor the context is scoped to
    pub current_private_state: P,

    /// Caller identity for this call
    pub identity: IdentityScope,

    /// Genesis snapshot (read-only)
    pub original_state: ContractState,

    /// Shared public ledger
    pub transaction: QueryContext,
}

impl<P> CircuitContext<P> {
    /// Returns the caller's public key.
    pub fn caller(&self) -> CoinPublicKey {
        self.identity.coin_public_key
    }

    /// Returns the private state of the scoped actor.
    pub fn private_state(&self) -> &P {
        &self.current_private_state
    }

    /// Decodes the public ledger into a typed value.
    pub fn ledger<T: DeserializeOwned>(&self) -> Result<T, CircuitError> {
        Ok(self.transaction.state.decode()?)
    }

    /// Replaces the public ledger with the encoding of `ledger`.
    pub fn with_ledger<T: Serialize>(mut self, ledger: &T) -> Result<Self, CircuitError> {
        self.transaction.state = StateValue::encode(ledger)?;
        Ok(self)
    }

    /// Replaces the private state.
    pub fn with_private_state(mut self, state: P) -> Self {
        self.current_private_state = state;
        self
    }

    /// Replaces the identity scope.
    pub fn with_identity(mut self, identity: IdentityScope) -> Self {
        self.identity = identity;
        self
    }

    /// Wraps the context and a result value into [`CircuitResults`].
    pub fn finish<R: Serialize>(self, result: R) -> Result<CircuitResults<P>, CircuitError> {
        let result = serde_json::to_value(result)
            .map_err(|e| CircuitError::Codec(CodecError::Encode(e.to_string())))?;
        Ok(CircuitResults::new(self, result))
    }
}

/// Input to a contract initializer.
#[derive(Debug, Clone)]
pub struct ConstructorContext<P> {
    /// Private state of the deploying actor
    pub initial_private_state: P,

    /// Public key of the deployer
    pub caller: CoinPublicKey,
}

impl<P> ConstructorContext<P> {
    pub fn new(initial_private_state: P, caller: CoinPublicKey) -> Self {
        Self {
            initial_private_state,
            caller,
        }
    }
}

/// Output of a contract initializer.
#[derive(Debug, Clone)]
pub struct InitialState<P> {
    pub private_state: P,
    pub contract_state: ContractState,
    pub identity: IdentityScope,
}

/// Opaque proof artifact emitted alongside a circuit result.
///
/// The harness never verifies it; it is diagnostic data only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofData {
    /// Circuit that produced the artifact
    pub circuit: String,

    /// Public inputs as seen by the circuit
    pub public_inputs: Vec<Value>,

    /// Public output
    pub public_output: Value,
}

/// Successful outcome of a circuit call.
#[derive(Debug, Clone)]
pub struct CircuitResults<P> {
    /// The replacement context
    pub context: CircuitContext<P>,

    /// Value returned by the circuit (`null` when it returns nothing)
    pub result: Value,

    /// Optional proof artifact
    pub proof: Option<ProofData>,
}

impl<P> CircuitResults<P> {
    pub fn new(context: CircuitContext<P>, result: Value) -> Self {
        Self {
            context,
            result,
            proof: None,
        }
    }

    /// Attaches a proof artifact.
    pub fn with_proof(mut self, proof: ProofData) -> Self {
        self.proof = Some(proof);
        self
    }
}
