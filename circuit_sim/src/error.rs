//! Error types for the simulation harness.

use circuit_env::{Actor, CircuitError};
use thiserror::Error;

/// Errors surfaced by the harness to test code.
///
/// Kinds are kept distinct so tests can assert on *why* a call failed:
/// a `RuleViolation` is the contract saying no, an `UnknownActor` is a
/// broken test setup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// No private state was ever registered for this actor
    #[error("Unknown actor '{0}': no private state registered")]
    UnknownActor(Actor),

    /// No transition is registered under this name
    #[error("Unknown transition: {0}")]
    UnknownTransition(String),

    /// The contract rejected the call; nothing was committed
    #[error("Rule violation in '{transition}': {source}")]
    RuleViolation {
        transition: String,
        #[source]
        source: CircuitError,
    },

    /// Genesis construction failed; no harness exists
    #[error("Initialization failed: {0}")]
    InitializationFailure(#[source] CircuitError),

    /// Call arguments could not be encoded
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Ledger projection or result decoding failed
    #[error("Codec error: {0}")]
    Codec(String),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),
}

impl SimError {
    /// Creates an unknown-actor error.
    pub fn unknown_actor(actor: impl Into<Actor>) -> Self {
        Self::UnknownActor(actor.into())
    }

    pub fn is_unknown_actor(&self) -> bool {
        matches!(self, Self::UnknownActor(_))
    }

    pub fn is_rule_violation(&self) -> bool {
        matches!(self, Self::RuleViolation { .. })
    }

    /// Returns the contract's reason when this is a rule violation.
    pub fn violation(&self) -> Option<&CircuitError> {
        match self {
            Self::RuleViolation { source, .. } => Some(source),
            _ => None,
        }
    }
}
