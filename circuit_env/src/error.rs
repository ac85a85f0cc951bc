//! Error types for the circuit engine boundary.

use thiserror::Error;

/// Errors raised while encoding or decoding raw ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A typed value could not be turned into raw state
    #[error("Encode error: {0}")]
    Encode(String),

    /// Raw state did not match the expected typed shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// A key or address was not valid 32-byte hex
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

/// Rule violations signalled by circuit logic.
///
/// Every variant means "the transition was rejected"; the harness never
/// commits any part of a call that returned one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    /// Caller lacks the required role or identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Argument missing, malformed or out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Subsystem is paused
    #[error("Paused: {0}")]
    Paused(String),

    /// Transition not allowed from the current ledger state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Ledger state could not be decoded or encoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl CircuitError {
    /// Creates an authorization failure.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Creates an invalid-argument failure.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a missing-entity failure.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a paused-subsystem failure.
    pub fn paused(msg: impl Into<String>) -> Self {
        Self::Paused(msg.into())
    }

    /// Creates an invalid-state failure.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
