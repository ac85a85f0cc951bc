//! Typed read projection of the public ledger.

use crate::error::SimError;
use circuit_env::{Contract, StateValue};

/// Decodes raw transaction state into the contract's ledger view.
///
/// Holds no cache: every projection is recomputed from the state it is
/// given, so a view can never be stale.
#[derive(Debug, Clone)]
pub struct LedgerProjector<C> {
    contract: C,
}

impl<C: Contract> LedgerProjector<C> {
    pub fn new(contract: C) -> Self {
        Self { contract }
    }

    /// Projects `state`. Pure; never mutates its input.
    pub fn project(&self, state: &StateValue) -> Result<C::Ledger, SimError> {
        self.contract
            .ledger(state)
            .map_err(|e| SimError::Codec(e.to_string()))
    }

    /// Returns the contract the projector decodes for.
    pub fn contract(&self) -> &C {
        &self.contract
    }
}
