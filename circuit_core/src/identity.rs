//! Verified-user registry maintained by verifiers.

use crate::access::{AccessControl, ADMIN_MASTER, VERIFIER};
use circuit_env::{CircuitError, CoinPublicKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserRegistry {
    pub verified: BTreeSet<CoinPublicKey>,
    pub paused: bool,
}

impl UserRegistry {
    pub fn is_verified(&self, user: &CoinPublicKey) -> bool {
        self.verified.contains(user)
    }

    fn assert_verifier(&self, access: &AccessControl, caller: &CoinPublicKey) -> Result<(), CircuitError> {
        if self.paused {
            return Err(CircuitError::paused("identity is paused"));
        }
        access.assert_only_role(VERIFIER, caller)
    }

    /// Marks `user` as verified. Idempotent.
    pub fn set_user(
        &mut self,
        access: &AccessControl,
        user: CoinPublicKey,
        caller: &CoinPublicKey,
    ) -> Result<(), CircuitError> {
        self.assert_verifier(access, caller)?;
        self.verified.insert(user);
        Ok(())
    }

    /// Removes `user` from the verified set. Idempotent.
    pub fn remove_user(
        &mut self,
        access: &AccessControl,
        user: &CoinPublicKey,
        caller: &CoinPublicKey,
    ) -> Result<(), CircuitError> {
        self.assert_verifier(access, caller)?;
        self.verified.remove(user);
        Ok(())
    }

    pub fn pause(&mut self, access: &AccessControl, caller: &CoinPublicKey) -> Result<(), CircuitError> {
        access.assert_only_role(ADMIN_MASTER, caller)?;
        if self.paused {
            return Err(CircuitError::invalid_state("identity already paused"));
        }
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self, access: &AccessControl, caller: &CoinPublicKey) -> Result<(), CircuitError> {
        access.assert_only_role(ADMIN_MASTER, caller)?;
        if !self.paused {
            return Err(CircuitError::invalid_state("identity is not paused"));
        }
        self.paused = false;
        Ok(())
    }
}
