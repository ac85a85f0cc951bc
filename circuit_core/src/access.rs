//! Role-based access control with a pausable admin hierarchy.
//!
//! Every role has an admin role whose holders may grant and revoke it.
//! `ADMIN_MASTER` administers the admin roles and is the only role allowed
//! to rewire the hierarchy or pause the module.

use circuit_env::{CircuitError, CoinPublicKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type Role = u64;

pub const ADMIN_MASTER: Role = 0;
pub const MINTER_ADMIN: Role = 1;
pub const MINTER: Role = 2;
pub const MATCHER_ADMIN: Role = 3;
pub const MATCHER: Role = 4;
pub const SETTLER_ADMIN: Role = 5;
pub const SETTLER: Role = 6;
pub const VERIFIER_ADMIN: Role = 7;
pub const VERIFIER: Role = 8;

/// Access control state embedded in a contract ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessControl {
    pub members: BTreeMap<Role, BTreeSet<CoinPublicKey>>,
    pub role_admins: BTreeMap<Role, Role>,
    pub paused: bool,
}

impl AccessControl {
    /// Creates the default hierarchy with `admin_master` holding `ADMIN_MASTER`.
    pub fn new(admin_master: CoinPublicKey) -> Self {
        let mut access = Self::default();
        access.members.entry(ADMIN_MASTER).or_default().insert(admin_master);
        access.role_admins.insert(MINTER, MINTER_ADMIN);
        access.role_admins.insert(MATCHER, MATCHER_ADMIN);
        access.role_admins.insert(SETTLER, SETTLER_ADMIN);
        access.role_admins.insert(VERIFIER, VERIFIER_ADMIN);
        access
    }

    pub fn has_role(&self, role: Role, account: &CoinPublicKey) -> bool {
        self.members.get(&role).is_some_and(|m| m.contains(account))
    }

    /// Admin role of `role`; unconfigured roles are administered by `ADMIN_MASTER`.
    pub fn admin_of(&self, role: Role) -> Role {
        self.role_admins.get(&role).copied().unwrap_or(ADMIN_MASTER)
    }

    pub fn assert_only_role(&self, role: Role, caller: &CoinPublicKey) -> Result<(), CircuitError> {
        if !self.has_role(role, caller) {
            return Err(CircuitError::unauthorized(format!("caller is missing role {}", role)));
        }
        Ok(())
    }

    pub fn assert_not_paused(&self) -> Result<(), CircuitError> {
        if self.paused {
            return Err(CircuitError::paused("access control is paused"));
        }
        Ok(())
    }

    pub fn grant_role(
        &mut self,
        role: Role,
        account: CoinPublicKey,
        caller: &CoinPublicKey,
    ) -> Result<(), CircuitError> {
        self.assert_not_paused()?;
        self.assert_only_role(self.admin_of(role), caller)?;
        self.members.entry(role).or_default().insert(account);
        Ok(())
    }

    pub fn revoke_role(
        &mut self,
        role: Role,
        account: &CoinPublicKey,
        caller: &CoinPublicKey,
    ) -> Result<(), CircuitError> {
        self.assert_not_paused()?;
        self.assert_only_role(self.admin_of(role), caller)?;
        let removed = self.members.get_mut(&role).is_some_and(|m| m.remove(account));
        if !removed {
            return Err(CircuitError::not_found(format!("account does not hold role {}", role)));
        }
        Ok(())
    }

    pub fn set_role_admin(
        &mut self,
        role: Role,
        admin_role: Role,
        caller: &CoinPublicKey,
    ) -> Result<(), CircuitError> {
        self.assert_not_paused()?;
        self.assert_only_role(ADMIN_MASTER, caller)?;
        if role == ADMIN_MASTER {
            return Err(CircuitError::invalid_argument("admin master is self-administered"));
        }
        self.role_admins.insert(role, admin_role);
        Ok(())
    }

    pub fn pause(&mut self, caller: &CoinPublicKey) -> Result<(), CircuitError> {
        self.assert_only_role(ADMIN_MASTER, caller)?;
        if self.paused {
            return Err(CircuitError::invalid_state("access control already paused"));
        }
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self, caller: &CoinPublicKey) -> Result<(), CircuitError> {
        self.assert_only_role(ADMIN_MASTER, caller)?;
        if !self.paused {
            return Err(CircuitError::invalid_state("access control is not paused"));
        }
        self.paused = false;
        Ok(())
    }
}
