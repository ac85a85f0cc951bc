//! Scripted multi-actor scenarios over the reference contracts.

use serde::{Deserialize, Serialize};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// Admin, operator and outsider racing on a role-guarded counter
    RoleCounter,

    /// Role grants, minting, pausing and burning on the certificate NFT
    NftLifecycle,

    /// Two posters sharing a single-slot bulletin board
    BulletinBoard,

    /// Mint, burn and treasury withdrawal on the token contract
    Minting,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::RoleCounter,
            ScenarioId::NftLifecycle,
            ScenarioId::BulletinBoard,
            ScenarioId::Minting,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::RoleCounter => "role_counter",
            ScenarioId::NftLifecycle => "nft_lifecycle",
            ScenarioId::BulletinBoard => "bulletin_board",
            ScenarioId::Minting => "minting",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::RoleCounter => "outsider rejected, admin appoints and removes an operator",
            ScenarioId::NftLifecycle => "grant roles, mint, reprice, pause, verify users, burn, open a bucket",
            ScenarioId::BulletinBoard => "only the poster can take a post down; keys rotate per post",
            ScenarioId::Minting => "zero-value and replayed coins rejected, owner-only withdrawal",
        }
    }

    /// Looks a scenario up by name. Accepts `-` for `_` and any case.
    pub fn from_name(name: &str) -> Option<ScenarioId> {
        match name.to_lowercase().replace('-', "_").as_str() {
            "role_counter" | "counter" => Some(ScenarioId::RoleCounter),
            "nft_lifecycle" | "nft" => Some(ScenarioId::NftLifecycle),
            "bulletin_board" | "bboard" => Some(ScenarioId::BulletinBoard),
            "minting" | "mint" => Some(ScenarioId::Minting),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioId::from_name(s).ok_or_else(|| format!("Unknown scenario: {}", s))
    }
}
