//! Deterministic key provider for simulated actors.

use circuit_env::{CoinPublicKey, ContractAddress};
use ed25519_dalek::SigningKey;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Provides deterministic actor keys derived from a master seed.
///
/// Keys are:
/// - Deterministic: same seed and actor name always produce the same keys
/// - Unique: each actor name gets a different key
/// - Isolated: adding actors never changes existing actors' keys
#[derive(Debug, Clone)]
pub struct DeterministicKeyProvider {
    master_seed: u64,
}

impl DeterministicKeyProvider {
    /// Creates a new key provider with the given master seed.
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derives the per-actor RNG seed.
    ///
    /// `master_seed * golden + fnv1a(name) * prime`
    fn actor_seed(&self, actor: &str) -> u64 {
        let name_hash = actor.bytes().fold(0xcbf29ce484222325u64, |h, b| {
            (h ^ b as u64).wrapping_mul(0x100000001b3)
        });
        self.master_seed
            .wrapping_mul(0x9e3779b97f4a7c15) // Golden ratio prime
            .wrapping_add(name_hash.wrapping_mul(0x517cc1b727220a95))
    }

    /// Signing key of an actor.
    pub fn signing_key(&self, actor: &str) -> SigningKey {
        let mut rng = ChaCha8Rng::seed_from_u64(self.actor_seed(actor));
        SigningKey::generate(&mut rng)
    }

    /// 32-byte secret for witness-style private state.
    pub fn actor_secret(&self, actor: &str) -> [u8; 32] {
        self.signing_key(actor).to_bytes()
    }

    /// Public key the actor presents as caller identity.
    pub fn coin_public_key(&self, actor: &str) -> CoinPublicKey {
        CoinPublicKey::from_bytes(self.signing_key(actor).verifying_key().to_bytes())
    }

    /// Address the contract is deployed at.
    pub fn contract_address(&self) -> ContractAddress {
        // Different salt so the address never collides with an actor key
        let mut rng = ChaCha8Rng::seed_from_u64(self.master_seed.wrapping_mul(0x3c6ef372fe94f82b));
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        ContractAddress::from_bytes(bytes)
    }
}
