//! Commitment and key derivation helpers used by witness-style contracts.
//!
//! Contracts that authenticate callers from private state never see the
//! secret on the ledger: they publish `persistent_hash(domain, secret, ..)`
//! and later recompute it from the caller's private state.

use circuit_env::CoinPublicKey;
use sha2::{Digest, Sha256};

/// Domain-separated SHA-256 over length-prefixed parts.
pub fn persistent_hash(domain: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update((domain.len() as u32).to_le_bytes());
    hasher.update(domain.as_bytes());
    for part in parts {
        hasher.update((part.len() as u32).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Derives the public key a contract associates with `secret`.
///
/// `instance` lets a contract rotate keys (e.g. once per bulletin board post)
/// so that successive actions by the same actor are unlinkable.
pub fn derive_public_key(domain: &str, secret: &[u8; 32], instance: u64) -> CoinPublicKey {
    CoinPublicKey::from_bytes(persistent_hash(domain, &[&instance.to_le_bytes(), secret]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistent_hash_domain_separated() {
        let a = persistent_hash("a", &[b"x"]);
        let b = persistent_hash("b", &[b"x"]);
        assert_ne!(a, b);
        assert_eq!(a, persistent_hash("a", &[b"x"]));
    }

    #[test]
    fn test_length_prefix_prevents_concatenation_collisions() {
        assert_ne!(
            persistent_hash("d", &[b"ab", b"c"]),
            persistent_hash("d", &[b"a", b"bc"])
        );
    }

    #[test]
    fn test_derive_public_key_rotates_with_instance() {
        let secret = [7u8; 32];
        let k1 = derive_public_key("board:pk:", &secret, 1);
        let k2 = derive_public_key("board:pk:", &secret, 2);
        assert_ne!(k1, k2);
        assert_eq!(k1, derive_public_key("board:pk:", &secret, 1));
    }
}
