//! Bucket DEFI: funded purchase orders for certificates.
//!
//! A bucket states which certificates its creator will pay for and locks the
//! funding coin as the bucket's pot. The ledger never stores the creator's
//! key, only `bucket_owner_commitment(secret_nonce, id)`.

use crate::crypto::persistent_hash;
use crate::minting::{CoinInfo, NATIVE_TOKEN};
use crate::nft::{Impact, Source};
use circuit_env::CircuitError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type BucketId = u64;

const OWNER_DOMAIN: &str = "bucket:owner:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketStatus {
    Open,
    Closed,
}

/// What a bucket buys and how it is funded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketConditions {
    pub source: Source,
    pub unit_price: u64,
    pub vintage_limit: u64,
    pub impact: Impact,
    pub location: String,
    pub status: BucketStatus,
    pub accumulated_price: u64,
    pub pot: u64,
    pub start_date: u64,
    pub end_date: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub conditions: BucketConditions,
    pub owner_commitment: [u8; 32],
}

/// Bucket sub-ledger embedded in the NFT ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketBook {
    pub bucket_counter: u64,
    pub buckets: BTreeMap<BucketId, Bucket>,
    pub spent_nonces: BTreeSet<String>,
}

/// Commitment that binds bucket `id` to the holder of `secret_nonce`.
pub fn bucket_owner_commitment(secret_nonce: &[u8; 32], id: BucketId) -> [u8; 32] {
    persistent_hash(OWNER_DOMAIN, &[secret_nonce, &id.to_le_bytes()])
}

impl BucketBook {
    pub fn get(&self, id: BucketId) -> Result<&Bucket, CircuitError> {
        self.buckets
            .get(&id)
            .ok_or_else(|| CircuitError::not_found(format!("bucket {} does not exist", id)))
    }

    /// Opens a bucket funded by `coin` and returns its id and owner commitment.
    ///
    /// The coin must be an unspent native coin worth exactly the pot.
    pub fn create(
        &mut self,
        conditions: BucketConditions,
        coin: &CoinInfo,
        secret_nonce: &[u8; 32],
    ) -> Result<(BucketId, [u8; 32]), CircuitError> {
        if conditions.status != BucketStatus::Open {
            return Err(CircuitError::invalid_argument("new buckets must be open"));
        }
        if conditions.unit_price == 0 {
            return Err(CircuitError::invalid_argument("unit price must be positive"));
        }
        if conditions.accumulated_price != 0 {
            return Err(CircuitError::invalid_argument("new buckets start with nothing accumulated"));
        }
        if conditions.end_date != 0 && conditions.end_date < conditions.start_date {
            return Err(CircuitError::invalid_argument("bucket ends before it starts"));
        }
        if coin.color != NATIVE_TOKEN {
            return Err(CircuitError::invalid_argument("coin is not the native token"));
        }
        if coin.value == 0 || coin.value != conditions.pot {
            return Err(CircuitError::invalid_argument(format!(
                "coin value {} does not fund pot {}",
                coin.value, conditions.pot
            )));
        }
        let id = self
            .bucket_counter
            .checked_add(1)
            .ok_or_else(|| CircuitError::invalid_state("bucket counter overflow"))?;
        if !self.spent_nonces.insert(hex::encode(coin.nonce)) {
            return Err(CircuitError::invalid_state("coin nonce already spent"));
        }

        let owner_commitment = bucket_owner_commitment(secret_nonce, id);
        self.bucket_counter = id;
        self.buckets.insert(
            id,
            Bucket {
                conditions,
                owner_commitment,
            },
        );
        Ok((id, owner_commitment))
    }
}
