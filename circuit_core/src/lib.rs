//! Circuit Core - reference contracts for the deterministic contract simulator
//!
//! These contracts play the role of externally supplied business logic:
//! 1. **Counter**: role-guarded round counter authenticated from private state
//! 2. **Bulletin board**: single-slot board with unlinkable poster keys
//! 3. **Minting**: coin deposits, burns and owner withdrawals by caller identity
//! 4. **Certificate NFT**: tokens behind a pausable role hierarchy and a verified-user registry
//! 5. **Bucket DEFI**: funded certificate purchase orders owned through a commitment

pub mod access;
pub mod bboard;
pub mod bucket;
pub mod counter;
pub mod crypto;
pub mod identity;
pub mod minting;
pub mod nft;

// Re-export key types for convenience
pub use bboard::{BoardLedger, BoardPrivateState, BoardState, BulletinBoard};
pub use bucket::{Bucket, BucketConditions, BucketStatus};
pub use counter::{CounterLedger, CounterPrivateState, RoleCounter};
pub use minting::{CoinInfo, Minting, MintingLedger, MintingPrivateState};
pub use nft::{Certificate, CertificateNft, Impact, NftConstructor, NftLedger, NftPrivateState, Source};
