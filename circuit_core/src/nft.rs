//! Certificate NFT with access control, a verified-user registry and
//! Bucket DEFI.
//!
//! Minting requires `MINTER`, burning requires `SETTLER`, and only the owner
//! of a token may reprice it. All checks use the caller identity of the
//! call. Buckets are owned through a commitment over the creator's secret
//! nonce rather than a caller key.

use crate::access::{AccessControl, Role, MINTER, SETTLER};
use crate::bucket::{BucketBook, BucketConditions, BucketId};
use crate::identity::UserRegistry;
use crate::minting::CoinInfo;
use circuit_env::{
    Args, CircuitContext, CircuitError, CircuitResults, CodecError, CoinPublicKey,
    ConstructorContext, Contract, ContractState, IdentityScope, InitialState, StateValue,
    TransitionTable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type TokenId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftPrivateState {
    pub secret_nonce: [u8; 32],
}

impl NftPrivateState {
    pub fn new(secret_nonce: [u8; 32]) -> Self {
        Self { secret_nonce }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Solar,
    Wind,
    Hydro,
    Biomass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// Energy certificate attached to a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String,
    pub source: Source,
    pub generation: u64,
    pub vintage: u64,
    pub impact: Impact,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct NftConstructor {
    pub name: String,
    pub symbol: String,
}

impl NftConstructor {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// Public ledger of the certificate NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftLedger {
    pub name: String,
    pub symbol: String,
    pub access: AccessControl,
    pub users: UserRegistry,
    pub owners: BTreeMap<TokenId, CoinPublicKey>,
    pub balances: BTreeMap<CoinPublicKey, u64>,
    pub certificates: BTreeMap<TokenId, Certificate>,
    pub prices: BTreeMap<TokenId, u64>,
    pub total_supply: u64,
    pub defi: BucketBook,
}

impl NftLedger {
    pub fn owner_of(&self, id: TokenId) -> Option<&CoinPublicKey> {
        self.owners.get(&id)
    }

    pub fn balance_of(&self, account: &CoinPublicKey) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn require_owner(&self, id: TokenId) -> Result<CoinPublicKey, CircuitError> {
        self.owners
            .get(&id)
            .copied()
            .ok_or_else(|| CircuitError::not_found(format!("token {} has no owner", id)))
    }
}

/// The certificate NFT contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateNft;

impl Contract for CertificateNft {
    type PrivateState = NftPrivateState;
    type Ledger = NftLedger;
    type Constructor = NftConstructor;

    fn name(&self) -> &str {
        "certificate-nft"
    }

    fn initial_state(
        &self,
        context: ConstructorContext<NftPrivateState>,
        args: NftConstructor,
    ) -> Result<InitialState<NftPrivateState>, CircuitError> {
        if args.name.is_empty() || args.symbol.is_empty() {
            return Err(CircuitError::invalid_argument("name and symbol must be non-empty"));
        }
        let ledger = NftLedger {
            name: args.name,
            symbol: args.symbol,
            access: AccessControl::new(context.caller),
            users: UserRegistry::default(),
            owners: BTreeMap::new(),
            balances: BTreeMap::new(),
            certificates: BTreeMap::new(),
            prices: BTreeMap::new(),
            total_supply: 0,
            defi: BucketBook::default(),
        };
        Ok(InitialState {
            private_state: context.initial_private_state,
            contract_state: ContractState::new(StateValue::encode(&ledger)?),
            identity: IdentityScope::new(context.caller),
        })
    }

    fn transitions(&self) -> TransitionTable<NftPrivateState> {
        TransitionTable::new()
            // Access control
            .with("grant_role", grant_role)
            .with("revoke_role", revoke_role)
            .with("set_role_admin", set_role_admin)
            .with("assert_only_role", assert_only_role)
            .with("pause_access_control", pause_access_control)
            .with("unpause_access_control", unpause_access_control)
            // Identity
            .with("set_user", set_user)
            .with("remove_user", remove_user)
            .with("pause_identity", pause_identity)
            .with("unpause_identity", unpause_identity)
            // Token
            .with("mint", mint)
            .with("burn", burn)
            .with("set_token_price", set_token_price)
            .with("owner_of", owner_of)
            .with("balance_of", balance_of)
            .with("token_price", token_price)
            .with("token_certificate", token_certificate)
            // Bucket DEFI
            .with("create_bucket", create_bucket)
            .with("bucket", bucket)
    }

    fn ledger(&self, state: &StateValue) -> Result<NftLedger, CodecError> {
        state.decode()
    }
}

type Ctx = CircuitContext<NftPrivateState>;
type Res = Result<CircuitResults<NftPrivateState>, CircuitError>;

/// Decodes the ledger, applies `f` with the caller key, re-encodes.
fn mutate<F>(ctx: Ctx, f: F) -> Res
where
    F: FnOnce(&mut NftLedger, &CoinPublicKey) -> Result<(), CircuitError>,
{
    let mut ledger: NftLedger = ctx.ledger()?;
    f(&mut ledger, &ctx.caller())?;
    ctx.with_ledger(&ledger)?.finish(())
}

fn grant_role(ctx: Ctx, args: &Args) -> Res {
    let role: Role = args.get(0)?;
    let account: CoinPublicKey = args.get(1)?;
    mutate(ctx, |l, caller| l.access.grant_role(role, account, caller))
}

fn revoke_role(ctx: Ctx, args: &Args) -> Res {
    let role: Role = args.get(0)?;
    let account: CoinPublicKey = args.get(1)?;
    mutate(ctx, |l, caller| l.access.revoke_role(role, &account, caller))
}

fn set_role_admin(ctx: Ctx, args: &Args) -> Res {
    let role: Role = args.get(0)?;
    let admin_role: Role = args.get(1)?;
    mutate(ctx, |l, caller| l.access.set_role_admin(role, admin_role, caller))
}

fn assert_only_role(ctx: Ctx, args: &Args) -> Res {
    let role: Role = args.get(0)?;
    let ledger: NftLedger = ctx.ledger()?;
    ledger.access.assert_only_role(role, &ctx.caller())?;
    ctx.finish(())
}

fn pause_access_control(ctx: Ctx, _args: &Args) -> Res {
    mutate(ctx, |l, caller| l.access.pause(caller))
}

fn unpause_access_control(ctx: Ctx, _args: &Args) -> Res {
    mutate(ctx, |l, caller| l.access.unpause(caller))
}

fn set_user(ctx: Ctx, args: &Args) -> Res {
    let user: CoinPublicKey = args.get(0)?;
    mutate(ctx, |l, caller| l.users.set_user(&l.access, user, caller))
}

fn remove_user(ctx: Ctx, args: &Args) -> Res {
    let user: CoinPublicKey = args.get(0)?;
    mutate(ctx, |l, caller| l.users.remove_user(&l.access, &user, caller))
}

fn pause_identity(ctx: Ctx, _args: &Args) -> Res {
    mutate(ctx, |l, caller| l.users.pause(&l.access, caller))
}

fn unpause_identity(ctx: Ctx, _args: &Args) -> Res {
    mutate(ctx, |l, caller| l.users.unpause(&l.access, caller))
}

fn mint(ctx: Ctx, args: &Args) -> Res {
    let to: CoinPublicKey = args.get(0)?;
    let id: TokenId = args.get(1)?;
    let certificate: Certificate = args.get(2)?;
    let price: u64 = args.get(3)?;

    mutate(ctx, |l, caller| {
        l.access.assert_not_paused()?;
        l.access.assert_only_role(MINTER, caller)?;
        if to == CoinPublicKey::default() {
            return Err(CircuitError::invalid_argument("cannot mint to the zero key"));
        }
        if l.owners.contains_key(&id) {
            return Err(CircuitError::invalid_state(format!("token {} already minted", id)));
        }
        l.owners.insert(id, to);
        *l.balances.entry(to).or_insert(0) += 1;
        l.certificates.insert(id, certificate);
        l.prices.insert(id, price);
        l.total_supply += 1;
        Ok(())
    })
}

fn burn(ctx: Ctx, args: &Args) -> Res {
    let id: TokenId = args.get(0)?;

    mutate(ctx, |l, caller| {
        l.access.assert_not_paused()?;
        l.access.assert_only_role(SETTLER, caller)?;
        let owner = l.require_owner(id)?;
        l.owners.remove(&id);
        match l.balances.get(&owner).copied() {
            Some(1) | None => {
                l.balances.remove(&owner);
            }
            Some(n) => {
                l.balances.insert(owner, n - 1);
            }
        }
        l.certificates.remove(&id);
        l.prices.remove(&id);
        l.total_supply -= 1;
        Ok(())
    })
}

fn set_token_price(ctx: Ctx, args: &Args) -> Res {
    let id: TokenId = args.get(0)?;
    let price: u64 = args.get(1)?;

    mutate(ctx, |l, caller| {
        if l.require_owner(id)? != *caller {
            return Err(CircuitError::unauthorized("only the token owner may set its price"));
        }
        l.prices.insert(id, price);
        Ok(())
    })
}

fn owner_of(ctx: Ctx, args: &Args) -> Res {
    let id: TokenId = args.get(0)?;
    let ledger: NftLedger = ctx.ledger()?;
    let owner = ledger.require_owner(id)?;
    ctx.finish(owner)
}

fn balance_of(ctx: Ctx, args: &Args) -> Res {
    let account: CoinPublicKey = args.get(0)?;
    let ledger: NftLedger = ctx.ledger()?;
    ctx.finish(ledger.balance_of(&account))
}

fn token_price(ctx: Ctx, args: &Args) -> Res {
    let id: TokenId = args.get(0)?;
    let ledger: NftLedger = ctx.ledger()?;
    let price = ledger
        .prices
        .get(&id)
        .copied()
        .ok_or_else(|| CircuitError::not_found(format!("token {} has no price", id)))?;
    ctx.finish(price)
}

fn token_certificate(ctx: Ctx, args: &Args) -> Res {
    let id: TokenId = args.get(0)?;
    let ledger: NftLedger = ctx.ledger()?;
    let certificate = ledger
        .certificates
        .get(&id)
        .cloned()
        .ok_or_else(|| CircuitError::not_found(format!("token {} has no certificate", id)))?;
    ctx.finish(certificate)
}

fn create_bucket(ctx: Ctx, args: &Args) -> Res {
    let conditions: BucketConditions = args.get(0)?;
    let coin: CoinInfo = args.get(1)?;
    let mut ledger: NftLedger = ctx.ledger()?;

    ledger.access.assert_not_paused()?;
    let (_, owner_commitment) = ledger.defi.create(conditions, &coin, &ctx.current_private_state.secret_nonce)?;
    ctx.with_ledger(&ledger)?.finish(owner_commitment)
}

fn bucket(ctx: Ctx, args: &Args) -> Res {
    let id: BucketId = args.get(0)?;
    let ledger: NftLedger = ctx.ledger()?;
    let bucket = ledger.defi.get(id)?.clone();
    ctx.finish(bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{MINTER_ADMIN, SETTLER_ADMIN, VERIFIER, VERIFIER_ADMIN};
    use crate::bucket::{bucket_owner_commitment, Bucket, BucketStatus};
    use circuit_env::{args, ContractAddress, QueryContext};

    const MASTER: CoinPublicKey = CoinPublicKey([1; 32]);
    const MINTER_KEY: CoinPublicKey = CoinPublicKey([2; 32]);
    const OTHER_KEY: CoinPublicKey = CoinPublicKey([3; 32]);

    fn certificate() -> Certificate {
        Certificate {
            id: "Certificate_1".to_string(),
            source: Source::Biomass,
            generation: 10,
            vintage: 20,
            impact: Impact::High,
            location: "RJ".to_string(),
        }
    }

    fn genesis() -> Ctx {
        let init = CertificateNft
            .initial_state(
                ConstructorContext::new(NftPrivateState::new([0; 32]), MASTER),
                NftConstructor::new("NAME", "SYMBOL"),
            )
            .unwrap();
        CircuitContext {
            current_private_state: init.private_state,
            identity: init.identity,
            original_state: init.contract_state.clone(),
            transaction: QueryContext::new(init.contract_state.data, ContractAddress::default()),
        }
    }

    fn apply_as(caller: CoinPublicKey, name: &str, ctx: Ctx, args: &Args) -> Res {
        let ctx = ctx.with_identity(IdentityScope::new(caller));
        CertificateNft.transitions().get(name).unwrap().apply(ctx, args)
    }

    /// Master appoints itself minter admin, then appoints `MINTER_KEY`.
    fn with_minter() -> Ctx {
        let ctx = apply_as(MASTER, "grant_role", genesis(), &args![MINTER_ADMIN, MASTER]).unwrap().context;
        apply_as(MASTER, "grant_role", ctx, &args![MINTER, MINTER_KEY]).unwrap().context
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = CertificateNft.initial_state(
            ConstructorContext::new(NftPrivateState::new([0; 32]), MASTER),
            NftConstructor::new("", "SYM"),
        );
        assert!(matches!(result, Err(CircuitError::InvalidArgument(_))));
    }

    #[test]
    fn test_mint_requires_minter_role() {
        let ctx = with_minter();
        let denied = apply_as(OTHER_KEY, "mint", ctx.clone(), &args![OTHER_KEY, 1u64, certificate(), 10u64]);
        assert!(matches!(denied, Err(CircuitError::Unauthorized(_))));

        let minted = apply_as(MINTER_KEY, "mint", ctx, &args![MINTER_KEY, 1u64, certificate(), 10u64]).unwrap();
        let ledger: NftLedger = minted.context.ledger().unwrap();
        assert_eq!(ledger.owner_of(1), Some(&MINTER_KEY));
        assert_eq!(ledger.balance_of(&MINTER_KEY), 1);
        assert_eq!(ledger.total_supply, 1);
    }

    #[test]
    fn test_duplicate_mint_rejected() {
        let ctx = with_minter();
        let minted = apply_as(MINTER_KEY, "mint", ctx, &args![MINTER_KEY, 1u64, certificate(), 10u64]).unwrap();
        let err = apply_as(MINTER_KEY, "mint", minted.context, &args![OTHER_KEY, 1u64, certificate(), 10u64])
            .unwrap_err();
        assert!(matches!(err, CircuitError::InvalidState(_)));
    }

    #[test]
    fn test_burn_clears_owner() {
        let ctx = with_minter();
        let ctx = apply_as(MASTER, "grant_role", ctx, &args![SETTLER_ADMIN, MASTER]).unwrap().context;
        let ctx = apply_as(MASTER, "grant_role", ctx, &args![SETTLER, MINTER_KEY]).unwrap().context;
        let ctx = apply_as(MINTER_KEY, "mint", ctx, &args![MINTER_KEY, 1u64, certificate(), 10u64])
            .unwrap()
            .context;

        let burned = apply_as(MINTER_KEY, "burn", ctx, &args![1u64]).unwrap();
        let err = apply_as(MINTER_KEY, "owner_of", burned.context.clone(), &args![1u64]).unwrap_err();
        assert!(matches!(err, CircuitError::NotFound(_)));

        let ledger: NftLedger = burned.context.ledger().unwrap();
        assert_eq!(ledger.balance_of(&MINTER_KEY), 0);
        assert!(ledger.certificates.is_empty());
    }

    #[test]
    fn test_only_owner_sets_price() {
        let ctx = with_minter();
        let ctx = apply_as(MINTER_KEY, "mint", ctx, &args![MINTER_KEY, 1u64, certificate(), 10u64])
            .unwrap()
            .context;

        let denied = apply_as(OTHER_KEY, "set_token_price", ctx.clone(), &args![1u64, 20u64]);
        assert!(matches!(denied, Err(CircuitError::Unauthorized(_))));

        let priced = apply_as(MINTER_KEY, "set_token_price", ctx, &args![1u64, 20u64]).unwrap();
        let price = apply_as(OTHER_KEY, "token_price", priced.context, &args![1u64]).unwrap();
        assert_eq!(price.result, serde_json::json!(20));
    }

    #[test]
    fn test_identity_pause_blocks_verifier() {
        let ctx = apply_as(MASTER, "grant_role", genesis(), &args![VERIFIER_ADMIN, MASTER]).unwrap().context;
        let ctx = apply_as(MASTER, "grant_role", ctx, &args![VERIFIER, OTHER_KEY]).unwrap().context;
        let ctx = apply_as(OTHER_KEY, "set_user", ctx, &args![MINTER_KEY]).unwrap().context;

        let paused = apply_as(MASTER, "pause_identity", ctx, &Args::new()).unwrap().context;
        let err = apply_as(OTHER_KEY, "remove_user", paused, &args![MINTER_KEY]).unwrap_err();
        assert!(matches!(err, CircuitError::Paused(_)));
    }

    fn bucket_conditions() -> BucketConditions {
        BucketConditions {
            source: Source::Biomass,
            unit_price: 10,
            vintage_limit: 20,
            impact: Impact::High,
            location: "RJ".to_string(),
            status: BucketStatus::Open,
            accumulated_price: 0,
            pot: 100_000_000,
            start_date: 0,
            end_date: 0,
        }
    }

    #[test]
    fn test_create_bucket_commits_to_private_nonce() {
        let ctx = genesis().with_private_state(NftPrivateState::new([5; 32]));
        let coin = CoinInfo::native([1; 32], 100_000_000);

        let created = apply_as(MINTER_KEY, "create_bucket", ctx, &args![bucket_conditions(), coin]).unwrap();
        let commitment: [u8; 32] = serde_json::from_value(created.result).unwrap();
        assert_eq!(commitment, bucket_owner_commitment(&[5; 32], 1));

        let ledger: NftLedger = created.context.ledger().unwrap();
        assert_eq!(ledger.defi.bucket_counter, 1);

        let fetched = apply_as(OTHER_KEY, "bucket", created.context, &args![1u64]).unwrap();
        let bucket: Bucket = serde_json::from_value(fetched.result).unwrap();
        assert_eq!(bucket.conditions, bucket_conditions());
        assert_eq!(bucket.owner_commitment, commitment);
    }

    #[test]
    fn test_create_bucket_blocked_while_paused() {
        let paused = apply_as(MASTER, "pause_access_control", genesis(), &Args::new()).unwrap().context;
        let coin = CoinInfo::native([1; 32], 100_000_000);
        let err = apply_as(MINTER_KEY, "create_bucket", paused, &args![bucket_conditions(), coin]).unwrap_err();
        assert!(matches!(err, CircuitError::Paused(_)));
    }

    #[test]
    fn test_minter_without_settler_role_cannot_burn() {
        let ctx = with_minter();
        let ctx = apply_as(MINTER_KEY, "mint", ctx, &args![MINTER_KEY, 1u64, certificate(), 10u64])
            .unwrap()
            .context;
        let err = apply_as(MINTER_KEY, "burn", ctx, &args![1u64]).unwrap_err();
        assert!(matches!(err, CircuitError::Unauthorized(_)));
    }
}
