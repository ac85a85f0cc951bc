//! Shielded-style token minting.
//!
//! Callers deposit coins to mint balance, burn balance into the treasury,
//! and the owner fixed at deployment can withdraw from the treasury.
//! Authorization uses the caller identity of the call, so tests drive it
//! with per-call caller overrides.

use circuit_env::{
    Args, CircuitContext, CircuitError, CircuitResults, CodecError, CoinPublicKey,
    ConstructorContext, Contract, ContractState, IdentityScope, InitialState, StateValue,
    TransitionTable,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Color of the native token.
pub const NATIVE_TOKEN: [u8; 32] = [0u8; 32];

/// Private state of a minting participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintingPrivateState {
    /// Running total this actor has minted
    pub value: u64,
}

impl MintingPrivateState {
    pub fn new(value: u64) -> Self {
        Self { value }
    }
}

/// A coin presented to `mint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub nonce: [u8; 32],
    pub color: [u8; 32],
    pub value: u64,
}

impl CoinInfo {
    /// Creates a native-token coin.
    pub fn native(nonce: [u8; 32], value: u64) -> Self {
        Self {
            nonce,
            color: NATIVE_TOKEN,
            value,
        }
    }
}

/// Public ledger of the minting contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintingLedger {
    pub owner: CoinPublicKey,
    pub total_minted: u64,
    pub total_burned: u64,
    pub treasury: u64,
    pub balances: BTreeMap<CoinPublicKey, u64>,
    pub spent_nonces: BTreeSet<String>,
}

impl MintingLedger {
    pub fn balance_of(&self, account: &CoinPublicKey) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

/// The minting contract. The constructor argument is the owner key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Minting;

impl Contract for Minting {
    type PrivateState = MintingPrivateState;
    type Ledger = MintingLedger;
    type Constructor = CoinPublicKey;

    fn name(&self) -> &str {
        "minting"
    }

    fn initial_state(
        &self,
        context: ConstructorContext<MintingPrivateState>,
        owner: CoinPublicKey,
    ) -> Result<InitialState<MintingPrivateState>, CircuitError> {
        if owner == CoinPublicKey::default() {
            return Err(CircuitError::invalid_argument("owner key must be non-zero"));
        }
        let ledger = MintingLedger {
            owner,
            total_minted: 0,
            total_burned: 0,
            treasury: 0,
            balances: BTreeMap::new(),
            spent_nonces: BTreeSet::new(),
        };
        Ok(InitialState {
            private_state: context.initial_private_state,
            contract_state: ContractState::new(StateValue::encode(&ledger)?),
            identity: IdentityScope::new(context.caller),
        })
    }

    fn transitions(&self) -> TransitionTable<MintingPrivateState> {
        TransitionTable::new()
            .with("mint", mint)
            .with("burn", burn)
            .with("owner_withdraw", owner_withdraw)
            .with("balance_of", balance_of)
    }

    fn ledger(&self, state: &StateValue) -> Result<MintingLedger, CodecError> {
        state.decode()
    }
}

type Ctx = CircuitContext<MintingPrivateState>;
type Res = Result<CircuitResults<MintingPrivateState>, CircuitError>;

fn mint(ctx: Ctx, args: &Args) -> Res {
    let coin: CoinInfo = args.get(0)?;
    let mut ledger: MintingLedger = ctx.ledger()?;

    if coin.value == 0 {
        return Err(CircuitError::invalid_argument("coin value must be positive"));
    }
    if coin.color != NATIVE_TOKEN {
        return Err(CircuitError::invalid_argument("coin is not the native token"));
    }
    if !ledger.spent_nonces.insert(hex::encode(coin.nonce)) {
        return Err(CircuitError::invalid_state("coin nonce already spent"));
    }

    let caller = ctx.caller();
    let balance = ledger.balances.entry(caller).or_insert(0);
    *balance = balance
        .checked_add(coin.value)
        .ok_or_else(|| CircuitError::invalid_state("balance overflow"))?;
    let new_balance = *balance;
    ledger.total_minted = ledger
        .total_minted
        .checked_add(coin.value)
        .ok_or_else(|| CircuitError::invalid_state("supply overflow"))?;

    let mut private = ctx.current_private_state.clone();
    private.value = private.value.saturating_add(coin.value);

    ctx.with_ledger(&ledger)?
        .with_private_state(private)
        .finish(new_balance)
}

fn burn(ctx: Ctx, args: &Args) -> Res {
    let value: u64 = args.get(0)?;
    let mut ledger: MintingLedger = ctx.ledger()?;
    let caller = ctx.caller();

    let balance = ledger.balance_of(&caller);
    if value == 0 || value > balance {
        return Err(CircuitError::invalid_argument("burn exceeds balance"));
    }
    if balance == value {
        ledger.balances.remove(&caller);
    } else {
        ledger.balances.insert(caller, balance - value);
    }
    ledger.total_burned += value;
    ledger.treasury += value;

    ctx.with_ledger(&ledger)?.finish(balance - value)
}

fn owner_withdraw(ctx: Ctx, args: &Args) -> Res {
    let value: u64 = args.get(0)?;
    let mut ledger: MintingLedger = ctx.ledger()?;

    if ctx.caller() != ledger.owner {
        return Err(CircuitError::unauthorized("only the owner may withdraw"));
    }
    if value > ledger.treasury {
        return Err(CircuitError::invalid_argument("withdrawal exceeds treasury"));
    }
    ledger.treasury -= value;

    ctx.with_ledger(&ledger)?.finish(ledger.treasury)
}

fn balance_of(ctx: Ctx, args: &Args) -> Res {
    let account: CoinPublicKey = args.get(0)?;
    let ledger: MintingLedger = ctx.ledger()?;
    ctx.finish(ledger.balance_of(&account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuit_env::{args, ContractAddress, QueryContext};

    const OWNER: CoinPublicKey = CoinPublicKey([1; 32]);
    const ALICE: CoinPublicKey = CoinPublicKey([2; 32]);

    fn genesis() -> Ctx {
        let init = Minting
            .initial_state(ConstructorContext::new(MintingPrivateState::new(0), OWNER), OWNER)
            .unwrap();
        CircuitContext {
            current_private_state: init.private_state,
            identity: init.identity,
            original_state: init.contract_state.clone(),
            transaction: QueryContext::new(init.contract_state.data, ContractAddress::default()),
        }
    }

    fn apply(name: &str, ctx: Ctx, args: &Args) -> Res {
        Minting.transitions().get(name).unwrap().apply(ctx, args)
    }

    #[test]
    fn test_zero_owner_rejected_at_construction() {
        let result = Minting.initial_state(
            ConstructorContext::new(MintingPrivateState::new(0), OWNER),
            CoinPublicKey::default(),
        );
        assert!(matches!(result, Err(CircuitError::InvalidArgument(_))));
    }

    #[test]
    fn test_mint_burn_withdraw_flow() {
        let ctx = genesis().with_identity(IdentityScope::new(ALICE));
        let minted = apply("mint", ctx, &args![CoinInfo::native([9; 32], 100)]).unwrap();
        assert_eq!(minted.context.current_private_state.value, 100);

        let burned = apply("burn", minted.context, &args![40u64]).unwrap();
        let ledger: MintingLedger = burned.context.ledger().unwrap();
        assert_eq!(ledger.balance_of(&ALICE), 60);
        assert_eq!(ledger.treasury, 40);

        let denied = apply("owner_withdraw", burned.context.clone(), &args![10u64]);
        assert!(matches!(denied, Err(CircuitError::Unauthorized(_))));

        let as_owner = burned.context.with_identity(IdentityScope::new(OWNER));
        let withdrawn = apply("owner_withdraw", as_owner, &args![10u64]).unwrap();
        assert_eq!(withdrawn.result, serde_json::json!(30));
    }

    #[test]
    fn test_nonce_reuse_rejected() {
        let coin = CoinInfo::native([5; 32], 1);
        let minted = apply("mint", genesis(), &args![coin.clone()]).unwrap();
        let err = apply("mint", minted.context, &args![coin]).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidState(_)));
    }

    #[test]
    fn test_foreign_color_rejected() {
        let coin = CoinInfo {
            nonce: [1; 32],
            color: [3; 32],
            value: 5,
        };
        let err = apply("mint", genesis(), &args![coin]).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidArgument(_)));
    }
}
