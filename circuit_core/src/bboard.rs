//! Single-slot bulletin board.
//!
//! Anyone may post to a vacant board. Only the poster can take the post
//! down, proven by recomputing the poster key from the private secret. The
//! key is rotated with the board sequence so posts are unlinkable.

use crate::crypto::derive_public_key;
use circuit_env::{
    Args, CircuitContext, CircuitError, CircuitResults, CodecError, CoinPublicKey,
    ConstructorContext, Contract, ContractState, IdentityScope, InitialState, StateValue,
    TransitionTable,
};
use serde::{Deserialize, Serialize};

const PK_DOMAIN: &str = "bboard:pk:";

/// Private state of a board participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPrivateState {
    pub secret_key: [u8; 32],
}

impl BoardPrivateState {
    pub fn new(secret_key: [u8; 32]) -> Self {
        Self { secret_key }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardState {
    Vacant,
    Occupied,
}

/// Public ledger of the bulletin board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLedger {
    pub state: BoardState,
    pub message: Option<String>,
    pub sequence: u64,
    pub poster: CoinPublicKey,
}

/// Derives the poster key for `secret` at board sequence `sequence`.
pub fn board_public_key(secret: &[u8; 32], sequence: u64) -> CoinPublicKey {
    derive_public_key(PK_DOMAIN, secret, sequence)
}

/// The bulletin board contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulletinBoard;

impl Contract for BulletinBoard {
    type PrivateState = BoardPrivateState;
    type Ledger = BoardLedger;
    type Constructor = ();

    fn name(&self) -> &str {
        "bulletin-board"
    }

    fn initial_state(
        &self,
        context: ConstructorContext<BoardPrivateState>,
        _args: (),
    ) -> Result<InitialState<BoardPrivateState>, CircuitError> {
        let ledger = BoardLedger {
            state: BoardState::Vacant,
            message: None,
            sequence: 1,
            poster: CoinPublicKey::default(),
        };
        Ok(InitialState {
            private_state: context.initial_private_state,
            contract_state: ContractState::new(StateValue::encode(&ledger)?),
            identity: IdentityScope::new(context.caller),
        })
    }

    fn transitions(&self) -> TransitionTable<BoardPrivateState> {
        TransitionTable::new()
            .with("post", post)
            .with("take_down", take_down)
            .with("public_key", public_key)
    }

    fn ledger(&self, state: &StateValue) -> Result<BoardLedger, CodecError> {
        state.decode()
    }
}

type Ctx = CircuitContext<BoardPrivateState>;
type Res = Result<CircuitResults<BoardPrivateState>, CircuitError>;

fn post(ctx: Ctx, args: &Args) -> Res {
    let message: String = args.get(0)?;
    let mut ledger: BoardLedger = ctx.ledger()?;
    if ledger.state != BoardState::Vacant {
        return Err(CircuitError::invalid_state("attempted to post to an occupied board"));
    }

    ledger.poster = board_public_key(&ctx.current_private_state.secret_key, ledger.sequence);
    ledger.message = Some(message);
    ledger.state = BoardState::Occupied;
    ctx.with_ledger(&ledger)?.finish(())
}

fn take_down(ctx: Ctx, _args: &Args) -> Res {
    let mut ledger: BoardLedger = ctx.ledger()?;
    if ledger.state != BoardState::Occupied {
        return Err(CircuitError::invalid_state("attempted to take down post from an empty board"));
    }
    if ledger.poster != board_public_key(&ctx.current_private_state.secret_key, ledger.sequence) {
        return Err(CircuitError::unauthorized(
            "attempted to take down post, but not the current poster",
        ));
    }

    let former = ledger.message.take();
    ledger.state = BoardState::Vacant;
    ledger.sequence += 1;
    ctx.with_ledger(&ledger)?.finish(former)
}

fn public_key(ctx: Ctx, _args: &Args) -> Res {
    let ledger: BoardLedger = ctx.ledger()?;
    let key = board_public_key(&ctx.current_private_state.secret_key, ledger.sequence);
    ctx.finish(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuit_env::{args, ContractAddress, QueryContext};

    fn genesis(secret: [u8; 32]) -> Ctx {
        let init = BulletinBoard
            .initial_state(
                ConstructorContext::new(BoardPrivateState::new(secret), CoinPublicKey::default()),
                (),
            )
            .unwrap();
        CircuitContext {
            current_private_state: init.private_state,
            identity: init.identity,
            original_state: init.contract_state.clone(),
            transaction: QueryContext::new(init.contract_state.data, ContractAddress::default()),
        }
    }

    fn apply(name: &str, ctx: Ctx, args: &Args) -> Res {
        BulletinBoard.transitions().get(name).unwrap().apply(ctx, args)
    }

    #[test]
    fn test_post_and_take_down_by_poster() {
        let posted = apply("post", genesis([1; 32]), &args!["hello"]).unwrap();
        let ledger: BoardLedger = posted.context.ledger().unwrap();
        assert_eq!(ledger.state, BoardState::Occupied);
        assert_eq!(ledger.message.as_deref(), Some("hello"));
        assert_eq!(ledger.poster, board_public_key(&[1; 32], 1));

        let removed = apply("take_down", posted.context, &Args::new()).unwrap();
        let ledger: BoardLedger = removed.context.ledger().unwrap();
        assert_eq!(ledger.state, BoardState::Vacant);
        assert_eq!(ledger.sequence, 2);
        assert_eq!(removed.result, serde_json::json!("hello"));
    }

    #[test]
    fn test_cannot_post_twice() {
        let posted = apply("post", genesis([1; 32]), &args!["first"]).unwrap();
        let err = apply("post", posted.context, &args!["second"]).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidState(_)));
    }

    #[test]
    fn test_other_user_cannot_take_down() {
        let posted = apply("post", genesis([1; 32]), &args!["mine"]).unwrap();
        let intruder = posted.context.with_private_state(BoardPrivateState::new([2; 32]));
        let err = apply("take_down", intruder, &Args::new()).unwrap_err();
        assert!(matches!(err, CircuitError::Unauthorized(_)));
    }
}
