//! Circuit Engine Abstraction Layer
//!
//! This crate is the boundary between the simulation harness and the
//! contract engine that supplies the actual transition logic.
//!
//! # Core Concept: Immutable-by-Replacement Contexts
//!
//! A circuit never mutates state in place. It receives a [`CircuitContext`]
//! by value and hands back a brand-new one inside [`CircuitResults`]:
//! - **Private state**: owned by the calling actor
//! - **Identity scope**: the caller identity for this single call
//! - **Genesis snapshot**: the contract state produced by initialization
//! - **Transaction state**: the shared public ledger
//!
//! A harness that only swaps its current context on success gets atomic
//! commit-or-reject semantics for free.
//!
//! # Example
//!
//! ```ignore
//! use circuit_env::{args, Args, CircuitContext, CircuitError, CircuitResults};
//!
//! fn increment(ctx: CircuitContext<Secret>, _args: &Args)
//!     -> Result<CircuitResults<Secret>, CircuitError>
//! {
//!     let mut ledger: Counter = ctx.ledger()?;
//!     ledger.round += 1;
//!     ctx.with_ledger(&ledger)?.finish(())
//! }
//! ```

mod args;
mod context;
mod contract;
mod error;
mod types;

pub use args::Args;
pub use context::{
    CircuitContext, CircuitResults, ConstructorContext, ContractState, IdentityScope,
    InitialState, ProofData, QueryContext,
};
pub use contract::{CircuitFn, Contract, NamedCircuit, Transition, TransitionTable};
pub use error::{CircuitError, CodecError};
pub use types::{Actor, CoinPublicKey, ContractAddress, StateValue};
