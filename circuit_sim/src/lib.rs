//! Circuit Simulator - deterministic multi-actor contract test harness
//!
//! This crate runs a contract's business logic in-process, with several
//! simulated actors taking turns against one shared public ledger. Every
//! actor keeps its own private state; the contract never sees anyone's but
//! the current caller's.
//!
//! # Core Principle: Commit or Nothing
//!
//! A transition receives a copy of the current context and returns a new
//! one. The harness adopts the returned context only when the transition
//! succeeds, so a rejected call leaves the ledger and every private state
//! exactly as they were.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Simulator                           │
//! │                                                              │
//! │  as_actor("bob") ──► ContextManager ◄── PrivateStateRegistry │
//! │                          │    ▲              ▲               │
//! │  invoke("post") ──► InvocationDispatcher ────┘               │
//! │                          │                                   │
//! │                  TransitionTable (contract)                  │
//! │                          │                                   │
//! │  view_ledger()  ──► LedgerProjector                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use circuit_core::{BoardPrivateState, BulletinBoard};
//! use circuit_env::args;
//! use circuit_sim::Simulator;
//!
//! let mut sim = Simulator::deploy(BulletinBoard, "alice", BoardPrivateState::new([1; 32]), ())?;
//! sim.register("bob", BoardPrivateState::new([2; 32]));
//!
//! sim.as_actor("alice")?.invoke("post", args!["hello"])?;
//! assert!(sim.as_actor("bob")?.invoke("take_down", args![]).is_err());
//! ```

mod bootstrap;
mod config;
mod context;
mod dispatcher;
mod error;
mod keys;
mod logging;
mod observer;
mod projector;
mod registry;
mod simulator;

pub mod exporter;
pub mod runner;
pub mod scenarios;

pub use bootstrap::Bootstrapper;
pub use config::{SimConfig, LOG_ENV, SEED_ENV};
pub use context::ContextManager;
pub use dispatcher::{Dispatched, InvocationDispatcher, Outcome};
pub use error::SimError;
pub use exporter::{TraceExport, TraceStep};
pub use keys::DeterministicKeyProvider;
pub use logging::init_tracing;
pub use observer::{CommitEvent, CommitObserver, ObservedEvent, RecordingObserver, RejectEvent, TracingObserver};
pub use projector::LedgerProjector;
pub use registry::PrivateStateRegistry;
pub use runner::{ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
pub use simulator::{Invocation, Simulator};
