//! Injected observers notified after each invocation.

use circuit_env::{Actor, CoinPublicKey, ProofData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// A successful, committed invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEvent {
    /// 1-based count of committed invocations on this harness
    pub sequence: u64,
    pub actor: Actor,
    pub transition: String,
    pub caller: CoinPublicKey,
    pub result: Value,
    pub proof: Option<ProofData>,
}

/// A rejected invocation. Nothing was committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectEvent {
    pub actor: Actor,
    pub transition: String,
    pub caller: CoinPublicKey,
    pub reason: String,
}

/// Side channel for commit/reject notifications.
///
/// Observers see events after the outcome is final and cannot influence
/// committed state or control flow.
pub trait CommitObserver: Send {
    fn on_commit(&self, event: &CommitEvent);

    fn on_reject(&self, _event: &RejectEvent) {}
}

/// Emits events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CommitObserver for TracingObserver {
    fn on_commit(&self, event: &CommitEvent) {
        debug!(
            seq = event.sequence,
            actor = %event.actor,
            caller = %event.caller,
            "committed {}",
            event.transition
        );
        if let Some(proof) = &event.proof {
            trace!(circuit = %proof.circuit, output = %proof.public_output, "proof artifact");
        }
    }

    fn on_reject(&self, event: &RejectEvent) {
        debug!(actor = %event.actor, caller = %event.caller, "rejected {}: {}", event.transition, event.reason);
    }
}

/// An observed event, in call order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservedEvent {
    Commit(CommitEvent),
    Reject(RejectEvent),
}

/// Records every event. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far.
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn commits(&self) -> usize {
        self.count(|e| matches!(e, ObservedEvent::Commit(_)))
    }

    pub fn rejects(&self) -> usize {
        self.count(|e| matches!(e, ObservedEvent::Reject(_)))
    }

    fn count(&self, f: impl Fn(&ObservedEvent) -> bool) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).iter().filter(|e| f(e)).count()
    }

    fn push(&self, event: ObservedEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}

impl CommitObserver for RecordingObserver {
    fn on_commit(&self, event: &CommitEvent) {
        self.push(ObservedEvent::Commit(event.clone()));
    }

    fn on_reject(&self, event: &RejectEvent) {
        self.push(ObservedEvent::Reject(event.clone()));
    }
}
