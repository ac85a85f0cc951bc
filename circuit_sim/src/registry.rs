//! Per-actor private state registry.

use crate::error::SimError;
use circuit_env::Actor;
use std::collections::BTreeMap;

/// Maps each actor to its one live private state.
///
/// Registration overwrites, so an actor can never have two states. Lookups
/// of unregistered actors fail loudly instead of producing a default.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateStateRegistry<P> {
    states: BTreeMap<Actor, P>,
}

impl<P> PrivateStateRegistry<P> {
    pub fn new() -> Self {
        Self {
            states: BTreeMap::new(),
        }
    }

    /// Creates a registry holding a single genesis entry.
    pub fn seeded(actor: Actor, state: P) -> Self {
        let mut registry = Self::new();
        registry.states.insert(actor, state);
        registry
    }

    /// Inserts or replaces the entry for `actor`, returning the old state.
    pub fn register(&mut self, actor: impl Into<Actor>, state: P) -> Option<P> {
        self.states.insert(actor.into(), state)
    }

    /// Returns the state stored for `actor`.
    pub fn get(&self, actor: &str) -> Result<&P, SimError> {
        self.states
            .get(actor)
            .ok_or_else(|| SimError::unknown_actor(actor))
    }

    /// Returns the registered key for `actor`.
    pub fn actor(&self, actor: &str) -> Result<&Actor, SimError> {
        self.states
            .get_key_value(actor)
            .map(|(key, _)| key)
            .ok_or_else(|| SimError::unknown_actor(actor))
    }

    /// Replaces the state of an already registered actor.
    ///
    /// Never creates an entry; returns the previous state.
    pub fn update(&mut self, actor: &str, state: P) -> Result<P, SimError> {
        let slot = self
            .states
            .get_mut(actor)
            .ok_or_else(|| SimError::unknown_actor(actor))?;
        Ok(std::mem::replace(slot, state))
    }

    pub fn contains(&self, actor: &str) -> bool {
        self.states.contains_key(actor)
    }

    /// Registered actors in sorted order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.states.keys()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<P> Default for PrivateStateRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
