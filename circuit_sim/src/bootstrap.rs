//! Genesis construction of a harness.

use crate::config::SimConfig;
use crate::context::ContextManager;
use crate::dispatcher::InvocationDispatcher;
use crate::error::SimError;
use crate::keys::DeterministicKeyProvider;
use crate::projector::LedgerProjector;
use crate::registry::PrivateStateRegistry;
use crate::simulator::Simulator;
use circuit_env::{Actor, CircuitContext, ConstructorContext, Contract, QueryContext};
use tracing::info;

/// Builds a ready-to-use [`Simulator`] from a contract's initializer.
#[derive(Debug, Clone)]
pub struct Bootstrapper {
    config: SimConfig,
    keys: DeterministicKeyProvider,
}

impl Bootstrapper {
    pub fn new(config: SimConfig) -> Self {
        let keys = DeterministicKeyProvider::new(config.seed);
        Self { config, keys }
    }

    /// Runs the initializer once and seeds the registry with the genesis actor.
    ///
    /// The deployer identity and the contract address are derived from the
    /// config seed. An initializer failure is returned as
    /// `InitializationFailure` and no harness is produced.
    pub fn deploy<C: Contract>(
        self,
        contract: C,
        genesis_actor: impl Into<Actor>,
        private_state: C::PrivateState,
        args: C::Constructor,
    ) -> Result<Simulator<C>, SimError> {
        let actor = genesis_actor.into();
        let deployer = self.keys.coin_public_key(actor.as_str());
        let address = self.keys.contract_address();

        let init = contract
            .initial_state(ConstructorContext::new(private_state, deployer), args)
            .map_err(SimError::InitializationFailure)?;

        let context = CircuitContext {
            current_private_state: init.private_state.clone(),
            identity: init.identity,
            original_state: init.contract_state.clone(),
            transaction: QueryContext::new(init.contract_state.data, address),
        };
        let registry = PrivateStateRegistry::seeded(actor.clone(), init.private_state);
        let dispatcher = InvocationDispatcher::new(contract.transitions());

        info!(
            contract = contract.name(),
            genesis = %actor,
            address = %address,
            seed = self.config.seed,
            "deployed"
        );

        Ok(Simulator::from_parts(
            self.config,
            self.keys,
            LedgerProjector::new(contract),
            registry,
            ContextManager::new(actor, context),
            dispatcher,
        ))
    }
}
