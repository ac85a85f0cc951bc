//! Scenario runner - executes scripted multi-actor scenarios.
//!
//! Each scenario deploys one reference contract, drives it through a fixed
//! script of calls from several actors, and checks that every call commits
//! or is rejected exactly as expected. The full trace is kept so runs of
//! the same seed can be compared for determinism.

use crate::config::SimConfig;
use crate::dispatcher::Outcome::{self, Committed, Rejected};
use crate::error::SimError;
use crate::exporter::{TraceExport, TraceStep};
use crate::keys::DeterministicKeyProvider;
use crate::observer::TracingObserver;
use crate::scenarios::ScenarioId;
use crate::simulator::Simulator;

use circuit_core::access::{
    ADMIN_MASTER, MINTER, MINTER_ADMIN, SETTLER, SETTLER_ADMIN, VERIFIER, VERIFIER_ADMIN,
};
use circuit_core::bboard::board_public_key;
use circuit_core::bucket::bucket_owner_commitment;
use circuit_core::{
    BoardPrivateState, BoardState, BucketConditions, BucketStatus, BulletinBoard, Certificate, CertificateNft,
    CoinInfo, CounterPrivateState, Impact, Minting, MintingPrivateState, NftConstructor,
    NftPrivateState, RoleCounter, Source,
};
use circuit_env::{args, Args, CoinPublicKey, Contract};
use serde_json::Value;
use tracing::{info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether every step and final check matched
    pub passed: bool,

    /// Number of scripted calls
    pub steps: usize,

    pub committed: u64,
    pub rejected: u64,

    /// First mismatch, if any
    pub failure_reason: Option<String>,

    /// Step-by-step trace
    pub trace: TraceExport,
}

/// Records steps and the first mismatch of a running script.
struct Script {
    trace: TraceExport,
    failure: Option<String>,
}

impl Script {
    fn new(scenario: ScenarioId, seed: u64) -> Self {
        Self {
            trace: TraceExport::new(scenario.name(), seed),
            failure: None,
        }
    }

    fn fail(&mut self, reason: String) {
        warn!("{}", reason);
        if self.failure.is_none() {
            self.failure = Some(reason);
        }
    }

    /// Runs one call as `actor` and records it.
    ///
    /// A rejection is a normal outcome here; only harness errors (unknown
    /// actor or transition, codec failures) abort the script.
    fn step<C: Contract>(
        &mut self,
        sim: &mut Simulator<C>,
        actor: &str,
        transition: &str,
        args: Args,
        caller: Option<CoinPublicKey>,
        expected: Outcome,
    ) -> Result<Value, SimError> {
        let index = self.trace.steps.len();
        let (outcome, result, error) = match sim.as_actor(actor)?.call(transition, args, caller) {
            Ok(done) => (Outcome::Committed, done.result, None),
            Err(err) if err.is_rule_violation() => (Outcome::Rejected, Value::Null, Some(err.to_string())),
            Err(err) => return Err(err),
        };
        let ledger = serde_json::to_value(sim.view_ledger()?).map_err(|e| SimError::Codec(e.to_string()))?;

        if outcome != expected {
            self.fail(format!(
                "step {} ({} as {}): expected {:?}, got {:?}{}",
                index,
                transition,
                actor,
                expected,
                outcome,
                error.as_deref().map(|e| format!(" ({})", e)).unwrap_or_default()
            ));
        }

        self.trace.add_step(TraceStep {
            index,
            actor: sim.current_actor().clone(),
            transition: transition.to_string(),
            caller: caller.unwrap_or_else(|| sim.context().caller()),
            expected,
            outcome,
            error,
            result: result.clone(),
            ledger,
        });
        Ok(result)
    }

    /// Calls with the actor's deterministic identity as the caller.
    fn step_as<C: Contract>(
        &mut self,
        sim: &mut Simulator<C>,
        actor: &str,
        transition: &str,
        args: Args,
        expected: Outcome,
    ) -> Result<Value, SimError> {
        let caller = sim.coin_public_key(actor);
        self.step(sim, actor, transition, args, Some(caller), expected)
    }

    fn check(&mut self, ok: bool, what: impl FnOnce() -> String) {
        if !ok {
            self.fail(format!("final check failed: {}", what()));
        }
    }
}

/// Runs scripted scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn config(&self) -> SimConfig {
        SimConfig::default().with_seed(self.seed)
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let mut script = Script::new(scenario, self.seed);
        let outcome = match scenario {
            ScenarioId::RoleCounter => self.run_role_counter(&mut script),
            ScenarioId::NftLifecycle => self.run_nft_lifecycle(&mut script),
            ScenarioId::BulletinBoard => self.run_bulletin_board(&mut script),
            ScenarioId::Minting => self.run_minting(&mut script),
        };
        if let Err(err) = outcome {
            script.fail(format!("harness error: {}", err));
        }

        let Script { mut trace, failure } = script;
        trace.finalize(failure.clone());

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure.is_none(),
            steps: trace.steps.len(),
            committed: trace.committed,
            rejected: trace.rejected,
            failure_reason: failure,
            trace,
        }
    }

    /// Runs a scenario twice and reports the first step where the traces differ.
    pub fn check_determinism(&self, scenario: ScenarioId) -> Result<(), String> {
        let first = self.run(scenario).trace;
        let second = self.run(scenario).trace;
        match first.first_divergence(&second) {
            None if first == second => Ok(()),
            None => Err(format!("{} (seed={}): summaries differ", scenario, self.seed)),
            Some(step) => Err(format!("{} (seed={}): traces diverge at step {}", scenario, self.seed, step)),
        }
    }

    /// Outsider rejected; admin appoints, uses and removes an operator.
    ///
    /// Witness-style authorization: the caller is derived from each actor's
    /// private secret, so switching actors is all that is needed.
    fn run_role_counter(&self, s: &mut Script) -> Result<(), SimError> {
        let keys = DeterministicKeyProvider::new(self.seed);
        let admin = CounterPrivateState::new(keys.actor_secret("admin"));
        let mut sim = Simulator::deploy_with(self.config(), RoleCounter, "admin", admin, ())?
            .with_observer(TracingObserver);
        sim.register("operator", CounterPrivateState::new(sim.actor_secret("operator")));
        sim.register("outsider", CounterPrivateState::new(sim.actor_secret("outsider")));
        s.trace.contract_address = sim.contract_address();

        let operator = sim.private_state_of("operator")?.public_key();

        s.step(&mut sim, "outsider", "increment", args![], None, Rejected)?;
        s.step(&mut sim, "admin", "increment", args![], None, Committed)?;
        s.step(&mut sim, "outsider", "add_operator", args![operator], None, Rejected)?;
        s.step(&mut sim, "admin", "add_operator", args![operator], None, Committed)?;
        s.step(&mut sim, "operator", "increment", args![], None, Committed)?;
        s.step(&mut sim, "admin", "add_operator", args![operator], None, Rejected)?;
        s.step(&mut sim, "admin", "remove_operator", args![operator], None, Committed)?;
        s.step(&mut sim, "operator", "increment", args![], None, Rejected)?;
        let round = s.step(&mut sim, "outsider", "read", args![], None, Committed)?;

        let ledger = sim.view_ledger()?;
        s.check(ledger.round == 2, || format!("round {} != 2", ledger.round));
        s.check(round == Value::from(2u64), || format!("read returned {}", round));
        s.check(ledger.operators.is_empty(), || "operator still appointed".to_string());
        s.check(sim.private_state_of("admin")?.increments == 1, || "admin increments != 1".to_string());
        s.check(sim.private_state_of("operator")?.increments == 1, || {
            "operator increments != 1".to_string()
        });
        s.check(sim.private_state_of("outsider")?.increments == 0, || {
            "outsider private state changed".to_string()
        });
        Ok(())
    }

    /// Role grants, minting, repricing, pausing, user verification, burning,
    /// bucket creation.
    ///
    /// Identity-style authorization: every call carries the acting actor's
    /// deterministic key as its caller identity.
    fn run_nft_lifecycle(&self, s: &mut Script) -> Result<(), SimError> {
        let keys = DeterministicKeyProvider::new(self.seed);
        let mut sim = Simulator::deploy_with(
            self.config(),
            CertificateNft,
            "admin",
            NftPrivateState::new(keys.actor_secret("admin")),
            NftConstructor::new("Energy Certificate", "ECRT"),
        )?
        .with_observer(TracingObserver);
        sim.register("minter", NftPrivateState::new(sim.actor_secret("minter")));
        sim.register("alice", NftPrivateState::new(sim.actor_secret("alice")));
        s.trace.contract_address = sim.contract_address();

        let admin = sim.coin_public_key("admin");
        let minter = sim.coin_public_key("minter");
        let alice = sim.coin_public_key("alice");
        let certificate = Certificate {
            id: "Certificate_1".to_string(),
            source: Source::Solar,
            generation: 120,
            vintage: 2024,
            impact: Impact::Medium,
            location: "RJ".to_string(),
        };

        s.step_as(&mut sim, "alice", "mint", args![alice, 1u64, certificate, 100u64], Rejected)?;
        s.step_as(&mut sim, "alice", "grant_role", args![MINTER, alice], Rejected)?;
        s.step_as(&mut sim, "admin", "grant_role", args![MINTER_ADMIN, admin], Committed)?;
        s.step_as(&mut sim, "admin", "grant_role", args![MINTER, minter], Committed)?;
        s.step_as(&mut sim, "minter", "mint", args![alice, 1u64, certificate, 100u64], Committed)?;
        s.step_as(&mut sim, "minter", "mint", args![minter, 1u64, certificate, 100u64], Rejected)?;
        s.step_as(&mut sim, "alice", "set_token_price", args![1u64, 150u64], Committed)?;
        s.step_as(&mut sim, "minter", "set_token_price", args![1u64, 1u64], Rejected)?;

        s.step_as(&mut sim, "minter", "pause_access_control", args![], Rejected)?;
        s.step_as(&mut sim, "admin", "pause_access_control", args![], Committed)?;
        s.step_as(&mut sim, "minter", "mint", args![alice, 2u64, certificate, 100u64], Rejected)?;
        s.step_as(&mut sim, "admin", "unpause_access_control", args![], Committed)?;
        s.step_as(&mut sim, "admin", "unpause_access_control", args![], Rejected)?;

        s.step_as(&mut sim, "admin", "grant_role", args![VERIFIER_ADMIN, admin], Committed)?;
        s.step_as(&mut sim, "admin", "grant_role", args![VERIFIER, admin], Committed)?;
        s.step_as(&mut sim, "admin", "set_user", args![alice], Committed)?;
        s.step_as(&mut sim, "alice", "set_user", args![minter], Rejected)?;
        s.step_as(&mut sim, "admin", "pause_identity", args![], Committed)?;
        s.step_as(&mut sim, "admin", "set_user", args![minter], Rejected)?;
        s.step_as(&mut sim, "admin", "unpause_identity", args![], Committed)?;

        s.step_as(&mut sim, "minter", "burn", args![1u64], Rejected)?;
        s.step_as(&mut sim, "admin", "grant_role", args![SETTLER_ADMIN, admin], Committed)?;
        s.step_as(&mut sim, "admin", "grant_role", args![SETTLER, admin], Committed)?;
        s.step_as(&mut sim, "admin", "assert_only_role", args![SETTLER], Committed)?;
        let price = s.step_as(&mut sim, "alice", "token_price", args![1u64], Committed)?;
        s.step_as(&mut sim, "admin", "burn", args![1u64], Committed)?;
        s.step_as(&mut sim, "alice", "owner_of", args![1u64], Rejected)?;
        s.step_as(&mut sim, "minter", "revoke_role", args![MINTER, minter], Rejected)?;
        s.step_as(&mut sim, "admin", "revoke_role", args![MINTER, minter], Committed)?;

        let conditions = BucketConditions {
            source: certificate.source,
            unit_price: 10,
            vintage_limit: 2020,
            impact: certificate.impact,
            location: certificate.location.clone(),
            status: BucketStatus::Open,
            accumulated_price: 0,
            pot: 1_000,
            start_date: 0,
            end_date: 0,
        };
        let coin = CoinInfo::native([0x11; 32], 1_000);
        s.step_as(&mut sim, "alice", "create_bucket", args![conditions, CoinInfo::native([0x12; 32], 999)], Rejected)?;
        let commitment = s.step_as(&mut sim, "alice", "create_bucket", args![conditions, coin], Committed)?;
        s.step_as(&mut sim, "minter", "create_bucket", args![conditions, coin], Rejected)?;
        s.step_as(&mut sim, "minter", "bucket", args![1u64], Committed)?;
        s.step_as(&mut sim, "minter", "bucket", args![2u64], Rejected)?;

        let ledger = sim.view_ledger()?;
        let alice_nonce = sim.private_state_of("alice")?.secret_nonce;
        let expected_commitment = bucket_owner_commitment(&alice_nonce, 1);
        s.check(
            serde_json::from_value::<[u8; 32]>(commitment).ok() == Some(expected_commitment),
            || "bucket commitment does not match alice's nonce".to_string(),
        );
        s.check(ledger.defi.bucket_counter == 1, || format!("bucket counter {} != 1", ledger.defi.bucket_counter));
        s.check(price == Value::from(150u64), || format!("price {} != 150", price));
        s.check(ledger.total_supply == 0, || format!("supply {} != 0", ledger.total_supply));
        s.check(ledger.balance_of(&alice) == 0, || "alice still holds a token".to_string());
        s.check(ledger.users.is_verified(&alice), || "alice not verified".to_string());
        s.check(!ledger.users.is_verified(&minter), || "minter verified".to_string());
        s.check(!ledger.access.has_role(MINTER, &minter), || "minter role not revoked".to_string());
        s.check(ledger.access.has_role(ADMIN_MASTER, &admin), || "admin lost master role".to_string());
        Ok(())
    }

    /// Only the poster can take a post down; the poster key rotates per post.
    fn run_bulletin_board(&self, s: &mut Script) -> Result<(), SimError> {
        let keys = DeterministicKeyProvider::new(self.seed);
        let alice = BoardPrivateState::new(keys.actor_secret("alice"));
        let mut sim = Simulator::deploy_with(self.config(), BulletinBoard, "alice", alice, ())?
            .with_observer(TracingObserver);
        sim.register("bob", BoardPrivateState::new(sim.actor_secret("bob")));
        s.trace.contract_address = sim.contract_address();

        s.step(&mut sim, "bob", "take_down", args![], None, Rejected)?;
        s.step(&mut sim, "alice", "post", args!["hello from alice"], None, Committed)?;
        s.step(&mut sim, "bob", "post", args!["hijack"], None, Rejected)?;
        s.step(&mut sim, "bob", "take_down", args![], None, Rejected)?;
        let removed = s.step(&mut sim, "alice", "take_down", args![], None, Committed)?;
        s.step(&mut sim, "bob", "post", args!["bob was here"], None, Committed)?;
        s.step(&mut sim, "alice", "take_down", args![], None, Rejected)?;

        let ledger = sim.view_ledger()?;
        let bob_secret = sim.private_state_of("bob")?.secret_key;
        s.check(removed == Value::from("hello from alice"), || format!("take_down returned {}", removed));
        s.check(ledger.state == BoardState::Occupied, || "board not occupied".to_string());
        s.check(ledger.sequence == 2, || format!("sequence {} != 2", ledger.sequence));
        s.check(ledger.message.as_deref() == Some("bob was here"), || "wrong message".to_string());
        s.check(ledger.poster == board_public_key(&bob_secret, 2), || "poster is not bob".to_string());
        Ok(())
    }

    /// Zero-value and replayed coins rejected; withdrawal limited to the owner.
    fn run_minting(&self, s: &mut Script) -> Result<(), SimError> {
        let keys = DeterministicKeyProvider::new(self.seed);
        let owner = keys.coin_public_key("owner");
        let mut sim = Simulator::deploy_with(self.config(), Minting, "owner", MintingPrivateState::new(0), owner)?
            .with_observer(TracingObserver);
        sim.register("alice", MintingPrivateState::new(0));
        s.trace.contract_address = sim.contract_address();

        let coin = CoinInfo::native(sim.actor_secret("coin-1"), 100);
        let empty = CoinInfo::native(sim.actor_secret("coin-0"), 0);
        let alice = sim.coin_public_key("alice");

        s.step_as(&mut sim, "alice", "mint", args![empty], Rejected)?;
        s.step_as(&mut sim, "alice", "mint", args![coin], Committed)?;
        s.step_as(&mut sim, "alice", "mint", args![coin], Rejected)?;
        s.step_as(&mut sim, "alice", "burn", args![150u64], Rejected)?;
        s.step_as(&mut sim, "alice", "burn", args![40u64], Committed)?;
        s.step_as(&mut sim, "alice", "owner_withdraw", args![10u64], Rejected)?;
        s.step_as(&mut sim, "owner", "owner_withdraw", args![50u64], Rejected)?;
        s.step_as(&mut sim, "owner", "owner_withdraw", args![40u64], Committed)?;
        let balance = s.step_as(&mut sim, "owner", "balance_of", args![alice], Committed)?;

        let ledger = sim.view_ledger()?;
        s.check(balance == Value::from(60u64), || format!("balance_of returned {}", balance));
        s.check(ledger.balance_of(&alice) == 60, || "alice balance != 60".to_string());
        s.check(ledger.treasury == 0, || format!("treasury {} != 0", ledger.treasury));
        s.check(ledger.total_minted == 100 && ledger.total_burned == 40, || {
            format!("minted {} burned {}", ledger.total_minted, ledger.total_burned)
        });
        s.check(sim.private_state_of("alice")?.value == 100, || "alice private value != 100".to_string());
        s.check(sim.private_state_of("owner")?.value == 0, || "owner private value changed".to_string());
        Ok(())
    }
}
