//! Harness Property Tests
//!
//! Random call sequences from several actors against the role counter.
//! Whatever the sequence, rejected calls must leave no trace, committed
//! calls must only touch the calling actor's private state, and replaying
//! the same sequence must reproduce the same ledger.

use circuit_core::{CounterLedger, CounterPrivateState, RoleCounter};
use circuit_env::{args, Args};
use circuit_sim::{DeterministicKeyProvider, SimConfig, SimError, Simulator};
use proptest::prelude::*;
use std::collections::BTreeMap;

const ACTORS: [&str; 3] = ["admin", "operator", "outsider"];

#[derive(Debug, Clone)]
enum Op {
    Increment,
    AddOperator(usize),
    RemoveOperator(usize),
    Read,
}

fn op_strategy() -> impl Strategy<Value = (usize, Op)> {
    let op = prop_oneof![
        3 => Just(Op::Increment),
        1 => (0..ACTORS.len()).prop_map(Op::AddOperator),
        1 => (0..ACTORS.len()).prop_map(Op::RemoveOperator),
        1 => Just(Op::Read),
    ];
    (0..ACTORS.len(), op)
}

fn deploy(seed: u64) -> Simulator<RoleCounter> {
    let keys = DeterministicKeyProvider::new(seed);
    let admin = CounterPrivateState::new(keys.actor_secret("admin"));
    let mut sim =
        Simulator::deploy_with(SimConfig::default().with_seed(seed), RoleCounter, "admin", admin, ()).unwrap();
    for actor in &ACTORS[1..] {
        sim.register(*actor, CounterPrivateState::new(keys.actor_secret(actor)));
    }
    sim
}

fn call(sim: &mut Simulator<RoleCounter>, op: &Op) -> Result<CounterLedger, SimError> {
    let key_of = |sim: &Simulator<RoleCounter>, i: usize| sim.private_state_of(ACTORS[i]).unwrap().public_key();
    let (name, args): (&str, Args) = match op {
        Op::Increment => ("increment", args![]),
        Op::AddOperator(i) => ("add_operator", args![key_of(&*sim, *i)]),
        Op::RemoveOperator(i) => ("remove_operator", args![key_of(&*sim, *i)]),
        Op::Read => ("read", args![]),
    };
    sim.invoke(name, args)
}

fn private_states(sim: &Simulator<RoleCounter>) -> BTreeMap<String, CounterPrivateState> {
    ACTORS
        .iter()
        .map(|a| (a.to_string(), sim.private_state_of(a).unwrap().clone()))
        .collect()
}

fn replay(seed: u64, ops: &[(usize, Op)]) -> (CounterLedger, BTreeMap<String, CounterPrivateState>, Vec<bool>) {
    let mut sim = deploy(seed);
    let outcomes = ops
        .iter()
        .map(|(actor, op)| {
            sim.as_actor(ACTORS[*actor]).unwrap();
            call(&mut sim, op).is_ok()
        })
        .collect();
    (sim.view_ledger().unwrap(), private_states(&sim), outcomes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rejected_calls_leave_no_trace(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut sim = deploy(seed);
        for (actor, op) in &ops {
            sim.as_actor(ACTORS[*actor]).unwrap();
            let ledger_before = sim.view_ledger().unwrap();
            let states_before = private_states(&sim);
            let context_before = sim.context().clone();

            match call(&mut sim, op) {
                Ok(_) => {}
                Err(err) => {
                    prop_assert!(err.is_rule_violation(), "unexpected error {:?}", err);
                    prop_assert_eq!(sim.view_ledger().unwrap(), ledger_before);
                    prop_assert_eq!(private_states(&sim), states_before);
                    prop_assert_eq!(sim.context(), &context_before);
                }
            }
        }
        prop_assert_eq!(sim.committed() + sim.rejected(), ops.len() as u64);
    }

    #[test]
    fn prop_commits_touch_only_the_calling_actor(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut sim = deploy(seed);
        for (actor, op) in &ops {
            let me = ACTORS[*actor];
            sim.as_actor(me).unwrap();
            let before = private_states(&sim);

            if call(&mut sim, op).is_ok() {
                let after = private_states(&sim);
                for other in ACTORS.iter().filter(|a| **a != me) {
                    prop_assert_eq!(&after[*other], &before[*other]);
                }
                prop_assert_eq!(sim.private_state(), &after[me]);
            }
        }
    }

    #[test]
    fn prop_same_seed_same_outcome(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 0..40)) {
        prop_assert_eq!(replay(seed, &ops), replay(seed, &ops));
    }

    #[test]
    fn prop_ledger_matches_reference_model(seed in any::<u64>(), ops in prop::collection::vec(op_strategy(), 0..40)) {
        let (ledger, states, outcomes) = replay(seed, &ops);

        let mut round = 0u64;
        let mut operators = [false; 3];
        let mut increments = [0u64; 3];
        for ((actor, op), ok) in ops.iter().zip(&outcomes) {
            let allowed = match op {
                Op::Increment => *actor == 0 || operators[*actor],
                Op::AddOperator(i) => *actor == 0 && !operators[*i],
                Op::RemoveOperator(i) => *actor == 0 && operators[*i],
                Op::Read => true,
            };
            prop_assert_eq!(*ok, allowed, "{:?} by {}", op, ACTORS[*actor]);
            if !allowed {
                continue;
            }
            match op {
                Op::Increment => {
                    round += 1;
                    increments[*actor] += 1;
                }
                Op::AddOperator(i) => operators[*i] = true,
                Op::RemoveOperator(i) => operators[*i] = false,
                Op::Read => {}
            }
        }

        prop_assert_eq!(ledger.round, round);
        prop_assert_eq!(ledger.operators.len(), operators.iter().filter(|o| **o).count());
        for (i, actor) in ACTORS.iter().enumerate() {
            prop_assert_eq!(states[*actor].increments, increments[i]);
        }
    }

    #[test]
    fn prop_unknown_actor_changes_nothing(name in "[a-z]{1,12}") {
        prop_assume!(!ACTORS.contains(&name.as_str()));
        let mut sim = deploy(42);
        sim.as_actor("operator").unwrap();
        let before = sim.context().clone();

        let err = sim.as_actor(&name).map(|_| ()).unwrap_err();
        prop_assert!(err.is_unknown_actor());
        prop_assert_eq!(sim.current_actor().as_str(), "operator");
        prop_assert_eq!(sim.context(), &before);
        prop_assert_eq!(sim.actors().count(), ACTORS.len());
    }
}

#[test]
fn test_projection_is_idempotent_between_calls() {
    let mut sim = deploy(3);
    sim.as_actor("admin").unwrap().invoke("increment", args![]).unwrap();
    let first = sim.view_ledger().unwrap();
    let second = sim.view_ledger().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.round, 1);
}
