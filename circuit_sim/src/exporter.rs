//! JSON trace export.
//!
//! A trace records every scripted call with the ledger snapshot after it,
//! so two runs of the same seed can be diffed line by line.

use crate::dispatcher::Outcome;
use circuit_env::{Actor, CoinPublicKey, ContractAddress};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One scripted call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    /// 0-based position in the script
    pub index: usize,

    pub actor: Actor,
    pub transition: String,

    /// Identity the transition saw
    pub caller: CoinPublicKey,

    /// Outcome the script expected
    pub expected: Outcome,

    /// Outcome the harness produced
    pub outcome: Outcome,

    /// Rejection reason, if rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Transition result value (null when rejected)
    pub result: Value,

    /// Projected ledger after the step
    pub ledger: Value,
}

impl TraceStep {
    /// True when the harness did what the script expected.
    pub fn as_expected(&self) -> bool {
        self.expected == self.outcome
    }
}

/// Complete scenario trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Address the contract was deployed at
    pub contract_address: ContractAddress,

    /// All steps in call order
    pub steps: Vec<TraceStep>,

    pub committed: u64,
    pub rejected: u64,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl TraceExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            contract_address: ContractAddress::default(),
            steps: Vec::new(),
            committed: 0,
            rejected: 0,
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a step and updates the counters.
    pub fn add_step(&mut self, step: TraceStep) {
        match step.outcome {
            Outcome::Committed => self.committed += 1,
            Outcome::Rejected => self.rejected += 1,
        }
        self.steps.push(step);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, failure_reason: Option<String>) {
        self.passed = failure_reason.is_none();
        self.failure_reason = failure_reason;
    }

    /// Index of the first step whose ledger or outcome differs from `other`.
    pub fn first_divergence(&self, other: &TraceExport) -> Option<usize> {
        let common = self.steps.len().min(other.steps.len());
        (0..common)
            .find(|&i| self.steps[i] != other.steps[i])
            .or_else(|| (self.steps.len() != other.steps.len()).then_some(common))
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
