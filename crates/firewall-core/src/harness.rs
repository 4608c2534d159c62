//! Differential replay of scripted requests against a configured table.
//!
//! The harness applies a configuration sequence to a fresh table, replays
//! each request through the matcher and compares the relevant decision bit
//! with the expected one. A failing test is recorded and the run carries on.

use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, warn};

use crate::matcher::{AccessMatcher, AccessRequest, Operation};
use crate::{Dimensions, FirewallError, RuleTable, RuleWord, RwxCode, TableSnapshot};

/// One configuration write: slot index and the word to store there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ConfigWrite {
    /// Target slot.
    pub index: usize,
    /// Encoded rule.
    pub word: RuleWord,
}

/// One scripted request and the response bit it should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RequestVector {
    /// Request presented to the matcher.
    pub request: AccessRequest,
    /// Expected grant bit on the request's channel.
    pub expected: bool,
}

/// What a single test saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TestContext {
    /// Requesting master.
    pub master_id: u64,
    /// Op code as logged.
    pub op_code: RwxCode,
    /// Target address.
    pub address: u64,
    /// Expected grant bit.
    pub expected: bool,
    /// Grant bit the matcher produced.
    pub actual: bool,
}

impl TestContext {
    /// Channel the request was replayed on.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        if self.op_code.read_flag() {
            Operation::Read
        } else {
            Operation::Write
        }
    }
}

impl fmt::Display for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by master {:X} at {:X} (op {}): expected {}, got {}",
            self.operation(),
            self.master_id,
            self.address,
            self.op_code,
            u8::from(self.expected),
            u8::from(self.actual)
        )
    }
}

/// Result of one replayed request. Test numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TestOutcome {
    /// One-based position in the request sequence.
    pub test_number: usize,
    /// Actual bit equals expected bit.
    pub passed: bool,
    /// Request fields and both bits.
    pub context: TestContext,
}

/// A configuration write the table refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFailure {
    /// Zero-based position in the configuration sequence.
    pub position: usize,
    /// Slot the write targeted.
    pub index: usize,
    /// Why it was refused.
    pub error: FirewallError,
}

/// Aggregate counts of one replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct HarnessSummary {
    /// Requests replayed.
    pub total: usize,
    /// Requests whose bit matched.
    pub passed: usize,
    /// Requests whose bit did not match.
    pub failed: usize,
}

/// Every outcome of one replay plus the configuration writes that were refused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarnessReport {
    outcomes: Vec<TestOutcome>,
    config_failures: Vec<ConfigFailure>,
}

impl HarnessReport {
    /// Number of requests replayed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// All outcomes in request order.
    #[must_use]
    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    /// Failed outcomes in request order.
    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed)
    }

    /// One-based numbers of the failed tests.
    #[must_use]
    pub fn failed_test_numbers(&self) -> Vec<usize> {
        self.failures().map(|outcome| outcome.test_number).collect()
    }

    /// Configuration writes the table refused before replay.
    #[must_use]
    pub fn config_failures(&self) -> &[ConfigFailure] {
        &self.config_failures
    }

    /// True when every request matched and every configuration write landed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.config_failures.is_empty() && self.outcomes.iter().all(|outcome| outcome.passed)
    }

    /// Pass/fail counts.
    #[must_use]
    pub fn summary(&self) -> HarnessSummary {
        let failed = self.failures().count();
        HarnessSummary {
            total: self.total(),
            passed: self.total() - failed,
            failed,
        }
    }
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.config_failures {
            writeln!(
                f,
                "config write {} (slot {}) rejected: {}",
                failure.position, failure.index, failure.error
            )?;
        }
        for outcome in self.failures() {
            writeln!(f, "test {} FAILED: {}", outcome.test_number, outcome.context)?;
        }
        let summary = self.summary();
        write!(
            f,
            "{} tests, {} passed, {} failed",
            summary.total, summary.passed, summary.failed
        )
    }
}

/// Owns a rule table and replays request sequences against it.
#[derive(Debug, Clone)]
pub struct ValidationHarness {
    table: RuleTable,
    config_failures: Vec<ConfigFailure>,
}

impl ValidationHarness {
    /// Creates a harness with a zeroed table.
    #[must_use]
    pub fn new(dims: Dimensions) -> Self {
        Self {
            table: RuleTable::new(dims),
            config_failures: Vec::new(),
        }
    }

    /// Table dimensions.
    #[must_use]
    pub const fn dims(&self) -> &Dimensions {
        self.table.dims()
    }

    /// Resets the table and applies `writes` in order.
    ///
    /// Refused writes are recorded and returned; they leave every other slot
    /// as configured.
    pub fn configure(&mut self, writes: &[ConfigWrite]) -> &[ConfigFailure] {
        self.table.reset();
        self.config_failures.clear();

        for (position, write) in writes.iter().enumerate() {
            if let Err(error) = self.table.write_rule(write.index, write.word) {
                warn!(position, index = write.index, %error, "configuration write rejected");
                self.config_failures.push(ConfigFailure {
                    position,
                    index: write.index,
                    error,
                });
            }
        }

        &self.config_failures
    }

    /// Frozen view of the configured table.
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        self.table.snapshot()
    }

    /// Replays `requests` against the configured table.
    #[must_use]
    pub fn run(&self, requests: &[RequestVector]) -> HarnessReport {
        self.replay_configured(&self.snapshot(), requests)
    }

    /// Replays several independent request sequences against one frozen
    /// snapshot, in parallel. Each sequence gets its own report, in input order.
    #[cfg(feature = "parallel")]
    #[must_use]
    pub fn run_suites(&self, suites: &[Vec<RequestVector>]) -> Vec<HarnessReport> {
        let snapshot = self.snapshot();
        suites
            .par_iter()
            .map(|suite| self.replay_configured(&snapshot, suite))
            .collect()
    }

    /// Replays several independent request sequences against one frozen
    /// snapshot. Each sequence gets its own report, in input order.
    #[cfg(not(feature = "parallel"))]
    #[must_use]
    pub fn run_suites(&self, suites: &[Vec<RequestVector>]) -> Vec<HarnessReport> {
        let snapshot = self.snapshot();
        suites
            .iter()
            .map(|suite| self.replay_configured(&snapshot, suite))
            .collect()
    }

    fn replay_configured(
        &self,
        snapshot: &TableSnapshot,
        requests: &[RequestVector],
    ) -> HarnessReport {
        let mut report = Self::replay(snapshot, requests);
        report.config_failures.clone_from(&self.config_failures);
        report
    }

    /// Replays `requests` against any matcher.
    pub fn replay<M: AccessMatcher + ?Sized>(
        matcher: &M,
        requests: &[RequestVector],
    ) -> HarnessReport {
        let outcomes: Vec<TestOutcome> = requests
            .iter()
            .enumerate()
            .map(|(position, vector)| {
                let actual = matcher.decide_request(&vector.request);
                let outcome = TestOutcome {
                    test_number: position + 1,
                    passed: actual == vector.expected,
                    context: TestContext {
                        master_id: vector.request.master_id,
                        op_code: vector.request.op_code,
                        address: vector.request.address,
                        expected: vector.expected,
                        actual,
                    },
                };
                if !outcome.passed {
                    warn!(test = outcome.test_number, context = %outcome.context, "test failed");
                }
                outcome
            })
            .collect();

        let report = HarnessReport {
            outcomes,
            config_failures: Vec::new(),
        };
        let summary = report.summary();
        info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            "replay finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigWrite, RequestVector, ValidationHarness};
    use crate::codec::encode_hex;
    use crate::matcher::AccessRequest;
    use crate::{Dimensions, Firewall, FirewallError, RuleWord, RwxCode};

    fn dims() -> Dimensions {
        Dimensions::derive(8, 16).unwrap()
    }

    fn write(index: usize, hex: &str) -> ConfigWrite {
        ConfigWrite {
            index,
            word: RuleWord::from_bits(&dims(), encode_hex(hex, 16).unwrap()).unwrap(),
        }
    }

    fn vector(master_id: u64, op_code: u8, address: u64, expected: bool) -> RequestVector {
        RequestVector {
            request: AccessRequest {
                master_id,
                op_code: RwxCode::from_bits(op_code),
                address,
            },
            expected,
        }
    }

    fn scripted_requests() -> Vec<RequestVector> {
        vec![
            vector(2, 0b100, 3, true),
            vector(2, 0b100, 4, true),
            vector(3, 0b100, 3, false),
        ]
    }

    #[test]
    fn wrong_expectation_is_the_only_failure() {
        let mut harness = ValidationHarness::new(dims());
        assert!(harness.configure(&[write(0, "5004")]).is_empty());

        let report = harness.run(&scripted_requests());
        assert_eq!(report.total(), 3);
        assert_eq!(report.failed_test_numbers(), vec![2]);
        assert!(!report.all_passed());

        let failure = report.failures().next().unwrap();
        assert_eq!(failure.context.master_id, 2);
        assert_eq!(failure.context.address, 4);
        assert!(failure.context.expected);
        assert!(!failure.context.actual);
    }

    #[test]
    fn refused_write_is_reported_and_others_still_apply() {
        let mut harness = ValidationHarness::new(dims());
        let failures = harness.configure(&[write(9, "FFFF"), write(0, "5004")]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].position, 0);
        assert_eq!(
            failures[0].error,
            FirewallError::IndexOutOfRange { index: 9, depth: 8 }
        );

        let report = harness.run(&[vector(2, 0b100, 1, true)]);
        assert_eq!(report.summary().passed, 1);
        assert_eq!(report.config_failures().len(), 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn configure_starts_from_a_fresh_table() {
        let mut harness = ValidationHarness::new(dims());
        harness.configure(&[write(0, "5004")]);
        harness.configure(&[]);
        assert!(harness.snapshot().slots().iter().all(RuleWord::is_zero));
    }

    #[test]
    fn suites_get_independent_reports() {
        let mut harness = ValidationHarness::new(dims());
        harness.configure(&[write(0, "5004")]);

        let suites = vec![scripted_requests(), vec![vector(2, 0b100, 0, true)]];
        let reports = harness.run_suites(&suites);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].failed_test_numbers(), vec![2]);
        assert!(reports[1].all_passed());
    }

    #[test]
    fn replay_denies_everything_on_a_configuring_firewall() {
        let mut firewall = Firewall::new(dims());
        firewall.begin_configuration();
        firewall.write_rule(0, write(0, "5004").word).unwrap();

        let report = ValidationHarness::replay(&firewall, &scripted_requests());
        assert_eq!(report.failed_test_numbers(), vec![1, 2]);
    }

    #[test]
    fn report_renders_failures_and_summary() {
        let mut harness = ValidationHarness::new(dims());
        harness.configure(&[write(0, "5004")]);
        let rendered = harness.run(&scripted_requests()).to_string();
        assert!(rendered.contains("test 2 FAILED: read by master 2 at 4 (op 100): expected 1, got 0"));
        assert!(rendered.ends_with("3 tests, 2 passed, 1 failed"));
    }
}
