//! Rendering of harness results.
//!
//! The failure log uses the same five-line block per failed test that the
//! generated VHDL test bench writes to `test_bench.log`, so a native run and a
//! simulator run can be diffed directly.

use std::fmt::Write as _;

use firewall_core::{HarnessReport, Operation, TestContext};

/// Name of the master-id port the request drives.
#[must_use]
pub const fn master_port(operation: Operation) -> &'static str {
    match operation {
        Operation::Read => "MID_R",
        Operation::Write => "MID_W",
    }
}

/// Name of the AXI address port the request drives.
#[must_use]
pub const fn address_port(operation: Operation) -> &'static str {
    match operation {
        Operation::Read => "S_AXI_ARADDR",
        Operation::Write => "S_AXI_AWADDR",
    }
}

/// Lines written after the `ERROR : test number N FAILED` header.
#[must_use]
pub fn failure_context_lines(context: &TestContext) -> [String; 4] {
    let operation = context.operation();
    let expected = u8::from(context.expected);
    [
        format!("{} = {:X}", master_port(operation), context.master_id),
        format!("rwx = {:X}", context.op_code.bits()),
        format!("{} = {:X}", address_port(operation), context.address),
        format!("Expected {expected} but the test return {}", 1 - expected),
    ]
}

/// Header line for a failed test.
#[must_use]
pub fn failure_header(test_number: usize) -> String {
    format!("ERROR : test number {test_number} FAILED ")
}

/// Renders the failure log for a report; empty when every test passed.
#[must_use]
pub fn render_log(report: &HarnessReport) -> String {
    let mut log = String::new();
    for outcome in report.failures() {
        let _ = writeln!(log, "{}", failure_header(outcome.test_number));
        for line in failure_context_lines(&outcome.context) {
            let _ = writeln!(log, "{line}");
        }
    }
    log
}

/// Renders the console summary printed by `axi-firewall check`.
#[must_use]
pub fn render_summary(report: &HarnessReport) -> String {
    let summary = report.summary();
    format!(
        "Test Summary: {} passed, {} failed (total: {})",
        summary.passed, summary.failed, summary.total
    )
}
