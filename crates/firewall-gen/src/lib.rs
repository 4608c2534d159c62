//! AXI firewall generator library: input loaders, VHDL emitters and report rendering.

use tracing_subscriber as _;

/// Structured load and generator error types.
pub mod errors;
/// VHDL emission for the rule memory, matcher wrapper and AXI interface.
pub mod hdl;
/// Writing generated files to disk.
pub mod output;
/// Failure log and summary rendering.
pub mod report;
/// Request file parsing.
pub mod request_format;
/// Rule file parsing.
pub mod rule_format;
/// Record extraction from line-oriented input files.
pub mod source;
/// VHDL test-bench emission.
pub mod testbench;
