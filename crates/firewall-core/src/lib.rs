//! Rule encoding, access matching and differential validation for an AXI bus firewall.

mod error;
pub use error::{DimensionError, FirewallError};

/// Field-width derivation and rule-word bit layout.
pub mod dims;
pub use dims::{
    addr_width_for, id_width_for, BitRange, Dimensions, FieldLayout, DEFAULT_DEPTH,
    DEFAULT_WORD_WIDTH, MAX_WORD_WIDTH, RWX_WIDTH,
};

/// Fixed-width unsigned codec.
pub mod codec;
pub use codec::{decode_unsigned, encode_hex, encode_unsigned, BitString};

/// Rule-word packing and the rwx code.
pub mod rule;
pub use rule::{truncate_field, RuleFields, RuleWord, RwxCode};

/// Rule storage.
pub mod table;
pub use table::{RuleTable, TableSnapshot};

/// Access decision algorithm.
pub mod matcher;
pub use matcher::{
    evaluate, AccessDecision, AccessMatcher, AccessRequest, Operation, PortRequest,
};

/// Configuration-gated firewall device.
pub mod firewall;
pub use firewall::Firewall;

/// Construction parameters.
pub mod config;
pub use config::FirewallConfig;

/// Request replay and pass/fail reporting.
pub mod harness;
pub use harness::{
    ConfigFailure, ConfigWrite, HarnessReport, HarnessSummary, RequestVector, TestContext,
    TestOutcome, ValidationHarness,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
