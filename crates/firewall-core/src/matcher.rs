//! Access decision over a rule table.
//!
//! Every slot is checked against both ports and the results are OR-ed
//! together. Slot order therefore never changes a decision: one matching rule
//! anywhere in the table grants the access. There is no deny rule, no
//! priority and no conflict detection; the table is an allow-list union.

use std::fmt;

use crate::rule::truncate_field;
use crate::{Dimensions, RuleFields, RwxCode, TableSnapshot};

/// Direction of a bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operation {
    /// Read channel.
    Read,
    /// Write channel.
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// What one channel presents to the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PortRequest {
    /// Requesting master.
    pub master_id: u64,
    /// Enable qualifier echoed into the rwx comparison.
    pub enable: bool,
    /// Target address.
    pub address: u64,
}

/// A single request as it appears in a request log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AccessRequest {
    /// Requesting master.
    pub master_id: u64,
    /// Three-bit op code; bit 2 selects read, bit 0 is the enable qualifier.
    pub op_code: RwxCode,
    /// Target address.
    pub address: u64,
}

impl AccessRequest {
    /// Read when bit 2 of the op code is set, write otherwise.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        if self.op_code.read_flag() {
            Operation::Read
        } else {
            Operation::Write
        }
    }

    /// The channel view of this request.
    #[must_use]
    pub const fn port(&self) -> PortRequest {
        PortRequest {
            master_id: self.master_id,
            enable: self.op_code.enable(),
            address: self.address,
        }
    }
}

/// Grant bits for both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AccessDecision {
    /// Write channel granted.
    pub write_granted: bool,
    /// Read channel granted.
    pub read_granted: bool,
}

impl AccessDecision {
    /// Both channels denied.
    pub const DENY_ALL: Self = Self {
        write_granted: false,
        read_granted: false,
    };

    /// The bit relevant to `operation`.
    #[must_use]
    pub const fn granted(&self, operation: Operation) -> bool {
        match operation {
            Operation::Read => self.read_granted,
            Operation::Write => self.write_granted,
        }
    }
}

/// Anything that can answer read/write access requests.
pub trait AccessMatcher {
    /// Decides both channels at once.
    fn decide(&self, write: &PortRequest, read: &PortRequest) -> AccessDecision;

    /// Decides a single logged request and returns the bit for its channel.
    fn decide_request(&self, request: &AccessRequest) -> bool {
        let port = request.port();
        let operation = request.operation();
        let idle = PortRequest::default();
        let decision = match operation {
            Operation::Read => self.decide(&idle, &port),
            Operation::Write => self.decide(&port, &idle),
        };
        decision.granted(operation)
    }
}

impl AccessMatcher for TableSnapshot {
    fn decide(&self, write: &PortRequest, read: &PortRequest) -> AccessDecision {
        evaluate(self, write, read)
    }
}

/// Computes the grant bits for one write request and one read request.
///
/// Request fields wider than the table's id or address widths are truncated
/// first, like a fixed-width bus port would.
#[must_use]
pub fn evaluate(table: &TableSnapshot, write: &PortRequest, read: &PortRequest) -> AccessDecision {
    let dims = table.dims();
    let write = fit_port(dims, write);
    let read = fit_port(dims, read);
    let write_code = RwxCode::write(write.enable);
    let read_code = RwxCode::read(read.enable);

    let mut decision = AccessDecision::DENY_ALL;
    for word in table.slots() {
        let rule = word.unpack(dims);
        if rule_matches(&rule, write_code, &write) {
            decision.write_granted = true;
        }
        if rule_matches(&rule, read_code, &read) {
            decision.read_granted = true;
        }
    }
    decision
}

fn fit_port(dims: &Dimensions, port: &PortRequest) -> PortRequest {
    PortRequest {
        master_id: truncate_field(port.master_id, dims.id_width()),
        enable: port.enable,
        address: truncate_field(port.address, dims.addr_width()),
    }
}

const fn rule_matches(rule: &RuleFields, code: RwxCode, port: &PortRequest) -> bool {
    rule.master_id == port.master_id
        && rule.rwx.bits() == code.bits()
        && rule.covers(port.address)
}
