//! Firewall device model: published rules plus an optional staging table.
//!
//! Rule writes land in the staging table while configuration mode is engaged
//! and become visible to evaluation only when [`Firewall::end_configuration`]
//! publishes them in one step. While engaged, both ports are denied.

use tracing::debug;

use crate::matcher::{evaluate, AccessDecision, AccessMatcher, PortRequest};
use crate::{Dimensions, FirewallConfig, FirewallError, RuleTable, RuleWord, TableSnapshot};

/// A rule table guarding one read port and one write port.
#[derive(Debug, Clone)]
pub struct Firewall {
    dims: Dimensions,
    active: TableSnapshot,
    staging: Option<RuleTable>,
}

impl Firewall {
    /// Creates a firewall with every slot zeroed and configuration mode off.
    #[must_use]
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            active: TableSnapshot::zeroed(dims),
            staging: None,
        }
    }

    /// Derives dimensions from `config` and builds a firewall.
    ///
    /// # Errors
    ///
    /// Returns [`FirewallError::InvalidDimension`] when the configured
    /// dimensions cannot be derived.
    pub fn from_config(config: &FirewallConfig) -> Result<Self, FirewallError> {
        Ok(Self::new(config.dimensions()?))
    }

    /// Table dimensions.
    #[must_use]
    pub const fn dims(&self) -> &Dimensions {
        &self.dims
    }

    /// True while rule writes are accepted and evaluation is blocked.
    #[must_use]
    pub const fn is_configuring(&self) -> bool {
        self.staging.is_some()
    }

    /// Engages configuration mode, staging a copy of the published rules.
    ///
    /// Calling this again while already engaged keeps the staged writes.
    pub fn begin_configuration(&mut self) {
        if self.staging.is_none() {
            self.staging = Some(RuleTable::from_snapshot(&self.active));
            debug!("configuration mode engaged");
        }
    }

    /// Stages one rule write.
    ///
    /// # Errors
    ///
    /// Returns [`FirewallError::ConfigurationDisabled`] outside configuration
    /// mode, otherwise whatever [`RuleTable::write_rule`] reports.
    pub fn write_rule(&mut self, index: usize, word: RuleWord) -> Result<(), FirewallError> {
        self.staging
            .as_mut()
            .ok_or(FirewallError::ConfigurationDisabled)?
            .write_rule(index, word)
    }

    /// Publishes the staged table and leaves configuration mode.
    ///
    /// Does nothing when configuration mode is not engaged.
    pub fn end_configuration(&mut self) {
        if let Some(staged) = self.staging.take() {
            self.active = staged.snapshot();
            debug!("configuration published");
        }
    }

    /// Zeroes every slot, published and staged.
    pub fn reset(&mut self) {
        self.active = TableSnapshot::zeroed(self.dims);
        if let Some(staged) = self.staging.as_mut() {
            staged.reset();
        }
        debug!("firewall reset");
    }

    /// The currently published rules.
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        self.active.clone()
    }

    /// Evaluates one write and one read request against the published rules.
    #[must_use]
    pub fn evaluate(&self, write: &PortRequest, read: &PortRequest) -> AccessDecision {
        if self.is_configuring() {
            AccessDecision::DENY_ALL
        } else {
            evaluate(&self.active, write, read)
        }
    }
}

impl AccessMatcher for Firewall {
    fn decide(&self, write: &PortRequest, read: &PortRequest) -> AccessDecision {
        self.evaluate(write, read)
    }
}

#[cfg(test)]
mod tests {
    use super::Firewall;
    use crate::matcher::{AccessDecision, PortRequest};
    use crate::{Dimensions, FirewallConfig, FirewallError, RuleFields, RuleWord, RwxCode};

    fn dims() -> Dimensions {
        Dimensions::derive(8, 16).unwrap()
    }

    fn read_rule() -> RuleWord {
        RuleWord::pack(
            &dims(),
            &RuleFields {
                master_id: 2,
                rwx: RwxCode::read(false),
                addr_min: 0,
                addr_max: 4,
            },
        )
    }

    fn read_port(address: u64) -> PortRequest {
        PortRequest {
            master_id: 2,
            enable: false,
            address,
        }
    }

    #[test]
    fn writes_need_configuration_mode() {
        let mut firewall = Firewall::new(dims());
        assert_eq!(
            firewall.write_rule(0, read_rule()),
            Err(FirewallError::ConfigurationDisabled)
        );
        assert!(firewall.snapshot().slots().iter().all(RuleWord::is_zero));
    }

    #[test]
    fn evaluation_is_denied_while_configuring() {
        let mut firewall = Firewall::new(dims());
        firewall.begin_configuration();
        firewall.write_rule(0, read_rule()).unwrap();
        assert!(firewall.is_configuring());
        assert_eq!(
            firewall.evaluate(&PortRequest::default(), &read_port(3)),
            AccessDecision::DENY_ALL
        );

        firewall.end_configuration();
        assert!(!firewall.is_configuring());
        assert!(
            firewall
                .evaluate(&PortRequest::default(), &read_port(3))
                .read_granted
        );
    }

    #[test]
    fn staged_writes_are_invisible_until_published() {
        let mut firewall = Firewall::new(dims());
        firewall.begin_configuration();
        firewall.write_rule(0, read_rule()).unwrap();
        assert!(firewall.snapshot().get(0).unwrap().is_zero());

        firewall.end_configuration();
        assert_eq!(firewall.snapshot().get(0), Some(&read_rule()));
    }

    #[test]
    fn reconfiguration_starts_from_published_rules() {
        let mut firewall = Firewall::new(dims());
        firewall.begin_configuration();
        firewall.write_rule(0, read_rule()).unwrap();
        firewall.end_configuration();

        firewall.begin_configuration();
        firewall.write_rule(1, read_rule()).unwrap();
        firewall.end_configuration();

        let snapshot = firewall.snapshot();
        assert_eq!(snapshot.get(0), Some(&read_rule()));
        assert_eq!(snapshot.get(1), Some(&read_rule()));
    }

    #[test]
    fn reset_clears_published_and_staged_rules() {
        let mut firewall = Firewall::new(dims());
        firewall.begin_configuration();
        firewall.write_rule(0, read_rule()).unwrap();
        firewall.end_configuration();

        firewall.begin_configuration();
        firewall.write_rule(1, read_rule()).unwrap();
        firewall.reset();
        firewall.end_configuration();

        assert!(firewall.snapshot().slots().iter().all(RuleWord::is_zero));
    }

    #[test]
    fn rejected_write_keeps_other_staged_slots() {
        let mut firewall = Firewall::new(dims());
        firewall.begin_configuration();
        firewall.write_rule(0, read_rule()).unwrap();
        assert_eq!(
            firewall.write_rule(8, read_rule()),
            Err(FirewallError::IndexOutOfRange { index: 8, depth: 8 })
        );
        firewall.end_configuration();
        assert_eq!(firewall.snapshot().get(0), Some(&read_rule()));
    }

    #[test]
    fn builds_from_default_config() {
        let firewall = Firewall::from_config(&FirewallConfig::default()).unwrap();
        assert_eq!(*firewall.dims(), dims());
        assert_eq!(firewall.snapshot().len(), 8);
    }
}
