use crate::dims::{DEFAULT_DEPTH, DEFAULT_WORD_WIDTH};
use crate::{Dimensions, FirewallError};

/// Construction-time firewall parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FirewallConfig {
    /// Number of rule slots.
    pub depth: usize,
    /// Bits per rule word and per data path.
    pub word_width: u32,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            word_width: DEFAULT_WORD_WIDTH,
        }
    }
}

impl FirewallConfig {
    /// Runs the width derivation for these parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FirewallError::InvalidDimension`] when the pair is inconsistent.
    pub fn dimensions(&self) -> Result<Dimensions, FirewallError> {
        Dimensions::derive(self.depth, self.word_width)
    }
}
