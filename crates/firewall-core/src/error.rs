use thiserror::Error;

/// Reason a `(depth, word_width)` pair cannot produce a consistent field split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DimensionError {
    /// The rule table must hold at least one slot.
    #[error("table depth must be at least 1")]
    ZeroDepth,
    /// The depth cannot be indexed by any representable id field.
    #[error("table depth {depth} is too large to index")]
    DepthTooLarge {
        /// Requested depth.
        depth: usize,
    },
    /// Codec widths are limited to `1..=128` bits.
    #[error("field width {width} is outside 1..=128 bits")]
    UnsupportedWidth {
        /// Requested width.
        width: u32,
    },
    /// No room left for two non-empty address fields.
    #[error("word width {word_width} leaves no address bits after a {id_width}-bit id and the 3-bit rwx code")]
    NoAddressBits {
        /// Requested word width.
        word_width: u32,
        /// Derived id width.
        id_width: u32,
    },
    /// The rounded-up address fields do not fit in the word.
    #[error("word width {word_width} cannot hold id({id_width}) + rwx(3) + 2 x addr({addr_width}) bits")]
    FieldOverflow {
        /// Requested word width.
        word_width: u32,
        /// Derived id width.
        id_width: u32,
        /// Derived address width.
        addr_width: u32,
    },
}

/// Error taxonomy for rule-table construction, configuration and literal decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FirewallError {
    /// Dimensions cannot be derived; the system cannot be built.
    #[error("invalid dimension: {0}")]
    InvalidDimension(#[from] DimensionError),
    /// Configuration write targeted a slot past the end of the table.
    #[error("rule index {index} is out of range for a table of depth {depth}")]
    IndexOutOfRange {
        /// Requested slot.
        index: usize,
        /// Table depth.
        depth: usize,
    },
    /// A hexadecimal, op-code or response literal failed to parse.
    #[error("malformed literal '{literal}': {reason}")]
    MalformedLiteral {
        /// Offending text.
        literal: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A rule word built for different dimensions was offered to a table.
    #[error("rule word is {actual} bits wide, table expects {expected}")]
    WidthMismatch {
        /// Table word width.
        expected: u32,
        /// Offered word width.
        actual: u32,
    },
    /// A rule write was attempted while the configuration enable was deasserted.
    #[error("rule write rejected: configuration mode is not engaged")]
    ConfigurationDisabled,
}

impl FirewallError {
    /// Builds a [`FirewallError::MalformedLiteral`] from any displayable reason.
    #[must_use]
    pub fn malformed(literal: &str, reason: impl Into<String>) -> Self {
        Self::MalformedLiteral {
            literal: literal.to_string(),
            reason: reason.into(),
        }
    }

    /// Per-record errors leave the rest of the run intact; dimension errors do not.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidDimension(_))
    }
}
