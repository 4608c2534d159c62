//! Width derivation shared by every consumer of the rule-word layout.
//!
//! The table, the matcher, the validation harness and both HDL emitters all
//! take their field widths from [`Dimensions::derive`]. Nothing else computes
//! `id_width` or `addr_width`.

use crate::{DimensionError, FirewallError};

/// Width of the read/write/enable code carried by every rule word.
pub const RWX_WIDTH: u32 = 3;
/// Widest word the codec can represent.
pub const MAX_WORD_WIDTH: u32 = u128::BITS;
/// Default number of rule slots.
pub const DEFAULT_DEPTH: usize = 8;
/// Default rule-word width in bits.
pub const DEFAULT_WORD_WIDTH: u32 = 16;

/// Field widths derived from a table depth and word width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Dimensions {
    depth: usize,
    word_width: u32,
    id_width: u32,
    addr_width: u32,
}

impl Dimensions {
    /// Derives `(id_width, rwx_width, addr_width)` for a table.
    ///
    /// # Errors
    ///
    /// Returns [`FirewallError::InvalidDimension`] when `depth` is zero or too
    /// large to index, when `word_width` is outside `1..=128`, when no address
    /// bits remain, or when the rounded-up address fields overflow the word.
    pub fn derive(depth: usize, word_width: u32) -> Result<Self, FirewallError> {
        let id_width = id_width_for(depth)?;

        if word_width == 0 || word_width > MAX_WORD_WIDTH {
            return Err(DimensionError::UnsupportedWidth { width: word_width }.into());
        }

        let addr_width = addr_width_for(word_width, id_width).ok_or(
            DimensionError::NoAddressBits {
                word_width,
                id_width,
            },
        )?;

        if id_width + RWX_WIDTH + 2 * addr_width > word_width {
            return Err(DimensionError::FieldOverflow {
                word_width,
                id_width,
                addr_width,
            }
            .into());
        }

        Ok(Self {
            depth,
            word_width,
            id_width,
            addr_width,
        })
    }

    /// Number of rule slots.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Bits per rule word.
    #[must_use]
    pub const fn word_width(&self) -> u32 {
        self.word_width
    }

    /// Bits in the master-id field.
    #[must_use]
    pub const fn id_width(&self) -> u32 {
        self.id_width
    }

    /// Bits in the rwx field; always [`RWX_WIDTH`].
    #[must_use]
    pub const fn rwx_width(&self) -> u32 {
        RWX_WIDTH
    }

    /// Bits in each of the two address-bound fields.
    #[must_use]
    pub const fn addr_width(&self) -> u32 {
        self.addr_width
    }

    /// Unused least-significant bits below the address-max field.
    #[must_use]
    pub const fn padding_width(&self) -> u32 {
        self.word_width - self.id_width - RWX_WIDTH - 2 * self.addr_width
    }

    /// Bit positions of every field inside a rule word.
    #[must_use]
    pub const fn layout(&self) -> FieldLayout {
        let addr_max_lsb = self.padding_width();
        let addr_min_lsb = addr_max_lsb + self.addr_width;
        let rwx_lsb = addr_min_lsb + self.addr_width;
        let id_lsb = rwx_lsb + RWX_WIDTH;

        FieldLayout {
            id: BitRange::new(id_lsb, self.id_width),
            rwx: BitRange::new(rwx_lsb, RWX_WIDTH),
            addr_min: BitRange::new(addr_min_lsb, self.addr_width),
            addr_max: BitRange::new(addr_max_lsb, self.addr_width),
        }
    }
}

/// `ceil(log2(depth))`, the bits needed to index `depth` slots.
///
/// # Errors
///
/// Returns [`FirewallError::InvalidDimension`] for a zero depth or a depth
/// whose next power of two overflows `usize`.
pub fn id_width_for(depth: usize) -> Result<u32, FirewallError> {
    if depth == 0 {
        return Err(DimensionError::ZeroDepth.into());
    }

    depth
        .checked_next_power_of_two()
        .map(usize::trailing_zeros)
        .ok_or_else(|| DimensionError::DepthTooLarge { depth }.into())
}

/// `ceil((word_width - id_width - 3) / 2)`, or `None` when that is not positive.
#[must_use]
pub const fn addr_width_for(word_width: u32, id_width: u32) -> Option<u32> {
    match word_width.checked_sub(id_width + RWX_WIDTH) {
        Some(remaining) if remaining > 0 => Some(remaining.div_ceil(2)),
        _ => None,
    }
}

/// Inclusive bit range `msb..=lsb` of one rule-word field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitRange {
    /// Least-significant bit position.
    pub lsb: u32,
    /// Field width in bits.
    pub width: u32,
}

impl BitRange {
    const fn new(lsb: u32, width: u32) -> Self {
        Self { lsb, width }
    }

    /// Most-significant bit position; equals `lsb` for one-bit fields.
    ///
    /// Zero-width fields report `lsb`, callers check [`BitRange::is_empty`].
    #[must_use]
    pub const fn msb(&self) -> u32 {
        if self.width == 0 {
            self.lsb
        } else {
            self.lsb + self.width - 1
        }
    }

    /// True for a zero-width field (a single-slot table has no id bits).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0
    }

    /// Extracts this field from a packed word.
    #[must_use]
    pub const fn extract(&self, word: u128) -> u128 {
        if self.width == 0 {
            return 0;
        }
        (word >> self.lsb) & crate::codec::mask(self.width)
    }

    /// Places `value` into this field, dropping bits above the field width.
    #[must_use]
    pub const fn place(&self, value: u128) -> u128 {
        if self.width == 0 {
            return 0;
        }
        (value & crate::codec::mask(self.width)) << self.lsb
    }
}

/// Positions of the four rule-word fields, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldLayout {
    /// Master-id field.
    pub id: BitRange,
    /// Read/write/enable code.
    pub rwx: BitRange,
    /// Inclusive lower address bound.
    pub addr_min: BitRange,
    /// Exclusive upper address bound.
    pub addr_max: BitRange,
}
