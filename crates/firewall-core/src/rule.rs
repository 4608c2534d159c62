//! Rule-word packing.
//!
//! Bit layout, most significant first:
//! `[MasterID:id_width][RWX:3][AddrMin:addr_width][AddrMax:addr_width][pad]`

use std::fmt;

use crate::codec::{mask, BitString};
use crate::{Dimensions, FirewallError};

/// Three-bit operation code: bit 2 = read, bit 1 = write, bit 0 = enable qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RwxCode(u8);

impl RwxCode {
    const READ: u8 = 0b100;
    const WRITE: u8 = 0b010;
    const ENABLE: u8 = 0b001;

    /// Keeps the low three bits of `bits`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Read code `10e` with the given enable qualifier.
    #[must_use]
    pub const fn read(enable: bool) -> Self {
        Self(Self::READ | enable as u8)
    }

    /// Write code `01e` with the given enable qualifier.
    #[must_use]
    pub const fn write(enable: bool) -> Self {
        Self(Self::WRITE | enable as u8)
    }

    /// Raw three-bit value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Bit 2.
    #[must_use]
    pub const fn read_flag(self) -> bool {
        self.0 & Self::READ != 0
    }

    /// Bit 1.
    #[must_use]
    pub const fn write_flag(self) -> bool {
        self.0 & Self::WRITE != 0
    }

    /// Bit 0.
    #[must_use]
    pub const fn enable(self) -> bool {
        self.0 & Self::ENABLE != 0
    }
}

impl fmt::Display for RwxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03b}", self.0)
    }
}

/// Decoded view of one rule word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RuleFields {
    /// Master allowed by this rule.
    pub master_id: u64,
    /// Operation code the request must present.
    pub rwx: RwxCode,
    /// Inclusive lower address bound.
    pub addr_min: u64,
    /// Exclusive upper address bound.
    pub addr_max: u64,
}

impl RuleFields {
    /// True when `address` lies in `[addr_min, addr_max)`. Inverted bounds match nothing.
    #[must_use]
    pub const fn covers(&self, address: u64) -> bool {
        address >= self.addr_min && address < self.addr_max
    }
}

/// One packed rule word, exactly `word_width` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RuleWord(BitString);

impl RuleWord {
    /// The all-zero word every slot holds after reset.
    #[must_use]
    pub const fn zero(dims: &Dimensions) -> Self {
        Self(BitString::from_parts(0, dims.word_width()))
    }

    /// Wraps an already encoded bit string.
    ///
    /// # Errors
    ///
    /// Returns [`FirewallError::WidthMismatch`] when `bits` is not `word_width` wide.
    pub fn from_bits(dims: &Dimensions, bits: BitString) -> Result<Self, FirewallError> {
        if bits.width() == dims.word_width() {
            Ok(Self(bits))
        } else {
            Err(FirewallError::WidthMismatch {
                expected: dims.word_width(),
                actual: bits.width(),
            })
        }
    }

    /// Packs fields into a word; each field keeps only its low `width` bits.
    #[must_use]
    pub const fn pack(dims: &Dimensions, fields: &RuleFields) -> Self {
        let layout = dims.layout();
        let word = layout.id.place(fields.master_id as u128)
            | layout.rwx.place(fields.rwx.bits() as u128)
            | layout.addr_min.place(fields.addr_min as u128)
            | layout.addr_max.place(fields.addr_max as u128);
        Self(BitString::from_parts(word, dims.word_width()))
    }

    /// Slices the word back into its fields.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn unpack(&self, dims: &Dimensions) -> RuleFields {
        let layout = dims.layout();
        let word = self.0.value();
        // id and address fields are at most 64 bits wide for any valid dimensions
        RuleFields {
            master_id: layout.id.extract(word) as u64,
            rwx: RwxCode::from_bits(layout.rwx.extract(word) as u8),
            addr_min: layout.addr_min.extract(word) as u64,
            addr_max: layout.addr_max.extract(word) as u64,
        }
    }

    /// Underlying bit string.
    #[must_use]
    pub const fn bits(&self) -> &BitString {
        &self.0
    }

    /// Word width in bits.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.0.width()
    }

    /// True for the reset value.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for RuleWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Truncates a request field to `width` bits, matching the hardware port width.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn truncate_field(value: u64, width: u32) -> u64 {
    (value as u128 & mask(width)) as u64
}
