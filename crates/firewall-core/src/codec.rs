//! Fixed-width unsigned bit strings.
//!
//! Values wider than the target width keep only their least-significant bits;
//! this silent wrap is part of the encoding contract, not an error. Nothing in
//! the firewall is signed.

use std::fmt;
use std::str::FromStr;

use crate::dims::MAX_WORD_WIDTH;
use crate::{DimensionError, FirewallError};

/// All-ones mask for the low `width` bits.
#[must_use]
pub const fn mask(width: u32) -> u128 {
    if width >= u128::BITS {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// An unsigned value held in exactly `width` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BitString {
    value: u128,
    width: u32,
}

impl BitString {
    /// All-zero bit string of `width` bits.
    ///
    /// # Errors
    ///
    /// Returns [`FirewallError::InvalidDimension`] when `width` is outside `1..=128`.
    pub fn zero(width: u32) -> Result<Self, FirewallError> {
        encode_unsigned(0, width)
    }

    /// Builds a bit string without range checks. `width` must already be valid.
    pub(crate) const fn from_parts(value: u128, width: u32) -> Self {
        Self {
            value: value & mask(width),
            width,
        }
    }

    /// Decoded unsigned value.
    #[must_use]
    pub const fn value(&self) -> u128 {
        self.value
    }

    /// Number of bits.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Bit `index`, counting from the least-significant bit.
    #[must_use]
    pub const fn bit(&self, index: u32) -> bool {
        index < self.width && (self.value >> index) & 1 == 1
    }

    /// True when every bit is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in (0..self.width).rev() {
            f.write_str(if self.bit(index) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for BitString {
    type Err = FirewallError;

    /// Parses a `0`/`1` string; its length becomes the width.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let width = u32::try_from(text.len()).unwrap_or(u32::MAX);
        if text.is_empty() || width > MAX_WORD_WIDTH {
            return Err(FirewallError::malformed(
                text,
                format!("bit string must hold 1..={MAX_WORD_WIDTH} bits"),
            ));
        }

        let mut value = 0u128;
        for ch in text.chars() {
            let bit = match ch {
                '0' => 0,
                '1' => 1,
                other => {
                    return Err(FirewallError::malformed(
                        text,
                        format!("unexpected character '{other}'"),
                    ))
                }
            };
            value = (value << 1) | bit;
        }

        Ok(Self { value, width })
    }
}

fn check_width(width: u32) -> Result<(), FirewallError> {
    if width == 0 || width > MAX_WORD_WIDTH {
        Err(DimensionError::UnsupportedWidth { width }.into())
    } else {
        Ok(())
    }
}

/// Encodes `value` into `width` bits, zero-padding or keeping the low bits.
///
/// # Errors
///
/// Returns [`FirewallError::InvalidDimension`] when `width` is outside `1..=128`.
pub fn encode_unsigned(value: u128, width: u32) -> Result<BitString, FirewallError> {
    check_width(width)?;
    Ok(BitString::from_parts(value, width))
}

/// Parses a hexadecimal literal of any length and encodes it into `width` bits.
///
/// An optional `0x`/`0X` prefix and `_` separators are accepted. Literals
/// longer than 128 bits are still truncated exactly, digit by digit.
///
/// # Errors
///
/// Returns [`FirewallError::MalformedLiteral`] for empty text or a non-hex
/// digit, and [`FirewallError::InvalidDimension`] for an unsupported width.
pub fn encode_hex(text: &str, width: u32) -> Result<BitString, FirewallError> {
    check_width(width)?;

    let digits = strip_hex_prefix(text.trim());
    let field_mask = mask(width);
    let mut value = 0u128;
    let mut seen_digit = false;

    for ch in digits.chars() {
        if ch == '_' {
            continue;
        }
        let digit = ch
            .to_digit(16)
            .ok_or_else(|| FirewallError::malformed(text, format!("invalid hex digit '{ch}'")))?;
        value = ((value << 4) | u128::from(digit)) & field_mask;
        seen_digit = true;
    }

    if seen_digit {
        Ok(BitString::from_parts(value, width))
    } else {
        Err(FirewallError::malformed(text, "expected hexadecimal digits"))
    }
}

/// Standard unsigned binary decode.
#[must_use]
pub const fn decode_unsigned(bits: &BitString) -> u128 {
    bits.value
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}
