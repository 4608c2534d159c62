//! Rule file parsing: one hexadecimal rule word per record.
//!
//! The k-th record (counting non-blank, non-comment lines from zero)
//! configures slot k. A record that fails to parse still consumes its slot
//! number, so dropping it leaves that slot zeroed instead of shifting the
//! rules after it.

use std::path::Path;

use firewall_core::{encode_hex, ConfigWrite, Dimensions, FirewallError, RuleWord};

use crate::errors::{GenError, LoadError, Loaded};
use crate::source::{read_records, SourceLine};

/// Parses rule records against `dims`.
#[must_use]
pub fn parse_rules(lines: &[SourceLine], dims: &Dimensions) -> Loaded<ConfigWrite> {
    let mut loaded = Loaded::default();

    for (index, line) in lines.iter().enumerate() {
        match parse_rule_word(&line.text, dims) {
            Ok(word) => loaded.records.push(ConfigWrite { index, word }),
            Err(kind) => loaded
                .errors
                .push(LoadError::new(line.original_line, kind.into())),
        }
    }

    loaded
}

/// Reads and parses a rule file.
///
/// # Errors
///
/// Returns [`GenError::Io`] when the file cannot be read. Record errors are
/// collected in the returned [`Loaded`].
pub fn load_rules(path: &Path, dims: &Dimensions) -> Result<Loaded<ConfigWrite>, GenError> {
    Ok(parse_rules(&read_records(path)?, dims))
}

fn parse_rule_word(text: &str, dims: &Dimensions) -> Result<RuleWord, FirewallError> {
    let bits = encode_hex(text, dims.word_width())?;
    RuleWord::from_bits(dims, bits)
}
