//! Request file parsing.
//!
//! Each record is four whitespace-separated fields:
//! ```text
//! <master id hex> <op code hex> <address hex> <expected 0|1>
//! ```
//! The master id and address wrap to the port widths; the op code keeps its
//! low three bits. Fields past the fourth are ignored.

use std::path::Path;

use firewall_core::{
    encode_hex, truncate_field, AccessRequest, Dimensions, FirewallError, RequestVector, RwxCode,
    RWX_WIDTH,
};

use crate::errors::{GenError, LoadError, LoadErrorKind, Loaded};
use crate::source::{read_records, SourceLine};

const FIELD_NAMES: [&str; 4] = ["master id", "op code", "address", "expected"];

/// Parses request records against `dims`.
#[must_use]
pub fn parse_requests(lines: &[SourceLine], dims: &Dimensions) -> Loaded<RequestVector> {
    let mut loaded = Loaded::default();

    for line in lines {
        match parse_request(&line.text, dims) {
            Ok(vector) => loaded.records.push(vector),
            Err(kind) => loaded.errors.push(LoadError::new(line.original_line, kind)),
        }
    }

    loaded
}

/// Reads and parses a request file.
///
/// # Errors
///
/// Returns [`GenError::Io`] when the file cannot be read. Record errors are
/// collected in the returned [`Loaded`].
pub fn load_requests(path: &Path, dims: &Dimensions) -> Result<Loaded<RequestVector>, GenError> {
    Ok(parse_requests(&read_records(path)?, dims))
}

fn parse_request(text: &str, dims: &Dimensions) -> Result<RequestVector, LoadErrorKind> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    let &[master_id, op_code, address, expected, ..] = fields.as_slice() else {
        return Err(LoadErrorKind::MissingField {
            field: FIELD_NAMES[fields.len().min(3)],
            found: fields.len(),
        });
    };

    let op_bits = encode_hex(op_code, RWX_WIDTH)?;
    let op_code = RwxCode::from_bits(u8::try_from(op_bits.value()).unwrap_or_default());

    Ok(RequestVector {
        request: AccessRequest {
            master_id: parse_field(master_id, dims.id_width())?,
            op_code,
            address: parse_field(address, dims.addr_width())?,
        },
        expected: parse_response_bit(expected)?,
    })
}

fn parse_field(text: &str, width: u32) -> Result<u64, FirewallError> {
    let bits = encode_hex(text, u64::BITS)?;
    let value = u64::try_from(bits.value())
        .map_err(|_| FirewallError::malformed(text, "does not fit in 64 bits"))?;
    Ok(truncate_field(value, width))
}

fn parse_response_bit(text: &str) -> Result<bool, FirewallError> {
    match text {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(FirewallError::malformed(text, "expected response must be 0 or 1")),
    }
}
