//! Record extraction for the flat rule and request files.
//!
//! Everything after `#` on a line is a comment. Lines that are blank after
//! comment stripping are dropped; the rest keep their original line number.

use std::fs;
use std::path::Path;

use crate::errors::GenError;

/// One non-blank record with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Record text with comments and surrounding whitespace removed.
    pub text: String,
    /// 1-indexed line number in the original file.
    pub original_line: usize,
}

/// Splits file content into records.
#[must_use]
pub fn extract_records(content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let text = strip_comment(line).trim();
            (!text.is_empty()).then(|| SourceLine {
                text: text.to_string(),
                original_line: idx + 1,
            })
        })
        .collect()
}

/// Reads `path` and splits it into records.
///
/// # Errors
///
/// Returns [`GenError::Io`] when the file cannot be read.
pub fn read_records(path: &Path) -> Result<Vec<SourceLine>, GenError> {
    let content = fs::read_to_string(path).map_err(|e| GenError::io(path, &e))?;
    Ok(extract_records(&content))
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before)
}

#[cfg(test)]
mod tests {
    use super::{extract_records, SourceLine};

    #[test]
    fn comments_and_blank_lines_are_dropped() {
        let content = "# header\n5004\n\n   \n4804 # trailing\n#only\n";
        assert_eq!(
            extract_records(content),
            vec![
                SourceLine {
                    text: "5004".to_string(),
                    original_line: 2,
                },
                SourceLine {
                    text: "4804".to_string(),
                    original_line: 5,
                },
            ]
        );
    }

    #[test]
    fn crlf_line_endings_are_trimmed() {
        let records = extract_records("2 4 3 1\r\n");
        assert_eq!(records[0].text, "2 4 3 1");
    }

    #[test]
    fn empty_content_has_no_records() {
        assert!(extract_records("").is_empty());
        assert!(extract_records("\n\n# nothing\n").is_empty());
    }
}
