//! Error reporting for loaders, emitters and file output.
//!
//! Loader errors carry the 1-indexed line they came from and format like
//! compiler diagnostics:
//! ```text
//! request.txt:4: error: malformed literal 'G1': invalid hex digit 'G'
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use firewall_core::FirewallError;
use tracing::warn;

/// One rejected record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// 1-indexed line in the source file.
    pub line: usize,
    /// What was wrong with the record.
    pub kind: LoadErrorKind,
}

impl LoadError {
    /// Creates a load error for `line`.
    #[must_use]
    pub const fn new(line: usize, kind: LoadErrorKind) -> Self {
        Self { line, kind }
    }

    /// Formats the error with the file it came from.
    #[must_use]
    pub fn format_with_path(&self, path: &Path) -> String {
        format!("{}:{}: error: {}", path.display(), self.line, self.kind)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for LoadError {}

/// Classification of record errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// A literal failed to decode.
    Literal(FirewallError),
    /// A request record has fewer than four fields.
    MissingField {
        /// Name of the first absent field.
        field: &'static str,
        /// Number of fields present.
        found: usize,
    },
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(e) => write!(f, "{e}"),
            Self::MissingField { field, found } => {
                write!(f, "missing {field} field (found {found} of 4 fields)")
            }
        }
    }
}

impl From<FirewallError> for LoadErrorKind {
    fn from(e: FirewallError) -> Self {
        Self::Literal(e)
    }
}

/// What a loader does with records that fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Any malformed record fails the whole load.
    #[default]
    Abort,
    /// Malformed records are logged and dropped.
    Skip,
}

/// Records that parsed plus every record error, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    /// Successfully parsed records.
    pub records: Vec<T>,
    /// Rejected records.
    pub errors: Vec<LoadError>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> Loaded<T> {
    /// Returns true when every record parsed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Applies `policy` to the collected errors.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::Load`] with every record error when the policy is
    /// [`LoadPolicy::Abort`] and at least one record failed.
    pub fn resolve(self, policy: LoadPolicy, path: &Path) -> Result<Vec<T>, GenError> {
        if self.errors.is_empty() {
            return Ok(self.records);
        }

        match policy {
            LoadPolicy::Abort => Err(GenError::Load {
                path: path.to_path_buf(),
                errors: self.errors,
            }),
            LoadPolicy::Skip => {
                for error in &self.errors {
                    warn!(
                        path = %path.display(),
                        line = error.line,
                        error = %error.kind,
                        "skipping malformed record"
                    );
                }
                Ok(self.records)
            }
        }
    }
}

/// Failure of a generator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    /// Reading or writing a file failed.
    Io {
        /// File involved.
        path: PathBuf,
        /// OS error text.
        message: String,
    },
    /// Dimension derivation or rule placement failed.
    Firewall(FirewallError),
    /// One or more records in an input file were malformed.
    Load {
        /// Input file.
        path: PathBuf,
        /// Every rejected record.
        errors: Vec<LoadError>,
    },
}

impl GenError {
    /// Wraps an I/O error with the path it concerns.
    #[must_use]
    pub fn io(path: &Path, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }

    /// Formats the error for stderr output, one diagnostic per line.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        match self {
            Self::Load { path, errors } => errors
                .iter()
                .map(|e| e.format_with_path(path))
                .collect::<Vec<_>>()
                .join("\n"),
            other => format!("error: {other}"),
        }
    }
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Firewall(e) => write!(f, "{e}"),
            Self::Load { path, errors } => write!(
                f,
                "{}: {} malformed record(s)",
                path.display(),
                errors.len()
            ),
        }
    }
}

impl std::error::Error for GenError {}

impl From<FirewallError> for GenError {
    fn from(e: FirewallError) -> Self {
        Self::Firewall(e)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use firewall_core::FirewallError;

    use super::{GenError, LoadError, LoadErrorKind, LoadPolicy, Loaded};

    fn loaded_with_error() -> Loaded<u32> {
        Loaded {
            records: vec![7],
            errors: vec![LoadError::new(
                3,
                FirewallError::malformed("xyz", "invalid hex digit 'x'").into(),
            )],
        }
    }

    #[test]
    fn abort_policy_reports_every_error() {
        let result = loaded_with_error().resolve(LoadPolicy::Abort, Path::new("rules.txt"));
        let Err(GenError::Load { path, errors }) = result else {
            panic!("expected load error");
        };
        assert_eq!(path, Path::new("rules.txt"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
    }

    #[test]
    fn skip_policy_keeps_good_records() {
        let records = loaded_with_error()
            .resolve(LoadPolicy::Skip, Path::new("rules.txt"))
            .unwrap();
        assert_eq!(records, vec![7]);
    }

    #[test]
    fn clean_load_ignores_policy() {
        let loaded = Loaded {
            records: vec![1, 2],
            errors: Vec::new(),
        };
        assert!(loaded.is_clean());
        assert_eq!(
            loaded.resolve(LoadPolicy::Abort, Path::new("x")).unwrap(),
            vec![1, 2]
        );
    }

    #[test]
    fn stderr_format_names_file_and_line() {
        let error = GenError::Load {
            path: "request.txt".into(),
            errors: vec![LoadError::new(
                4,
                LoadErrorKind::MissingField {
                    field: "expected",
                    found: 3,
                },
            )],
        };
        assert_eq!(
            error.format_for_stderr(),
            "request.txt:4: error: missing expected field (found 3 of 4 fields)"
        );
    }
}
