use std::path::PathBuf;
use thiserror::Error;

/// Why a pattern/that/topic triple could not become a [`Category`](crate::Category).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pattern is empty")]
    EmptyPattern,

    #[error("reserved token '{token}' inside {field}")]
    ReservedToken { field: &'static str, token: String },

    #[error("unterminated wildcard in {field}: '{token}'")]
    UnterminatedWildcard { field: &'static str, token: String },

    #[error("path is missing the {separator} separator: '{path}'")]
    MissingSeparator { separator: &'static str, path: String },
}

/// A single interchange record that failed to parse.
///
/// Batch loaders report these per line and keep going unless told to abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct RecordError {
    /// 1-based line number within the batch (0 when parsed standalone).
    pub line: usize,
    pub reason: String,
}

impl RecordError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        RecordError { line: 0, reason: reason.into() }
    }

    pub(crate) fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid category: {0}")]
    Validation(#[from] ValidationError),

    #[error("malformed record at {0}")]
    Record(#[from] RecordError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether a batch may skip the offending item and continue.
    ///
    /// Record and validation failures are local to one category; I/O and
    /// configuration failures are not.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Record(_))
    }
}
