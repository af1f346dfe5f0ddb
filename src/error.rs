//! Error taxonomy for configuration resolution, persistence and backups.
//!
//! Missing files are never errors. A present file that cannot be read or parsed
//! aborts resolution; validation problems are reported separately as
//! [`ValidationIssue`](crate::config::ValidationIssue)s and never appear here.

use crate::config::ConfigSource;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    IoError,
    ParseError,
    NotFound,
}

/// A file could not be read or written for a reason other than absence.
#[derive(Debug, Error)]
#[error("I/O error on {}: {source}", .path.display())]
pub struct IoError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl IoError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// A file exists but is not a well-formed configuration document.
#[derive(Debug, Clone, Error)]
#[error("failed to parse {}: {detail}", .path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub detail: String,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Failure to load a single present source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl LoadError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LoadError::Io(_) => ErrorCode::IoError,
            LoadError::Parse(_) => ErrorCode::ParseError,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Io(e) => &e.path,
            LoadError::Parse(e) => &e.path,
        }
    }
}

/// The first load failure of a resolve, tagged with the offending source.
#[derive(Debug, Error)]
#[error("cannot resolve configuration: {origin} failed: {cause}")]
pub struct ResolutionError {
    /// The lowest-ranked source that failed to load.
    pub origin: ConfigSource,
    #[source]
    pub cause: LoadError,
}

impl ResolutionError {
    pub fn code(&self) -> ErrorCode {
        self.cause.code()
    }
}

/// Backup ring failures. None of these invalidate an in-memory configuration.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("corrupt backup entry: {0}")]
    Corrupt(#[from] ParseError),
    #[error("no backup with sequence number {sequence}")]
    NotFound { sequence: u64 },
    #[error("backup sequence {sequence} cannot be advanced")]
    SequenceExhausted { sequence: u64 },
}

impl BackupError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BackupError::Io(_) => ErrorCode::IoError,
            BackupError::Corrupt(_) => ErrorCode::ParseError,
            BackupError::NotFound { .. } => ErrorCode::NotFound,
            BackupError::SequenceExhausted { .. } => ErrorCode::ParseError,
        }
    }
}

/// Structured error body for machine-readable CLI output.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl From<&ResolutionError> for ErrorReport {
    fn from(err: &ResolutionError) -> Self {
        ErrorReport::new(err.code(), err.to_string()).with_path(err.cause.path())
    }
}

impl From<&BackupError> for ErrorReport {
    fn from(err: &BackupError) -> Self {
        let report = ErrorReport::new(err.code(), err.to_string());
        match err {
            BackupError::Io(e) => report.with_path(&e.path),
            BackupError::Corrupt(e) => report.with_path(&e.path),
            BackupError::NotFound { .. } | BackupError::SequenceExhausted { .. } => report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::ParseError).unwrap();
        assert_eq!(json, "\"PARSE_ERROR\"");
    }

    #[test]
    fn test_backup_not_found_report_has_no_path() {
        let err = BackupError::NotFound { sequence: 7 };
        let report = ErrorReport::from(&err);
        assert_eq!(report.code, ErrorCode::NotFound);
        assert!(report.path.is_none());
        assert!(report.message.contains('7'));
    }

    #[test]
    fn test_load_error_exposes_path() {
        let err = LoadError::from(ParseError::new("/tmp/config.json", "expected value"));
        assert_eq!(err.code(), ErrorCode::ParseError);
        assert_eq!(err.path(), std::path::Path::new("/tmp/config.json"));
    }
}
