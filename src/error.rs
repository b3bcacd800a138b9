//! Error types shared across the library.
//!
//! Per-file problems surface as [`SheetError`] and are absorbed by the
//! aggregator. [`RosterLoadError`] and [`PreflightError`] are fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read a single tabular file.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    #[error("expected at least {expected} columns, found {found}")]
    Shape { expected: usize, found: usize },
}

/// Failure to build the roster. The run cannot continue without one.
#[derive(Debug, Error)]
pub enum RosterLoadError {
    #[error("cannot read roster {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: SheetError,
    },

    #[error("roster {} lacks the id and name columns: {source}", path.display())]
    Shape {
        path: PathBuf,
        #[source]
        source: SheetError,
    },

    #[error("roster row {row}: member id {value:?} is not an integer")]
    InvalidId { row: usize, value: String },
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid file pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid status code {0:?}")]
    Status(String),
}

/// Problems found before any file is processed.
#[derive(Debug, Error)]
#[error("path configuration error:\n  {}", problems.join("\n  "))]
pub struct PreflightError {
    pub problems: Vec<String>,
}

impl PreflightError {
    /// Operator-facing steps for fixing a failed pre-flight check.
    pub fn hints(&self) -> &'static [&'static str] {
        &[
            "check that the base directory exists (CLUB_BASE_DIR or --base-dir)",
            "check that the roster file is inside it (CLUB_ROSTER_FILE or --roster)",
        ]
    }
}
