//! Run configuration.
//!
//! Resolved once at startup: defaults, then an optional JSON file, then
//! environment variables, then command-line flags. The resulting [`Config`] is
//! passed explicitly to every stage of the pipeline.
//!
//! A config file only needs the fields it overrides:
//! ```json
//! {
//!   "base_dir": "/srv/club/data/raw",
//!   "roster_file": "members-2025.xlsx",
//!   "qualifying_statuses": [1, 2]
//! }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analyzers::types::StatusCode;
use crate::error::{ConfigError, PreflightError};

pub const DEFAULT_FILE_PATTERN: &str = r"(?i)^20\d{2}.*\.(xlsx|xlsm|xlsb|xls|ods|csv)$";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the roster and the dated attendance files.
    pub base_dir: PathBuf,
    /// Roster location. A relative path is taken relative to `base_dir`.
    pub roster_file: PathBuf,
    /// Attendance candidates whose name contains this are skipped. Defaults to
    /// the roster file's stem.
    pub roster_marker: Option<String>,
    pub output_dir: PathBuf,
    pub report_file: String,
    pub log_file: String,
    /// Regex matched against attendance file names.
    pub file_pattern: String,
    pub qualifying_statuses: Vec<StatusCode>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("data/raw"),
            roster_file: PathBuf::from("roster.xlsx"),
            roster_marker: None,
            output_dir: PathBuf::from("data/processed"),
            report_file: "attendance_report.csv".to_string(),
            log_file: "processing_log.txt".to_string(),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            qualifying_statuses: vec![StatusCode::CHECKED_OUT, StatusCode::CHECKED_OUT_LATE],
        }
    }
}

impl Config {
    /// Loads a config from a JSON file at `path`; missing fields keep their
    /// defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `CLUB_*` environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup, using the same keys as
    /// [`Config::apply_env`].
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CLUB_BASE_DIR") {
            self.base_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CLUB_ROSTER_FILE") {
            self.roster_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("CLUB_ROSTER_MARKER") {
            self.roster_marker = Some(v);
        }
        if let Some(v) = lookup("CLUB_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CLUB_REPORT_FILE") {
            self.report_file = v;
        }
        if let Some(v) = lookup("CLUB_LOG_FILE") {
            self.log_file = v;
        }
        if let Some(v) = lookup("CLUB_FILE_PATTERN") {
            self.file_pattern = v;
        }
        if let Some(v) = lookup("CLUB_QUALIFYING_STATUSES") {
            self.qualifying_statuses = parse_statuses(&v)?;
        }
        Ok(())
    }

    /// Substring that marks a file in `base_dir` as the roster.
    pub fn roster_marker(&self) -> String {
        self.roster_marker.clone().unwrap_or_else(|| {
            self.roster_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    /// Roster path with a relative `roster_file` resolved against `base_dir`.
    pub fn roster_path(&self) -> PathBuf {
        self.base_dir.join(&self.roster_file)
    }

    pub fn matcher(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.file_pattern).map_err(|source| ConfigError::Pattern {
            pattern: self.file_pattern.clone(),
            source,
        })
    }

    pub fn is_qualifying(&self, status: i64) -> bool {
        self.qualifying_statuses.iter().any(|s| s.code() == status)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file)
    }

    /// Checks that the inputs exist before any processing starts.
    pub fn validate(&self) -> Result<(), PreflightError> {
        let mut problems = Vec::new();
        if !self.base_dir.is_dir() {
            problems.push(format!(
                "attendance directory does not exist: {}",
                self.base_dir.display()
            ));
        }
        let roster_path = self.roster_path();
        if !roster_path.is_file() {
            problems.push(format!(
                "roster file does not exist: {}",
                roster_path.display()
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PreflightError { problems })
        }
    }
}

fn parse_statuses(raw: &str) -> Result<Vec<StatusCode>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map(StatusCode)
                .map_err(|_| ConfigError::Status(s.to_string()))
        })
        .collect()
}
