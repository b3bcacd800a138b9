//! Data types used by the attendance pipeline.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::parser::{Cell, Table};

/// Sign-out status code recorded in an attendance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub i64);

impl StatusCode {
    pub const CHECKED_OUT: StatusCode = StatusCode(1);
    pub const CHECKED_OUT_LATE: StatusCode = StatusCode(2);

    pub fn code(self) -> i64 {
        self.0
    }
}

/// One row of an attendance sheet. Only rows with a numeric member id become
/// records; the status may still be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub member_id: i64,
    pub status: Option<i64>,
}

impl AttendanceRecord {
    /// Reads `(id, status)` from the first two columns of `row`.
    pub fn from_row(row: &[Cell]) -> Option<Self> {
        let member_id = Table::cell(row, 0).as_integer()?;
        let status = Table::cell(row, 1).as_integer();
        Some(Self { member_id, status })
    }
}

/// One line of the participation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub id: i64,
    pub participation_count: u32,
    pub derived_credit: u64,
}

impl ReportRow {
    pub const CREDIT_MULTIPLIER: u64 = 2;
    pub const HEADERS: [&'static str; 4] = ["name", "id", "participation_count", "derived_credit"];

    pub fn new(name: String, id: i64, participation_count: u32) -> Self {
        Self {
            name,
            id,
            participation_count,
            derived_credit: u64::from(participation_count) * Self::CREDIT_MULTIPLIER,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub finished_at: DateTime<Local>,
    pub files_discovered: usize,
    pub files_failed: usize,
    pub members_loaded: usize,
    pub participants: usize,
    pub total_participations: u64,
    pub unregistered: BTreeSet<i64>,
    pub report_path: PathBuf,
    pub log_path: Option<PathBuf>,
}
