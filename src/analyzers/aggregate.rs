use anyhow::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::AttendanceRecord;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::SheetError;
use crate::parser::read_table;
use crate::roster::Roster;
use crate::stats::Aggregate;

/// Result of scanning the attendance directory.
#[derive(Debug, Default)]
pub struct AttendanceScan {
    /// Every attendance file found, including the ones that failed.
    pub files: Vec<PathBuf>,
    pub aggregate: Aggregate,
    pub diagnostics: Diagnostics,
}

/// Lists attendance files in `dir`: names matching `pattern` that do not
/// contain `roster_marker`. Sorted by file name.
pub fn discover_files(dir: &Path, pattern: &Regex, roster_marker: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !pattern.is_match(name) {
            continue;
        }
        if !roster_marker.is_empty() && name.contains(roster_marker) {
            debug!(file = name, "Skipping roster file");
            continue;
        }

        files.push(entry.path());
    }

    files.sort();
    Ok(files)
}

/// Turns `2025.3.31.xlsx` into `2025-3-31`.
pub fn date_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace('.', "-"))
        .unwrap_or_default()
}

/// Counts the qualifying rows of a single headerless `(id, status)` sheet.
///
/// Rows without a numeric id, without a status, or with a status outside the
/// configured set are skipped. The whole file fails if it cannot be read or
/// has fewer than two columns.
#[tracing::instrument(skip(config), fields(file = %path.display()))]
pub fn aggregate_file(path: &Path, config: &Config) -> Result<Aggregate, SheetError> {
    let table = read_table(path, false)?;
    table.require_columns(2)?;

    let mut aggregate = Aggregate::new();
    for record in table.rows.iter().filter_map(|row| AttendanceRecord::from_row(row)) {
        if record.status.is_some_and(|s| config.is_qualifying(s)) {
            aggregate.record(record.member_id);
        }
    }

    debug!(
        rows = table.rows.len(),
        participations = aggregate.total(),
        "File aggregated"
    );
    Ok(aggregate)
}

/// Scans `config.base_dir` and accumulates participation counts over every
/// attendance file. Files that fail to parse are recorded in the returned
/// diagnostics and contribute nothing.
///
/// The roster is only used for progress reporting; unknown ids are counted.
pub fn aggregate_attendance(config: &Config, roster: &Roster) -> Result<AttendanceScan> {
    let pattern = config.matcher()?;
    let files = discover_files(&config.base_dir, &pattern, &config.roster_marker())?;
    info!(
        files = files.len(),
        members = roster.len(),
        dir = %config.base_dir.display(),
        "Analyzing attendance files"
    );

    let mut aggregate = Aggregate::new();
    let mut diagnostics = Diagnostics::new();

    for file in &files {
        info!(date = %date_label(file), "Processing attendance");
        match aggregate_file(file, config) {
            Ok(counts) => aggregate.merge(&counts),
            Err(e) => diagnostics.file_skipped(file, e),
        }
    }

    info!(
        participants = aggregate.len(),
        total = aggregate.total(),
        failed = diagnostics.len(),
        "Attendance aggregated"
    );

    Ok(AttendanceScan {
        files,
        aggregate,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> Config {
        Config {
            base_dir: dir.to_path_buf(),
            roster_file: dir.join("roster.csv"),
            ..Default::default()
        }
    }

    #[test]
    fn test_date_label() {
        assert_eq!(date_label(Path::new("raw/2025.3.31.xlsx")), "2025-3-31");
    }

    #[test]
    fn test_discover_skips_roster_and_unrelated_files() {
        let dir = TempDir::new().unwrap();
        for name in [
            "2025.3.1.csv",
            "2025.3.2.xlsx",
            "2025-roster.csv",
            "notes.csv",
            "2025.3.3.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("2025.archive.csv")).unwrap();

        let config = config_for(dir.path());
        let files =
            discover_files(dir.path(), &config.matcher().unwrap(), &config.roster_marker()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["2025.3.1.csv", "2025.3.2.xlsx"]);
    }

    #[test]
    fn test_only_qualifying_statuses_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2025.3.1.csv");
        fs::write(&path, "1,1\n2,2\n3,0\n4,\n5,9\nabc,1\n1,1\n").unwrap();

        let agg = aggregate_file(&path, &config_for(dir.path())).unwrap();

        assert_eq!(agg.get(1), 2);
        assert_eq!(agg.get(2), 1);
        assert_eq!(agg.get(3), 0);
        assert_eq!(agg.get(4), 0);
        assert_eq!(agg.get(5), 0);
        assert_eq!(agg.total(), 3);
    }

    #[test]
    fn test_workbook_attendance_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2025.3.31.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        // (id, status): 1 and 2 count, 0 and a blank status do not
        let rows: [(f64, Option<f64>); 5] = [
            (1.0, Some(1.0)),
            (2.0, Some(2.0)),
            (3.0, Some(0.0)),
            (4.0, None),
            (1.0, Some(2.0)),
        ];
        for (r, (id, status)) in rows.iter().enumerate() {
            sheet.write_number(r as u32, 0, *id).unwrap();
            if let Some(status) = status {
                sheet.write_number(r as u32, 1, *status).unwrap();
            }
        }
        workbook.save(&path).unwrap();

        let agg = aggregate_file(&path, &config_for(dir.path())).unwrap();

        assert_eq!(agg.get(1), 2);
        assert_eq!(agg.get(2), 1);
        assert_eq!(agg.get(3), 0);
        assert_eq!(agg.get(4), 0);
        assert_eq!(agg.total(), 3);
    }

    #[test]
    fn test_custom_status_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2025.3.1.csv");
        fs::write(&path, "1,1\n2,2\n").unwrap();

        let config = Config {
            qualifying_statuses: vec![crate::analyzers::types::StatusCode::CHECKED_OUT_LATE],
            ..config_for(dir.path())
        };
        let agg = aggregate_file(&path, &config).unwrap();

        assert_eq!(agg.get(1), 0);
        assert_eq!(agg.get(2), 1);
    }

    #[test]
    fn test_single_column_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2025.3.1.csv");
        fs::write(&path, "1\n2\n").unwrap();

        let err = aggregate_file(&path, &config_for(dir.path())).unwrap_err();
        assert!(matches!(err, SheetError::Shape { found: 1, .. }));
    }

    #[test]
    fn test_corrupt_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2025.3.1.csv"), "1,1\n2,1\n").unwrap();
        fs::write(dir.path().join("2025.3.2.xlsx"), b"garbage").unwrap();

        let scan = aggregate_attendance(&config_for(dir.path()), &Roster::default()).unwrap();

        assert_eq!(scan.files.len(), 2);
        assert_eq!(scan.diagnostics.len(), 1);
        assert!(scan.diagnostics.warnings()[0].file.ends_with("2025.3.2.xlsx"));
        assert_eq!(scan.aggregate.total(), 2);
    }
}
