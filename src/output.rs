//! Report building and persistence.
//!
//! Joins the aggregate with the roster, writes the report CSV, and writes the
//! plain-text run log.

use anyhow::Result;
use chrono::{DateTime, Local};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::ReportRow;
use crate::config::Config;
use crate::roster::Roster;
use crate::stats::Aggregate;

pub const PREVIEW_ROWS: usize = 5;

/// Name used for participants without a roster entry.
pub fn placeholder_name(id: i64) -> String {
    format!("Unknown member_{id}")
}

/// Builds one row per aggregated member, most active first.
///
/// Members missing from the roster get a placeholder name. The sort is stable
/// over the id-ordered aggregate, so equal counts stay in ascending id order.
pub fn build_report(roster: &Roster, aggregate: &Aggregate) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = aggregate
        .iter()
        .map(|(id, count)| {
            let name = roster
                .name(id)
                .map(str::to_string)
                .unwrap_or_else(|| placeholder_name(id));
            ReportRow::new(name, id, count)
        })
        .collect();

    rows.sort_by(|a, b| b.participation_count.cmp(&a.participation_count));
    rows
}

/// Writes `rows` as CSV with a header row, replacing any existing file.
pub fn write_report<W: Write>(target: W, rows: &[ReportRow]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(target);
    // serde only emits the header alongside the first record
    if rows.is_empty() {
        writer.write_record(ReportRow::HEADERS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Builds the report and saves it under the configured output directory,
/// creating the directory if needed.
///
/// Returns the rows and the path they were written to.
#[tracing::instrument(skip_all, fields(participants = aggregate.len()))]
pub fn generate_report(
    config: &Config,
    roster: &Roster,
    aggregate: &Aggregate,
) -> Result<(Vec<ReportRow>, PathBuf)> {
    let rows = build_report(roster, aggregate);

    fs::create_dir_all(&config.output_dir)?;
    let path = config.report_path();
    write_report(File::create(&path)?, &rows)?;

    info!(path = %path.display(), rows = rows.len(), "Report written");
    Ok((rows, path))
}

/// Logs the first `limit` report rows.
pub fn log_preview(rows: &[ReportRow], limit: usize) {
    for row in rows.iter().take(limit) {
        info!(
            name = %row.name,
            id = row.id,
            participation_count = row.participation_count,
            derived_credit = row.derived_credit,
            "Report preview"
        );
    }
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes the three-line run log, replacing any previous one.
pub fn write_run_log(
    path: &Path,
    finished_at: DateTime<Local>,
    files_processed: usize,
    total_participations: u64,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    writeln!(file, "Last processed: {}", finished_at.to_rfc3339())?;
    writeln!(file, "Files processed: {files_processed}")?;
    writeln!(file, "Total participations: {total_participations}")?;

    debug!(path = %path.display(), "Run log written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn sample() -> (Roster, Aggregate) {
        let roster: Roster = [(1, "A"), (2, "B")].into_iter().collect();
        let aggregate: Aggregate = [(1, 2), (2, 1), (3, 1)].into_iter().collect();
        (roster, aggregate)
    }

    #[test]
    fn test_build_report_joins_and_sorts() {
        let (roster, aggregate) = sample();
        let rows = build_report(&roster, &aggregate);

        assert_eq!(
            rows,
            vec![
                ReportRow::new("A".into(), 1, 2),
                ReportRow::new("B".into(), 2, 1),
                ReportRow::new("Unknown member_3".into(), 3, 1),
            ]
        );
        assert_eq!(rows[0].derived_credit, 4);
    }

    #[test]
    fn test_roster_only_members_are_not_reported() {
        let roster: Roster = [(1, "A"), (2, "B"), (9, "Z")].into_iter().collect();
        let aggregate: Aggregate = [(2, 3)].into_iter().collect();

        let rows = build_report(&roster, &aggregate);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "B");
    }

    #[test]
    fn test_write_report_format() {
        let (roster, aggregate) = sample();
        let mut out = Vec::new();
        write_report(&mut out, &build_report(&roster, &aggregate)).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name,id,participation_count,derived_credit\n\
             A,1,2,4\n\
             B,2,1,2\n\
             Unknown member_3,3,1,2\n"
        );
    }

    #[test]
    fn test_generate_report_creates_dir_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            output_dir: dir.path().join("processed"),
            ..Default::default()
        };
        let (roster, aggregate) = sample();

        let (rows, path) = generate_report(&config, &roster, &aggregate).unwrap();
        let first = fs::read(&path).unwrap();
        assert_eq!(path, config.report_path());
        assert_eq!(rows.len(), 3);

        generate_report(&config, &roster, &aggregate).unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_empty_aggregate_writes_header_only() {
        let mut out = Vec::new();
        write_report(&mut out, &build_report(&Roster::default(), &Aggregate::new())).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name,id,participation_count,derived_credit\n"
        );
    }

    #[test]
    fn test_write_run_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("processing_log.txt");
        let at = Local.with_ymd_and_hms(2025, 3, 31, 18, 30, 0).unwrap();

        write_run_log(&path, at, 4, 17).unwrap();
        write_run_log(&path, at, 5, 20).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Last processed: 2025-03-31T18:30:00"));
        assert_eq!(lines[1], "Files processed: 5");
        assert_eq!(lines[2], "Total participations: 20");
    }

    proptest! {
        #[test]
        fn prop_report_is_sorted_and_complete(
            counts in proptest::collection::btree_map(0i64..500, 1u32..50, 0..60)
        ) {
            let aggregate: Aggregate = counts.iter().map(|(&id, &c)| (id, c)).collect();
            let rows = build_report(&Roster::default(), &aggregate);

            prop_assert_eq!(rows.len(), counts.len());
            for pair in rows.windows(2) {
                prop_assert!(pair[0].participation_count >= pair[1].participation_count);
                if pair[0].participation_count == pair[1].participation_count {
                    prop_assert!(pair[0].id < pair[1].id);
                }
            }
            for row in &rows {
                prop_assert_eq!(row.derived_credit, u64::from(row.participation_count) * 2);
                prop_assert_eq!(row.participation_count, counts[&row.id]);
                prop_assert_eq!(&row.name, &placeholder_name(row.id));
            }
        }
    }
}
