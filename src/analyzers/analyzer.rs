use anyhow::{Context, Result};
use chrono::Local;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::analyzers::aggregate::{AttendanceScan, aggregate_attendance};
use crate::analyzers::consistency::unregistered_ids;
use crate::analyzers::types::RunSummary;
use crate::config::Config;
use crate::output::{PREVIEW_ROWS, generate_report, log_preview, write_run_log};
use crate::roster::{Roster, load_roster};

/// Validates paths, loads the roster, and aggregates attendance.
fn prepare(config: &Config) -> Result<(Roster, AttendanceScan)> {
    info!("Validating input paths");
    config.validate()?;

    let roster_path = config.roster_path();
    info!(file = %roster_path.display(), "Loading roster");
    let roster = load_roster(&roster_path)?;

    let scan = aggregate_attendance(config, &roster)?;
    Ok((roster, scan))
}

/// Runs the whole pipeline: roster, attendance, report, run log.
///
/// Pre-flight and roster failures abort before anything is written. Individual
/// attendance files that fail are skipped. A failure to write the run log is
/// logged and otherwise ignored.
#[tracing::instrument(skip_all, fields(base_dir = %config.base_dir.display()))]
pub fn run(config: &Config) -> Result<RunSummary> {
    let (roster, scan) = prepare(config)?;

    let unregistered = unregistered_ids(&roster, &scan.aggregate);
    if !unregistered.is_empty() {
        warn!(
            count = unregistered.len(),
            ids = ?unregistered,
            "Participants missing from roster"
        );
    }

    let (rows, report_path) = generate_report(config, &roster, &scan.aggregate)
        .context("failed to write attendance report")?;
    log_preview(&rows, PREVIEW_ROWS);

    let finished_at = Local::now();
    let total_participations = scan.aggregate.total();
    let log_path = config.log_path();
    let log_path = match write_run_log(&log_path, finished_at, scan.files.len(), total_participations) {
        Ok(()) => Some(log_path),
        Err(e) => {
            warn!(path = %log_path.display(), error = %e, "Failed to write run log");
            None
        }
    };

    let summary = RunSummary {
        finished_at,
        files_discovered: scan.files.len(),
        files_failed: scan.diagnostics.len(),
        members_loaded: roster.len(),
        participants: scan.aggregate.len(),
        total_participations,
        unregistered,
        report_path,
        log_path,
    };

    info!(
        files = summary.files_discovered,
        failed = summary.files_failed,
        participants = summary.participants,
        total = summary.total_participations,
        report = %summary.report_path.display(),
        "Processing complete"
    );
    Ok(summary)
}

/// Reports participants that have no roster entry without writing any output.
#[tracing::instrument(skip_all, fields(base_dir = %config.base_dir.display()))]
pub fn check(config: &Config) -> Result<BTreeSet<i64>> {
    let (roster, scan) = prepare(config)?;
    let unregistered = unregistered_ids(&roster, &scan.aggregate);

    if unregistered.is_empty() {
        info!("Every participant is on the roster");
    } else {
        warn!(
            count = unregistered.len(),
            ids = ?unregistered,
            "Found unregistered member ids"
        );
    }
    Ok(unregistered)
}
