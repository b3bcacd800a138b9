//! CLI entry point for the club attendance tally.
//!
//! With no arguments, aggregates every dated attendance sheet in the
//! configured directory and writes the participation report and run log.

use anyhow::Result;
use clap::{Parser, Subcommand};
use club_attendance::analyzers::analyzer::{check, run};
use club_attendance::config::Config;
use club_attendance::error::PreflightError;
use club_attendance::output::print_json;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "club_attendance")]
#[command(about = "Tally club attendance sheets against the member roster", long_about = None)]
struct Cli {
    /// JSON config file; fields it omits keep their defaults
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the roster and dated attendance sheets
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Roster file (header row, then id and name columns); a relative path is
    /// resolved against the base directory
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    /// Directory receiving the report and run log
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate attendance and write the report (default)
    Run {
        /// Also log the run summary as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List participant ids that are missing from the roster
    Check,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        config.apply_env()?;

        if let Some(dir) = &self.base_dir {
            config.base_dir = dir.clone();
        }
        if let Some(roster) = &self.roster {
            config.roster_file = roster.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/club_attendance.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("club_attendance.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let result = match cli.command.unwrap_or(Commands::Run { json: false }) {
        Commands::Run { json } => run(&config).and_then(|summary| {
            info!(report = %summary.report_path.display(), "Report saved");
            if let Some(log_path) = &summary.log_path {
                info!(log = %log_path.display(), "Run log saved");
            }
            if json {
                print_json(&summary)?;
            }
            Ok(())
        }),
        Commands::Check => check(&config).map(|unregistered| {
            for id in unregistered {
                println!("{id}");
            }
        }),
    };

    if let Err(e) = &result {
        if let Some(preflight) = e.downcast_ref::<PreflightError>() {
            for problem in &preflight.problems {
                error!("{problem}");
            }
            for hint in preflight.hints() {
                error!(hint, "Remediation");
            }
        } else {
            error!(error = %e, "Run aborted");
        }
    }

    result
}
