//! Command-line interface definitions for NewsLens.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Connection settings can also be provided via environment variables.

use chrono::{NaiveDate, NaiveTime};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the NewsLens acquisition pipeline.
///
/// A run covers a date range (one day by default) and a set of capture
/// times per day, against every source in the catalog.
///
/// # Examples
///
/// ```sh
/// # Archive one day at the default five slots
/// newslens --start-date 2025-04-18
///
/// # A date range at two custom slots, without persisting anything
/// newslens --start-date 2025-04-01 --end-date 2025-04-07 \
///     --times 08:00 --times 20:00 --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// First date to archive (YYYY-MM-DD)
    #[arg(short, long)]
    pub start_date: NaiveDate,

    /// Last date to archive, inclusive (defaults to the start date)
    #[arg(short, long)]
    pub end_date: Option<NaiveDate>,

    /// Capture times of day (HH:MM), repeatable; defaults to the standard
    /// five-slot schedule
    #[arg(short, long, value_parser = parse_time)]
    pub times: Vec<NaiveTime>,

    /// Run the full pipeline but skip persistence
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Base URL of the Browserless screenshot service
    #[arg(long, env = "BROWSERLESS_URL", default_value = "http://localhost:3000")]
    pub browserless_url: String,

    /// Access token for the Browserless service
    #[arg(long, env = "BROWSERLESS_TOKEN")]
    pub browserless_token: Option<String>,

    /// Local data directory for screenshots and snapshot documents
    #[arg(long, env = "NEWSLENS_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Key prefix for stored screenshots
    #[arg(long, default_value = "auto")]
    pub storage_root: String,
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{value}' (expected HH:MM)"))
}

impl Cli {
    /// The inclusive date range of the run.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let end = self.end_date.unwrap_or(self.start_date);
        self.start_date
            .iter_days()
            .take_while(|day| *day <= end)
            .collect()
    }

    /// Capture times for each day, falling back to the default schedule.
    pub fn capture_times(&self) -> Vec<NaiveTime> {
        if self.times.is_empty() {
            crate::sources::default_times()
        } else {
            self.times.clone()
        }
    }
}
