//! # NewsLens
//!
//! An acquisition pipeline that rebuilds an archive of major news
//! homepages from the Wayback Machine. For every tracked source and
//! every capture slot in the requested date range it:
//!
//! 1. **Resolves** the archived snapshot closest to the slot via the
//!    CDX index
//! 2. **Captures** a full-page screenshot of the replay URL through a
//!    Browserless/Chrome service
//! 3. **Crops** the raster down to the editorially relevant region(s)
//!    using a per-source layout rule
//! 4. **Extracts** the ranked top headlines from the rendered markup
//! 5. **Persists** the cropped artifact and a snapshot document, keyed
//!    so that re-runs overwrite instead of duplicating
//!
//! Slot failures are isolated and summarized at the end of the run; a
//! streak of consecutive failures trips a circuit breaker and aborts.
//!
//! ## Usage
//!
//! ```sh
//! newslens --start-date 2025-04-18
//! ```

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod capture;
mod cli;
mod crop;
mod error;
mod extractors;
mod models;
mod pipeline;
mod sources;
mod store;
mod wayback;

use capture::{BrowserlessCapture, PageCapture};
use cli::Cli;
use crop::CropRules;
use pipeline::Pipeline;
use store::{FsDocumentStore, FsObjectStore};
use wayback::WaybackResolver;

/// Pause between grid slots, to stay polite to the archive.
const INTER_TASK_DELAY: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newslens starting up");
    debug!(?args.start_date, ?args.end_date, ?args.data_dir, "Parsed CLI arguments");

    let dates = args.dates();
    let times = args.capture_times();
    let sources = sources::catalog();

    let capture: Arc<dyn PageCapture> = Arc::new(BrowserlessCapture::new(
        &args.browserless_url,
        args.browserless_token.as_deref(),
    ));
    let pipeline = Pipeline::new(
        Arc::new(WaybackResolver::new()),
        Arc::clone(&capture),
        Arc::new(FsObjectStore::new(args.data_dir.join("screenshots"))),
        Arc::new(FsDocumentStore::new(args.data_dir.join("snapshots"))),
        CropRules::default(),
        &args.storage_root,
        args.dry_run,
        INTER_TASK_DELAY,
    );

    let outcome = pipeline.run(sources, &dates, &times).await;
    capture.cleanup().await;

    let elapsed = start_time.elapsed();
    match outcome {
        Ok(summary) => {
            if !summary.failures.is_empty() {
                warn!(failed = summary.failed(), "SUMMARY OF FAILED SLOTS");
                for failure in &summary.failures {
                    warn!("  {failure}");
                }
            }
            info!(
                total = summary.total,
                succeeded = summary.succeeded,
                failed = summary.failed(),
                secs = elapsed.as_secs(),
                "Execution complete"
            );
            Ok(())
        }
        Err(aborted) => {
            error!(secs = elapsed.as_secs(), "Run aborted: {aborted}");
            Err(Box::new(aborted) as Box<dyn Error>)
        }
    }
}
