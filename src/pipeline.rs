//! Batch acquisition orchestrator.
//!
//! A run expands `(dates x sources x times)` into a deterministic grid of
//! capture tasks and drives each through resolve, capture, crop, extract,
//! and persist. Task failures are isolated: the failing slot is recorded
//! and the run moves on. The exception is a streak of consecutive failures
//! with no intervening success, which signals a systemic outage (archive
//! or browser backend down) and trips a circuit breaker that aborts the
//! whole run.

use chrono::{NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::capture::PageCapture;
use crate::crop::{self, CropRules, CroppedArtifact};
use crate::error::{CropError, RunAborted};
use crate::extractors;
use crate::models::{
    CaptureTask, HeadlineRecord, Provenance, ScreenshotRef, SnapshotDocument,
};
use crate::sources::Source;
use crate::store::{DocumentStore, ObjectStore, screenshot_key};
use crate::wayback::SnapshotResolver;

/// Consecutive failures tolerated before the run aborts. The counter
/// resets on any success, so the fourth failure in a row trips the
/// breaker.
pub const CIRCUIT_BREAKER_THRESHOLD: u32 = 3;

/// The pipeline stage a task failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Capture,
    Crop,
    Extract,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "resolve",
            Stage::Capture => "capture",
            Stage::Crop => "crop",
            Stage::Extract => "extract",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// One recorded slot failure.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub source_short_id: String,
    pub display_timestamp: chrono::NaiveDateTime,
    pub stage: Stage,
    pub reason: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} [{}]: {}",
            self.source_short_id,
            self.display_timestamp.format("%Y-%m-%d %H:%M"),
            self.stage,
            self.reason
        )
    }
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<TaskFailure>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

pub struct Pipeline {
    resolver: Arc<dyn SnapshotResolver>,
    capture: Arc<dyn PageCapture>,
    objects: Arc<dyn ObjectStore>,
    documents: Arc<dyn DocumentStore>,
    crop_rules: CropRules,
    storage_root: String,
    dry_run: bool,
    inter_task_delay: Duration,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: Arc<dyn SnapshotResolver>,
        capture: Arc<dyn PageCapture>,
        objects: Arc<dyn ObjectStore>,
        documents: Arc<dyn DocumentStore>,
        crop_rules: CropRules,
        storage_root: &str,
        dry_run: bool,
        inter_task_delay: Duration,
    ) -> Self {
        Pipeline {
            resolver,
            capture,
            objects,
            documents,
            crop_rules,
            storage_root: storage_root.to_string(),
            dry_run,
            inter_task_delay,
        }
    }

    /// Drive the full task grid. Returns the run summary, or
    /// [`RunAborted`] when the circuit breaker trips; the summary of the
    /// partial run is folded into the log in that case.
    pub async fn run(
        &self,
        sources: &[Source],
        dates: &[NaiveDate],
        times: &[NaiveTime],
    ) -> Result<RunSummary, RunAborted> {
        let mut summary = RunSummary::default();
        let mut consecutive_failures: u32 = 0;

        info!(
            dates = dates.len(),
            sources = sources.len(),
            times = times.len(),
            total = dates.len() * sources.len() * times.len(),
            dry_run = self.dry_run,
            "Starting acquisition run"
        );

        for date in dates {
            for source in sources {
                for time in times {
                    let task = CaptureTask {
                        source: *source,
                        display_timestamp: date.and_time(*time),
                    };
                    summary.total += 1;

                    match self.run_task(&task).await {
                        Ok(()) => {
                            summary.succeeded += 1;
                            consecutive_failures = 0;
                            info!(
                                source = source.short_id,
                                slot = %task.display_timestamp.format("%Y-%m-%d %H:%M"),
                                "[OK] slot archived"
                            );
                        }
                        Err(failure) => {
                            consecutive_failures += 1;
                            error!(
                                source = %failure.source_short_id,
                                slot = %failure.display_timestamp.format("%Y-%m-%d %H:%M"),
                                stage = %failure.stage,
                                consecutive = consecutive_failures,
                                "[ERROR] {}",
                                failure.reason
                            );
                            summary.failures.push(failure);

                            if consecutive_failures > CIRCUIT_BREAKER_THRESHOLD {
                                error!(
                                    succeeded = summary.succeeded,
                                    failed = summary.failed(),
                                    "Circuit breaker tripped; aborting run"
                                );
                                return Err(RunAborted {
                                    consecutive: consecutive_failures,
                                    threshold: CIRCUIT_BREAKER_THRESHOLD,
                                });
                            }
                        }
                    }

                    if !self.inter_task_delay.is_zero() {
                        sleep(self.inter_task_delay).await;
                    }
                }
            }
        }

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            "Acquisition run complete"
        );
        Ok(summary)
    }

    /// One slot, end to end. Every error is folded into a [`TaskFailure`]
    /// naming the stage it happened in.
    async fn run_task(&self, task: &CaptureTask) -> Result<(), TaskFailure> {
        let source = task.source;
        let fail = |stage: Stage, reason: String| TaskFailure {
            source_short_id: source.short_id.to_string(),
            display_timestamp: task.display_timestamp,
            stage,
            reason,
        };

        let snapshot = self
            .resolver
            .resolve(source.domain, task.display_timestamp)
            .await
            .map_err(|e| fail(Stage::Resolve, e.to_string()))?;

        let (raw, html) = self
            .capture
            .capture_with_html(&snapshot.archive_url)
            .await
            .map_err(|e| fail(Stage::Capture, e.to_string()))?;

        let strategy = self
            .crop_rules
            .strategy_for(source.short_id)
            .ok_or_else(|| {
                fail(
                    Stage::Crop,
                    CropError::UnknownSource(source.short_id.to_string()).to_string(),
                )
            })?;
        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| fail(Stage::Crop, CropError::Decode(e.to_string()).to_string()))?
            .to_rgba8();
        let (cropped, metadata) = strategy.crop(&decoded);
        strategy
            .validate(&cropped, &metadata)
            .map_err(|e| fail(Stage::Crop, e.to_string()))?;
        let artifact = CroppedArtifact {
            bytes: crop::encode_png(&cropped).map_err(|e| fail(Stage::Crop, e.to_string()))?,
            width: cropped.width(),
            height: cropped.height(),
        };

        // A page whose markup yields nothing still gets archived; the
        // screenshot is the primary artifact.
        let headlines: Vec<HeadlineRecord> =
            match extractors::extract(source.short_id, &html, source.home_url) {
                Some(headlines) if !headlines.is_empty() => headlines,
                _ => {
                    warn!(
                        source = source.short_id,
                        slot = %task.display_timestamp.format("%Y-%m-%d %H:%M"),
                        "[WARN] no headlines extracted; archiving screenshot only"
                    );
                    Vec::new()
                }
            };

        if self.dry_run {
            info!(
                source = source.short_id,
                headlines = headlines.len(),
                width = artifact.width,
                height = artifact.height,
                "Dry run; skipping persistence"
            );
            return Ok(());
        }

        let object_key = screenshot_key(&self.storage_root, source.short_id, task.display_timestamp);
        self.objects
            .put_bytes(&object_key, &artifact.bytes, "image/png")
            .await
            .map_err(|e| fail(Stage::Persist, e.to_string()))?;

        let now = Utc::now();
        let document = SnapshotDocument {
            source_short_id: source.short_id.to_string(),
            display_timestamp: task.display_timestamp,
            actual_timestamp: snapshot.actual_timestamp,
            headlines,
            screenshot: ScreenshotRef {
                object_key,
                thumbnail_key: None,
                format: "png".to_string(),
                size: artifact.bytes.len() as u64,
                width: artifact.width,
                height: artifact.height,
                archive_url: snapshot.archive_url.clone(),
            },
            provenance: Provenance::wayback_success(),
            created_at: now,
            updated_at: now,
        };
        self.documents
            .upsert_snapshot(document)
            .await
            .map_err(|e| fail(Stage::Persist, e.to_string()))?;

        Ok(())
    }
}
