//! Core data model for the acquisition pipeline.
//!
//! The stage components are stateless transformers over these types:
//! a [`CaptureTask`] flows through resolution ([`ResolvedSnapshot`]),
//! capture ([`RawCapture`]), cropping and extraction
//! ([`HeadlineRecord`]s), and is finally persisted as a
//! [`SnapshotDocument`] keyed by `(source_short_id, display_timestamp)`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sources::Source;

/// The unit of work: one source at one intended wall-clock slot.
///
/// Ephemeral; constructed per grid cell by the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct CaptureTask {
    pub source: Source,
    /// The intended, rounded slot (e.g. 2025-04-18 06:00), as opposed to
    /// the archive's actual capture instant.
    pub display_timestamp: NaiveDateTime,
}

/// The archived copy the resolver settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSnapshot {
    /// Fully qualified replay URL, usable as a navigation target.
    pub archive_url: String,
    /// The real capture instant, which may differ from the display
    /// timestamp by minutes to hours.
    pub actual_timestamp: NaiveDateTime,
}

/// A raw full-page screenshot plus its pixel dimensions. Freed after
/// cropping and extraction.
#[derive(Debug, Clone)]
pub struct RawCapture {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// One extracted headline, ordered by on-page prominence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineRecord {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subheadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editorial_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Position in the source's prominence order; 0 is the lead story.
    pub rank: u32,
    /// Placeholder for a future scoring pass; never computed here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f32>,
}

impl HeadlineRecord {
    pub fn new(text: String, rank: u32) -> Self {
        HeadlineRecord {
            text,
            subheadline: None,
            editorial_tag: None,
            article_url: None,
            category: None,
            rank,
            sentiment: None,
        }
    }
}

/// Pointer to the stored screenshot artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotRef {
    pub object_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_key: Option<String>,
    pub format: String,
    /// Size of the stored bytes.
    pub size: u64,
    pub width: u32,
    pub height: u32,
    /// The replay URL the screenshot was rendered from.
    pub archive_url: String,
}

/// How the snapshot was collected and how much to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub collection_method: String,
    pub confidence: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Provenance {
    /// Provenance for a snapshot collected from the web archive.
    pub fn wayback_success() -> Self {
        Provenance {
            collection_method: "wayback".to_string(),
            confidence: "high".to_string(),
            status: "success".to_string(),
            error_message: None,
        }
    }
}

/// The persisted union of one task's results.
///
/// Upserted keyed by `(source_short_id, display_timestamp)` so re-runs are
/// idempotent overwrites, not duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub source_short_id: String,
    pub display_timestamp: NaiveDateTime,
    pub actual_timestamp: NaiveDateTime,
    pub headlines: Vec<HeadlineRecord>,
    pub screenshot: ScreenshotRef,
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
