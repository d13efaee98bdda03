//! Error taxonomy for the acquisition pipeline.
//!
//! Each stage has its own error enum so the orchestrator can tell apart
//! conditions that are worth retrying (transient network and render
//! failures) from ones that are not (an empty index result set, a geometry
//! invariant violation). The orchestrator converts all of these into
//! recorded per-task failures; only [`RunAborted`] escapes the run loop.

use thiserror::Error;

/// Errors from the archive snapshot resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The CDX index has no successful capture for the requested day.
    /// Expected condition; the task is skipped, never retried.
    #[error("no archived capture for the requested day")]
    NotFound,

    /// The index endpoint answered with a non-success status.
    #[error("CDX index error (status {status}): {message}")]
    Index { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("network error: {0}")]
    Transport(String),

    /// The index answered 200 but the body was not the expected
    /// JSON array-of-arrays shape.
    #[error("malformed CDX response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        ResolveError::Transport(err.to_string())
    }
}

impl ResolveError {
    /// Transient failures get the bounded retry; `NotFound` and a
    /// malformed body do not (repeating the query cannot change them).
    pub fn is_retryable(&self) -> bool {
        match self {
            ResolveError::Transport(_) => true,
            ResolveError::Index { status, .. } => (500..=599).contains(status),
            ResolveError::NotFound | ResolveError::Malformed(_) => false,
        }
    }
}

/// Errors from the browser capture service.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The render service answered with a non-success status.
    #[error("browser service error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("network error: {0}")]
    Transport(String),

    /// The service returned bytes that do not decode as an image.
    #[error("could not decode screenshot: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CaptureError {
    fn from(err: reqwest::Error) -> Self {
        CaptureError::Transport(err.to_string())
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::Decode(err.to_string())
    }
}

/// Errors from the cropping stage. All of these are fatal to the task and
/// never retried: re-cropping an identical screenshot cannot change the
/// outcome.
#[derive(Debug, Error)]
pub enum CropError {
    #[error("crop width {actual}px does not match target {target}px")]
    WidthMismatch { actual: u32, target: u32 },

    #[error("crop height {actual}px below minimum {minimum}px")]
    BelowMinimumHeight { actual: u32, minimum: u32 },

    #[error("required region '{label}' fell outside the {image_height}px screenshot")]
    MissingRegion { label: String, image_height: u32 },

    #[error("no crop rule registered for source '{0}'")]
    UnknownSource(String),

    #[error("could not decode screenshot for cropping: {0}")]
    Decode(String),

    #[error("could not encode cropped artifact: {0}")]
    Encode(String),
}

/// Errors from the object or document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object store error: {0}")]
    Object(String),

    #[error("document store error: {0}")]
    Document(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Object(err.to_string())
    }
}

/// Fatal run abort raised by the consecutive-failure circuit breaker.
///
/// Isolated task failures never stop the run; a streak of them with no
/// intervening success signals a systemic outage (archive or browser
/// backend down) and does.
#[derive(Debug, Error)]
#[error("aborting run: {consecutive} consecutive task failures (threshold {threshold})")]
pub struct RunAborted {
    pub consecutive: u32,
    pub threshold: u32,
}
