//! Page rendering and screenshotting via a Browserless/Chrome service.
//!
//! The long-lived browser belongs to a Browserless service; this module
//! is a thin HTTP client over its `/screenshot` and `/content` endpoints.
//! Each request runs in an isolated browsing context that the service
//! tears down when the request finishes, so one task's wreckage never
//! leaks into the next, and the browser itself survives individual task
//! failures.
//!
//! Every capture uses a fixed viewport (1920x2000 logical px at 2.0 device
//! scale), navigates until `domcontentloaded`, waits for the document body,
//! hides the archive's injected toolbar chrome, allows a settle delay for
//! layout, and takes a full-page PNG. Navigation and the overall request
//! share a 120s timeout.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::error::CaptureError;
use crate::models::RawCapture;

pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 2000;
pub const DEVICE_SCALE_FACTOR: f64 = 2.0;
pub const NAVIGATION_TIMEOUT_MS: u64 = 120_000;

const MAX_ATTEMPTS: usize = 3;
const RETRY_PAUSE: Duration = Duration::from_secs(2);
const SETTLE_DELAY_MS: u64 = 1_500;

/// Hides the Wayback Machine toolbar and donation banner the replay
/// wrapper injects above the archived page.
const ARCHIVE_CHROME_CSS: &str =
    "#wm-ipp-base, #wm-ipp-print, #donato { display: none !important; }";

/// Renders an archived page and produces a raster screenshot, optionally
/// with the rendered markup.
#[async_trait]
pub trait PageCapture: Send + Sync {
    /// Render `url` and take a full-page screenshot. Transient render
    /// failures are retried a bounded number of times inside the call.
    async fn capture(&self, url: &str) -> Result<RawCapture, CaptureError>;

    /// Fetch the rendered markup of `url`. Not retried; callers degrade.
    async fn fetch_html(&self, url: &str) -> Result<String, CaptureError>;

    /// Screenshot plus markup from the same navigation target, for
    /// pipelines that extract from the exact rendered state. A markup
    /// failure degrades to an empty document rather than failing the
    /// capture; downstream extraction treats empty markup as "nothing
    /// found".
    async fn capture_with_html(&self, url: &str) -> Result<(RawCapture, String), CaptureError> {
        let shot = self.capture(url).await?;
        let html = match self.fetch_html(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%url, error = %e, "Markup fetch failed; extraction will see an empty document");
                String::new()
            }
        };
        Ok((shot, html))
    }

    /// Release any session resources. Only the orchestrator calls this,
    /// once, at the end of the run.
    async fn cleanup(&self);
}

/// [`PageCapture`] backed by a Browserless service.
pub struct BrowserlessCapture {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessCapture {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(NAVIGATION_TIMEOUT_MS))
            .build()
            .expect("reqwest client with static configuration");
        BrowserlessCapture {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        match &self.token {
            Some(token) => format!("{}/{path}?token={token}", self.base_url),
            None => format!("{}/{path}", self.base_url),
        }
    }

    async fn screenshot_once(&self, url: &str) -> Result<RawCapture, CaptureError> {
        let body = json!({
            "url": url,
            "viewport": {
                "width": VIEWPORT_WIDTH,
                "height": VIEWPORT_HEIGHT,
                "deviceScaleFactor": DEVICE_SCALE_FACTOR,
            },
            "gotoOptions": {
                "waitUntil": "domcontentloaded",
                "timeout": NAVIGATION_TIMEOUT_MS,
            },
            "waitForSelector": { "selector": "body", "timeout": NAVIGATION_TIMEOUT_MS },
            "addStyleTag": [ { "content": ARCHIVE_CHROME_CSS } ],
            "waitForTimeout": SETTLE_DELAY_MS,
            "options": { "fullPage": true, "type": "png" },
        });

        let resp = self
            .client
            .post(self.endpoint("screenshot"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CaptureError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await?.to_vec();
        // Decode once to learn the pixel dimensions; the cropper works on
        // the same bytes later.
        let decoded = image::load_from_memory(&bytes)?;
        Ok(RawCapture {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }
}

#[async_trait]
impl PageCapture for BrowserlessCapture {
    #[instrument(level = "info", skip(self), fields(%url))]
    async fn capture(&self, url: &str) -> Result<RawCapture, CaptureError> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.screenshot_once(url).await {
                Ok(capture) => {
                    info!(
                        bytes = capture.bytes.len(),
                        width = capture.width,
                        height = capture.height,
                        "Captured full-page screenshot"
                    );
                    return Ok(capture);
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!(attempt, max = MAX_ATTEMPTS, error = %e, "Screenshot attempt failed; retrying");
                    sleep(RETRY_PAUSE).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    #[instrument(level = "info", skip(self), fields(%url))]
    async fn fetch_html(&self, url: &str) -> Result<String, CaptureError> {
        let body = json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": "domcontentloaded",
                "timeout": NAVIGATION_TIMEOUT_MS,
            },
        });

        let resp = self
            .client
            .post(self.endpoint("content"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CaptureError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let html = resp.text().await?;
        debug!(bytes = html.len(), "Fetched rendered markup");
        Ok(html)
    }

    async fn cleanup(&self) {
        // The browser lives in the Browserless service; nothing to tear
        // down on this side beyond the connection pool, which drops with
        // the client.
        debug!("Capture client released");
    }
}
