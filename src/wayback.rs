//! Wayback Machine snapshot resolution.
//!
//! Given a source URL and a target instant, queries the archive's CDX index
//! for the calendar day of the target, restricted to successful captures and
//! collapsed by content digest, then picks the capture whose timestamp is
//! closest to the target. The winning timestamp and the original URL are
//! joined verbatim into a replay URL that a browser can navigate to.
//!
//! The index query gets a bounded retry with jittered exponential backoff,
//! but only for transport and 5xx failures. An empty result set is a
//! [`ResolveError::NotFound`] and is returned immediately: asking again
//! cannot make a capture appear.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rand::{Rng, rng};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::error::ResolveError;
use crate::models::ResolvedSnapshot;

/// CDX index endpoint of the Wayback Machine.
pub const CDX_API: &str = "https://web.archive.org/cdx/search/cdx";

/// Replay base; a navigable snapshot URL is `{REPLAY_BASE}/{ts}/{original}`.
pub const REPLAY_BASE: &str = "https://web.archive.org/web";

const USER_AGENT: &str = "NewsLensBot/0.1 (+https://github.com/newslens/newslens)";

const MAX_ATTEMPTS: usize = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(4);
const BACKOFF_CAP: Duration = Duration::from_secs(10);

/// Finds the archived copy of a URL closest to a target instant.
#[async_trait]
pub trait SnapshotResolver: Send + Sync {
    async fn resolve(
        &self,
        source_url: &str,
        target: NaiveDateTime,
    ) -> Result<ResolvedSnapshot, ResolveError>;
}

/// [`SnapshotResolver`] backed by the Wayback Machine CDX API.
pub struct WaybackResolver {
    client: reqwest::Client,
    cdx_api: String,
}

impl WaybackResolver {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client with static configuration");
        WaybackResolver {
            client,
            cdx_api: CDX_API.to_string(),
        }
    }

    /// One index query, no retry.
    async fn query_cdx(
        &self,
        source_url: &str,
        target: NaiveDateTime,
    ) -> Result<ResolvedSnapshot, ResolveError> {
        let day = target.format("%Y%m%d").to_string();
        let resp = self
            .client
            .get(&self.cdx_api)
            .query(&[
                ("url", source_url),
                ("from", day.as_str()),
                ("to", day.as_str()),
                ("output", "json"),
                ("filter", "statuscode:200"),
                ("collapse", "digest"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ResolveError::Index {
                status: status.as_u16(),
                message,
            });
        }

        let rows: Vec<Vec<String>> = resp
            .json()
            .await
            .map_err(|e| ResolveError::Malformed(e.to_string()))?;
        select_closest(&rows, target)
    }
}

impl Default for WaybackResolver {
    fn default() -> Self {
        WaybackResolver::new()
    }
}

#[async_trait]
impl SnapshotResolver for WaybackResolver {
    #[instrument(level = "info", skip(self), fields(%source_url, %target))]
    async fn resolve(
        &self,
        source_url: &str,
        target: NaiveDateTime,
    ) -> Result<ResolvedSnapshot, ResolveError> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.query_cdx(source_url, target).await {
                Ok(snapshot) => {
                    info!(
                        archive_url = %snapshot.archive_url,
                        actual = %snapshot.actual_timestamp,
                        "Resolved archive snapshot"
                    );
                    return Ok(snapshot);
                }
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    let delay = backoff_delay(attempt, BACKOFF_BASE, BACKOFF_CAP);
                    warn!(attempt, max = MAX_ATTEMPTS, ?delay, error = %e, "CDX query failed; backing off");
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Jittered exponential backoff: `min(base * 2^(attempt-1), cap)` plus up
/// to 250ms of jitter.
pub(crate) fn backoff_delay(attempt: usize, base: Duration, cap: Duration) -> Duration {
    let mut delay = base.saturating_mul(1 << (attempt.saturating_sub(1)).min(16));
    if delay > cap {
        delay = cap;
    }
    let jitter_ms: u64 = rng().random_range(0..=250);
    delay + Duration::from_millis(jitter_ms)
}

/// Pick the data row whose capture timestamp is nearest the target.
///
/// CDX `output=json` is an array of arrays: a header row, then
/// `[urlkey, timestamp, original, mimetype, statuscode, digest, length]`.
/// A header-only response means no capture exists for the day. Ties on the
/// absolute difference keep the first-listed candidate, so repeated calls
/// over an unchanged index are idempotent.
fn select_closest(
    rows: &[Vec<String>],
    target: NaiveDateTime,
) -> Result<ResolvedSnapshot, ResolveError> {
    if rows.len() <= 1 {
        return Err(ResolveError::NotFound);
    }

    let mut best: Option<(i64, NaiveDateTime, &str, &str)> = None;
    for row in &rows[1..] {
        if row.len() < 3 {
            debug!(?row, "Skipping short CDX row");
            continue;
        }
        let Some(captured) = parse_cdx_timestamp(&row[1]) else {
            debug!(timestamp = %row[1], "Skipping CDX row with unparsable timestamp");
            continue;
        };
        let diff = (captured - target).num_seconds().abs();
        // Strict comparison keeps the first-seen candidate on ties.
        if best.map(|(d, _, _, _)| diff < d).unwrap_or(true) {
            best = Some((diff, captured, &row[1], &row[2]));
        }
    }

    match best {
        Some((_, captured, ts, original)) => Ok(ResolvedSnapshot {
            archive_url: replay_url(ts, original),
            actual_timestamp: captured,
        }),
        None => Err(ResolveError::Malformed(
            "index returned rows but none were usable".to_string(),
        )),
    }
}

/// Join the replay base, capture timestamp, and original URL. The original
/// URL goes in verbatim; re-encoding it would break replay.
fn replay_url(timestamp: &str, original: &str) -> String {
    format!("{REPLAY_BASE}/{timestamp}/{original}")
}

fn parse_cdx_timestamp(ts: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(ts, "%Y%m%d%H%M%S").ok()
}
