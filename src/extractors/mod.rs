//! Per-source headline extraction from rendered homepage markup.
//!
//! Each source gets its own strategy module, because each site's markup
//! differs structurally. Every strategy follows the same contract:
//!
//! 1. Identify candidate headline containers via source-specific
//!    structural markers, never one universal selector
//! 2. Pull headline text, and subheadline / editorial tag where the
//!    source carries them
//! 3. Order deterministically by the source's own visual prominence —
//!    document order for single-block layouts, an explicit priority
//!    table where content blocks compete
//! 4. Cap the result to a bounded top-N (3, unless the source
//!    intentionally surfaces more)
//!
//! Markup is adversarial input: extraction never panics, and malformed or
//! empty documents yield an empty list.
//!
//! # Supported Sources
//!
//! | Source | Module | Ordering |
//! |--------|--------|----------|
//! | CNN | [`cnn`] | document order, lead-package containers |
//! | Fox News | [`foxnews`] | document order, main-content articles |
//! | New York Times | [`nytimes`] | document order, story wrappers |
//! | Washington Post | [`washingtonpost`] | document order, headline containers |
//! | USA Today | [`usatoday`] | explicit category priority table |

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::models::HeadlineRecord;

pub mod cnn;
pub mod foxnews;
pub mod nytimes;
pub mod usatoday;
pub mod washingtonpost;

/// Default cap on extracted headlines per task.
pub const MAX_HEADLINES: usize = 3;

/// Dispatch to the extractor registered for a source key.
///
/// Returns `None` for an unknown key; the caller should skip extraction
/// rather than treat this as fatal. Keys are normalized (lowercased,
/// trailing `.com` stripped) so both `"cnn"` and `"CNN.com"` resolve.
pub fn extract(source_key: &str, html: &str, base_url: &str) -> Option<Vec<HeadlineRecord>> {
    match normalize_key(source_key).as_str() {
        "cnn" => Some(cnn::extract(html, base_url)),
        "foxnews" => Some(foxnews::extract(html, base_url)),
        "nytimes" => Some(nytimes::extract(html, base_url)),
        "washingtonpost" => Some(washingtonpost::extract(html, base_url)),
        "usatoday" => Some(usatoday::extract(html, base_url)),
        _ => None,
    }
}

fn normalize_key(source_key: &str) -> String {
    let key = source_key.trim().to_lowercase();
    key.strip_suffix(".com").unwrap_or(&key).to_string()
}

/// Normalize Unicode quotes and dashes to ASCII and collapse whitespace.
pub(crate) fn clean_text(text: &str) -> String {
    let replaced: String = text
        .chars()
        .flat_map(|c| match c {
            '\u{2018}' | '\u{2019}' => vec!['\''],
            '\u{201C}' | '\u{201D}' => vec!['"'],
            '\u{2013}' => vec!['-'],
            '\u{2014}' => vec!['-', '-'],
            other => vec![other],
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

static ARCHIVE_REPLAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://web\.archive\.org/web/\d+[a-z_]*/(.+)$").expect("static regex")
});

/// Unwrap an archive replay link back to its original destination.
pub(crate) fn unwrap_archive_url(url: &str) -> Option<String> {
    let tail = ARCHIVE_REPLAY_RE.captures(url)?.get(1)?.as_str();
    if tail.starts_with("http") {
        Some(tail.to_string())
    } else {
        Some(format!("https://{}", tail.trim_start_matches('/')))
    }
}

/// Resolve an article href to an absolute original-site URL.
///
/// Replay-wrapped links are unwrapped to their original destination;
/// relative links are resolved against `base_url`.
pub(crate) fn resolve_article_url(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if let Some(unwrapped) = unwrap_archive_url(href) {
        return Some(unwrapped);
    }
    if href.starts_with("http") {
        return Some(href.to_string());
    }
    Url::parse(base_url)
        .ok()?
        .join(href)
        .ok()
        .map(|u| u.to_string())
}
