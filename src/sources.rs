//! The immutable news source catalog and default capture schedule.
//!
//! Sources are configuration data: created at seed time, read-only during
//! pipeline runs. The `short_id` is the canonical key used for storage keys
//! and for looking up the per-source crop and extraction rules; `domain` is
//! what the archive index is queried with.

use chrono::NaiveTime;

/// One catalog entry for a tracked news homepage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    /// Stable, human-readable canonical key (e.g. `"cnn"`).
    pub short_id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Homepage URL, used as the extraction base URL.
    pub home_url: &'static str,
    /// Bare domain the archive index is queried with (e.g. `"cnn.com"`).
    pub domain: &'static str,
    /// Coarse editorial region.
    pub region: &'static str,
}

static CATALOG: [Source; 5] = [
    Source {
        short_id: "cnn",
        name: "CNN",
        home_url: "https://www.cnn.com",
        domain: "cnn.com",
        region: "us",
    },
    Source {
        short_id: "foxnews",
        name: "Fox News",
        home_url: "https://www.foxnews.com",
        domain: "foxnews.com",
        region: "us",
    },
    Source {
        short_id: "nytimes",
        name: "New York Times",
        home_url: "https://www.nytimes.com",
        domain: "nytimes.com",
        region: "us",
    },
    Source {
        short_id: "washingtonpost",
        name: "Washington Post",
        home_url: "https://www.washingtonpost.com",
        domain: "washingtonpost.com",
        region: "us",
    },
    Source {
        short_id: "usatoday",
        name: "USA Today",
        home_url: "https://www.usatoday.com",
        domain: "usatoday.com",
        region: "us",
    },
];

/// All tracked sources, in catalog order. The order is part of the run's
/// deterministic task grid.
pub fn catalog() -> &'static [Source] {
    &CATALOG
}

/// The fixed five-slot daily schedule used when no `--times` are given.
pub fn default_times() -> Vec<NaiveTime> {
    [(6, 0), (9, 0), (12, 0), (15, 0), (18, 0)]
        .iter()
        .map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
        .collect()
}
