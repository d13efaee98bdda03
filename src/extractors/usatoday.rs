//! USA Today headline extraction.
//!
//! USA Today's top table mixes competing content blocks (a hero article,
//! regular tiles, and section bundles further down the page), so document
//! order does not reflect prominence. Ordering instead comes from an
//! explicit category-to-rank priority table; the hero always leads, and
//! unmapped categories sort last. The result is not capped at three — the
//! source intentionally surfaces more stories in its top table.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashMap;

use super::{clean_text, resolve_article_url};
use crate::models::HeadlineRecord;

static TOP_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.gnt_m_tt").expect("static selector"));
static HERO: Lazy<Selector> = Lazy::new(|| Selector::parse("a.gnt_m_he").expect("static selector"));
static HERO_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[data-tb-title]").expect("static selector"));
static SUBTITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.gnt_sbt").expect("static selector"));
static TILE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.gnt_m_tl").expect("static selector"));
static TILE_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.gnt_m_tl_c").expect("static selector"));
static BUNDLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.gnt_m_sb").expect("static selector"));
static BUNDLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.gnt_m_sb_hl").expect("static selector"));

// Legacy front-page layout, still seen on older snapshots.
static LEGACY_MODULE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "div.gnt_m_flm_a, div.gnt_m_flm_b, article.gnt_m_flm_a, article.gnt_m_flm_b",
    )
    .expect("static selector")
});
static LEGACY_HEADING: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h2.gnt_m_hd, h3.gnt_m_hd, h2.gnt_m_flm_hd, h3.gnt_m_flm_hd")
        .expect("static selector")
});
static LEGACY_SUBTITLE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p.gnt_m_sbt, div.gnt_m_sbt, p.gnt_m_flm_sbt, div.gnt_m_flm_sbt")
        .expect("static selector")
});
static LEGACY_KICKER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.gnt_m_kw, span.gnt_m_kw, div.gnt_m_flm_kw, span.gnt_m_flm_kw")
        .expect("static selector")
});
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

/// Category ranks; lower means more prominent. Unmapped categories fall to
/// [`DEFAULT_PRIORITY`]. New sections are data additions here, not code
/// changes.
static CATEGORY_PRIORITIES: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("GRAPHICS", 1),
        ("CELEBRITIES", 2),
        ("WORLD", 3),
        ("U.S. News", 4),
        ("Investigations", 5),
        ("Politics", 6),
        ("Sports", 7),
        ("Entertainment", 8),
        ("Tech", 9),
        ("Wellness", 10),
        ("Travel", 11),
        ("Money", 12),
        ("Shopping", 13),
        ("USA TODAY 10BEST", 14),
        ("Just Curious", 15),
        ("Opinion", 16),
        ("Tax Season", 17),
        ("Trending Video", 18),
    ])
});

const HERO_PRIORITY: u32 = 0;
const DEFAULT_PRIORITY: u32 = 20;

fn priority_for(category: Option<&str>) -> u32 {
    category
        .and_then(|c| CATEGORY_PRIORITIES.get(c).copied())
        .unwrap_or(DEFAULT_PRIORITY)
}

struct Candidate {
    record: HeadlineRecord,
    priority: u32,
}

pub fn extract(html: &str, base_url: &str) -> Vec<HeadlineRecord> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    if let Some(top_table) = document.select(&TOP_TABLE).next() {
        // Hero article leads regardless of category.
        if let Some(hero) = top_table.select(&HERO).next() {
            if let Some(title) = hero.select(&HERO_TITLE).next() {
                let text = clean_text(&title.text().collect::<String>());
                if !text.is_empty() {
                    let category = hero
                        .select(&SUBTITLE)
                        .next()
                        .and_then(|s| s.value().attr("data-c-ms"))
                        .map(str::to_string);
                    let mut record = HeadlineRecord::new(text, 0);
                    record.category = category;
                    record.article_url = hero
                        .value()
                        .attr("href")
                        .and_then(|href| resolve_article_url(base_url, href));
                    candidates.push(Candidate {
                        record,
                        priority: HERO_PRIORITY,
                    });
                }
            }
        }

        for tile in top_table.select(&TILE) {
            if tile.value().attr("rel") == Some("sponsored") {
                continue;
            }
            let Some(title) = tile.select(&TILE_TITLE).next() else {
                continue;
            };
            let text = clean_text(&title.text().collect::<String>());
            if text.is_empty() {
                continue;
            }
            let category = tile
                .select(&SUBTITLE)
                .next()
                .and_then(|s| s.value().attr("data-c-ms"))
                .map(str::to_string);
            let priority = priority_for(category.as_deref());
            let mut record = HeadlineRecord::new(text, 0);
            record.category = category;
            record.article_url = tile
                .value()
                .attr("href")
                .and_then(|href| resolve_article_url(base_url, href));
            candidates.push(Candidate { record, priority });
        }
    }

    for bundle in document.select(&BUNDLE) {
        let section = bundle.value().attr("data-m-lbl").map(str::to_string);
        for link in bundle.select(&BUNDLE_LINK) {
            // Bundle links carry the headline in their title attribute.
            let Some(title) = link.value().attr("title") else {
                continue;
            };
            let text = clean_text(title);
            if text.is_empty() {
                continue;
            }
            let priority = priority_for(section.as_deref());
            let mut record = HeadlineRecord::new(text, 0);
            record.category = section.clone();
            record.article_url = link
                .value()
                .attr("href")
                .and_then(|href| resolve_article_url(base_url, href));
            candidates.push(Candidate { record, priority });
        }
    }

    if candidates.is_empty() {
        candidates = extract_legacy(&document, base_url);
    }

    // Stable sort keeps document order within equal priorities.
    candidates.sort_by_key(|c| c.priority);
    candidates
        .into_iter()
        .enumerate()
        .map(|(i, mut c)| {
            c.record.rank = i as u32;
            c.record
        })
        .collect()
}

/// Older snapshots predate the top-table layout; fall back to the flim
/// modules and derive the category from the story URL path.
fn extract_legacy(document: &Html, base_url: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for module in document.select(&LEGACY_MODULE) {
        let Some(heading) = module.select(&LEGACY_HEADING).next() else {
            continue;
        };
        let text = clean_text(&heading.text().collect::<String>());
        if text.is_empty() {
            continue;
        }
        let Some(link) = module.select(&ANCHOR).next() else {
            continue;
        };
        let article_url = link
            .value()
            .attr("href")
            .and_then(|href| resolve_article_url(base_url, href));
        let category = article_url.as_deref().and_then(category_from_path);
        let priority = priority_for(category.as_deref());

        let mut record = HeadlineRecord::new(text, 0);
        record.subheadline = module
            .select(&LEGACY_SUBTITLE)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());
        record.editorial_tag = module
            .select(&LEGACY_KICKER)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());
        record.category = category;
        record.article_url = article_url;
        candidates.push(Candidate { record, priority });
    }
    candidates
}

fn category_from_path(url: &str) -> Option<String> {
    let tail = url.split("/story/").nth(1)?;
    let segment = tail.split('/').next()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.usatoday.com";

    #[test]
    fn test_hero_outranks_mapped_categories() {
        let html = r#"<html><body><div class="gnt_m_tt">
            <a class="gnt_m_tl" href="/story/news/world/w1/">
              <div class="gnt_m_tl_c">World story</div>
              <div class="gnt_sbt" data-c-ms="WORLD"></div>
            </a>
            <a class="gnt_m_he" href="/story/news/hero/">
              <span data-tb-title>Hero story</span>
              <div class="gnt_sbt" data-c-ms="Politics"></div>
            </a>
        </div></body></html>"#;
        let headlines = extract(html, BASE);
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].text, "Hero story");
        assert_eq!(headlines[0].rank, 0);
        assert_eq!(headlines[1].text, "World story");
        assert_eq!(headlines[1].category.as_deref(), Some("WORLD"));
    }

    #[test]
    fn test_unmapped_categories_sort_last() {
        let html = r#"<html><body><div class="gnt_m_tt">
            <a class="gnt_m_tl" href="/story/mystery/m1/">
              <div class="gnt_m_tl_c">Mystery section</div>
              <div class="gnt_sbt" data-c-ms="Mystery"></div>
            </a>
            <a class="gnt_m_tl" href="/story/sports/s1/">
              <div class="gnt_m_tl_c">Sports story</div>
              <div class="gnt_sbt" data-c-ms="Sports"></div>
            </a>
        </div></body></html>"#;
        let headlines = extract(html, BASE);
        assert_eq!(headlines[0].text, "Sports story");
        assert_eq!(headlines[1].text, "Mystery section");
    }

    #[test]
    fn test_sponsored_tiles_are_skipped() {
        let html = r#"<html><body><div class="gnt_m_tt">
            <a class="gnt_m_tl" rel="sponsored" href="/ad">
              <div class="gnt_m_tl_c">Sponsored thing</div>
            </a>
        </div></body></html>"#;
        assert!(extract(html, BASE).is_empty());
    }

    #[test]
    fn test_section_bundles_use_their_label_for_priority() {
        let html = r#"<html><body>
            <div class="gnt_m_sb" data-m-lbl="Opinion">
              <a class="gnt_m_sb_hl" title="Opinion piece" href="/story/opinion/o1/"></a>
            </div>
            <div class="gnt_m_sb" data-m-lbl="WORLD">
              <a class="gnt_m_sb_hl" title="World brief" href="/story/news/world/w2/"></a>
            </div>
        </body></html>"#;
        let headlines = extract(html, BASE);
        assert_eq!(headlines[0].text, "World brief");
        assert_eq!(headlines[0].category.as_deref(), Some("WORLD"));
        assert_eq!(headlines[1].text, "Opinion piece");
    }

    #[test]
    fn test_legacy_layout_fallback() {
        let html = r#"<html><body>
            <div class="gnt_m_flm_a">
              <h2 class="gnt_m_flm_hd">Legacy headline</h2>
              <p class="gnt_m_flm_sbt">Legacy subtitle</p>
              <a href="/story/sports/legacy/">read</a>
            </div>
        </body></html>"#;
        let headlines = extract(html, BASE);
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].text, "Legacy headline");
        assert_eq!(headlines[0].subheadline.as_deref(), Some("Legacy subtitle"));
        assert_eq!(headlines[0].category.as_deref(), Some("SPORTS"));
    }

    #[test]
    fn test_result_is_not_capped_at_three() {
        let tiles: String = (0..5)
            .map(|i| {
                format!(
                    r#"<a class="gnt_m_tl" href="/story/news/t{i}/">
                         <div class="gnt_m_tl_c">Tile {i}</div>
                       </a>"#
                )
            })
            .collect();
        let html = format!(r#"<html><body><div class="gnt_m_tt">{tiles}</div></body></html>"#);
        assert_eq!(extract(&html, BASE).len(), 5);
    }

    #[test]
    fn test_malformed_markup_yields_empty_list() {
        assert!(extract("", BASE).is_empty());
        assert!(extract("<div class='gnt_m_tt'><a class='gnt_m_he'>", BASE).is_empty());
    }
}
