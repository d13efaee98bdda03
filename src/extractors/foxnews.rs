//! Fox News headline extraction.
//!
//! Fox wraps stories in `article` elements, scoped under `main` when the
//! page carries one. Headlines come from `h2`/`h3`, the subheadline from a
//! `dek`/`subtitle` paragraph, and the editorial kicker from
//! `div.kicker span.kicker-text`. Only articles whose container classes
//! mark them as main-content count.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{MAX_HEADLINES, clean_text, resolve_article_url};
use crate::models::HeadlineRecord;

static MAIN: Lazy<Selector> = Lazy::new(|| Selector::parse("main").expect("static selector"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").expect("static selector"));
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h2, h3").expect("static selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static DEK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.dek, p.subtitle").expect("static selector"));
static KICKER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.kicker span.kicker-text").expect("static selector"));

const MAIN_CLASSES: [&str; 3] = ["article", "article-ct", "main-content"];

pub fn extract(html: &str, base_url: &str) -> Vec<HeadlineRecord> {
    let document = Html::parse_document(html);
    let containers: Vec<ElementRef<'_>> = match document.select(&MAIN).next() {
        Some(main) => main.select(&ARTICLE).collect(),
        None => document.select(&ARTICLE).collect(),
    };

    let mut headlines = Vec::new();
    for container in containers {
        if headlines.len() >= MAX_HEADLINES {
            break;
        }
        let is_main = container
            .value()
            .classes()
            .any(|c| MAIN_CLASSES.contains(&c));
        if !is_main {
            continue;
        }
        let Some(heading) = container.select(&HEADING).next() else {
            continue;
        };
        let text = clean_text(&heading.text().collect::<String>());
        if text.is_empty() {
            continue;
        }
        let Some(link) = heading
            .select(&ANCHOR)
            .next()
            .or_else(|| container.select(&ANCHOR).next())
        else {
            continue;
        };

        let mut record = HeadlineRecord::new(text, headlines.len() as u32);
        record.article_url = link
            .value()
            .attr("href")
            .and_then(|href| resolve_article_url(base_url, href));
        record.subheadline = container
            .select(&DEK)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());
        record.editorial_tag = container
            .select(&KICKER)
            .next()
            .map(|el| clean_text(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty());
        headlines.push(record);
    }

    headlines
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.foxnews.com";

    #[test]
    fn test_extracts_main_articles_with_dek_and_kicker() {
        let html = r#"<html><body><main>
            <article class="article">
              <div class="kicker"><span class="kicker-text">EXCLUSIVE</span></div>
              <h2><a href="/politics/big-story">Big story</a></h2>
              <p class="dek">All the details inside</p>
            </article>
        </main></body></html>"#;
        let headlines = extract(html, BASE);
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].text, "Big story");
        assert_eq!(headlines[0].editorial_tag.as_deref(), Some("EXCLUSIVE"));
        assert_eq!(
            headlines[0].subheadline.as_deref(),
            Some("All the details inside")
        );
        assert_eq!(
            headlines[0].article_url.as_deref(),
            Some("https://www.foxnews.com/politics/big-story")
        );
    }

    #[test]
    fn test_articles_outside_main_classes_are_ignored() {
        let html = r#"<html><body><main>
            <article class="sidebar-promo">
              <h3><a href="/promo">Promo</a></h3>
            </article>
        </main></body></html>"#;
        assert!(extract(html, BASE).is_empty());
    }

    #[test]
    fn test_falls_back_to_document_scope_without_main() {
        let html = r#"<html><body>
            <article class="article-ct">
              <h3><a href="/story">Fallback story</a></h3>
            </article>
        </body></html>"#;
        let headlines = extract(html, BASE);
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].text, "Fallback story");
    }

    #[test]
    fn test_article_without_link_is_skipped() {
        let html = r#"<html><body><main>
            <article class="article"><h2>Linkless headline</h2></article>
        </main></body></html>"#;
        assert!(extract(html, BASE).is_empty());
    }

    #[test]
    fn test_malformed_markup_yields_empty_list() {
        assert!(extract("", BASE).is_empty());
        assert!(extract("<main><article class=", BASE).is_empty());
    }
}
