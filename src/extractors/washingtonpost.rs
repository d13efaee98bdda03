//! Washington Post headline extraction.
//!
//! The Post uses a spread of container classes for headlines across layout
//! revisions, so the candidate set is wider than the other sources'. When
//! extraction runs against an archive replay, article links point back
//! into the replay wrapper and get unwrapped to their original
//! destinations.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::{MAX_HEADLINES, clean_text, resolve_article_url};
use crate::models::HeadlineRecord;

static CONTAINER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "div.headline, div.story-headline, div.article-headline, div.story, \
         article.headline, article.story-headline, article.article-headline, article.story",
    )
    .expect("static selector")
});
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h2, h3").expect("static selector"));
static HEADING_FALLBACK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".headline, .story-headline").expect("static selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

pub fn extract(html: &str, base_url: &str) -> Vec<HeadlineRecord> {
    let document = Html::parse_document(html);
    let mut headlines = Vec::new();

    for container in document.select(&CONTAINER) {
        if headlines.len() >= MAX_HEADLINES {
            break;
        }
        let heading = container
            .select(&HEADING)
            .next()
            .or_else(|| container.select(&HEADING_FALLBACK).next());
        let Some(heading) = heading else {
            continue;
        };
        let text = clean_text(&heading.text().collect::<String>());
        if text.is_empty() {
            continue;
        }
        let Some(link) = container.select(&ANCHOR).next() else {
            continue;
        };
        let Some(article_url) = link
            .value()
            .attr("href")
            .and_then(|href| resolve_article_url(base_url, href))
        else {
            continue;
        };

        let mut record = HeadlineRecord::new(text, headlines.len() as u32);
        record.article_url = Some(article_url);
        headlines.push(record);
    }

    headlines
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.washingtonpost.com";

    #[test]
    fn test_extracts_headline_containers() {
        let html = r#"<html><body>
            <div class="story"><h2>Top story</h2><a href="/politics/top">read</a></div>
            <article class="headline"><h3>Second story</h3><a href="/world/second">read</a></article>
        </body></html>"#;
        let headlines = extract(html, BASE);
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].text, "Top story");
        assert_eq!(
            headlines[0].article_url.as_deref(),
            Some("https://www.washingtonpost.com/politics/top")
        );
    }

    #[test]
    fn test_replay_links_are_unwrapped() {
        let html = r#"<html><body>
            <div class="story"><h2>Archived story</h2>
              <a href="https://web.archive.org/web/20250418060000/https://www.washingtonpost.com/national/story/">read</a>
            </div>
        </body></html>"#;
        let headlines = extract(html, BASE);
        assert_eq!(
            headlines[0].article_url.as_deref(),
            Some("https://www.washingtonpost.com/national/story/")
        );
    }

    #[test]
    fn test_empty_headline_or_missing_link_is_skipped() {
        let html = r#"<html><body>
            <div class="story"><h2>   </h2><a href="/x">read</a></div>
            <div class="headline"><h2>No link here</h2></div>
        </body></html>"#;
        assert!(extract(html, BASE).is_empty());
    }

    #[test]
    fn test_malformed_markup_yields_empty_list() {
        assert!(extract("", BASE).is_empty());
        assert!(extract("</div></div><div class=story>", BASE).is_empty());
    }
}
