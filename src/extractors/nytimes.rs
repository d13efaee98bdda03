//! New York Times headline extraction.
//!
//! The NYT homepage wraps each story in a `section.story-wrapper`; the
//! headline text sits in a `p.indicate-hover`. The current layout carries
//! no subheadlines or kickers in these wrappers.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::{MAX_HEADLINES, clean_text, resolve_article_url};
use crate::models::HeadlineRecord;

static STORY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("section.story-wrapper").expect("static selector"));
static HEADLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.indicate-hover").expect("static selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

pub fn extract(html: &str, base_url: &str) -> Vec<HeadlineRecord> {
    let document = Html::parse_document(html);
    let mut headlines = Vec::new();

    for story in document.select(&STORY) {
        if headlines.len() >= MAX_HEADLINES {
            break;
        }
        let Some(headline_el) = story.select(&HEADLINE).next() else {
            continue;
        };
        let Some(link) = story.select(&ANCHOR).next() else {
            continue;
        };
        let text = clean_text(&headline_el.text().collect::<String>());
        if text.is_empty() {
            continue;
        }

        let mut record = HeadlineRecord::new(text, headlines.len() as u32);
        record.article_url = link
            .value()
            .attr("href")
            .and_then(|href| resolve_article_url(base_url, href));
        headlines.push(record);
    }

    headlines
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.nytimes.com";

    fn story(href: &str, headline: &str) -> String {
        format!(
            r#"<section class="story-wrapper">
                 <a href="{href}"><p class="indicate-hover">{headline}</p></a>
               </section>"#
        )
    }

    #[test]
    fn test_extracts_story_wrappers_in_document_order() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            story("/2025/04/18/us/lead.html", "Lead story"),
            story("/2025/04/18/world/second.html", "Second story"),
        );
        let headlines = extract(&html, BASE);
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].text, "Lead story");
        assert_eq!(
            headlines[0].article_url.as_deref(),
            Some("https://www.nytimes.com/2025/04/18/us/lead.html")
        );
        assert_eq!(headlines[1].rank, 1);
    }

    #[test]
    fn test_caps_at_top_three() {
        let stories: String = (0..6)
            .map(|i| story(&format!("/story-{i}.html"), &format!("Story {i}")))
            .collect();
        let headlines = extract(&format!("<html><body>{stories}</body></html>"), BASE);
        assert_eq!(headlines.len(), 3);
    }

    #[test]
    fn test_wrapper_without_headline_paragraph_is_skipped() {
        let html = r#"<html><body>
            <section class="story-wrapper"><a href="/x">bare link</a></section>
        </body></html>"#;
        assert!(extract(html, BASE).is_empty());
    }

    #[test]
    fn test_malformed_markup_yields_empty_list() {
        assert!(extract("", BASE).is_empty());
        assert!(extract("<section class='story-wrapper'>", BASE).is_empty());
    }
}
