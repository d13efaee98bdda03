//! CNN headline extraction.
//!
//! CNN's homepage marks article links with `container__link--type-article`;
//! only links inside lead-package containers count as main headlines. The
//! headline text lives in a `container__headline-text` span, and a second
//! such span under the same parent (when present) is the subheadline.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{MAX_HEADLINES, clean_text, resolve_article_url};
use crate::models::HeadlineRecord;

static ARTICLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.container__link--type-article").expect("static selector"));
static HEADLINE_TEXT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.container__headline-text").expect("static selector"));

const LEAD_CLASSES: [&str; 2] = [
    "container_lead-package__link",
    "container_lead-plus-headlines-with-images__link",
];

pub fn extract(html: &str, base_url: &str) -> Vec<HeadlineRecord> {
    let document = Html::parse_document(html);
    let mut headlines = Vec::new();

    for link in document.select(&ARTICLE_LINK) {
        if headlines.len() >= MAX_HEADLINES {
            break;
        }
        let is_lead = link
            .value()
            .classes()
            .any(|c| LEAD_CLASSES.contains(&c));
        if !is_lead {
            continue;
        }
        let Some(headline_el) = link.select(&HEADLINE_TEXT).next() else {
            continue;
        };
        let text = clean_text(&headline_el.text().collect::<String>());
        if text.is_empty() {
            continue;
        }

        let mut record = HeadlineRecord::new(text.clone(), headlines.len() as u32);
        record.subheadline = sibling_headline(link, &text);
        record.article_url = link
            .value()
            .attr("href")
            .and_then(|href| resolve_article_url(base_url, href));
        headlines.push(record);
    }

    headlines
}

/// A different headline-text span under the same parent container serves
/// as the subheadline.
fn sibling_headline(link: ElementRef<'_>, own_text: &str) -> Option<String> {
    let parent = link.parent().and_then(ElementRef::wrap)?;
    for span in parent.select(&HEADLINE_TEXT) {
        let text = clean_text(&span.text().collect::<String>());
        if !text.is_empty() && text != own_text {
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.cnn.com";

    fn lead_link(href: &str, headline: &str) -> String {
        format!(
            r#"<a class="container__link container__link--type-article container_lead-package__link" href="{href}">
                 <span class="container__headline-text">{headline}</span>
               </a>"#
        )
    }

    #[test]
    fn test_extracts_lead_package_headlines_in_document_order() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            lead_link("/2025/04/18/politics/first", "First story"),
            lead_link("/2025/04/18/world/second", "Second story"),
        );
        let headlines = extract(&html, BASE);
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].text, "First story");
        assert_eq!(headlines[0].rank, 0);
        assert_eq!(
            headlines[0].article_url.as_deref(),
            Some("https://www.cnn.com/2025/04/18/politics/first")
        );
        assert_eq!(headlines[1].rank, 1);
    }

    #[test]
    fn test_non_lead_links_are_ignored() {
        let html = r#"<html><body>
            <a class="container__link container__link--type-article" href="/not-lead">
              <span class="container__headline-text">Secondary</span>
            </a>
        </body></html>"#;
        assert!(extract(html, BASE).is_empty());
    }

    #[test]
    fn test_caps_at_top_three() {
        let links: String = (0..5)
            .map(|i| lead_link(&format!("/story/{i}"), &format!("Story {i}")))
            .collect();
        let headlines = extract(&format!("<html><body>{links}</body></html>"), BASE);
        assert_eq!(headlines.len(), 3);
    }

    #[test]
    fn test_sibling_span_becomes_subheadline() {
        let html = r#"<html><body><div class="container__field-links">
            <a class="container__link--type-article container_lead-package__link" href="/a">
              <span class="container__headline-text">Main headline</span>
            </a>
            <span class="container__headline-text">Supporting line</span>
        </div></body></html>"#;
        let headlines = extract(html, BASE);
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].subheadline.as_deref(), Some("Supporting line"));
    }

    #[test]
    fn test_malformed_markup_yields_empty_list() {
        assert!(extract("", BASE).is_empty());
        assert!(extract("<<<>>> not html at all &&&", BASE).is_empty());
        assert!(extract("<html><body><p>no headlines</p></body>", BASE).is_empty());
    }
}
