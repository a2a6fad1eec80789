// src/page/model.rs
// =============================================================================
// This module reads a fetched page: its <title> and every <a href>.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// The parsed DOM is thrown away as soon as we have the title and links.
// `scraper::Html` is not Send, and a crawl unit has to hold the Page across
// .await points, so a Page keeps plain Strings only.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

use crate::error::CrawlError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    title: String,
    links: Vec<String>,
}

impl Page {
    // Builds a page from the raw bytes of a response body.
    //
    // Parameters:
    //   url: the page's own URL (only used to attribute errors)
    //   content: the raw body
    //
    // Fails with CrawlError::Parse when the body is not UTF-8 text.
    pub fn parse(url: &str, content: &[u8]) -> Result<Page, CrawlError> {
        let text = std::str::from_utf8(content).map_err(|e| CrawlError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Page::from_html(text))
    }

    pub fn from_html(html: &str) -> Page {
        let document = Html::parse_document(html);

        // Both selectors are constants and known to be valid
        let title_selector = Selector::parse("title").expect("valid title selector");
        let link_selector = Selector::parse("a[href]").expect("valid link selector");

        // Only the first <title> counts, an empty string when there is none
        let title = document
            .select(&title_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        // Document order, duplicates kept: dedup is the visited set's job
        let links = document
            .select(&link_selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect();

        Page { title, links }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    // Raw href values, exactly as written in the page
    pub fn links(&self) -> &[String] {
        &self.links
    }
}

// Resolves an href found on `base` into something the crawler can fetch.
//
// Returns: Some(url) or None if the link is not worth crawling
//
// Examples:
//   base = "https://example.com/page"
//   href = "https://other.com/x" -> Some("https://other.com/x") (untouched)
//   href = "/docs"               -> Some("https://example.com/docs")
//   href = "#top"                -> None (same page)
//   href = "mailto:a@b.c"        -> None (not HTTP)
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    match Url::parse(href) {
        // Already absolute: keep the exact string so dedup sees what the page wrote
        Ok(url) => is_crawlable(&url).then(|| href.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let url = base.join(href).ok()?;
            is_crawlable(&url).then(|| url.to_string())
        }
        Err(_) => None,
    }
}

fn is_crawlable(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}
