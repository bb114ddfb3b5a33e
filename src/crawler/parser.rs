//! HTML parser for extracting links and visible text
//!
//! This module handles parsing rendered HTML to extract:
//! - Links to follow (from <a> tags and canonical links)
//! - The visible body text used by the content classifier
//! - Page title

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// File extensions that never lead to an HTML page
const NON_PAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".pdf", ".css", ".js", ".zip",
    ".mp4", ".mp3", ".woff", ".woff2",
];

/// Elements whose text is not visible page content
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Visible body text, whitespace-collapsed
    pub text: String,

    /// Unique absolute links in document order
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts links, text and title
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - fragment-only links
/// - links to images, stylesheets, scripts, PDFs and other static files
/// - anything that is not HTTP(S) after resolution
///
/// # Example
///
/// ```
/// use product_scout::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Shoes</title></head><body><a href="/p/1">Runner</a></body></html>"#;
/// let base_url = Url::parse("https://shop.test/category/shoes").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title.as_deref(), Some("Shoes"));
/// assert_eq!(parsed.links[0].as_str(), "https://shop.test/p/1");
/// assert_eq!(parsed.text, "Runner");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        text: extract_text(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects the visible text of <body>, skipping scripts and styles
fn extract_text(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };

    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut words: Vec<&str> = Vec::new();
    collect_visible_text(body, &mut words);
    words.join(" ")
}

fn collect_visible_text<'a>(element: ElementRef<'a>, words: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            words.extend(text.split_whitespace());
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !INVISIBLE_ELEMENTS.contains(&child_element.value().name()) {
                collect_visible_text(child_element, words);
            }
        }
    }
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut push = |url: Url| {
        if seen.insert(url.as_str().to_string()) {
            links.push(url);
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                push(url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                push(url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;

    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    let path = absolute_url.path().to_ascii_lowercase();
    if NON_PAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return None;
    }

    Some(absolute_url)
}
