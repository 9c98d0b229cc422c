//! Link extraction from HTML and CSS bodies
//!
//! HTML documents yield the targets of every `<a>` and `<link>` element;
//! CSS files yield their `@import` references. Discovered references are
//! resolved against the page that contained them and filtered through the
//! follow predicate before they reach the crawler.

use crate::url::follow;
use crate::CrawlError;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Matches `@import "reset.css"` style directives.
fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"@import *"([^"]+)""#).expect("static regex"))
}

/// Extracts followable links from an HTML document.
///
/// Visits every `<a>` and `<link>` element, reading `href` and falling
/// back to `src`. References that fail to resolve are skipped rather than
/// failing the page. Fragments and query strings are dropped so the same
/// document reached via different anchors dedupes to one crawl.
pub fn extract_html(body: &[u8], root: &Url, page: &Url) -> Result<Vec<Url>, CrawlError> {
    let document = Html::parse_document(&String::from_utf8_lossy(body));
    let selector = Selector::parse("a, link").expect("static selector");

    let mut urls = Vec::new();
    for element in document.select(&selector) {
        let href = element
            .value()
            .attr("href")
            .or_else(|| element.value().attr("src"))
            .unwrap_or("");
        if href.is_empty() {
            continue;
        }

        let Ok(mut resolved) = page.join(href) else {
            continue;
        };
        resolved.set_fragment(None);
        resolved.set_query(None);

        if follow(root, &resolved) {
            urls.push(resolved);
        }
    }

    Ok(urls)
}

/// Extracts followable `@import` targets from a CSS file.
///
/// Unlike HTML extraction, a reference that fails to resolve fails the
/// whole extraction: a stylesheet with a broken import is treated as an
/// errored resource.
pub fn extract_css(body: &[u8], root: &Url, page: &Url) -> Result<Vec<Url>, CrawlError> {
    let body = String::from_utf8_lossy(body);

    let mut urls = Vec::new();
    for capture in import_re().captures_iter(&body) {
        let import = &capture[1];
        let resolved = page.join(import).map_err(|source| CrawlError::CssImport {
            import: import.to_string(),
            source,
        })?;

        if follow(root, &resolved) {
            urls.push(resolved);
        }
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("http://example.com/").unwrap()
    }

    fn page(path: &str) -> Url {
        Url::parse("http://example.com/").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_html_anchor_links() {
        let body = br#"<html><body>
            <a href="/about">About</a>
            <a href="posts/7">Post</a>
        </body></html>"#;

        let urls = extract_html(body, &root(), &page("/")).unwrap();
        let paths: Vec<&str> = urls.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/about", "/posts/7"]);
    }

    #[test]
    fn test_html_link_elements() {
        let body = br#"<html><head>
            <link rel="stylesheet" href="/style.css">
        </head></html>"#;

        let urls = extract_html(body, &root(), &page("/")).unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].path(), "/style.css");
    }

    #[test]
    fn test_html_src_fallback() {
        let body = br#"<html><head><link src="/feed.xml"></head></html>"#;

        let urls = extract_html(body, &root(), &page("/")).unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].path(), "/feed.xml");
    }

    #[test]
    fn test_html_strips_fragment_and_query() {
        let body = br#"<html><body>
            <a href="/page?tab=1#section">One</a>
            <a href="/page">Two</a>
        </body></html>"#;

        let urls = extract_html(body, &root(), &page("/")).unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "http://example.com/page");
        assert_eq!(urls[0], urls[1]);
    }

    #[test]
    fn test_html_same_origin_gate() {
        let body = br#"<html><body>
            <a href="http://example.com/ok">Ok</a>
            <a href="http://other.com/x">Other</a>
            <a href="mailto:a@b">Mail</a>
        </body></html>"#;

        let urls = extract_html(body, &root(), &page("/")).unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].path(), "/ok");
    }

    #[test]
    fn test_html_relative_resolution() {
        let body = br#"<html><body><a href="sibling">S</a></body></html>"#;

        let urls = extract_html(body, &root(), &page("/docs/intro")).unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].path(), "/docs/sibling");
    }

    #[test]
    fn test_html_empty_href_skipped() {
        let body = br#"<html><body><a href="">Empty</a><a>None</a></body></html>"#;

        let urls = extract_html(body, &root(), &page("/")).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_css_imports() {
        let body = br#"
            @import "reset.css";
            @import  "theme/dark.css";
            body { color: black; }
        "#;

        let urls = extract_css(body, &root(), &page("/style.css")).unwrap();
        let paths: Vec<&str> = urls.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/reset.css", "/theme/dark.css"]);
    }

    #[test]
    fn test_css_import_same_origin_gate() {
        let body = br#"@import "http://cdn.other.com/lib.css";"#;

        let urls = extract_css(body, &root(), &page("/style.css")).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_css_bad_import_fails_extraction() {
        let body = br#"@import "http://[broken";"#;

        let result = extract_css(body, &root(), &page("/style.css"));
        match result.unwrap_err() {
            CrawlError::CssImport { import, .. } => assert_eq!(import, "http://[broken"),
            other => panic!("expected css import error, got {}", other),
        }
    }

    #[test]
    fn test_css_no_imports() {
        let body = b"body { margin: 0; }";

        let urls = extract_css(body, &root(), &page("/style.css")).unwrap();
        assert!(urls.is_empty());
    }
}
