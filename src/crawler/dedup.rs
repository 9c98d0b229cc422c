//! URL deduplication
//!
//! Guarantees that no URL is crawled more than once per run, regardless of
//! how many pages link to it or whether they link to `/x` or `/x/`.

use crate::url::normalize;
use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;

/// Tracks which URLs the crawler has already accepted.
///
/// The set grows monotonically for the lifetime of a run and is guarded by
/// a mutex so worker batches filter atomically. The default value is ready
/// to use.
#[derive(Debug, Default)]
pub struct Deduplicator {
    visited: Mutex<HashSet<String>>,
}

impl Deduplicator {
    /// Filters a batch of candidates down to the ones never seen before,
    /// preserving input order. Candidates are normalized before the set
    /// lookup and the returned URLs are the normalized forms.
    pub fn filter(&self, urls: Vec<Url>) -> Vec<Url> {
        let mut visited = self.visited.lock().expect("visited set poisoned");

        let mut novel = Vec::new();
        for url in urls {
            let url = normalize(url);
            if visited.insert(url.to_string()) {
                novel.push(url);
            }
        }
        novel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_filter() {
        let dedup = Deduplicator::default();

        let urls = vec![
            parse("https://example.com/a"),
            parse("https://example.com/b"),
            parse("https://example.com/c"),
        ];

        let novel = dedup.filter(urls.clone());
        assert_eq!(novel.len(), 3);

        let novel = dedup.filter(urls);
        assert_eq!(novel.len(), 0);

        let novel = dedup.filter(vec![parse("https://example.com/d")]);
        assert_eq!(novel.len(), 1);
    }

    #[test]
    fn test_filter_preserves_order() {
        let dedup = Deduplicator::default();

        let novel = dedup.filter(vec![
            parse("https://example.com/z"),
            parse("https://example.com/a"),
            parse("https://example.com/m"),
        ]);

        let paths: Vec<&str> = novel.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/z", "/a", "/m"]);
    }

    #[test]
    fn test_filter_collapses_trailing_slash() {
        let dedup = Deduplicator::default();

        let novel = dedup.filter(vec![
            parse("https://example.com/a"),
            parse("https://example.com/a/"),
        ]);
        assert_eq!(novel.len(), 1);

        let novel = dedup.filter(vec![parse("https://example.com/a/")]);
        assert_eq!(novel.len(), 0);
    }

    #[test]
    fn test_filter_duplicates_within_batch() {
        let dedup = Deduplicator::default();

        let novel = dedup.filter(vec![
            parse("https://example.com/a"),
            parse("https://example.com/a"),
            parse("https://example.com/a"),
        ]);
        assert_eq!(novel.len(), 1);
    }
}
