//! Per-domain crawl frontier
//!
//! A FIFO queue of URLs waiting to be visited, paired with the set of every
//! URL ever admitted. FIFO order gives a breadth-first crawl: all pages at
//! depth `n` are dequeued before any page at depth `n + 1`.
//!
//! The frontier enforces both budgets of a [`CrawlTarget`]: nothing deeper
//! than `max_depth` is admitted, and no more than `max_pages` URLs are ever
//! admitted in total.

use crate::state::CrawlTarget;
use crate::url::{dedup_key, NormalizeRules};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting in the frontier with the depth it was discovered at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL
    pub url: Url,

    /// Link distance from the seed (seed = 0)
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Breadth-first queue with deduplication and budgets
///
/// URLs are expected to be normalized before they are pushed; two URLs with
/// the same dedup key are the same page.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
    rules: NormalizeRules,
    max_depth: u32,
    max_pages: usize,
}

impl Frontier {
    pub fn new(max_depth: u32, max_pages: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            rules: NormalizeRules::default(),
            max_depth,
            max_pages: max_pages as usize,
        }
    }

    /// Creates a frontier with the budgets of `target`
    pub fn for_target(target: &CrawlTarget) -> Self {
        Self::new(target.max_depth, target.max_pages)
    }

    /// Uses `rules` when deciding whether two URLs are the same page
    pub fn with_rules(mut self, rules: NormalizeRules) -> Self {
        self.rules = rules;
        self
    }

    /// Admits `entry` unless it was seen before, is too deep, or the page
    /// budget is spent
    ///
    /// # Returns
    ///
    /// `true` if the entry was queued
    pub fn push(&mut self, entry: FrontierEntry) -> bool {
        if entry.depth > self.max_depth || self.budget_exhausted() {
            return false;
        }

        if !self.seen.insert(dedup_key(&entry.url, &self.rules)) {
            return false;
        }

        self.queue.push_back(entry);
        true
    }

    /// Removes the oldest entry
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of entries still waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Total number of URLs ever admitted
    pub fn admitted(&self) -> usize {
        self.seen.len()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.seen.len() >= self.max_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(url: &str, depth: u32) -> FrontierEntry {
        FrontierEntry::new(Url::parse(url).unwrap(), depth)
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new(5, 10);
        frontier.push(entry("https://shop.test/", 0));
        frontier.push(entry("https://shop.test/a", 1));
        frontier.push(entry("https://shop.test/b", 1));

        assert_eq!(frontier.pop().unwrap().url.path(), "/");
        assert_eq!(frontier.pop().unwrap().url.path(), "/a");
        assert_eq!(frontier.pop().unwrap().url.path(), "/b");
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut frontier = Frontier::new(5, 10);
        assert!(frontier.push(entry("https://shop.test/a", 1)));
        assert!(!frontier.push(entry("https://shop.test/a", 2)));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_scheme_does_not_split_pages() {
        let mut frontier = Frontier::new(5, 10);
        assert!(frontier.push(entry("https://shop.test/a", 1)));
        assert!(!frontier.push(entry("http://shop.test/a", 1)));
    }

    #[test]
    fn test_www_variant_is_same_page() {
        let mut frontier = Frontier::new(5, 10);
        assert!(frontier.push(entry("https://www.shop.test/a", 1)));
        assert!(!frontier.push(entry("https://shop.test/a", 1)));

        let mut strict = Frontier::new(5, 10).with_rules(NormalizeRules {
            strip_www: false,
            ..NormalizeRules::default()
        });
        assert!(strict.push(entry("https://www.shop.test/a", 1)));
        assert!(strict.push(entry("https://shop.test/a", 1)));
    }

    #[test]
    fn test_popped_url_stays_seen() {
        let mut frontier = Frontier::new(5, 10);
        frontier.push(entry("https://shop.test/", 0));
        frontier.pop();

        assert!(frontier.is_empty());
        assert!(!frontier.push(entry("https://shop.test/", 1)));
    }

    #[test]
    fn test_depth_limit() {
        let mut frontier = Frontier::new(1, 10);
        assert!(frontier.push(entry("https://shop.test/", 0)));
        assert!(frontier.push(entry("https://shop.test/a", 1)));
        assert!(!frontier.push(entry("https://shop.test/a/b", 2)));
    }

    #[test]
    fn test_page_budget() {
        let mut frontier = Frontier::new(5, 2);
        assert!(frontier.push(entry("https://shop.test/", 0)));
        assert!(frontier.push(entry("https://shop.test/a", 1)));
        assert!(frontier.budget_exhausted());
        assert!(!frontier.push(entry("https://shop.test/b", 1)));

        // Popping frees nothing; the budget counts admissions
        frontier.pop();
        assert!(!frontier.push(entry("https://shop.test/c", 1)));
        assert_eq!(frontier.admitted(), 2);
    }

    #[test]
    fn test_for_target() {
        let target = CrawlTarget {
            domain: "shop.test".into(),
            max_pages: 1,
            max_depth: 0,
            timeout: std::time::Duration::from_secs(1),
        };
        let mut frontier = Frontier::for_target(&target);
        assert!(!frontier.push(entry("https://shop.test/a", 1)));
        assert!(frontier.push(entry("https://shop.test/", 0)));
        assert!(!frontier.push(entry("https://shop.test/b", 0)));
    }

    proptest! {
        #[test]
        fn prop_budgets_hold(
            pushes in proptest::collection::vec((0u32..40, 0u32..6), 0..200),
            max_depth in 0u32..5,
            max_pages in 1u32..30,
        ) {
            let mut frontier = Frontier::new(max_depth, max_pages);
            for (page, depth) in pushes {
                frontier.push(entry(&format!("https://shop.test/page/{}", page), depth));
            }

            prop_assert!(frontier.admitted() <= max_pages as usize);

            let mut popped = HashSet::new();
            let mut last_depth = 0;
            while let Some(e) = frontier.pop() {
                prop_assert!(e.depth <= max_depth);
                prop_assert!(popped.insert(e.url.to_string()));
                last_depth = last_depth.max(e.depth);
            }
            prop_assert!(last_depth <= max_depth);
        }
    }
}
