//! Statistics over a finished crawl
//!
//! This module provides functionality for summarizing an
//! [`AggregateResult`] and displaying the numbers at the end of a run.

use crate::classifier::Signal;
use crate::state::{AggregateResult, DomainCrawlResult, ErrorKind};
use std::collections::BTreeMap;

/// Per-domain line of the statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStatistics {
    pub domain: String,
    pub crawled: usize,
    pub products: usize,
    pub errors: usize,
    pub fatal: bool,
    pub cancelled: bool,
    pub max_depth: u32,
    pub duration_ms: Option<i64>,
}

impl DomainStatistics {
    fn from_result(result: &DomainCrawlResult) -> Self {
        Self {
            domain: result.domain.clone(),
            crawled: result.crawled_urls.len(),
            products: result.product_urls.len(),
            errors: result.errors.len(),
            fatal: result.is_fatal(),
            cancelled: result.cancelled,
            max_depth: result.visits.iter().map(|v| v.depth).max().unwrap_or(0),
            duration_ms: result.duration_ms(),
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Number of domains in the run
    pub domains: usize,

    /// Domains that ended with a domain-fatal error
    pub failed_domains: usize,

    /// Total URLs visited across all domains
    pub total_crawled: usize,

    /// Total product URLs across all domains
    pub total_products: usize,

    /// Product URLs by the signal that identified them
    pub products_by_signal: BTreeMap<Signal, usize>,

    /// Per-URL errors by kind, fatal errors included
    pub errors_by_kind: BTreeMap<ErrorKind, usize>,

    /// Visited pages per depth
    pub pages_by_depth: BTreeMap<u32, usize>,

    /// Whether the run was cancelled
    pub cancelled: bool,

    /// Wall-clock duration of the run in seconds
    pub duration_seconds: Option<i64>,

    pub per_domain: Vec<DomainStatistics>,
}

impl CrawlStatistics {
    /// Computes statistics from the results of a run
    pub fn from_results(results: &AggregateResult) -> Self {
        let mut stats = Self {
            domains: results.domains.len(),
            cancelled: results.cancelled,
            duration_seconds: results
                .finished_at
                .map(|finished| (finished - results.started_at).num_seconds()),
            ..Self::default()
        };

        for result in results.domains.values() {
            stats.total_crawled += result.crawled_urls.len();
            stats.total_products += result.product_urls.len();
            if result.is_fatal() {
                stats.failed_domains += 1;
            }

            for visit in &result.visits {
                *stats.pages_by_depth.entry(visit.depth).or_default() += 1;
                if visit.classification.is_product {
                    *stats
                        .products_by_signal
                        .entry(visit.classification.signal)
                        .or_default() += 1;
                }
            }

            for error in result.errors.iter().chain(result.fatal.iter()) {
                *stats.errors_by_kind.entry(error.kind).or_default() += 1;
            }

            stats.per_domain.push(DomainStatistics::from_result(result));
        }

        stats
    }

    pub fn total_errors(&self) -> usize {
        self.errors_by_kind.values().sum()
    }

    /// Share of visited pages classified as products, in percent
    pub fn product_rate(&self) -> f64 {
        if self.total_crawled == 0 {
            0.0
        } else {
            (self.total_products as f64 / self.total_crawled as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Domains crawled: {}", stats.domains);
    println!("  Domains failed: {}", stats.failed_domains);
    println!("  Pages visited: {}", stats.total_crawled);
    println!(
        "  Product pages: {} ({:.1}%)",
        stats.total_products,
        stats.product_rate()
    );
    if let Some(seconds) = stats.duration_seconds {
        println!("  Duration: {}s", seconds);
    }
    if stats.cancelled {
        println!("  Run was cancelled; results are partial");
    }
    println!();

    if !stats.products_by_signal.is_empty() {
        println!("Products by Signal:");
        for (signal, count) in &stats.products_by_signal {
            println!("  {:?}: {}", signal, count);
        }
        println!();
    }

    println!("Per Domain:");
    for domain in &stats.per_domain {
        let status = if domain.fatal {
            " [failed]"
        } else if domain.cancelled {
            " [cancelled]"
        } else {
            ""
        };
        println!(
            "  {}: {} products / {} pages, {} errors{}",
            domain.domain, domain.products, domain.crawled, domain.errors, status
        );
    }
    println!();

    if !stats.errors_by_kind.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = stats.errors_by_kind.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in error_counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassificationResult;
    use crate::state::CrawlError;

    fn visit(result: &mut DomainCrawlResult, url: &str, depth: u32, signal: Signal) {
        result.record_visit(
            url,
            depth,
            ClassificationResult {
                url: url.to_string(),
                is_product: signal != Signal::None,
                signal,
            },
        );
    }

    fn sample() -> AggregateResult {
        let mut shop = DomainCrawlResult::new("shop.test");
        visit(&mut shop, "https://shop.test/", 0, Signal::None);
        visit(&mut shop, "https://shop.test/category/shoes", 1, Signal::None);
        visit(&mut shop, "https://shop.test/p/1", 2, Signal::UrlPattern);
        visit(&mut shop, "https://shop.test/women/red", 2, Signal::ContentMatch);
        shop.record_error(CrawlError::new(
            "https://shop.test/slow",
            ErrorKind::FetchTimeout,
            "timed out",
        ));
        shop.finish();

        let mut results = AggregateResult::new();
        results.insert(shop);
        results.insert(DomainCrawlResult::failed("down.test", "seed page unreachable"));
        results
    }

    #[test]
    fn test_statistics_totals() {
        let stats = CrawlStatistics::from_results(&sample());

        assert_eq!(stats.domains, 2);
        assert_eq!(stats.failed_domains, 1);
        assert_eq!(stats.total_crawled, 4);
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_errors(), 2);
        assert!((stats.product_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_breakdowns() {
        let stats = CrawlStatistics::from_results(&sample());

        assert_eq!(stats.products_by_signal[&Signal::UrlPattern], 1);
        assert_eq!(stats.products_by_signal[&Signal::ContentMatch], 1);
        assert_eq!(stats.pages_by_depth[&2], 2);
        assert_eq!(stats.errors_by_kind[&ErrorKind::FetchTimeout], 1);
        assert_eq!(stats.errors_by_kind[&ErrorKind::DomainFatal], 1);
    }

    #[test]
    fn test_per_domain_lines() {
        let stats = CrawlStatistics::from_results(&sample());

        // BTreeMap order: down.test before shop.test
        assert_eq!(stats.per_domain[0].domain, "down.test");
        assert!(stats.per_domain[0].fatal);
        assert_eq!(stats.per_domain[1].max_depth, 2);
        assert_eq!(stats.per_domain[1].products, 2);
    }

    #[test]
    fn test_empty_results() {
        let stats = CrawlStatistics::from_results(&AggregateResult::new());
        assert_eq!(stats.total_crawled, 0);
        assert_eq!(stats.product_rate(), 0.0);
        assert!(stats.per_domain.is_empty());
    }
}
