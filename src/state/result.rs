use crate::classifier::ClassificationResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Kind of a recorded crawl error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The page did not load within the configured timeout
    FetchTimeout,

    /// Connection, DNS, TLS or transport failure
    NetworkError,

    /// The site refused the request (401, 403, 429, ...)
    BlockedByTarget,

    /// The page was reached but its content could not be classified
    ClassificationSkipped,

    /// The domain crawl ended early
    DomainFatal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchTimeout => "fetch_timeout",
            Self::NetworkError => "network_error",
            Self::BlockedByTarget => "blocked_by_target",
            Self::ClassificationSkipped => "classification_skipped",
            Self::DomainFatal => "domain_fatal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure recorded against one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlError {
    pub url: String,
    pub kind: ErrorKind,
    pub reason: String,
}

impl CrawlError {
    pub fn new(url: impl Into<String>, kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            reason: reason.into(),
        }
    }
}

/// A visited URL together with its depth and classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub url: String,
    pub depth: u32,
    pub classification: ClassificationResult,
}

/// Everything one domain crawl produced
///
/// Built incrementally by its `DomainCrawler` and handed over to the
/// orchestrator when the crawl reaches `Done`.
#[derive(Debug, Clone, Serialize)]
pub struct DomainCrawlResult {
    /// The target domain as configured
    pub domain: String,

    /// URLs classified as product pages
    pub product_urls: BTreeSet<String>,

    /// All URLs visited (classified), including product pages
    pub crawled_urls: BTreeSet<String>,

    /// Per-URL failures, in the order they happened
    pub errors: Vec<CrawlError>,

    /// Visited URLs in visit order
    pub visits: Vec<Visit>,

    /// The error that ended the crawl early, if any
    pub fatal: Option<CrawlError>,

    /// Whether the crawl was stopped by cancellation
    pub cancelled: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DomainCrawlResult {
    /// Creates an empty result for `domain`
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            product_urls: BTreeSet::new(),
            crawled_urls: BTreeSet::new(),
            errors: Vec::new(),
            visits: Vec::new(),
            fatal: None,
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Creates a finished result for a domain whose crawl died before producing anything
    pub fn failed(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        let domain = domain.into();
        let mut result = Self::new(domain.clone());
        result.fatal = Some(CrawlError::new(domain, ErrorKind::DomainFatal, reason));
        result.finish();
        result
    }

    /// Creates a finished result for a domain that was cancelled before it started
    pub fn cancelled(domain: impl Into<String>) -> Self {
        let mut result = Self::new(domain);
        result.cancelled = true;
        result.finish();
        result
    }

    /// Records a visited URL and its classification
    pub fn record_visit(&mut self, url: &str, depth: u32, classification: ClassificationResult) {
        self.crawled_urls.insert(url.to_string());
        if classification.is_product {
            self.product_urls.insert(url.to_string());
        }
        self.visits.push(Visit {
            url: url.to_string(),
            depth,
            classification,
        });
    }

    /// Records a product URL found in a link without visiting it
    pub fn record_product(&mut self, url: &str) {
        self.product_urls.insert(url.to_string());
    }

    /// Records a recoverable per-URL failure
    pub fn record_error(&mut self, error: CrawlError) {
        self.errors.push(error);
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Returns the depth at which `url` was visited
    pub fn depth_of(&self, url: &str) -> Option<u32> {
        self.visits.iter().find(|v| v.url == url).map(|v| v.depth)
    }

    /// Returns true if the crawl ended with a domain-fatal error
    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    /// Duration of the crawl in whole milliseconds, if finished
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds())
    }
}

/// Results of a whole crawl run, keyed by domain
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub domains: BTreeMap<String, DomainCrawlResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancelled: bool,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self {
            domains: BTreeMap::new(),
            started_at: Utc::now(),
            finished_at: None,
            cancelled: false,
        }
    }

    /// Merges a completed domain result
    pub fn insert(&mut self, result: DomainCrawlResult) {
        self.domains.insert(result.domain.clone(), result);
    }

    pub fn get(&self, domain: &str) -> Option<&DomainCrawlResult> {
        self.domains.get(domain)
    }

    /// Domain to sorted product URLs, the shape of `product_urls.json`
    pub fn product_url_map(&self) -> BTreeMap<String, Vec<String>> {
        self.domains
            .iter()
            .map(|(domain, r)| (domain.clone(), r.product_urls.iter().cloned().collect()))
            .collect()
    }

    /// Domain to sorted crawled URLs, the shape of `crawled_urls.json`
    pub fn crawled_url_map(&self) -> BTreeMap<String, Vec<String>> {
        self.domains
            .iter()
            .map(|(domain, r)| (domain.clone(), r.crawled_urls.iter().cloned().collect()))
            .collect()
    }

    /// Domain to every recorded error, fatal error last
    pub fn error_map(&self) -> BTreeMap<String, Vec<CrawlError>> {
        self.domains
            .iter()
            .map(|(domain, r)| {
                let mut errors = r.errors.clone();
                errors.extend(r.fatal.clone());
                (domain.clone(), errors)
            })
            .collect()
    }

    pub fn total_product_urls(&self) -> usize {
        self.domains.values().map(|r| r.product_urls.len()).sum()
    }

    pub fn total_crawled_urls(&self) -> usize {
        self.domains.values().map(|r| r.crawled_urls.len()).sum()
    }
}

impl Default for AggregateResult {
    fn default() -> Self {
        Self::new()
    }
}
