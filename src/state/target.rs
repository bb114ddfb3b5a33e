use crate::config::CrawlerConfig;
use crate::url::{normalize_url, NormalizeRules};
use crate::UrlResult;
use std::time::Duration;
use url::Url;

/// One domain to crawl, with its budgets
///
/// A target is built from the caller's configuration and never changes once
/// its `DomainCrawler` starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Bare host (`shop.test`) or full origin URL (`http://127.0.0.1:8080`)
    pub domain: String,

    /// Maximum number of URLs admitted to the frontier
    pub max_pages: u32,

    /// Maximum link-hop distance from the seed
    pub max_depth: u32,

    /// Per-request fetch timeout
    pub timeout: Duration,
}

impl CrawlTarget {
    /// Creates a target for `domain` using the crawler budgets
    pub fn from_config(domain: &str, config: &CrawlerConfig) -> Self {
        Self {
            domain: domain.trim().to_string(),
            max_pages: config.max_pages_per_domain,
            max_depth: config.max_depth,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Returns the normalized seed URL for this target
    ///
    /// Bare hosts are crawled over HTTPS starting at `/`; origins that carry
    /// their own scheme are used as given.
    ///
    /// # Examples
    ///
    /// ```
    /// use product_scout::state::CrawlTarget;
    /// use product_scout::url::NormalizeRules;
    /// use std::time::Duration;
    ///
    /// let target = CrawlTarget {
    ///     domain: "shop.test".to_string(),
    ///     max_pages: 10,
    ///     max_depth: 2,
    ///     timeout: Duration::from_secs(5),
    /// };
    /// let seed = target.seed_url(&NormalizeRules::default()).unwrap();
    /// assert_eq!(seed.as_str(), "https://shop.test/");
    /// ```
    pub fn seed_url(&self, rules: &NormalizeRules) -> UrlResult<Url> {
        let raw = if self.domain.contains("://") {
            self.domain.clone()
        } else {
            format!("https://{}/", self.domain)
        };
        normalize_url(&raw, rules)
    }
}
