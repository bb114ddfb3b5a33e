use crate::url::NormalizeRules;
use serde::Deserialize;

/// Main configuration structure for Product Scout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Domains to crawl, bare hosts or full origins
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub normalize: NormalizeRules,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler budgets and scheduling
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of URLs admitted per domain
    #[serde(rename = "max-pages-per-domain")]
    pub max_pages_per_domain: u32,

    /// Maximum depth to crawl from the seed URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Run the browser without a window
    pub headless: bool,

    /// Maximum number of domains crawled at the same time
    #[serde(rename = "max-concurrent-domains")]
    pub max_concurrent_domains: u32,

    /// Extra attempts for timed-out or network-failed fetches
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Pause between fetch attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Overall run timeout in seconds, 0 disables it
    #[serde(rename = "run-timeout-secs")]
    pub run_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages_per_domain: 500,
            max_depth: 10,
            timeout_ms: 30_000,
            headless: true,
            max_concurrent_domains: 4,
            max_retries: 1,
            retry_delay_ms: 1_000,
            run_timeout_secs: 0,
        }
    }
}

/// Which page fetcher implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherBackend {
    /// Plain HTTP GET, static HTML only
    #[default]
    Http,
    /// Headless Chromium (requires the `browser` feature)
    Browser,
}

/// Page fetcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub backend: FetcherBackend,

    /// User-Agent header sent by the HTTP backend and the browser
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Number of scroll-to-bottom passes after navigation (browser only)
    #[serde(rename = "scroll-passes")]
    pub scroll_passes: u32,

    /// Pause after each scroll pass (milliseconds)
    #[serde(rename = "scroll-wait-ms")]
    pub scroll_wait_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            backend: FetcherBackend::Http,
            user_agent: format!("product-scout/{}", env!("CARGO_PKG_VERSION")),
            scroll_passes: 3,
            scroll_wait_ms: 1_000,
        }
    }
}

/// Product classifier rules
///
/// Patterns are regular expressions matched against the lowercased URL path.
/// Keywords are matched case-insensitively against the rendered page text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    #[serde(rename = "url-patterns")]
    pub url_patterns: Vec<String>,

    /// Paths matching any of these are never product URLs by pattern
    #[serde(rename = "exclusion-patterns")]
    pub exclusion_patterns: Vec<String>,

    #[serde(rename = "content-keywords")]
    pub content_keywords: Vec<String>,

    /// Distinct keywords required for a content match
    #[serde(rename = "min-content-matches")]
    pub min_content_matches: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            url_patterns: owned(&[
                "/product/",
                "/products/",
                "/item/",
                "/p/",
                "/dp/",
                "/pd/",
                "/detail/",
                "/view/",
                "/show/",
                "/product-detail/",
                "/buy/",
                "/shop/product",
            ]),
            exclusion_patterns: owned(&[
                "/category/",
                "/search/",
                "/cart/",
                "/login/",
                "/account/",
                "/wishlist/",
                "/about/",
                "/contact/",
                "/help/",
                "/faq/",
                r"\.(jpe?g|png|gif|webp|svg|pdf|css|js)$",
            ]),
            content_keywords: owned(&[
                "add to cart",
                "add to bag",
                "add to basket",
                "buy now",
                "delivery time",
                "sku",
                "item number",
                "model number",
                "in stock",
                "out of stock",
                "quantity",
                "size chart",
                "size guide",
                "inclusive of all taxes",
            ]),
            min_content_matches: 1,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the JSON listings and the summary
    pub directory: String,

    /// Optional plain-text log file, in addition to stderr
    #[serde(rename = "log-file")]
    pub log_file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "crawler_output".to_string(),
            log_file: None,
        }
    }
}
