//! Crawler module for discovering product pages
//!
//! This module contains the core crawling logic, including:
//! - The page fetcher seam, with HTTP and (optionally) browser backends
//! - HTML parsing for visible text and link extraction
//! - The per-domain breadth-first frontier
//! - Per-domain crawl loops and multi-domain orchestration

#[cfg(feature = "browser")]
mod browser;
mod domain_crawler;
mod fetcher;
mod frontier;
mod orchestrator;
mod parser;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use domain_crawler::{CrawlContext, DomainCrawler};
pub use fetcher::{
    build_http_client, fetch_with_retry, FetchError, FetchedPage, HttpFetcher, PageFetcher,
    RetryPolicy,
};
pub use frontier::{Frontier, FrontierEntry};
pub use orchestrator::CrawlOrchestrator;
pub use parser::{parse_html, ParsedPage};

use crate::config::{Config, FetcherBackend};
use crate::state::{AggregateResult, CrawlTarget};
use crate::CrawlerError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Creates the page fetcher selected by the configuration
///
/// The browser backend launches Chromium, so this can take a while.
pub async fn build_fetcher(config: &Config) -> Result<Arc<dyn PageFetcher>, FetchError> {
    match config.fetcher.backend {
        FetcherBackend::Http => {
            tracing::debug!("Using HTTP fetcher");
            Ok(Arc::new(HttpFetcher::new(&config.fetcher)?))
        }
        #[cfg(feature = "browser")]
        FetcherBackend::Browser => {
            let fetcher = BrowserFetcher::launch(&config.fetcher, config.crawler.headless).await?;
            Ok(Arc::new(fetcher))
        }
        #[cfg(not(feature = "browser"))]
        FetcherBackend::Browser => Err(FetchError::Fatal(
            "the browser backend requires building with --features browser".into(),
        )),
    }
}

/// Builds one crawl target per configured domain
pub fn targets_from_config(config: &Config) -> Vec<CrawlTarget> {
    config
        .domains
        .iter()
        .map(|domain| CrawlTarget::from_config(domain, &config.crawler))
        .collect()
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the page fetcher and the classifier
/// 2. Crawl every configured domain under the concurrency limit
/// 3. Return the merged per-domain results
///
/// # Example
///
/// ```no_run
/// use product_scout::config::load_config;
/// use product_scout::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let results = run_crawl(&config).await?;
/// println!("{} product URLs", results.total_product_urls());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<AggregateResult, CrawlerError> {
    run_crawl_with_cancel(config, CancellationToken::new()).await
}

/// Runs a complete crawl that stops early when `cancel` fires
pub async fn run_crawl_with_cancel(
    config: &Config,
    cancel: CancellationToken,
) -> Result<AggregateResult, CrawlerError> {
    let fetcher = build_fetcher(config).await?;
    let orchestrator = CrawlOrchestrator::from_config(config, fetcher)?;
    Ok(orchestrator
        .run_with_cancel(targets_from_config(config), cancel)
        .await)
}
