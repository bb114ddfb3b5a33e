//! In-memory site used by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use product_scout::config::Config;
use product_scout::crawler::{CrawlOrchestrator, FetchError, FetchedPage, PageFetcher};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

enum MockResponse {
    Page { text: String, links: Vec<String> },
    Fail(FetchError),
    Panic,
}

/// Serves canned pages keyed by exact URL and records every fetch
///
/// Unknown URLs answer with HTTP 404.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    calls: Mutex<Vec<String>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page with visible `text` linking to `links` (relative or absolute)
    pub fn page(mut self, url: &str, text: &str, links: &[&str]) -> Self {
        self.responses.insert(
            url.to_string(),
            MockResponse::Page {
                text: text.to_string(),
                links: links.iter().map(|l| l.to_string()).collect(),
            },
        );
        self
    }

    pub fn fail(mut self, url: &str, error: FetchError) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Fail(error));
        self
    }

    pub fn panic_on(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), MockResponse::Panic);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == url).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> Result<FetchedPage, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.responses.get(url.as_str()) {
            Some(MockResponse::Page { text, links }) => Ok(FetchedPage {
                final_url: url.clone(),
                title: None,
                text: text.clone(),
                links: links.iter().filter_map(|l| url.join(l).ok()).collect(),
            }),
            Some(MockResponse::Fail(error)) => Err(error.clone()),
            Some(MockResponse::Panic) => panic!("mock fetcher exploded on {}", url),
            None => Err(FetchError::Status { status: 404 }),
        }
    }
}

/// A valid configuration for `domains` with no retry delay
pub fn config_for(domains: &[&str]) -> Config {
    let mut config = Config {
        domains: domains.iter().map(|d| d.to_string()).collect(),
        ..Config::default()
    };
    config.crawler.retry_delay_ms = 0;
    config.crawler.timeout_ms = 1_000;
    config
}

pub fn orchestrator(config: &Config, fetcher: Arc<MockFetcher>) -> CrawlOrchestrator {
    CrawlOrchestrator::from_config(config, fetcher).unwrap()
}
