//! Page fetching
//!
//! This module defines the [`PageFetcher`] seam used by the domain crawler and
//! the plain-HTTP implementation of it:
//! - Building an HTTP client with the configured user agent
//! - GET requests bounded by the per-page timeout
//! - Error classification into [`FetchError`]
//! - Bounded retries for transient failures

use crate::config::FetcherConfig;
use crate::crawler::parser::parse_html;
use crate::state::ErrorKind;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A rendered page as seen by the classifier
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// Contents of `<title>`, if any
    pub title: Option<String>,

    /// Visible body text
    pub text: String,

    /// Absolute outbound links, not yet scoped or normalized
    pub links: Vec<Url>,
}

impl FetchedPage {
    /// Builds a page from HTML, extracting text and links relative to `final_url`
    pub fn from_html(final_url: Url, html: &str) -> Self {
        let parsed = parse_html(html, &final_url);
        Self {
            final_url,
            title: parsed.title,
            text: parsed.text,
            links: parsed.links,
        }
    }
}

/// Why a fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("page did not load within the timeout")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("blocked by target (HTTP {status})")]
    Blocked { status: u16 },

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("unsupported content type '{content_type}'")]
    Unsupported { content_type: String },

    #[error("fetcher failure: {0}")]
    Fatal(String),
}

impl FetchError {
    /// Timeouts, transport errors and server errors are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Status { status } => *status >= 500,
            _ => false,
        }
    }

    /// The fetcher itself is unusable; the domain cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Maps the failure to the kind recorded in crawl errors
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::FetchTimeout,
            Self::Network(_) | Self::Status { .. } => ErrorKind::NetworkError,
            Self::Blocked { .. } => ErrorKind::BlockedByTarget,
            Self::Unsupported { .. } => ErrorKind::ClassificationSkipped,
            Self::Fatal(_) => ErrorKind::DomainFatal,
        }
    }
}

/// Navigates to a URL and returns the rendered page
///
/// Implementations must respect `timeout` for the whole navigation and must
/// be safe to share between concurrently running domain crawls.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError>;
}

/// Retry settings for transient fetch failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,

    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(1))
    }
}

/// Fetches `url`, retrying transient failures
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Timeout | Retry up to `max_retries` times |
/// | Network error | Retry up to `max_retries` times |
/// | HTTP 5xx | Retry up to `max_retries` times |
/// | HTTP 401/403/429/451 | Immediate → Blocked |
/// | Other HTTP 4xx | Immediate → Status |
/// | Non-HTML content | Immediate → Unsupported |
/// | Fetcher failure | Immediate → Fatal |
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &Url,
    timeout: Duration,
    policy: &RetryPolicy,
) -> Result<FetchedPage, FetchError> {
    let mut attempt = 0;

    loop {
        match fetcher.fetch(url, timeout).await {
            Ok(page) => return Ok(page),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                tracing::debug!(
                    "Retrying {} after {} (attempt {}/{})",
                    url,
                    err,
                    attempt,
                    policy.max_retries
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Requests carry no client-wide timeout; each fetch sets its own.
///
/// # Example
///
/// ```no_run
/// use product_scout::config::FetcherConfig;
/// use product_scout::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches static HTML over plain HTTP
///
/// Sees only server-rendered markup; pages that build their content with
/// JavaScript need the browser backend.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client =
            build_http_client(config).map_err(|e| FetchError::Fatal(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        // A missing header is treated as HTML
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(FetchError::Unsupported { content_type });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(FetchedPage::from_html(final_url, &body))
    }
}

fn classify_status(status: StatusCode) -> FetchError {
    match status.as_u16() {
        401 | 403 | 429 | 451 => FetchError::Blocked {
            status: status.as_u16(),
        },
        code => FetchError::Status { status: code },
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}
