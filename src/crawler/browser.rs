//! Headless Chromium page fetcher
//!
//! Renders pages with a real browser so content built by JavaScript is
//! visible to the classifier. One browser process is shared by every domain
//! crawl; each fetch opens and closes its own tab.

use crate::config::FetcherConfig;
use crate::crawler::fetcher::{FetchError, FetchedPage, PageFetcher};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::future::BoxFuture;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Hands `value` to `close` on the current runtime when dropped
///
/// A fetch future dropped mid-render (cancellation) still closes its tab.
struct CloseOnDrop<T: Send + 'static> {
    value: Option<T>,
    close: fn(T) -> BoxFuture<'static, ()>,
}

impl<T: Send + 'static> CloseOnDrop<T> {
    fn new(value: T, close: fn(T) -> BoxFuture<'static, ()>) -> Self {
        Self {
            value: Some(value),
            close,
        }
    }
}

impl<T: Send + 'static> Drop for CloseOnDrop<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn((self.close)(value));
            }
        }
    }
}

fn close_tab(page: Page) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close tab: {}", e);
        }
    })
}

pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    alive: Arc<AtomicBool>,
    user_agent: String,
    scroll_passes: u32,
    scroll_wait: Duration,
}

impl BrowserFetcher {
    /// Launches Chromium and starts its event handler
    pub async fn launch(config: &FetcherConfig, headless: bool) -> Result<Self, FetchError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(Duration::from_secs(30))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !headless {
            builder = builder.with_head();
        }

        let browser_config = builder.build().map_err(FetchError::Fatal)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::Fatal(format!("failed to launch browser: {}", e)))?;

        let alive = Arc::new(AtomicBool::new(true));
        let handler_alive = alive.clone();
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            handler_alive.store(false, Ordering::SeqCst);
            tracing::warn!("Browser event handler stopped");
        });

        tracing::info!("Browser launched (headless: {})", headless);

        Ok(Self {
            browser,
            handler,
            alive,
            user_agent: config.user_agent.clone(),
            scroll_passes: config.scroll_passes,
            scroll_wait: Duration::from_millis(config.scroll_wait_ms),
        })
    }

    async fn render(&self, page: &Page, url: &Url) -> Result<FetchedPage, FetchError> {
        page.goto(url.as_str())
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        // Lazy-loaded listings only reveal links after scrolling
        for _ in 0..self.scroll_passes {
            if let Err(e) = page.evaluate(SCROLL_SCRIPT).await {
                tracing::debug!("Scroll failed on {}: {}", url, e);
                break;
            }
            tokio::time::sleep(self.scroll_wait).await;
        }

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        Ok(FetchedPage::from_html(final_url, &html))
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(FetchError::Fatal("browser is no longer running".into()));
        }

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Fatal(format!("failed to open tab: {}", e)))?;
        let _tab = CloseOnDrop::new(page.clone(), close_tab);

        if let Err(e) = page.set_user_agent(self.user_agent.as_str()).await {
            tracing::debug!("Could not set user agent: {}", e);
        }

        match tokio::time::timeout(timeout, self.render(&page, url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
