//! Multi-domain crawl orchestration
//!
//! Runs one [`DomainCrawler`] per target, at most `max_concurrent_domains` at
//! a time, and merges their results. A domain that panics or fails is
//! recorded as failed; the others keep running.

use crate::classifier::ProductClassifier;
use crate::config::Config;
use crate::crawler::domain_crawler::{CrawlContext, DomainCrawler};
use crate::crawler::fetcher::{PageFetcher, RetryPolicy};
use crate::state::{AggregateResult, CrawlTarget, DomainCrawlResult};
use crate::ConfigError;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Schedules domain crawls under a global concurrency limit
pub struct CrawlOrchestrator {
    ctx: CrawlContext,
    max_concurrent: usize,
    run_timeout: Option<Duration>,
}

impl CrawlOrchestrator {
    pub fn new(ctx: CrawlContext, max_concurrent: usize, run_timeout: Option<Duration>) -> Self {
        Self {
            ctx,
            max_concurrent: max_concurrent.max(1),
            run_timeout,
        }
    }

    /// Builds an orchestrator from configuration around an existing fetcher
    pub fn from_config(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self, ConfigError> {
        let classifier = ProductClassifier::from_config(&config.classifier)?;
        let retry = RetryPolicy::new(
            config.crawler.max_retries,
            Duration::from_millis(config.crawler.retry_delay_ms),
        );
        let ctx = CrawlContext::new(
            fetcher,
            Arc::new(classifier),
            config.normalize.clone(),
            retry,
        );
        let run_timeout = match config.crawler.run_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self::new(
            ctx,
            config.crawler.max_concurrent_domains as usize,
            run_timeout,
        ))
    }

    /// Crawls every target and returns the merged results
    pub async fn run(&self, targets: Vec<CrawlTarget>) -> AggregateResult {
        self.run_with_cancel(targets, CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), stopping early once `cancel` fires
    ///
    /// Domains still waiting for a slot when the run is cancelled are
    /// reported as cancelled; running domains stop after their current page.
    /// Every target appears in the aggregate exactly once.
    pub async fn run_with_cancel(
        &self,
        targets: Vec<CrawlTarget>,
        cancel: CancellationToken,
    ) -> AggregateResult {
        let mut aggregate = AggregateResult::new();
        let targets = dedup_targets(targets);

        tracing::info!(
            "Crawling {} domains, {} at a time",
            targets.len(),
            self.max_concurrent
        );

        let timer = self.run_timeout.map(|limit| spawn_run_timer(limit, cancel.clone()));
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let domains: Vec<String> = targets.iter().map(|t| t.domain.clone()).collect();

        let mut tasks = JoinSet::new();
        for target in targets {
            tasks.spawn(run_isolated(
                target,
                self.ctx.clone(),
                semaphore.clone(),
                cancel.clone(),
            ));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    tracing::info!(
                        "Finished {}: {} products, {} pages",
                        result.domain,
                        result.product_urls.len(),
                        result.crawled_urls.len()
                    );
                    aggregate.insert(result);
                }
                Err(e) => tracing::error!("Domain task failed: {}", e),
            }
        }

        for domain in domains {
            if aggregate.get(&domain).is_none() {
                aggregate.insert(DomainCrawlResult::failed(domain, "crawl task was lost"));
            }
        }

        if let Some(timer) = timer {
            timer.abort();
        }

        aggregate.cancelled = cancel.is_cancelled();
        aggregate.finished_at = Some(Utc::now());
        aggregate
    }
}

/// Waits for a slot, then crawls `target` in its own task
///
/// The inner task boundary turns a panic inside the crawl into a failed
/// result for this domain only.
async fn run_isolated(
    target: CrawlTarget,
    ctx: CrawlContext,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
) -> DomainCrawlResult {
    let domain = target.domain.clone();

    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return DomainCrawlResult::cancelled(domain),
        permit = semaphore.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return DomainCrawlResult::failed(domain, "scheduler closed"),
        },
    };

    let crawler = DomainCrawler::new(target, ctx, cancel);
    match tokio::spawn(crawler.run()).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(domain = %domain, "Domain crawl panicked: {}", e);
            DomainCrawlResult::failed(domain, format!("crawl task failed: {}", e))
        }
    }
}

fn spawn_run_timer(limit: Duration, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(limit) => {
                tracing::warn!("Run timeout of {:?} reached, cancelling", limit);
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    })
}

fn dedup_targets(targets: Vec<CrawlTarget>) -> Vec<CrawlTarget> {
    let mut seen = HashSet::new();
    targets
        .into_iter()
        .filter(|t| {
            let fresh = seen.insert(t.domain.clone());
            if !fresh {
                tracing::warn!("Duplicate domain {} ignored", t.domain);
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(domain: &str) -> CrawlTarget {
        CrawlTarget {
            domain: domain.into(),
            max_pages: 1,
            max_depth: 0,
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_dedup_targets_keeps_first() {
        let targets = dedup_targets(vec![target("a.test"), target("b.test"), target("a.test")]);
        let domains: Vec<_> = targets.iter().map(|t| t.domain.as_str()).collect();
        assert_eq!(domains, vec!["a.test", "b.test"]);
    }

    #[tokio::test]
    async fn test_run_timer_cancels() {
        let cancel = CancellationToken::new();
        let timer = spawn_run_timer(Duration::from_millis(10), cancel.clone());
        timer.await.unwrap();
        assert!(cancel.is_cancelled());
    }
}
