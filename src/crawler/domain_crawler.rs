//! Single-domain crawl loop
//!
//! A [`DomainCrawler`] owns everything about one domain crawl: its frontier,
//! its visited set and its result. Nothing here is shared with other domains
//! except the fetcher and the classifier, both read-only.

use crate::classifier::ProductClassifier;
use crate::crawler::fetcher::{fetch_with_retry, FetchError, PageFetcher, RetryPolicy};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::state::{CrawlError, CrawlPhase, CrawlTarget, DomainCrawlResult, ErrorKind};
use crate::url::{dedup_key, normalize_url, DomainScope, NormalizeRules};
use crate::CrawlerError;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

/// How often progress is logged, in visited pages
const PROGRESS_INTERVAL: usize = 10;

/// Read-only collaborators shared by every domain crawl of a run
#[derive(Clone)]
pub struct CrawlContext {
    pub fetcher: Arc<dyn PageFetcher>,
    pub classifier: Arc<ProductClassifier>,
    pub rules: NormalizeRules,
    pub retry: RetryPolicy,
}

impl CrawlContext {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        classifier: Arc<ProductClassifier>,
        rules: NormalizeRules,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            rules,
            retry,
        }
    }
}

/// What happened to one dequeued URL
enum VisitOutcome {
    Continue,
    Fatal(CrawlError),
    Cancelled,
}

/// Breadth-first crawler for one domain
pub struct DomainCrawler {
    target: CrawlTarget,
    ctx: CrawlContext,
    cancel: CancellationToken,
    phase: CrawlPhase,
    frontier: Frontier,
    visited: HashSet<String>,
    /// Dedup keys of URL-pattern products already recorded
    product_keys: HashSet<String>,
    result: DomainCrawlResult,
}

impl DomainCrawler {
    pub fn new(target: CrawlTarget, ctx: CrawlContext, cancel: CancellationToken) -> Self {
        let frontier = Frontier::for_target(&target).with_rules(ctx.rules.clone());
        let result = DomainCrawlResult::new(target.domain.clone());

        Self {
            target,
            ctx,
            cancel,
            phase: CrawlPhase::Init,
            frontier,
            visited: HashSet::new(),
            product_keys: HashSet::new(),
            result,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Crawls the domain to completion and returns its result
    ///
    /// The crawl ends when the frontier drains, the page budget is spent, the
    /// crawl is cancelled, or a domain-fatal error occurs. Per-URL failures
    /// never end it.
    pub async fn run(mut self) -> DomainCrawlResult {
        let span = tracing::info_span!("domain", domain = %self.target.domain);

        async move {
            self.crawl().await;
            self.finish();
            self.result
        }
        .instrument(span)
        .await
    }

    async fn crawl(&mut self) {
        let seed = match self.target.seed_url(&self.ctx.rules) {
            Ok(seed) => seed,
            Err(e) => {
                self.fail(format!("invalid seed URL: {}", e));
                return;
            }
        };

        let Some(scope) = DomainScope::from_seed(&seed) else {
            self.fail(format!("seed URL has no host: {}", seed));
            return;
        };

        self.transition(CrawlPhase::Running);
        tracing::info!(
            "Crawling {} (max pages: {}, max depth: {})",
            seed,
            self.target.max_pages,
            self.target.max_depth
        );

        self.frontier.push(FrontierEntry::new(seed, 0));

        loop {
            if self.cancel.is_cancelled() {
                self.result.cancelled = true;
                tracing::info!("Crawl cancelled");
                break;
            }

            let Some(entry) = self.frontier.pop() else {
                break;
            };

            // Already-visited URLs are a no-op
            if !self.visited.insert(dedup_key(&entry.url, &self.ctx.rules)) {
                continue;
            }

            match self.visit(&entry, &scope).await {
                VisitOutcome::Continue => {}
                VisitOutcome::Fatal(error) => {
                    tracing::error!("Domain crawl aborted: {}", error.reason);
                    self.result.fatal = Some(error);
                    break;
                }
                VisitOutcome::Cancelled => {
                    self.result.cancelled = true;
                    tracing::info!("Crawl cancelled during fetch of {}", entry.url);
                    break;
                }
            }

            if self.visited.len() % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {} pages visited, {} in frontier, {} products",
                    self.visited.len(),
                    self.frontier.len(),
                    self.result.product_urls.len()
                );
            }
        }
    }

    /// Classifies one URL, fetching it only when its URL alone is not enough
    async fn visit(&mut self, entry: &FrontierEntry, scope: &DomainScope) -> VisitOutcome {
        let url = &entry.url;

        // Product URLs are leaves: recorded without a fetch, links not followed
        if let Some(hit) = self.ctx.classifier.classify_url(url) {
            tracing::debug!("Product by URL pattern: {}", url);
            self.product_keys.insert(dedup_key(url, &self.ctx.rules));
            self.result.record_visit(url.as_str(), entry.depth, hit);
            return VisitOutcome::Continue;
        }

        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return VisitOutcome::Cancelled,
            fetched = fetch_with_retry(
                self.ctx.fetcher.as_ref(),
                url,
                self.target.timeout,
                &self.ctx.retry,
            ) => fetched,
        };

        match fetched {
            Ok(page) => {
                tracing::debug!(
                    "Fetched {} ({}, {} links)",
                    url,
                    page.title.as_deref().unwrap_or("untitled"),
                    page.links.len()
                );
                let classification = self.ctx.classifier.classify_content(url, Some(&page.text));
                if classification.is_product {
                    tracing::debug!("Product by content: {}", url);
                }
                self.result.record_visit(url.as_str(), entry.depth, classification);
                self.enqueue_links(&page.links, entry.depth + 1, scope);
                VisitOutcome::Continue
            }
            Err(err) => {
                let classification = self.ctx.classifier.classify_content(url, None);
                self.result.record_visit(url.as_str(), entry.depth, classification);
                self.handle_fetch_error(url, entry.depth, err)
            }
        }
    }

    fn handle_fetch_error(&mut self, url: &Url, depth: u32, err: FetchError) -> VisitOutcome {
        if err.is_fatal() {
            return VisitOutcome::Fatal(CrawlError::new(
                url.as_str(),
                ErrorKind::DomainFatal,
                err.to_string(),
            ));
        }

        // Nothing is reachable without the seed
        if depth == 0 {
            return VisitOutcome::Fatal(CrawlError::new(
                url.as_str(),
                ErrorKind::DomainFatal,
                format!("seed page unreachable: {}", err),
            ));
        }

        tracing::warn!("Failed to fetch {}: {}", url, err);
        let kind = err.kind();
        self.result
            .record_error(CrawlError::new(url.as_str(), kind, err.to_string()));

        // The content stage had nothing to read
        if kind != ErrorKind::ClassificationSkipped {
            self.result.record_error(CrawlError::new(
                url.as_str(),
                ErrorKind::ClassificationSkipped,
                format!("content stage skipped: {}", kind),
            ));
        }
        VisitOutcome::Continue
    }

    /// Queues in-scope links and records product-pattern links straight away
    ///
    /// Product links are recorded even when the frontier refuses them, since
    /// their URL is all the classifier needs.
    fn enqueue_links(&mut self, links: &[Url], depth: u32, scope: &DomainScope) {
        let mut queued = 0;
        for link in links.iter().filter(|link| scope.contains(link)) {
            let normalized = match normalize_url(link.as_str(), &self.ctx.rules) {
                Ok(normalized) => normalized,
                Err(e) => {
                    tracing::debug!("Skipping link {}: {}", link, e);
                    continue;
                }
            };

            if self.ctx.classifier.classify_url(&normalized).is_some()
                && self
                    .product_keys
                    .insert(dedup_key(&normalized, &self.ctx.rules))
            {
                self.result.record_product(normalized.as_str());
            }

            if depth <= self.target.max_depth
                && self.frontier.push(FrontierEntry::new(normalized, depth))
            {
                queued += 1;
            }
        }

        if queued > 0 {
            tracing::trace!("Queued {} links at depth {}", queued, depth);
        }
    }

    fn fail(&mut self, reason: String) {
        tracing::error!("{}", reason);
        self.result.fatal = Some(CrawlError::new(
            self.target.domain.as_str(),
            ErrorKind::DomainFatal,
            reason,
        ));
    }

    fn finish(&mut self) {
        self.transition(CrawlPhase::Done);
        self.result.finish();

        tracing::info!(
            "Domain done: {} pages visited, {} products, {} errors",
            self.result.crawled_urls.len(),
            self.result.product_urls.len(),
            self.result.errors.len()
        );
    }

    fn transition(&mut self, next: CrawlPhase) {
        if let Err(e) = self.try_transition(next) {
            tracing::error!("{}", e);
        }
    }

    fn try_transition(&mut self, next: CrawlPhase) -> Result<(), CrawlerError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlerError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}
