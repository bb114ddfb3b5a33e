//! State module for tracking crawl progress and results
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of one domain crawl (init, running, done)
//! - `CrawlTarget`: one domain with its page/depth budgets and timeout
//! - `DomainCrawlResult` / `AggregateResult`: what a crawl hands back

mod phase;
mod result;
mod target;

// Re-export main types
pub use phase::CrawlPhase;
pub use result::{AggregateResult, CrawlError, DomainCrawlResult, ErrorKind, Visit};
pub use target::CrawlTarget;
