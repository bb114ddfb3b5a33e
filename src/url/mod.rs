//! URL handling module
//!
//! This module provides URL normalization, deduplication keys, domain
//! extraction and the per-target crawl scope.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, DomainScope};
pub use normalize::{dedup_key, normalize_url, NormalizeRules};
