//! Output module for persisting crawl results
//!
//! This module handles:
//! - Writing the per-domain URL listings as JSON
//! - Generating a markdown summary of the run
//! - Computing and printing crawl statistics

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, CrawlStatistics};

use crate::state::AggregateResult;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Product URLs per domain
pub const PRODUCT_URLS_FILE: &str = "product_urls.json";

/// Every visited URL per domain
pub const CRAWLED_URLS_FILE: &str = "crawled_urls.json";

/// Recorded errors per domain
pub const CRAWL_ERRORS_FILE: &str = "crawl_errors.json";

/// Human-readable run summary
pub const SUMMARY_FILE: &str = "summary.md";

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes the JSON listings of `results` into `dir`
///
/// The directory is created if needed. Domains map to sorted URL lists, so
/// two runs with the same outcome produce identical files.
///
/// # Returns
///
/// The paths written, in a fixed order
pub fn write_results(results: &AggregateResult, dir: &Path) -> OutputResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let written = vec![
        write_json(&dir.join(PRODUCT_URLS_FILE), &results.product_url_map())?,
        write_json(&dir.join(CRAWLED_URLS_FILE), &results.crawled_url_map())?,
        write_json(&dir.join(CRAWL_ERRORS_FILE), &results.error_map())?,
    ];

    tracing::info!("Wrote results to {}", dir.display());
    Ok(written)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> OutputResult<PathBuf> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassificationResult, Signal};
    use crate::state::{CrawlError, DomainCrawlResult, ErrorKind};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn classification(url: &str, is_product: bool) -> ClassificationResult {
        ClassificationResult {
            url: url.to_string(),
            is_product,
            signal: if is_product {
                Signal::UrlPattern
            } else {
                Signal::None
            },
        }
    }

    fn sample_results() -> AggregateResult {
        let mut shop = DomainCrawlResult::new("shop.test");
        shop.record_visit("https://shop.test/", 0, classification("https://shop.test/", false));
        shop.record_visit(
            "https://shop.test/p/2",
            1,
            classification("https://shop.test/p/2", true),
        );
        shop.record_visit(
            "https://shop.test/p/1",
            1,
            classification("https://shop.test/p/1", true),
        );
        shop.record_error(CrawlError::new(
            "https://shop.test/broken",
            ErrorKind::NetworkError,
            "connection reset",
        ));
        shop.finish();

        let mut results = AggregateResult::new();
        results.insert(shop);
        results.insert(DomainCrawlResult::failed("down.test", "seed page unreachable"));
        results
    }

    fn read_map(path: &Path) -> BTreeMap<String, serde_json::Value> {
        let content = std::fs::read_to_string(path).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn test_write_results_creates_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested/output");

        let written = write_results(&sample_results(), &out).unwrap();

        assert_eq!(written.len(), 3);
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }
    }

    #[test]
    fn test_product_urls_sorted_per_domain() {
        let dir = TempDir::new().unwrap();
        write_results(&sample_results(), dir.path()).unwrap();

        let products = read_map(&dir.path().join(PRODUCT_URLS_FILE));
        assert_eq!(
            products["shop.test"],
            serde_json::json!(["https://shop.test/p/1", "https://shop.test/p/2"])
        );
        assert_eq!(products["down.test"], serde_json::json!([]));
    }

    #[test]
    fn test_crawled_urls_include_products() {
        let dir = TempDir::new().unwrap();
        write_results(&sample_results(), dir.path()).unwrap();

        let crawled = read_map(&dir.path().join(CRAWLED_URLS_FILE));
        assert_eq!(crawled["shop.test"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_errors_include_fatal() {
        let dir = TempDir::new().unwrap();
        write_results(&sample_results(), dir.path()).unwrap();

        let errors = read_map(&dir.path().join(CRAWL_ERRORS_FILE));
        assert_eq!(errors["shop.test"][0]["kind"], "network_error");
        assert_eq!(errors["down.test"][0]["kind"], "domain_fatal");
        assert_eq!(errors["down.test"][0]["reason"], "seed page unreachable");
    }
}
