//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including totals, a per-domain table and an error report.

use crate::output::stats::CrawlStatistics;
use crate::output::OutputResult;
use crate::state::AggregateResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Most errors listed per domain before the list is truncated
const MAX_ERRORS_PER_DOMAIN: usize = 20;

/// Writes the markdown summary of `results` to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    results: &AggregateResult,
    stats: &CrawlStatistics,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(results, stats);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats the results of a run as markdown
pub fn format_markdown_summary(results: &AggregateResult, stats: &CrawlStatistics) -> String {
    let mut md = String::new();

    md.push_str("# Product Scout Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", results.started_at.to_rfc3339()));
    if let Some(finished) = results.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = stats.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    let status = if results.cancelled {
        "cancelled"
    } else {
        "completed"
    };
    md.push_str(&format!("- **Status**: {}\n\n", status));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Domains**: {}\n", stats.domains));
    md.push_str(&format!("- **Failed Domains**: {}\n", stats.failed_domains));
    md.push_str(&format!("- **Pages Visited**: {}\n", stats.total_crawled));
    md.push_str(&format!("- **Product Pages**: {}\n", stats.total_products));
    md.push_str(&format!(
        "- **Product Rate**: {:.2}%\n",
        stats.product_rate()
    ));
    md.push_str(&format!("- **Total Errors**: {}\n\n", stats.total_errors()));

    // Per-domain table
    md.push_str("## Domains\n\n");
    md.push_str("| Domain | Pages | Products | Errors | Max Depth | Status |\n");
    md.push_str("|--------|-------|----------|--------|-----------|--------|\n");
    for domain in &stats.per_domain {
        let status = if domain.fatal {
            "failed"
        } else if domain.cancelled {
            "cancelled"
        } else {
            "done"
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            domain.domain, domain.crawled, domain.products, domain.errors, domain.max_depth, status
        ));
    }
    md.push('\n');

    if !stats.products_by_signal.is_empty() {
        md.push_str("## Products by Signal\n\n");
        md.push_str("| Signal | Count |\n");
        md.push_str("|--------|-------|\n");
        for (signal, count) in &stats.products_by_signal {
            md.push_str(&format!("| {:?} | {} |\n", signal, count));
        }
        md.push('\n');
    }

    if !stats.pages_by_depth.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &stats.pages_by_depth {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    // Error summary
    if !stats.errors_by_kind.is_empty() {
        md.push_str("## Error Summary\n\n");
        md.push_str("| Error Type | Count |\n");
        md.push_str("|------------|-------|\n");
        for (kind, count) in &stats.errors_by_kind {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');

        md.push_str("## Errors by Domain\n\n");
        for (domain, errors) in results.error_map() {
            if errors.is_empty() {
                continue;
            }
            md.push_str(&format!("### {}\n\n", domain));
            for error in errors.iter().take(MAX_ERRORS_PER_DOMAIN) {
                md.push_str(&format!(
                    "- `{}` {}: {}\n",
                    error.kind, error.url, error.reason
                ));
            }
            if errors.len() > MAX_ERRORS_PER_DOMAIN {
                md.push_str(&format!(
                    "\n... and {} more\n",
                    errors.len() - MAX_ERRORS_PER_DOMAIN
                ));
            }
            md.push('\n');
        }
    }

    md
}
