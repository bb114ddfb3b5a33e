//! Product Scout main entry point
//!
//! This is the command-line interface for the Product Scout crawler.

use anyhow::Context;
use clap::Parser;
use product_scout::config::{compute_config_hash, read_config, validate, Config};
use product_scout::crawler::{run_crawl_with_cancel, targets_from_config};
use product_scout::output::{
    generate_markdown_summary, print_statistics, write_results, CrawlStatistics, SUMMARY_FILE,
};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Product Scout: finds product-detail pages on e-commerce sites
///
/// Product Scout crawls each configured shop breadth-first and separates
/// product pages from category and navigation pages using URL shape and
/// on-page purchase cues.
#[derive(Parser, Debug)]
#[command(name = "product-scout")]
#[command(version)]
#[command(about = "Discovers product pages on e-commerce sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl this domain instead of the configured ones (repeatable)
    #[arg(long = "domain", value_name = "DOMAIN")]
    domains: Vec<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = read_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if !cli.domains.is_empty() {
        config.domains = cli.domains.clone();
    }
    validate(&config).context("invalid configuration")?;

    setup_logging(cli.verbose, cli.quiet, config.output.log_file.as_deref())?;

    let config_hash = compute_config_hash(&cli.config)?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// When `log_file` is set, the same events are also appended to that file
/// without ANSI colors.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("product_scout=info,warn"),
            1 => EnvFilter::new("product_scout=debug,info"),
            2 => EnvFilter::new("product_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Product Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages per domain: {}", config.crawler.max_pages_per_domain);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Page timeout: {}ms", config.crawler.timeout_ms);
    println!("  Concurrent domains: {}", config.crawler.max_concurrent_domains);
    println!(
        "  Retries: {} ({}ms apart)",
        config.crawler.max_retries, config.crawler.retry_delay_ms
    );
    if config.crawler.run_timeout_secs > 0 {
        println!("  Run timeout: {}s", config.crawler.run_timeout_secs);
    }

    println!("\nFetcher:");
    println!("  Backend: {:?}", config.fetcher.backend);
    println!("  Headless: {}", config.crawler.headless);
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nClassifier:");
    println!("  URL patterns: {}", config.classifier.url_patterns.len());
    println!(
        "  Exclusion patterns: {}",
        config.classifier.exclusion_patterns.len()
    );
    println!(
        "  Content keywords: {} (min matches: {})",
        config.classifier.content_keywords.len(),
        config.classifier.min_content_matches
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    if let Some(log_file) = &config.output.log_file {
        println!("  Log file: {}", log_file);
    }

    let targets = targets_from_config(config);
    println!("\nDomains ({}):", targets.len());
    for target in &targets {
        match target.seed_url(&config.normalize) {
            Ok(seed) => println!("  - {} (seed: {})", target.domain, seed),
            Err(e) => println!("  - {} (invalid seed: {})", target.domain, e),
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping crawl and keeping partial results");
                cancel.cancel();
            }
        })
    };

    tracing::info!("Starting crawl of {} domains", config.domains.len());
    let results = run_crawl_with_cancel(config, cancel).await?;
    ctrl_c.abort();

    let out_dir = Path::new(&config.output.directory);
    write_results(&results, out_dir)?;

    let stats = CrawlStatistics::from_results(&results);
    generate_markdown_summary(&results, &stats, &out_dir.join(SUMMARY_FILE))?;

    print_statistics(&stats);
    println!("Results written to {}", out_dir.display());

    Ok(())
}
