//! Configuration module for Product Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a file containing only `domains` is valid.
//!
//! # Example
//!
//! ```no_run
//! use product_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifierConfig, Config, CrawlerConfig, FetcherBackend, FetcherConfig, OutputConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, read_config,
};
pub use validation::validate;
