use crate::config::types::{ClassifierConfig, Config, CrawlerConfig, FetcherBackend, FetcherConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_domains(&config.domains)?;
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_classifier_config(&config.classifier)?;

    if config.output.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler budgets and scheduling limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages_per_domain < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_per_domain must be >= 1, got {}",
            config.max_pages_per_domain
        )));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    if config.max_concurrent_domains < 1 || config.max_concurrent_domains > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_domains must be between 1 and 64, got {}",
            config.max_concurrent_domains
        )));
    }

    if config.max_retries > 3 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 3, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.backend == FetcherBackend::Browser && !cfg!(feature = "browser") {
        return Err(ConfigError::Validation(
            "backend = \"browser\" requires building with the `browser` feature".to_string(),
        ));
    }

    Ok(())
}

/// Validates classifier rules, compiling every pattern once
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    if config.url_patterns.is_empty() {
        return Err(ConfigError::Validation(
            "url_patterns cannot be empty".to_string(),
        ));
    }

    if config.content_keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "content_keywords must contain at least one keyword".to_string(),
        ));
    }

    if config.min_content_matches < 1 {
        return Err(ConfigError::Validation(
            "min_content_matches must be >= 1".to_string(),
        ));
    }

    for pattern in config
        .url_patterns
        .iter()
        .chain(config.exclusion_patterns.iter())
    {
        Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
    }

    Ok(())
}

/// Validates the list of crawl targets
fn validate_domains(domains: &[String]) -> Result<(), ConfigError> {
    if domains.is_empty() {
        return Err(ConfigError::Validation(
            "at least one domain must be configured".to_string(),
        ));
    }

    for domain in domains {
        let domain = domain.trim();
        if domain.contains("://") {
            validate_origin(domain)?;
        } else {
            validate_domain_string(domain)?;
        }
    }

    Ok(())
}

/// Validates a full origin such as `http://127.0.0.1:8080`
fn validate_origin(origin: &str) -> Result<(), ConfigError> {
    let url = Url::parse(origin)
        .map_err(|e| ConfigError::InvalidDomain(format!("'{}': {}", origin, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidDomain(format!(
            "'{}' must use http or https",
            origin
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidDomain(format!(
            "'{}' has no host",
            origin
        )));
    }

    Ok(())
}

/// Validates a bare domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidDomain(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' must contain at least one dot (e.g., 'shop.example')",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            domains: vec!["shop.test".to_string()],
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config_with_domain_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_no_domains_rejected() {
        let config = Config::default();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_validate_domain_string() {
        assert!(validate_domain_string("shop.test").is_ok());
        assert!(validate_domain_string("www2.hm.com").is_ok());

        assert!(validate_domain_string("").is_err());
        assert!(validate_domain_string("shop").is_err());
        assert!(validate_domain_string(".shop.test").is_err());
        assert!(validate_domain_string("shop.test.").is_err());
        assert!(validate_domain_string("shop..test").is_err());
        assert!(validate_domain_string("shop test.com").is_err());
    }

    #[test]
    fn test_validate_origin() {
        assert!(validate_origin("http://127.0.0.1:8080").is_ok());
        assert!(validate_origin("https://shop.test").is_ok());
        assert!(validate_origin("ftp://shop.test").is_err());
    }

    #[test]
    fn test_zero_page_budget_rejected() {
        let mut config = valid_config();
        config.crawler.max_pages_per_domain = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_short_timeout_rejected() {
        let mut config = valid_config();
        config.crawler.timeout_ms = 50;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = valid_config();
        config.crawler.max_concurrent_domains = 0;
        assert!(validate(&config).is_err());

        config.crawler.max_concurrent_domains = 65;
        assert!(validate(&config).is_err());

        config.crawler.max_concurrent_domains = 64;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_retry_bound() {
        let mut config = valid_config();
        config.crawler.max_retries = 4;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let mut config = valid_config();
        config.classifier.url_patterns.push("/p/(".to_string());
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let mut config = valid_config();
        config.classifier.content_keywords = vec!["  ".to_string()];
        assert!(validate(&config).is_err());
    }

    #[cfg(not(feature = "browser"))]
    #[test]
    fn test_browser_backend_needs_feature() {
        let mut config = valid_config();
        config.fetcher.backend = FetcherBackend::Browser;
        assert!(validate(&config).is_err());
    }
}
