//! Product-page classifier
//!
//! Decides whether a URL is a product-detail page in two stages:
//!
//! 1. **URL pattern**: the path is matched against configured regexes. A hit
//!    classifies the page without fetching it.
//! 2. **Content match**: only when stage 1 fails, the rendered page text is
//!    searched for configured keyword cues.
//!
//! Classification is best-effort. Missing content (the fetch failed) yields a
//! negative result with [`Signal::None`], never an error.

mod rules;

pub use rules::{KeywordRules, UrlRules};

use crate::config::ClassifierConfig;
use crate::ConfigError;
use serde::Serialize;
use url::Url;

/// Why a URL was (or was not) classified as a product page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// The URL path matched a product pattern
    UrlPattern,
    /// The rendered text contained enough product cues
    ContentMatch,
    /// No signal fired
    None,
}

/// The outcome of classifying one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub url: String,
    pub is_product: bool,
    pub signal: Signal,
}

impl ClassificationResult {
    fn positive(url: &Url, signal: Signal) -> Self {
        Self {
            url: url.to_string(),
            is_product: true,
            signal,
        }
    }

    fn negative(url: &Url) -> Self {
        Self {
            url: url.to_string(),
            is_product: false,
            signal: Signal::None,
        }
    }
}

/// Two-stage structural product classifier
#[derive(Debug, Clone)]
pub struct ProductClassifier {
    url_rules: UrlRules,
    keywords: KeywordRules,
    min_content_matches: usize,
}

impl ProductClassifier {
    /// Compiles the classifier from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ProductClassifier)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - A pattern is not a valid regex
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        let keywords = KeywordRules::new(&config.content_keywords);
        if keywords.is_empty() {
            tracing::warn!("No content keywords configured; only URL patterns can find products");
        } else {
            tracing::debug!("Content stage uses {} keywords", keywords.len());
        }

        Ok(Self {
            url_rules: UrlRules::new(&config.url_patterns, &config.exclusion_patterns)?,
            keywords,
            min_content_matches: config.min_content_matches.max(1) as usize,
        })
    }

    /// Runs the URL-pattern stage only
    ///
    /// Returns `Some` with signal [`Signal::UrlPattern`] on a hit and `None`
    /// when the content stage is needed.
    ///
    /// # Examples
    ///
    /// ```
    /// use product_scout::classifier::{ProductClassifier, Signal};
    /// use product_scout::config::ClassifierConfig;
    /// use url::Url;
    ///
    /// let classifier = ProductClassifier::from_config(&ClassifierConfig::default()).unwrap();
    /// let hit = classifier.classify_url(&Url::parse("https://shop.test/p/12345").unwrap());
    /// assert_eq!(hit.unwrap().signal, Signal::UrlPattern);
    ///
    /// let miss = classifier.classify_url(&Url::parse("https://shop.test/category/shoes").unwrap());
    /// assert!(miss.is_none());
    /// ```
    pub fn classify_url(&self, url: &Url) -> Option<ClassificationResult> {
        if self.url_rules.matches(url.path()) {
            Some(ClassificationResult::positive(url, Signal::UrlPattern))
        } else {
            None
        }
    }

    /// Runs the content stage on rendered page text
    ///
    /// `None` text means the page could not be fetched; the result is then
    /// negative.
    pub fn classify_content(&self, url: &Url, text: Option<&str>) -> ClassificationResult {
        let Some(text) = text.filter(|_| !self.keywords.is_empty()) else {
            return ClassificationResult::negative(url);
        };

        let matches = self.keywords.count_matches(text);
        tracing::trace!(url = %url, matches, "content cues");

        if matches >= self.min_content_matches {
            ClassificationResult::positive(url, Signal::ContentMatch)
        } else {
            ClassificationResult::negative(url)
        }
    }

    /// Full two-stage decision
    pub fn classify(&self, url: &Url, text: Option<&str>) -> ClassificationResult {
        self.classify_url(url)
            .unwrap_or_else(|| self.classify_content(url, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ProductClassifier {
        ProductClassifier::from_config(&ClassifierConfig::default()).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_url_pattern_stage() {
        let c = classifier();
        for product in [
            "https://shop.test/p/12345",
            "https://shop.test/product/red-shoe",
            "https://shop.test/gp/dp/B000123",
            "https://shop.test/item/42",
            "https://shop.test/shop/products-sale",
        ] {
            let result = c.classify_url(&url(product)).unwrap();
            assert!(result.is_product, "{} should match", product);
            assert_eq!(result.signal, Signal::UrlPattern);
        }
    }

    #[test]
    fn test_url_pattern_misses() {
        let c = classifier();
        for other in [
            "https://shop.test/",
            "https://shop.test/category/shoes",
            "https://shop.test/women/dresses",
            "https://shop.test/pages/about",
        ] {
            assert!(c.classify_url(&url(other)).is_none(), "{} should not match", other);
        }
    }

    #[test]
    fn test_exclusions_block_url_stage() {
        let c = classifier();
        assert!(c
            .classify_url(&url("https://shop.test/category/product/all"))
            .is_none());
        assert!(c
            .classify_url(&url("https://shop.test/product/hero.png"))
            .is_none());
    }

    #[test]
    fn test_content_stage_match() {
        let c = classifier();
        let result = c.classify_content(
            &url("https://shop.test/women/red-dress"),
            Some("Red Dress  $49.99  ADD TO CART  Size chart"),
        );
        assert!(result.is_product);
        assert_eq!(result.signal, Signal::ContentMatch);
    }

    #[test]
    fn test_content_stage_no_match() {
        let c = classifier();
        let result = c.classify_content(
            &url("https://shop.test/category/shoes"),
            Some("Shoes. Browse our collection. Page 1 of 4."),
        );
        assert!(!result.is_product);
        assert_eq!(result.signal, Signal::None);
    }

    #[test]
    fn test_missing_content_is_negative() {
        let c = classifier();
        let result = c.classify_content(&url("https://shop.test/women/red-dress"), None);
        assert!(!result.is_product);
        assert_eq!(result.signal, Signal::None);
    }

    #[test]
    fn test_min_content_matches() {
        let config = ClassifierConfig {
            min_content_matches: 3,
            ..ClassifierConfig::default()
        };
        let c = ProductClassifier::from_config(&config).unwrap();
        let page = url("https://shop.test/women/red-dress");

        assert!(!c.classify_content(&page, Some("add to cart, in stock")).is_product);
        assert!(
            c.classify_content(&page, Some("add to cart, in stock, size guide"))
                .is_product
        );
    }

    #[test]
    fn test_no_keywords_disables_content_stage() {
        let config = ClassifierConfig {
            content_keywords: Vec::new(),
            ..ClassifierConfig::default()
        };
        let c = ProductClassifier::from_config(&config).unwrap();
        let page = url("https://shop.test/women/red-dress");

        assert!(!c.classify_content(&page, Some("add to cart")).is_product);
        assert!(c.classify_url(&url("https://shop.test/p/1")).is_some());
    }

    #[test]
    fn test_url_stage_short_circuits() {
        let c = classifier();
        let result = c.classify(&url("https://shop.test/p/1"), Some("add to cart"));
        assert_eq!(result.signal, Signal::UrlPattern);

        let result = c.classify(&url("https://shop.test/p/1"), None);
        assert!(result.is_product);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let c = classifier();
        let page = url("https://shop.test/women/red-dress");
        let text = Some("Buy now. Quantity: 1");

        assert_eq!(c.classify(&page, text), c.classify(&page, text));
        assert_eq!(c.classify(&page, None), c.classify(&page, None));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let config = ClassifierConfig {
            url_patterns: vec!["[".to_string()],
            ..ClassifierConfig::default()
        };
        assert!(matches!(
            ProductClassifier::from_config(&config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }
}
