use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host, or `None` for URLs without one.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use product_scout::url::extract_domain;
///
/// let url = Url::parse("https://SHOP.test/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("shop.test".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// The set of hosts a domain crawl may follow links into
///
/// Built from the seed URL. A host is in scope when, after removing a leading
/// `www.`, it equals the seed's root host or is a subdomain of it. Links
/// outside the scope are discarded, never enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    root: String,
    pattern: String,
}

impl DomainScope {
    /// Creates a scope rooted at the host of `seed`
    pub fn from_seed(seed: &Url) -> Option<Self> {
        let host = extract_domain(seed)?;
        Some(Self::new(&host))
    }

    /// Creates a scope rooted at `host`
    pub fn new(host: &str) -> Self {
        let root = strip_www(&host.to_lowercase()).to_string();
        let pattern = format!("*.{}", root);
        Self { root, pattern }
    }

    /// The root host, without `www.`
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns true if `url` points into this scope
    ///
    /// ```
    /// use product_scout::url::DomainScope;
    /// use url::Url;
    ///
    /// let scope = DomainScope::new("www.shop.test");
    /// assert!(scope.contains(&Url::parse("https://shop.test/p/1").unwrap()));
    /// assert!(scope.contains(&Url::parse("https://m.shop.test/p/1").unwrap()));
    /// assert!(!scope.contains(&Url::parse("https://other.test/").unwrap()));
    /// ```
    pub fn contains(&self, url: &Url) -> bool {
        match extract_domain(url) {
            Some(host) => matches_wildcard(&self.pattern, strip_www(&host)),
            None => false,
        }
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// `*.base` matches `base` itself and any subdomain of it; other patterns match exactly
fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_extract_simple_domain() {
        assert_eq!(
            extract_domain(&url("https://shop.test/")),
            Some("shop.test".to_string())
        );
    }

    #[test]
    fn test_extract_with_port() {
        assert_eq!(
            extract_domain(&url("https://shop.test:8080/")),
            Some("shop.test".to_string())
        );
    }

    #[test]
    fn test_extract_mixed_case() {
        assert_eq!(
            extract_domain(&url("https://Shop.TEST/")),
            Some("shop.test".to_string())
        );
    }

    #[test]
    fn test_scope_same_host() {
        let scope = DomainScope::from_seed(&url("https://shop.test/")).unwrap();
        assert_eq!(scope.root(), "shop.test");
        assert!(scope.contains(&url("https://shop.test/category/shoes")));
        assert!(scope.contains(&url("http://shop.test/category/shoes")));
    }

    #[test]
    fn test_scope_www_variants() {
        let scope = DomainScope::new("shop.test");
        assert!(scope.contains(&url("https://www.shop.test/")));

        let scope = DomainScope::new("www.shop.test");
        assert!(scope.contains(&url("https://shop.test/")));
    }

    #[test]
    fn test_scope_subdomains() {
        let scope = DomainScope::new("shop.test");
        assert!(scope.contains(&url("https://m.shop.test/p/1")));
        assert!(scope.contains(&url("https://eu.m.shop.test/p/1")));
    }

    #[test]
    fn test_scope_rejects_other_domains() {
        let scope = DomainScope::new("shop.test");
        assert!(!scope.contains(&url("https://othershop.test/")));
        assert!(!scope.contains(&url("https://shop.test.evil.com/")));
        assert!(!scope.contains(&url("https://cdn.example.com/shop.test")));
    }

    #[test]
    fn test_wildcard_matching() {
        assert!(matches_wildcard("*.shop.test", "shop.test"));
        assert!(matches_wildcard("*.shop.test", "a.b.shop.test"));
        assert!(!matches_wildcard("*.shop.test", "myshop.test"));
        assert!(matches_wildcard("shop.test", "shop.test"));
        assert!(!matches_wildcard("shop.test", "m.shop.test"));
    }

    #[test]
    fn test_scope_ip_host_ignores_port() {
        let scope = DomainScope::from_seed(&url("http://127.0.0.1:4000/")).unwrap();
        assert!(scope.contains(&url("http://127.0.0.1:4000/p/1")));
    }
}
