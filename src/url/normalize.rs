use crate::UrlError;
use serde::Deserialize;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Tunable parts of URL normalization
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NormalizeRules {
    /// Drop the whole query string (otherwise only tracking params go)
    pub strip_query: bool,

    /// Treat `www.host` and `host` as the same page when deduplicating
    pub strip_www: bool,
}

impl Default for NormalizeRules {
    fn default() -> Self {
        Self {
            strip_query: true,
            strip_www: true,
        }
    }
}

/// Normalizes a URL so that equivalent links collapse to one string
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Lowercase the host
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Query: drop entirely when `strip_query`, otherwise remove tracking
///    parameters and sort the rest alphabetically
///
/// Scheme and host are kept so the URL stays fetchable; use [`dedup_key`] to
/// compare URLs regardless of scheme or a `www.` prefix.
///
/// # Examples
///
/// ```
/// use product_scout::url::{normalize_url, NormalizeRules};
///
/// let url = normalize_url("https://WWW.SHOP.TEST/shoes/?page=2#top", &NormalizeRules::default()).unwrap();
/// assert_eq!(url.as_str(), "https://www.shop.test/shoes");
/// ```
pub fn normalize_url(url_str: &str, rules: &NormalizeRules) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str() {
        let normalized_host = host.to_lowercase();
        url.set_host(Some(&normalized_host))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    } else {
        return Err(UrlError::MissingDomain);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        if rules.strip_query {
            url.set_query(None);
        } else {
            let filtered_params = filter_and_sort_query_params(&url);
            if filtered_params.is_empty() {
                url.set_query(None);
            } else {
                let query_string = filtered_params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join("&");
                url.set_query(Some(&query_string));
            }
        }
    }

    Ok(url)
}

/// Returns the key used to deduplicate a normalized URL
///
/// The key is the URL without its scheme, so `http://` and `https://`
/// variants of the same page collide. With `strip_www` a leading `www.` is
/// dropped from the key as well.
///
/// ```
/// use product_scout::url::{dedup_key, normalize_url, NormalizeRules};
///
/// let rules = NormalizeRules::default();
/// let a = normalize_url("http://shop.test/p/1/", &rules).unwrap();
/// let b = normalize_url("https://www.shop.test/p/1", &rules).unwrap();
/// assert_eq!(dedup_key(&a, &rules), dedup_key(&b, &rules));
/// ```
pub fn dedup_key(url: &Url, rules: &NormalizeRules) -> String {
    let s = url.as_str();
    let key = match s.find("://") {
        Some(idx) => &s[idx + 3..],
        None => s,
    };

    if rules.strip_www {
        key.strip_prefix("www.").unwrap_or(key).to_string()
    } else {
        key.to_string()
    }
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
