use crate::ConfigError;
use regex::Regex;

/// Compiled URL-path patterns with their exclusions
#[derive(Debug, Clone)]
pub struct UrlRules {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl UrlRules {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// Returns true if `path` looks like a product URL
    ///
    /// The path is lowercased first. Exclusions win over includes.
    pub fn matches(&self, path: &str) -> bool {
        let path = path.to_lowercase();

        if self.exclude.iter().any(|re| re.is_match(&path)) {
            return false;
        }

        self.include.iter().any(|re| re.is_match(&path))
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Lowercased content cues
#[derive(Debug, Clone)]
pub struct KeywordRules {
    keywords: Vec<String>,
}

impl KeywordRules {
    pub fn new(keywords: &[String]) -> Self {
        let mut normalized: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();

        Self {
            keywords: normalized,
        }
    }

    /// Counts how many distinct keywords occur in `text`
    pub fn count_matches(&self, text: &str) -> usize {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
