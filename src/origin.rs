use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// Cached because Origin::from_url sits on every popup-open and page-load path.
static COM_PREFIX: OnceLock<Regex> = OnceLock::new();

fn com_prefix() -> &'static Regex {
    COM_PREFIX.get_or_init(|| Regex::new(r".+\.com").expect("valid origin pattern"))
}

/// Storage key identifying a web site.
///
/// URLs whose host ends in `.com` are truncated to the `.com` boundary so
/// that every page of a site shares one key; anything else (other TLDs,
/// ports, bare hosts) falls back to the full URL. The narrow pattern is kept
/// for compatibility with existing stored keys; widening it would orphan
/// them without a migration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    /// Derive the storage key for a page or tab URL.
    pub fn from_url(url: &str) -> Self {
        match com_prefix().find(url) {
            Some(m) => Origin(m.as_str().to_string()),
            None => Origin(url.to_string()),
        }
    }

    /// Use a string as a key verbatim, skipping normalization.
    pub fn from_key(key: impl Into<String>) -> Self {
        Origin(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_com_url_truncated_at_tld() {
        let origin = Origin::from_url("https://news.example.com/politics/story?id=7");
        assert_eq!(origin.as_str(), "https://news.example.com");
    }

    #[test]
    fn test_non_com_url_kept_whole() {
        let origin = Origin::from_url("https://example.org/article");
        assert_eq!(origin.as_str(), "https://example.org/article");
    }

    #[test]
    fn test_bare_com_origin_is_stable() {
        let a = Origin::from_url("https://example.com");
        let b = Origin::from_url("https://example.com/other/page");
        assert_eq!(a, b);
    }

    #[test]
    fn test_greedy_match_spans_to_last_com() {
        // The historical pattern is greedy; a ".com" later in the URL wins.
        let origin = Origin::from_url("https://example.com/r/foo.com");
        assert_eq!(origin.as_str(), "https://example.com/r/foo.com");
    }

    #[test]
    fn test_from_key_is_verbatim() {
        let origin = Origin::from_key("https://example.org/article");
        assert_eq!(origin.as_str(), "https://example.org/article");
    }
}
