//! Router configuration.
//!
//! [`RouterConfig`] holds the few knobs a [`Store`](crate::Store) needs at
//! creation time: the initial URL, the sentinel route names, and the size of
//! the match cache. Every field has a default, so a partial JSON document
//! deserializes cleanly:
//!
//! ```
//! use navstate::RouterConfig;
//!
//! let config: RouterConfig = serde_json::from_str(r#"{ "initialUrl": "/page" }"#).unwrap();
//! assert_eq!(config.initial_url, "/page");
//! assert_eq!(config.not_found_name, "+not-found");
//! ```

use serde::{Deserialize, Serialize};

/// Settings for building a route table and the initial navigation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterConfig {
    /// URL the initial state is built from.
    pub initial_url: String,
    /// Name of the single-entry wrapper stack around the root navigator.
    pub root_name: String,
    /// Route used when no pattern matches.
    pub not_found_name: String,
    /// Sitemap sentinel added to the root navigator; `None` leaves it out.
    pub sitemap_name: Option<String>,
    /// Capacity of the segment match cache; `0` disables it.
    pub cache_capacity: usize,
}

impl RouterConfig {
    /// Default capacity of the match cache.
    pub const DEFAULT_CACHE_CAPACITY: usize = 256;

    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial URL.
    pub fn with_initial_url(mut self, url: impl Into<String>) -> Self {
        self.initial_url = url.into();
        self
    }

    /// Set the wrapper stack route name.
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Set the not-found route name.
    pub fn with_not_found_name(mut self, name: impl Into<String>) -> Self {
        self.not_found_name = name.into();
        self
    }

    /// Set or remove the sitemap sentinel.
    pub fn with_sitemap_name(mut self, name: Option<String>) -> Self {
        self.sitemap_name = name;
        self
    }

    /// Set the match cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Parameter name the not-found route binds unmatched segments to
    /// (`+not-found` becomes `not-found`).
    pub fn not_found_param(&self) -> &str {
        self.not_found_name.trim_start_matches('+')
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            initial_url: "/".to_string(),
            root_name: "__root".to_string(),
            not_found_name: "+not-found".to_string(),
            sitemap_name: Some("_sitemap".to_string()),
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.initial_url, "/");
        assert_eq!(config.root_name, "__root");
        assert_eq!(config.sitemap_name.as_deref(), Some("_sitemap"));
        assert_eq!(config.cache_capacity, 256);
        assert_eq!(config.not_found_param(), "not-found");
    }

    #[test]
    fn test_builders() {
        let config = RouterConfig::new()
            .with_initial_url("/home")
            .with_root_name("root")
            .with_not_found_name("missing")
            .with_sitemap_name(None)
            .with_cache_capacity(0);

        assert_eq!(config.initial_url, "/home");
        assert_eq!(config.root_name, "root");
        assert_eq!(config.not_found_param(), "missing");
        assert!(config.sitemap_name.is_none());
        assert_eq!(config.cache_capacity, 0);
    }

    #[test]
    fn test_serde_camel_case() {
        let json = serde_json::to_value(RouterConfig::default()).unwrap();
        assert_eq!(json["initialUrl"], "/");
        assert_eq!(json["notFoundName"], "+not-found");
        assert_eq!(json["cacheCapacity"], 256);

        let config: RouterConfig =
            serde_json::from_str(r#"{ "sitemapName": null, "cacheCapacity": 8 }"#).unwrap();
        assert!(config.sitemap_name.is_none());
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.root_name, "__root");
    }
}
