//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides `access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Content API
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub request_timeout_secs: u64,

    // Listing
    pub listing_page_size: usize,
    pub max_listing_pages: Option<usize>,
    pub load_more_label: String,

    // Detail pages
    pub paths_page_size: usize,
    pub reading_time: String,

    // Date / Time format
    pub date_format: String,
    pub timezone: String,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            api_endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            request_timeout_secs: 10,

            listing_page_size: 1,
            max_listing_pages: None,
            load_more_label: "Carregar mais posts".to_string(),

            paths_page_size: 2,
            reading_time: "4 min".to_string(),

            date_format: "dd MMM y".to_string(),
            timezone: "UTC".to_string(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading {:?}", path.as_ref()))?;
        let mut config: SiteConfig = serde_yaml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.access_token = Some(token);
            }
        }
    }

    /// Timezone dates are rendered in
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone {:?}: {}", self.timezone, e))
    }

    /// Timeout applied to every content API request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.document_type, "posts");
        assert_eq!(config.listing_page_size, 1);
        assert_eq!(config.paths_page_size, 2);
        assert_eq!(config.date_format, "dd MMM y");
        assert_eq!(config.timezone().unwrap(), Tz::UTC);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
api_endpoint: https://myblog.cdn.prismic.io/api/v2
listing_page_size: 5
max_listing_pages: 3
timezone: America/Sao_Paulo
github_username: someone
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.api_endpoint, "https://myblog.cdn.prismic.io/api/v2");
        assert_eq!(config.listing_page_size, 5);
        assert_eq!(config.max_listing_pages, Some(3));
        assert_eq!(config.paths_page_size, 2);
        assert_eq!(config.timezone().unwrap(), chrono_tz::America::Sao_Paulo);
        assert!(config.extra.contains_key("github_username"));
    }

    #[test]
    fn test_invalid_timezone() {
        let config = SiteConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SiteConfig::default()
        };
        assert!(config.timezone().is_err());
    }
}
