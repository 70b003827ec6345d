//! Connector configuration.

use std::time::Duration;

const API_VERSION: &str = "v3";

/// OpenProject connector configuration.
#[derive(Debug, Clone)]
pub struct OpenProjectConfig {
    /// Instance base URL, with or without the `/api/v3` suffix.
    pub base_url: String,

    /// API key (sent as Basic auth user `apikey`).
    pub api_key: Option<String>,

    /// Page size of the listing call.
    pub sync_limit: u32,

    /// Case-insensitive project name substrings; empty means all projects.
    pub sync_projects: Vec<String>,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl OpenProjectConfig {
    /// Create a configuration for the given instance.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builder method to set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Builder method to set the project patterns.
    pub fn with_projects(mut self, patterns: Vec<String>) -> Self {
        self.sync_projects = patterns;
        self
    }

    /// Builder method to set the listing page size.
    pub fn with_sync_limit(mut self, limit: u32) -> Self {
        self.sync_limit = limit;
        self
    }

    /// Resolve the API root used for all requests.
    pub fn api_base_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.contains("/api/v3") {
            base.to_string()
        } else {
            format!("{}/api/{}", base, API_VERSION)
        }
    }

    /// Parse a comma-separated project pattern list.
    pub fn parse_projects(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for OpenProjectConfig {
    fn default() -> Self {
        Self {
            base_url: "https://your-openproject-instance.com".to_string(),
            api_key: None,
            sync_limit: 100,
            sync_projects: Vec::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_url_appends_version() {
        let config = OpenProjectConfig::new("https://op.example.com/");
        assert_eq!(config.api_base_url(), "https://op.example.com/api/v3");
    }

    #[test]
    fn test_api_base_url_kept_when_present() {
        let config = OpenProjectConfig::new("https://op.example.com/api/v3");
        assert_eq!(config.api_base_url(), "https://op.example.com/api/v3");
    }

    #[test]
    fn test_parse_projects() {
        assert_eq!(
            OpenProjectConfig::parse_projects(" Apollo , gemini,,"),
            vec!["Apollo".to_string(), "gemini".to_string()]
        );
        assert!(OpenProjectConfig::parse_projects("").is_empty());
    }
}
