//! Platform client configuration

use std::time::Duration;

/// REST platform configuration
#[derive(Clone, Debug)]
pub struct BaasConfig {
    /// API server URL, without trailing slash
    pub server_url: String,
    /// Application id (`X-LC-Id`)
    pub app_id: String,
    /// Application key (`X-LC-Key`)
    pub app_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for BaasConfig {
    fn default() -> Self {
        Self {
            server_url: "https://api.leancloud.cn".to_string(),
            app_id: String::new(),
            app_key: String::new(),
            timeout: Duration::from_secs(10),
            user_agent: format!("grocer-baas/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl BaasConfig {
    /// Create a config for the given server and application credentials
    pub fn new(
        server_url: impl Into<String>,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            app_key: app_key.into(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a full API URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = BaasConfig::new("http://localhost:3000/", "id", "key");
        assert_eq!(config.url("/1.1/login"), "http://localhost:3000/1.1/login");
    }
}
