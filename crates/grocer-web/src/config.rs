//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Deployment mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Verbose error pages
    Development,
    /// Terse error pages
    #[default]
    Production,
}

impl Environment {
    /// Only the literal `development` selects development mode
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("development") => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Deployment mode
    pub environment: Environment,
    /// Secret used to sign session cookies
    pub session_secret: String,
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session lifetime (milliseconds)
    pub session_max_age_ms: u64,
    /// Re-resolve the session user from the platform on every request
    pub fetch_user: bool,
    /// Application name shown on pages
    pub app_name: String,
    /// Directory of static assets
    pub public_dir: PathBuf,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Deadline for platform calls (milliseconds)
    pub collaborator_timeout_ms: u64,
    /// Use the in-memory platform backend
    pub use_memory_backend: bool,
    /// Platform API server URL
    pub baas_server_url: String,
    /// Platform application id
    pub baas_app_id: Option<String>,
    /// Platform application key
    pub baas_app_key: Option<String>,
    /// Demo account registered in the in-memory backend, as `username:password`
    pub demo_user: Option<String>,
    /// Token shared with the wechat platform for signature checks
    pub wechat_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: Environment::Production,
            session_secret: String::new(),
            session_cookie_name: "grocer.sess".to_string(),
            session_max_age_ms: 3_600_000, // 1 hour
            fetch_user: true,
            app_name: "包子的杂货铺".to_string(),
            public_dir: PathBuf::from("public"),
            max_body_size: 10 * 1024 * 1024, // 10 MB
            collaborator_timeout_ms: 10_000,
            use_memory_backend: false,
            baas_server_url: "https://api.leancloud.cn".to_string(),
            baas_app_id: None,
            baas_app_key: None,
            demo_user: None,
            wechat_token: None,
        }
    }
}

impl ServerConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_max_age(&self) -> Duration {
        Duration::from_millis(self.session_max_age_ms)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    /// Split `demo_user` into credentials
    pub fn demo_credentials(&self) -> Option<(&str, &str)> {
        self.demo_user.as_deref().and_then(|s| s.split_once(':'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_flag() {
        assert_eq!(Environment::from_flag(Some("development")), Environment::Development);
        assert_eq!(Environment::from_flag(Some("production")), Environment::Production);
        assert_eq!(Environment::from_flag(Some("Development")), Environment::Production);
        assert_eq!(Environment::from_flag(None), Environment::Production);
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.session_max_age(), Duration::from_secs(3600));
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_demo_credentials() {
        let config = ServerConfig {
            demo_user: Some("baozi:pa:ss".to_string()),
            ..Default::default()
        };
        assert_eq!(config.demo_credentials(), Some(("baozi", "pa:ss")));
    }
}
