//! Application state

use crate::cloud::{self, CloudFunctions};
use crate::config::ServerConfig;
use grocer_baas::{AuthProvider, BaasConfig, BaasError, FileStore, MemoryBackend, RestClient};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Authentication collaborator
    pub auth: Arc<dyn AuthProvider>,
    /// Storage collaborator
    pub files: Arc<dyn FileStore>,
    /// Remote-callable functions
    pub cloud: CloudFunctions,
}

impl AppState {
    /// Create the application state, choosing a platform backend from configuration
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        if config.session_secret.is_empty() {
            anyhow::bail!("session secret must be configured");
        }

        let rest = match (&config.baas_app_id, &config.baas_app_key) {
            (Some(id), Some(key)) if !config.use_memory_backend => {
                let baas = BaasConfig::new(&config.baas_server_url, id, key)
                    .with_timeout(config.collaborator_timeout());
                Some(RestClient::new(baas)?)
            }
            _ => None,
        };

        let state = match rest {
            Some(client) => {
                info!("Using platform API at {}", client.config().server_url);
                let client = Arc::new(client);
                Self::with_backends(config, client.clone(), client)
            }
            None => {
                if !config.use_memory_backend {
                    warn!("Platform credentials not configured, falling back to in-memory backend");
                }
                warn!("⚠ In-memory backend: users and files are NOT persistent");
                let backend =
                    Arc::new(MemoryBackend::default().with_session_ttl(config.session_max_age()));
                if let Some((username, password)) = config.demo_credentials() {
                    backend.register(username, password);
                    info!("Registered demo user {}", username);
                }
                Self::with_backends(config, backend.clone(), backend)
            }
        };

        Ok(state)
    }

    /// Create state over explicit collaborators
    pub fn with_backends(
        config: ServerConfig,
        auth: Arc<dyn AuthProvider>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            config,
            auth,
            files,
            cloud: cloud::default_functions(),
        }
    }

    /// Await a platform call, failing with `Timeout` past the collaborator deadline
    pub async fn with_deadline<T, F>(&self, call: F) -> grocer_baas::Result<T>
    where
        F: Future<Output = grocer_baas::Result<T>>,
    {
        let deadline = self.config.collaborator_timeout();
        tokio::time::timeout(deadline, call)
            .await
            .unwrap_or_else(|_| {
                Err(BaasError::Timeout {
                    millis: deadline.as_millis() as u64,
                })
            })
    }
}
