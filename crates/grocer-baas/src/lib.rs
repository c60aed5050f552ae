//! # Grocer BaaS
//!
//! The Backend-as-a-Service collaborator used by the Grocer web app.
//!
//! This crate provides:
//! - **Authentication**: username/password login and session-token lookup
//! - **File storage**: persist a base64-encoded file and get back its id and URL
//! - **Backends**: an in-memory backend for development and tests, and a
//!   REST client for a LeanCloud-style platform
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              grocer-web                 │
//! ├────────────────────┬────────────────────┤
//! │  AuthProvider      │  FileStore         │
//! ├────────────────────┴────────────────────┤
//! │   MemoryBackend    │    RestClient      │
//! └────────────────────┴────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use grocer_baas::{AuthProvider, MemoryBackend};
//!
//! let backend = MemoryBackend::new("memory://files");
//! backend.register("alice", "s3cret");
//! let user = backend.log_in("alice", "s3cret").await?;
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod rest;
pub mod types;

pub use config::BaasConfig;
pub use error::{BaasError, Result};
pub use memory::MemoryBackend;
pub use rest::RestClient;
pub use types::{NewFile, StoredFile, User};

use async_trait::async_trait;

/// Validates credentials and resolves session tokens
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Log a user in with username and password
    async fn log_in(&self, username: &str, password: &str) -> Result<User>;

    /// Resolve the user owning a session token
    async fn become_user(&self, session_token: &str) -> Result<User>;
}

/// Creates and persists files
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist a file and return its stored descriptor
    async fn save(&self, file: NewFile) -> Result<StoredFile>;
}
