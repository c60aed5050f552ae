//! # Grocer Web
//!
//! HTTP backend for the Grocer app, built on a BaaS platform.
//!
//! This crate provides:
//! - **Fault boundary**: per-request containment of panics and background failures
//! - **Error responder**: one rendering path for every handler error
//! - **Sessions**: signed cookie sessions backed by platform login
//! - **Uploads**: single-file multipart uploads stored on the platform
//! - **Cloud functions**: named remote-callable functions
//! - **Wechat**: platform handshake and message intake
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                Browsers / Mobile App                │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │  Fault Boundary │ Request ID │ Access Log           │
//! ├─────────────────────────────────────────────────────┤
//! │  Error Responder │ Session                          │
//! ├─────────────────────────────────────────────────────┤
//! │  Pages │ Login │ Upload │ Cloud Functions │ Wechat  │
//! ├─────────────────────────────────────────────────────┤
//! │                    grocer-baas                      │
//! │          (AuthProvider, FileStore backends)         │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod boundary;
pub mod cloud;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod views;
pub mod wechat;

pub use config::{Environment, ServerConfig};
pub use error::{ApiError, PendingError};
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
