//! Per-request fault boundary
//!
//! Every request runs inside a [`FaultBoundary`]. Panics in the request
//! future, and failures in work spawned through [`FaultBoundary::spawn`],
//! are funnelled into one channel. The first fault that arrives before the
//! response is finalized becomes the fixed `uncaughtException` response;
//! anything later is logged and dropped.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Body of the last-resort response
pub const UNCAUGHT_BODY: &str = "uncaughtException";

/// A captured fault
#[derive(Clone, Debug)]
pub struct Fault {
    /// Diagnostic detail: panic payload or error chain
    pub detail: String,
}

impl Fault {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    /// Build a fault from a `catch_unwind` payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        Self { detail }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

struct BoundaryInner {
    path: String,
    finalized: AtomicBool,
    faults: mpsc::UnboundedSender<Fault>,
}

/// Fault boundary for one request, cloneable into spawned work
#[derive(Clone)]
pub struct FaultBoundary {
    inner: Arc<BoundaryInner>,
}

impl FaultBoundary {
    /// Create a boundary for the request at `path` and the receiving end of its channel
    pub fn new(path: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<Fault>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let boundary = Self {
            inner: Arc::new(BoundaryInner {
                path: path.into(),
                finalized: AtomicBool::new(false),
                faults: tx,
            }),
        };
        (boundary, rx)
    }

    /// Path of the owning request
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn is_finalized(&self) -> bool {
        self.inner.finalized.load(Ordering::Acquire)
    }

    /// Mark the response as finalized. Returns `true` for the first caller only.
    pub fn finalize(&self) -> bool {
        !self.inner.finalized.swap(true, Ordering::AcqRel)
    }

    /// Report a fault. Returns `false` when it can no longer affect the response.
    pub fn raise(&self, fault: Fault) -> bool {
        if self.is_finalized() {
            warn!(url = %self.inner.path, msg = %fault, "error after response finalized");
            return false;
        }
        match self.inner.faults.send(fault) {
            Ok(()) => true,
            Err(mpsc::error::SendError(fault)) => {
                warn!(url = %self.inner.path, msg = %fault, "error after request completed");
                false
            }
        }
    }

    /// Run follow-up work for this request on the runtime.
    ///
    /// An `Err` or a panic in `work` is raised into the boundary.
    pub fn spawn<F, E>(&self, work: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let boundary = self.clone();
        tokio::spawn(async move {
            match AssertUnwindSafe(work).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    boundary.raise(Fault::new(e.to_string()));
                }
                Err(payload) => {
                    boundary.raise(Fault::from_panic(payload));
                }
            }
        })
    }
}

/// The last-resort response written when a fault wins the race
pub fn uncaught_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json; charset=UTF-8")],
        UNCAUGHT_BODY,
    )
        .into_response()
}
