//! HTTP middleware: fault boundary, error rendering, sessions, request ids and logging

use crate::auth::{self, CurrentUser};
use crate::boundary::{uncaught_response, Fault, FaultBoundary};
use crate::error::PendingError;
use crate::{views, AppState};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::error;

/// Fault boundary middleware
///
/// Races the downstream future against the request's fault channel. A panic
/// or a raised fault that arrives first produces the `uncaughtException`
/// response; the boundary is finalized either way.
pub async fn fault_boundary(mut request: Request<Body>, next: Next) -> Response {
    let (boundary, mut faults) = FaultBoundary::new(request.uri().path());
    request.extensions_mut().insert(boundary.clone());

    let handler = AssertUnwindSafe(next.run(request)).catch_unwind();
    tokio::pin!(handler);

    let outcome = tokio::select! {
        biased;
        Some(fault) = faults.recv() => Err(fault),
        result = &mut handler => result.map_err(Fault::from_panic),
    };

    // Only this middleware finalizes, so the flag is always clear here;
    // later faults from spawned work see it set and are dropped.
    boundary.finalize();
    match outcome {
        Ok(response) => response,
        Err(fault) => {
            error!(url = %boundary.path(), msg = %fault, "uncaughtException");
            uncaught_response()
        }
    }
}

/// Error responder middleware
///
/// Renders the [`PendingError`] attached by a handler or by the catch-all.
pub async fn error_responder(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    match response.extensions_mut().remove::<PendingError>() {
        Some(pending) => render_error(&pending, state.config.environment.is_development()),
        None => response,
    }
}

/// Render a pending error as the error view
pub fn render_error(pending: &PendingError, development: bool) -> Response {
    let status = pending.status_code();
    let detail = if development {
        if status.as_u16() == 500 {
            error!(detail = %pending.detail, "{}", pending.message);
        }
        Some(pending.detail.as_str())
    } else {
        None
    };
    (status, Html(views::error_page(&pending.message, detail))).into_response()
}

/// Session middleware - attaches [`CurrentUser`] to every request
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.config;
    let mut user = auth::session_from_headers(
        request.headers(),
        &config.session_cookie_name,
        &config.session_secret,
    );

    if config.fetch_user {
        if let Some(session_user) = user.take() {
            match auth::refresh_user(&state, &session_user).await {
                Ok(fresh) => user = Some(fresh),
                Err(e) => tracing::debug!(error = %e, "session user could not be resolved"),
            }
        }
    }

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

/// Request ID middleware - adds x-request-id header
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Request ID extension
#[derive(Clone)]
pub struct RequestId(pub String);

/// Logging middleware
///
/// Runs inside `request_id_middleware` so each line carries the request id.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        content_type = ?response.headers().get(header::CONTENT_TYPE),
        "Request completed"
    );

    response
}
