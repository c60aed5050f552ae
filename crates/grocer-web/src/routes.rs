//! HTTP route definitions

use crate::{cloud, handlers, middleware, wechat, AppState};
use axum::{
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

/// Create the main router
///
/// Routes are tried in declaration order, then static files, then the
/// catch-all. Every miss ends up as the same "Not Found" error view.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.public_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(handlers::not_found.into_service());

    Router::new()
        // Cloud functions
        .route("/1.1/functions/{name}", post(cloud::invoke))
        .route("/1/functions/{name}", post(cloud::invoke))

        // Pages and session
        .route("/", get(handlers::index))
        .route("/main", get(handlers::main_page))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout).get(handlers::logout))

        // Upload
        .route("/uploadPic", get(handlers::upload_form))
        .route("/uploadPicInterface", post(handlers::upload_file))

        .nest("/wechat", wechat::router())

        .method_not_allowed_fallback(handlers::not_found)
        .fallback_service(static_files)

        // Apply middleware, innermost first
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::session_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::error_responder,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(axum_middleware::from_fn(middleware::fault_boundary))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .with_state(state)
}
