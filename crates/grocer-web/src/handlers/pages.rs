//! Page handlers and the catch-all

use crate::auth::CurrentUser;
use crate::{views, ApiError, AppState};
use axum::{
    extract::{Extension, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::Local;
use std::sync::Arc;

/// 302 to the landing page
pub fn redirect_home() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

/// GET / - Landing page
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(views::index_page(&state.config.app_name, Local::now()))
}

/// GET /main - Signed-in landing page
pub async fn main_page(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    match current.user() {
        Some(user) => Html(views::main_page(
            &state.config.app_name,
            Local::now(),
            &user.username,
        ))
        .into_response(),
        None => redirect_home(),
    }
}

/// GET /uploadPic - Upload form
pub async fn upload_form(Extension(current): Extension<CurrentUser>) -> Response {
    if current.user().is_some() {
        Html(views::upload_page("上传图片")).into_response()
    } else {
        redirect_home()
    }
}

/// Catch-all for requests no route or static file matched
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
