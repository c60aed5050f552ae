//! Session login and logout

use crate::auth::{self, SessionUser};
use crate::handlers::redirect_home;
use crate::{ApiError, AppState};
use axum::{
    extract::{FromRequest, Request, State},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Login form or JSON body
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Read credentials from a JSON or url-encoded body; unreadable bodies yield empty credentials
async fn read_credentials(request: Request) -> Credentials {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        Json::<Credentials>::from_request(request, &())
            .await
            .map(|Json(c)| c)
            .unwrap_or_default()
    } else {
        Form::<Credentials>::from_request(request, &())
            .await
            .map(|Form(c)| c)
            .unwrap_or_default()
    }
}

/// POST /login - Log in and start a session
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
) -> Result<Response, ApiError> {
    let credentials = read_credentials(request).await;

    let user = match auth::authenticate(&state, &credentials.username, &credentials.password).await {
        Ok(user) => SessionUser::from(user),
        Err(e) => {
            if e.is_auth_failure() {
                debug!(username = %credentials.username, "signin failed: bad credentials");
            } else {
                warn!(username = %credentials.username, error = %e, "signin failed: platform error");
            }
            return Ok(Json(json!({ "success": false })).into_response());
        }
    };

    let config = &state.config;
    let token = auth::issue_session_token(&user, &config.session_secret, config.session_max_age())
        .map_err(|e| ApiError::Internal(format!("failed to sign session: {}", e)))?;
    let jar = jar.add(auth::session_cookie(
        &config.session_cookie_name,
        token,
        config.session_max_age(),
    ));

    info!(user_id = %user.object_id, username = %user.username, "signin successfully");
    Ok((jar, Json(json!({ "success": true }))).into_response())
}

/// POST /logout - End the session
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let jar = jar.remove(auth::removal_cookie(&state.config.session_cookie_name));
    (jar, redirect_home()).into_response()
}
