//! Session cookies and platform authentication

use crate::AppState;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use grocer_baas::{BaasError, User};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session cookie claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (platform user object id)
    pub sub: String,
    /// Login name
    pub username: String,
    /// Platform session token
    pub token: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// The user attached to a request by the session layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub object_id: String,
    pub username: String,
    pub session_token: String,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            object_id: user.object_id,
            username: user.username,
            session_token: user.session_token,
        }
    }
}

/// Request extension holding the authenticated user, if any
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

impl CurrentUser {
    pub fn user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}

/// Sign a session for `user`, valid for `max_age`
pub fn issue_session_token(
    user: &SessionUser,
    secret: &str,
    max_age: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.object_id.clone(),
        username: user.username.clone(),
        token: user.session_token.clone(),
        iat: now,
        exp: now + max_age.as_secs() as i64,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a signed session and extract its user
pub fn validate_session_token(token: &str, secret: &str) -> Option<SessionUser> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| SessionUser {
            object_id: data.claims.sub,
            username: data.claims.username,
            session_token: data.claims.token,
        })
        .map_err(|e| {
            tracing::debug!("Session validation failed: {}", e);
        })
        .ok()
}

/// Read the session user from request cookies
pub fn session_from_headers(headers: &HeaderMap, cookie_name: &str, secret: &str) -> Option<SessionUser> {
    let jar = CookieJar::from_headers(headers);
    let cookie = jar.get(cookie_name)?;
    validate_session_token(cookie.value(), secret)
}

/// Build the session cookie carrying `token`
pub fn session_cookie(name: &str, token: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age.as_secs() as i64))
        .build()
}

/// Build a cookie that removes the session
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), String::new())).path("/").build()
}

/// Log in through the platform, bounded by the collaborator deadline
pub async fn authenticate(state: &AppState, username: &str, password: &str) -> Result<User, BaasError> {
    state.with_deadline(state.auth.log_in(username, password)).await
}

/// Re-resolve a session user through the platform
pub async fn refresh_user(state: &AppState, user: &SessionUser) -> Result<SessionUser, BaasError> {
    state
        .with_deadline(state.auth.become_user(&user.session_token))
        .await
        .map(SessionUser::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn alice() -> SessionUser {
        SessionUser {
            object_id: "u1".to_string(),
            username: "alice".to_string(),
            session_token: "tok".to_string(),
        }
    }

    #[test]
    fn test_session_round_trip() {
        let token = issue_session_token(&alice(), "secret", Duration::from_secs(3600)).unwrap();
        assert_eq!(validate_session_token(&token, "secret"), Some(alice()));
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_session_token(&alice(), "secret", Duration::from_secs(3600)).unwrap();
        assert_eq!(validate_session_token(&token, "other"), None);
    }

    #[test]
    fn test_expired_session() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "u1".to_string(),
            username: "alice".to_string(),
            token: "tok".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert_eq!(validate_session_token(&token, "secret"), None);
    }

    #[test]
    fn test_session_from_headers() {
        let token = issue_session_token(&alice(), "secret", Duration::from_secs(60)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("other=1; grocer.sess={}", token).parse().unwrap(),
        );
        assert_eq!(session_from_headers(&headers, "grocer.sess", "secret"), Some(alice()));
        assert_eq!(session_from_headers(&headers, "missing", "secret"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("grocer.sess", "abc".to_string(), Duration::from_millis(3_600_000));
        let rendered = cookie.to_string();
        assert!(rendered.starts_with("grocer.sess=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Max-Age=3600"));
        assert!(rendered.contains("Path=/"));
    }
}
