//! Remote-callable cloud functions
//!
//! Functions are registered by name and invoked with
//! `POST /1.1/functions/{name}` (or `/1/functions/{name}`) carrying a JSON
//! object of parameters. Results are wrapped as `{"result": ...}`, failures
//! as `{"code": 1, "error": ...}`.

use crate::auth::{self, CurrentUser, SessionUser};
use crate::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of a cloud function
pub type CloudResult = Result<Value, CloudError>;

type CloudFn = Arc<dyn Fn(Arc<AppState>, CloudRequest) -> BoxFuture<'static, CloudResult> + Send + Sync>;

/// Cloud function errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// The function reported failure
    #[error("{0}")]
    Failed(String),

    #[error("Cloud function not found: {0}")]
    NotFound(String),
}

impl IntoResponse for CloudError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Failed(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "code": 1, "error": self.to_string() }))).into_response()
    }
}

/// Arguments of one invocation
#[derive(Clone, Debug, Default)]
pub struct CloudRequest {
    /// Parameters object
    pub params: Map<String, Value>,
    /// Session user, if the caller is signed in
    pub user: Option<SessionUser>,
}

impl CloudRequest {
    /// String parameter, empty when absent or not a string
    pub fn param(&self, key: &str) -> &str {
        self.params.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// Registry of named functions
#[derive(Clone, Default)]
pub struct CloudFunctions {
    functions: HashMap<String, CloudFn>,
}

impl CloudFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`, replacing any previous definition
    pub fn define<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Arc<AppState>, CloudRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CloudResult> + Send + 'static,
    {
        let f: CloudFn = Arc::new(move |state, request| f(state, request).boxed());
        self.functions.insert(name.into(), f);
    }

    /// Invoke a function by name
    pub async fn call(&self, name: &str, state: Arc<AppState>, request: CloudRequest) -> CloudResult {
        let f = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| CloudError::NotFound(name.to_string()))?;
        f(state, request).await
    }

    /// Registered function names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The functions this app exposes
pub fn default_functions() -> CloudFunctions {
    let mut functions = CloudFunctions::new();
    functions.define("hello", hello);
    functions.define("login", login);
    functions
}

async fn hello(_state: Arc<AppState>, _request: CloudRequest) -> CloudResult {
    Ok(json!("Hello world!"))
}

async fn login(state: Arc<AppState>, request: CloudRequest) -> CloudResult {
    match auth::authenticate(&state, request.param("username"), request.param("password")).await {
        Ok(_) => Ok(json!("登录成功")),
        Err(e) => {
            tracing::debug!(error = %e, "cloud login failed");
            Err(CloudError::Failed("登录失败".to_string()))
        }
    }
}

/// POST /1.1/functions/{name} - Invoke a cloud function
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, CloudError> {
    let params = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let request = CloudRequest {
        params,
        user: current.0,
    };

    tracing::debug!(function = %name, "invoking cloud function");
    let result = state.cloud.call(&name, Arc::clone(&state), request).await?;
    Ok(Json(json!({ "result": result })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use grocer_baas::MemoryBackend;

    fn state() -> Arc<AppState> {
        let backend = Arc::new(MemoryBackend::default());
        backend.register("baozi", "123456");
        Arc::new(AppState::with_backends(
            ServerConfig::default(),
            backend.clone(),
            backend,
        ))
    }

    fn request(params: Value) -> CloudRequest {
        CloudRequest {
            params: params.as_object().cloned().unwrap_or_default(),
            user: None,
        }
    }

    #[test]
    fn test_default_names() {
        assert_eq!(default_functions().names(), vec!["hello", "login"]);
    }

    #[tokio::test]
    async fn test_hello() {
        let state = state();
        let result = state.cloud.call("hello", state.clone(), request(json!({}))).await.unwrap();
        assert_eq!(result, json!("Hello world!"));
    }

    #[tokio::test]
    async fn test_login() {
        let state = state();
        let ok = state
            .cloud
            .call("login", state.clone(), request(json!({ "username": "baozi", "password": "123456" })))
            .await
            .unwrap();
        assert_eq!(ok, json!("登录成功"));

        let err = state
            .cloud
            .call("login", state.clone(), request(json!({ "username": "baozi", "password": "nope" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "登录失败");
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let state = state();
        let err = state.cloud.call("nope", state.clone(), request(json!({}))).await.unwrap_err();
        assert!(matches!(err, CloudError::NotFound(_)));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_param_types() {
        let req = request(json!({ "username": "a", "n": 1 }));
        assert_eq!(req.param("username"), "a");
        assert_eq!(req.param("n"), "");
        assert_eq!(req.param("missing"), "");
    }
}
