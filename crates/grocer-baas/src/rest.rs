//! REST client for a LeanCloud-style platform

use crate::{AuthProvider, BaasConfig, BaasError, FileStore, NewFile, Result, StoredFile, User};
use async_trait::async_trait;
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

/// Platform REST client
pub struct RestClient {
    config: BaasConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    error: String,
}

#[derive(Debug, Deserialize)]
struct FileCreated {
    #[serde(rename = "objectId")]
    object_id: String,
    url: String,
    name: Option<String>,
}

impl RestClient {
    /// Create a new client with the given configuration
    pub fn new(config: BaasConfig) -> Result<Self> {
        if config.app_id.is_empty() || config.app_key.is_empty() {
            return Err(BaasError::Configuration(
                "app id and app key are required".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent)
                .map_err(|e| BaasError::Configuration(e.to_string()))?,
        );
        headers.insert(
            "X-LC-Id",
            header::HeaderValue::from_str(&config.app_id)
                .map_err(|e| BaasError::Configuration(e.to_string()))?,
        );
        headers.insert(
            "X-LC-Key",
            header::HeaderValue::from_str(&config.app_key)
                .map_err(|e| BaasError::Configuration(e.to_string()))?,
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { config, http })
    }

    /// Get the configuration
    pub fn config(&self) -> &BaasConfig {
        &self.config
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        session_token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = self.config.url(path);
        let mut req = self.http.request(method.clone(), &url);

        if let Some(token) = session_token {
            req = req.header("X-LC-Session", token);
        }
        if let Some(json) = body {
            req = req.json(&json);
        }

        debug!("Sending {} request to {}", method, url);
        let response = req.send().await.map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) => BaasError::from_api(body.code, body.error),
                Err(_) if status == StatusCode::UNAUTHORIZED => BaasError::SessionInvalid,
                Err(_) => BaasError::Http(format!("HTTP {}: {}", status.as_u16(), text)),
            });
        }

        Ok(response)
    }

    /// Map a send or body-read failure, reporting timeouts with the configured deadline
    fn map_transport(&self, err: reqwest::Error) -> BaasError {
        if err.is_timeout() {
            BaasError::Timeout {
                millis: self.config.timeout.as_millis() as u64,
            }
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl AuthProvider for RestClient {
    #[instrument(skip(self, password))]
    async fn log_in(&self, username: &str, password: &str) -> Result<User> {
        let response = self
            .request(
                Method::POST,
                "/1.1/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await?;
        response.json::<User>().await.map_err(|e| self.map_transport(e))
    }

    #[instrument(skip_all)]
    async fn become_user(&self, session_token: &str) -> Result<User> {
        let response = self
            .request(Method::GET, "/1.1/users/me", Some(session_token), None)
            .await
            .map_err(|e| match e {
                BaasError::InvalidCredentials => BaasError::SessionInvalid,
                other => other,
            })?;

        let mut user = response
            .json::<User>()
            .await
            .map_err(|e| self.map_transport(e))?;
        if user.session_token.is_empty() {
            user.session_token = session_token.to_string();
        }
        Ok(user)
    }
}

#[async_trait]
impl FileStore for RestClient {
    #[instrument(skip(self, file), fields(name = %file.name))]
    async fn save(&self, file: NewFile) -> Result<StoredFile> {
        let path = format!("/1.1/files/{}", urlencoding::encode(&file.name));
        let mut meta = json!({ "mime_type": file.mime_type });
        if let Some(owner) = &file.owner {
            meta["owner"] = json!(owner);
        }

        let response = self
            .request(
                Method::POST,
                &path,
                None,
                Some(json!({
                    "base64": file.base64,
                    "_ContentType": file.mime_type,
                    "mime_type": file.mime_type,
                    "metaData": meta,
                })),
            )
            .await?;

        let created = response
            .json::<FileCreated>()
            .await
            .map_err(|e| self.map_transport(e))?;
        Ok(StoredFile {
            id: created.object_id,
            name: created.name.unwrap_or(file.name),
            mime_type: file.mime_type,
            url: created.url,
        })
    }
}
