//! Wechat sub-router
//!
//! Implements the platform handshake and message intake. What the bot says
//! back is out of scope; received messages are only logged.

use crate::boundary::FaultBoundary;
use crate::{ApiError, AppState};
use axum::{
    extract::{Extension, Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::sync::Arc;
use tracing::{debug, info};

/// Build the router mounted at `/wechat`
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(verify).post(receive))
}

/// Signature parameters sent with every platform request
#[derive(Debug, Default, Deserialize)]
pub struct SignatureQuery {
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub echostr: String,
}

/// Inbound message envelope
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct WechatMessage {
    pub to_user_name: String,
    pub from_user_name: String,
    pub create_time: u64,
    pub msg_type: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub msg_id: Option<u64>,
}

/// `sha1` over the sorted concatenation of token, timestamp and nonce
pub fn compute_signature(token: &str, timestamp: &str, nonce: &str) -> String {
    let mut parts = [token, timestamp, nonce];
    parts.sort_unstable();
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

pub fn check_signature(token: &str, query: &SignatureQuery) -> bool {
    !query.signature.is_empty()
        && compute_signature(token, &query.timestamp, &query.nonce)
            .eq_ignore_ascii_case(&query.signature)
}

fn authorize(state: &AppState, query: &SignatureQuery) -> Result<(), ApiError> {
    let token = state
        .config
        .wechat_token
        .as_deref()
        .ok_or_else(|| ApiError::Forbidden("wechat token not configured".to_string()))?;
    if check_signature(token, query) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("invalid wechat signature".to_string()))
    }
}

pub fn parse_message(xml: &str) -> Result<WechatMessage, ApiError> {
    quick_xml::de::from_str(xml).map_err(|e| ApiError::BadRequest(format!("malformed message: {}", e)))
}

/// GET /wechat - Server verification handshake
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignatureQuery>,
) -> Result<String, ApiError> {
    authorize(&state, &query)?;
    debug!("wechat handshake verified");
    Ok(query.echostr)
}

/// POST /wechat - Accept a message and process it in the background
pub async fn receive(
    State(state): State<Arc<AppState>>,
    Extension(boundary): Extension<FaultBoundary>,
    Query(query): Query<SignatureQuery>,
    body: String,
) -> Result<&'static str, ApiError> {
    authorize(&state, &query)?;
    let message = parse_message(&body)?;
    boundary.spawn(handle_message(message));
    Ok("success")
}

async fn handle_message(message: WechatMessage) -> Result<(), ApiError> {
    info!(
        from = %message.from_user_name,
        msg_type = %message.msg_type,
        content = message.content.as_deref().unwrap_or(""),
        "wechat message received"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_order_independent() {
        let a = compute_signature("token", "1700000000", "nonce");
        let b = compute_signature("nonce", "token", "1700000000");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn test_check_signature() {
        let query = SignatureQuery {
            signature: compute_signature("secret", "123", "abc"),
            timestamp: "123".into(),
            nonce: "abc".into(),
            echostr: "hi".into(),
        };
        assert!(check_signature("secret", &query));
        assert!(!check_signature("other", &query));
        assert!(!check_signature("secret", &SignatureQuery::default()));
    }

    #[test]
    fn test_parse_text_message() {
        let xml = r#"<xml>
            <ToUserName><![CDATA[gh_123]]></ToUserName>
            <FromUserName><![CDATA[user_1]]></FromUserName>
            <CreateTime>1348831860</CreateTime>
            <MsgType><![CDATA[text]]></MsgType>
            <Content><![CDATA[你好]]></Content>
            <MsgId>1234567890123456</MsgId>
        </xml>"#;
        let message = parse_message(xml).unwrap();
        assert_eq!(message.to_user_name, "gh_123");
        assert_eq!(message.from_user_name, "user_1");
        assert_eq!(message.create_time, 1348831860);
        assert_eq!(message.msg_type, "text");
        assert_eq!(message.content.as_deref(), Some("你好"));
        assert_eq!(message.msg_id, Some(1234567890123456));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_message("not xml"), Err(ApiError::BadRequest(_))));
    }
}
