//! In-memory backend for development and testing

use crate::{AuthProvider, BaasError, FileStore, NewFile, Result, StoredFile, User};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone, Debug)]
struct Account {
    object_id: String,
    password_digest: String,
}

#[derive(Clone, Debug)]
struct Session {
    user: User,
    expires_at: Instant,
}

/// An in-memory user directory and file store
#[derive(Clone)]
pub struct MemoryBackend {
    accounts: Arc<DashMap<String, Account>>,
    sessions: Arc<DashMap<String, Session>>,
    session_ttl: Duration,
    files: Arc<DashMap<String, (StoredFile, Vec<u8>)>>,
    file_base_url: String,
}

impl MemoryBackend {
    /// Create an empty backend serving file URLs under `file_base_url`
    pub fn new(file_base_url: impl Into<String>) -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
            sessions: Arc::new(DashMap::new()),
            session_ttl: DEFAULT_SESSION_TTL,
            files: Arc::new(DashMap::new()),
            file_base_url: file_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Set how long a session token stays valid after login
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Number of live session tokens
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn prune_sessions(&self, now: Instant) {
        self.sessions.retain(|_, session| session.expires_at > now);
    }

    /// Register a user, replacing any existing password. Returns the object id.
    pub fn register(&self, username: &str, password: &str) -> String {
        let object_id = self
            .accounts
            .get(username)
            .map(|a| a.object_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        self.accounts.insert(
            username.to_string(),
            Account {
                object_id: object_id.clone(),
                password_digest: password_digest(password),
            },
        );
        object_id
    }

    /// Number of stored files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Decoded content of a stored file
    pub fn file_content(&self, id: &str) -> Option<Vec<u8>> {
        self.files.get(id).map(|entry| entry.value().1.clone())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new("memory://files")
    }
}

fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"grocer:password:");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn log_in(&self, username: &str, password: &str) -> Result<User> {
        let account = self
            .accounts
            .get(username)
            .map(|entry| entry.value().clone())
            .ok_or(BaasError::InvalidCredentials)?;

        if account.password_digest != password_digest(password) {
            return Err(BaasError::InvalidCredentials);
        }

        let user = User {
            object_id: account.object_id,
            username: username.to_string(),
            session_token: Uuid::new_v4().simple().to_string(),
        };
        let now = Instant::now();
        self.prune_sessions(now);
        self.sessions.insert(
            user.session_token.clone(),
            Session {
                user: user.clone(),
                expires_at: now + self.session_ttl,
            },
        );
        Ok(user)
    }

    async fn become_user(&self, session_token: &str) -> Result<User> {
        let session = self
            .sessions
            .get(session_token)
            .map(|entry| entry.value().clone())
            .ok_or(BaasError::SessionInvalid)?;

        if session.expires_at <= Instant::now() {
            self.sessions.remove(session_token);
            return Err(BaasError::SessionInvalid);
        }
        Ok(session.user)
    }
}

#[async_trait]
impl FileStore for MemoryBackend {
    async fn save(&self, file: NewFile) -> Result<StoredFile> {
        if file.name.is_empty() {
            return Err(BaasError::InvalidFile("file name is empty".to_string()));
        }
        let content = general_purpose::STANDARD
            .decode(file.base64.as_bytes())
            .map_err(|e| BaasError::InvalidFile(e.to_string()))?;

        let id = Uuid::new_v4().simple().to_string();
        let stored = StoredFile {
            url: format!(
                "{}/{}/{}",
                self.file_base_url,
                id,
                urlencoding::encode(&file.name)
            ),
            id: id.clone(),
            name: file.name,
            mime_type: file.mime_type,
        };
        self.files.insert(id, (stored.clone(), content));
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_and_become() {
        let backend = MemoryBackend::default();
        let id = backend.register("alice", "s3cret");

        let user = backend.log_in("alice", "s3cret").await.unwrap();
        assert_eq!(user.object_id, id);
        assert_eq!(user.username, "alice");
        assert!(!user.session_token.is_empty());

        let again = backend.become_user(&user.session_token).await.unwrap();
        assert_eq!(again, user);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_dropped() {
        let backend = MemoryBackend::default().with_session_ttl(Duration::ZERO);
        backend.register("alice", "s3cret");

        let first = backend.log_in("alice", "s3cret").await.unwrap();
        let second = backend.log_in("alice", "s3cret").await.unwrap();
        assert_eq!(backend.session_count(), 1);

        assert!(matches!(
            backend.become_user(&first.session_token).await,
            Err(BaasError::SessionInvalid)
        ));
        assert!(matches!(
            backend.become_user(&second.session_token).await,
            Err(BaasError::SessionInvalid)
        ));
        assert_eq!(backend.session_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let backend = MemoryBackend::default();
        backend.register("alice", "s3cret");

        let result = backend.log_in("alice", "nope").await;
        assert!(matches!(result, Err(BaasError::InvalidCredentials)));

        let result = backend.log_in("bob", "s3cret").await;
        assert!(matches!(result, Err(BaasError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let backend = MemoryBackend::default();
        assert!(matches!(
            backend.become_user("missing").await,
            Err(BaasError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_save_file() {
        let backend = MemoryBackend::new("http://files.local/");
        let file = NewFile::new("a b.png", "aGVsbG8=", "image/png").with_owner("u1");

        let stored = backend.save(file).await.unwrap();
        assert_eq!(stored.name, "a b.png");
        assert_eq!(stored.mime_type, "image/png");
        assert_eq!(stored.url, format!("http://files.local/{}/a%20b.png", stored.id));
        assert_eq!(backend.file_content(&stored.id).unwrap(), b"hello");
        assert_eq!(backend.file_count(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_bad_base64() {
        let backend = MemoryBackend::default();
        let result = backend.save(NewFile::new("x.bin", "not base64!", "application/octet-stream")).await;
        assert!(matches!(result, Err(BaasError::InvalidFile(_))));
        assert_eq!(backend.file_count(), 0);
    }
}
