//! Value types exchanged with the platform

use serde::{Deserialize, Serialize};

/// An authenticated platform user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform object id
    #[serde(rename = "objectId")]
    pub object_id: String,
    /// Login name
    pub username: String,
    /// Session token issued at login
    #[serde(rename = "sessionToken", default)]
    pub session_token: String,
}

/// A file waiting to be persisted
#[derive(Clone, Debug)]
pub struct NewFile {
    /// Declared file name
    pub name: String,
    /// File content, standard base64 with padding
    pub base64: String,
    /// Resolved content type
    pub mime_type: String,
    /// Object id of the uploading user, if known
    pub owner: Option<String>,
}

impl NewFile {
    /// Create a file with no owner
    pub fn new(name: impl Into<String>, base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base64: base64.into(),
            mime_type: mime_type.into(),
            owner: None,
        }
    }

    /// Set the owner
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// A persisted file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Platform object id
    pub id: String,
    /// Stored name
    pub name: String,
    /// Content type recorded with the file
    pub mime_type: String,
    /// Public URL
    pub url: String,
}
