//! File upload handler

use crate::auth::CurrentUser;
use crate::{ApiError, AppState};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Extension, Multipart, State,
    },
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use grocer_baas::NewFile;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Incremental base64 encoder
///
/// Holds back up to two bytes between chunks so the concatenated output is
/// the encoding of the whole stream.
#[derive(Debug, Default)]
pub struct Base64Accumulator {
    encoded: String,
    carry: Vec<u8>,
    bytes: u64,
}

impl Base64Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw bytes
    pub fn push(&mut self, mut chunk: &[u8]) {
        self.bytes += chunk.len() as u64;

        if !self.carry.is_empty() {
            let take = (3 - self.carry.len()).min(chunk.len());
            self.carry.extend_from_slice(&chunk[..take]);
            chunk = &chunk[take..];
            if self.carry.len() < 3 {
                return;
            }
            general_purpose::STANDARD.encode_string(&self.carry, &mut self.encoded);
            self.carry.clear();
        }

        let whole = chunk.len() - chunk.len() % 3;
        general_purpose::STANDARD.encode_string(&chunk[..whole], &mut self.encoded);
        self.carry.extend_from_slice(&chunk[whole..]);
    }

    /// Raw bytes consumed so far
    pub fn byte_len(&self) -> u64 {
        self.bytes
    }

    /// Flush the carry and return the padded encoding
    pub fn finish(mut self) -> String {
        if !self.carry.is_empty() {
            general_purpose::STANDARD.encode_string(&self.carry, &mut self.encoded);
        }
        self.encoded
    }
}

/// The accepted file field of an upload
#[derive(Debug)]
pub struct UploadBuffer {
    pub file_name: String,
    pub declared_type: Option<String>,
    pub content: Base64Accumulator,
}

impl UploadBuffer {
    pub fn new(file_name: impl Into<String>, declared_type: Option<String>) -> Self {
        Self {
            file_name: file_name.into(),
            declared_type: declared_type.filter(|t| !t.is_empty()),
            content: Base64Accumulator::new(),
        }
    }

    /// Declared content type, else a guess from the file name
    pub fn mime_type(&self) -> String {
        match &self.declared_type {
            Some(declared) => declared.clone(),
            None => mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .to_string(),
        }
    }

    pub fn into_new_file(self, owner: Option<&str>) -> NewFile {
        let mime_type = self.mime_type();
        let file = NewFile::new(self.file_name, self.content.finish(), mime_type);
        match owner {
            Some(owner) => file.with_owner(owner),
            None => file,
        }
    }
}

/// Upload result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_url: String,
}

/// A failure while reading the multipart stream keeps axum's classification,
/// e.g. 413 when the body limit is exceeded
fn stream_error(e: MultipartError) -> ApiError {
    warn!("uploadFile - stream failed: {}", e);
    ApiError::Upload {
        status: e.status(),
        reason: e.body_text(),
    }
}

/// POST /uploadPicInterface - Store a single uploaded file
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("uploadFile - multipart unavailable: {}", e);
        ApiError::upload_unavailable(e.body_text())
    })?;

    let mut accepted: Option<UploadBuffer> = None;
    while let Some(mut field) = multipart.next_field().await.map_err(stream_error)? {
        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        if accepted.is_some() {
            warn!("uploadFile - rejected second file field {}", file_name);
            return Err(ApiError::TooManyFiles);
        }

        let mut buffer = UploadBuffer::new(file_name, field.content_type().map(str::to_string));
        while let Some(chunk) = field.chunk().await.map_err(stream_error)? {
            buffer.content.push(&chunk);
        }
        accepted = Some(buffer);
    }

    let buffer = accepted.ok_or(ApiError::MissingFile)?;
    info!(
        file_name = %buffer.file_name,
        bytes = buffer.content.byte_len(),
        "uploadFile - storing"
    );

    let owner = current.user().map(|u| u.object_id.as_str());
    let stored = state
        .with_deadline(state.files.save(buffer.into_new_file(owner)))
        .await
        .map_err(|e| {
            warn!("uploadFile - {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(UploadResponse {
        file_id: stored.id,
        file_name: stored.name,
        mime_type: stored.mime_type,
        file_url: stored.url,
    }))
}
