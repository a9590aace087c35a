//! Durable blob storage for file attachments.
//!
//! Attachments arrive over the WebSocket as base64 data URLs. The store
//! decodes the payload and writes it under a collision-resistant name
//! (`<uuid-v4>.<original extension>`); only that filename reference is
//! recorded and propagated by the core. Files are served statically at
//! `/uploads/{filename}`.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::GatewayError;

/// Filesystem-backed attachment store.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Creates a store rooted at the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the root directory attachments are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the upload directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] when the directory
    /// cannot be created.
    pub async fn ensure_dir(&self) -> Result<(), GatewayError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))
    }

    /// Decodes a base64 data URL and writes it durably, returning the
    /// generated filename reference.
    ///
    /// The extension of the client-supplied name is preserved; the rest of
    /// the name is replaced by a UUID, so simultaneous uploads cannot
    /// collide.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a malformed data URL
    /// and [`GatewayError::StoreUnavailable`] when the write fails.
    pub async fn save_data_url(
        &self,
        original_name: &str,
        data_url: &str,
    ) -> Result<String, GatewayError> {
        let payload = data_url
            .split_once("base64,")
            .map(|(_, payload)| payload)
            .ok_or_else(|| {
                GatewayError::InvalidRequest("attachment is not a base64 data URL".to_string())
            })?;

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| GatewayError::InvalidRequest(format!("attachment decode failed: {e}")))?;

        let filename = generated_name(original_name);
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

        tracing::debug!(file = %filename, "attachment saved");
        Ok(filename)
    }
}

/// Builds a collision-resistant filename, keeping the original extension
/// when one is present.
fn generated_name(original_name: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match original_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => format!("{id}.{ext}"),
        _ => id.to_string(),
    }
}
