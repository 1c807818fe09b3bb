//! Upload Store collaborator and image token resolution.
//!
//! Authors reference images with `[uploadedimage:TOKEN]`. A token is either a
//! numeric upload id (looked up in the upload registry) or a literal filename
//! under the static uploads prefix.
//!
//! ## Registry Format
//!
//! The registry is a JSON object keyed by upload id, written by the upload
//! side of the application:
//!
//! ```json
//! {
//!   "123456": {
//!     "stored_name": "cover.png",
//!     "original_name": "Cover Art.png",
//!     "title": null,
//!     "deleted_at": null
//!   }
//! }
//! ```
//!
//! Only `stored_name` matters to rendering; any other fields are ignored.
//! The registry is read-only from here and re-read on every lookup, so a
//! render always sees the current state of the uploads directory.
//!
//! ## Resolution
//!
//! | Token | Outcome |
//! |-------|---------|
//! | digits, length within the id range, record + file present | `/uploads/<stored_name>`, found |
//! | digits, length within the id range, anything missing | `/image/<token>`, not found |
//! | anything else | `/uploads/<encoded token>`, found (no existence check) |
//!
//! A store that cannot be read is treated as "not found" and logged; a render
//! never fails because of the registry.

use crate::config::UploadsConfig;
use crate::escape::encode_asset_path;
use crate::types::ImageRef;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Registry JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry of the upload registry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadRecord {
    /// File name of the stored asset inside the uploads directory.
    #[serde(default)]
    pub stored_name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Set when the upload was moved to the trash.
    #[serde(default)]
    pub deleted_at: Option<serde_json::Value>,
}

impl UploadRecord {
    pub fn new(stored_name: impl Into<String>) -> Self {
        Self {
            stored_name: stored_name.into(),
            ..Self::default()
        }
    }

    /// Whether the record has been soft-deleted.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at
            .as_ref()
            .is_some_and(|v| !v.is_null() && v != &serde_json::Value::Bool(false))
    }
}

/// Read-only lookup of upload ids.
pub trait UploadStore {
    /// Look up an upload id. `Ok(None)` means the id is unknown.
    fn lookup(&self, token: &str) -> Result<Option<UploadRecord>, UploadError>;

    /// Whether the asset a record points to is present in the backing store.
    fn asset_exists(&self, record: &UploadRecord) -> bool;
}

/// Upload store backed by a JSON registry file next to the stored assets.
#[derive(Debug, Clone)]
pub struct JsonUploadStore {
    dir: PathBuf,
    registry: PathBuf,
}

impl JsonUploadStore {
    /// Store rooted at `dir`, reading the registry file `registry` inside it.
    pub fn new(dir: impl Into<PathBuf>, registry: impl AsRef<Path>) -> Self {
        let dir = dir.into();
        let registry = dir.join(registry);
        Self { dir, registry }
    }

    /// Build the store described by the `[uploads]` config section,
    /// relative to `root`.
    pub fn from_config(root: &Path, config: &UploadsConfig) -> Self {
        Self::new(root.join(&config.dir), &config.registry)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load(&self) -> Result<HashMap<String, UploadRecord>, UploadError> {
        let content = match fs::read_to_string(&self.registry) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl UploadStore for JsonUploadStore {
    fn lookup(&self, token: &str) -> Result<Option<UploadRecord>, UploadError> {
        Ok(self.load()?.remove(token))
    }

    fn asset_exists(&self, record: &UploadRecord) -> bool {
        !record.stored_name.is_empty() && self.dir.join(&record.stored_name).is_file()
    }
}

/// Maps image directive tokens to concrete URLs.
pub struct ImageResolver<'a, S: ?Sized> {
    store: &'a S,
    config: &'a UploadsConfig,
}

impl<'a, S: UploadStore + ?Sized> ImageResolver<'a, S> {
    pub fn new(store: &'a S, config: &'a UploadsConfig) -> Self {
        Self { store, config }
    }

    /// Whether a token is shaped like an upload id.
    pub fn is_upload_id(&self, token: &str) -> bool {
        let len = token.len();
        len >= self.config.id_min_len
            && len <= self.config.id_max_len
            && token.bytes().all(|b| b.is_ascii_digit())
    }

    /// Resolve a token into an image reference. Never fails.
    pub fn resolve(&self, token: &str) -> ImageRef {
        let token = token.trim();
        if !self.is_upload_id(token) {
            return ImageRef {
                url: format!("{}{}", self.config.static_prefix, encode_asset_path(token)),
                alt: token.to_string(),
                found: true,
            };
        }

        match self.find_stored(token) {
            Some(stored) => ImageRef {
                url: format!("{}{}", self.config.static_prefix, encode_asset_path(&stored)),
                alt: token.to_string(),
                found: true,
            },
            None => ImageRef {
                url: format!("{}{}", self.config.resolve_prefix, token),
                alt: token.to_string(),
                found: false,
            },
        }
    }

    fn find_stored(&self, token: &str) -> Option<String> {
        let record = match self.store.lookup(token) {
            Ok(record) => record?,
            Err(e) => {
                tracing::warn!("upload store unavailable, treating {token} as missing: {e}");
                return None;
            }
        };
        if record.stored_name.is_empty() || record.is_trashed() {
            tracing::debug!("upload {token} has no live asset");
            return None;
        }
        if !self.store.asset_exists(&record) {
            tracing::debug!("upload {token} points at missing file {}", record.stored_name);
            return None;
        }
        Some(record.stored_name)
    }
}
