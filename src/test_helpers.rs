//! Shared test utilities for the pixitext test suite.
//!
//! Provides an in-memory upload store, one-call render helpers, project
//! fixtures on disk, and lookups that panic with a readable message.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let store = MemoryUploadStore::new().with_asset("123456", "cover.png");
//! let pages = render_with(&store, "[uploadedimage:123456][newpage]two");
//!
//! assert_eq!(page_html(&pages, 2), "<p>two</p>");
//! assert_eq!(count(&pages[0].html, "<figure"), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use tempfile::TempDir;

use crate::config::RenderConfig;
use crate::render::Renderer;
use crate::types::Page;
use crate::upload::{UploadError, UploadRecord, UploadStore};

// =========================================================================
// In-memory upload store
// =========================================================================

/// Upload store held entirely in memory.
///
/// Records and asset files are tracked separately so tests can model a
/// registry entry whose file has gone away.
#[derive(Debug, Default)]
pub struct MemoryUploadStore {
    records: HashMap<String, UploadRecord>,
    files: HashSet<String>,
    failing: bool,
}

impl MemoryUploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every lookup fails, as if the registry were unreadable.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Add a record and its asset file.
    pub fn with_asset(self, id: &str, stored_name: &str) -> Self {
        self.with_record(id, UploadRecord::new(stored_name))
            .with_file(stored_name)
    }

    /// Add a record without touching the file set.
    pub fn with_record(mut self, id: &str, record: UploadRecord) -> Self {
        self.records.insert(id.to_string(), record);
        self
    }

    /// Add an asset file without a record.
    pub fn with_file(mut self, stored_name: &str) -> Self {
        self.files.insert(stored_name.to_string());
        self
    }
}

impl UploadStore for MemoryUploadStore {
    fn lookup(&self, token: &str) -> Result<Option<UploadRecord>, UploadError> {
        if self.failing {
            return Err(UploadError::Io(std::io::Error::other("registry unavailable")));
        }
        Ok(self.records.get(token).cloned())
    }

    fn asset_exists(&self, record: &UploadRecord) -> bool {
        self.files.contains(&record.stored_name)
    }
}

// =========================================================================
// Rendering shortcuts
// =========================================================================

/// Render a document with default config against `store`.
pub fn render_with(store: &MemoryUploadStore, text: &str) -> Vec<Page> {
    let config = RenderConfig::default();
    Renderer::new(store, &config).render_document(text)
}

/// HTML of 1-based page `n`. Panics if out of range.
pub fn page_html(pages: &[Page], n: usize) -> &str {
    pages
        .iter()
        .find(|p| p.index == n)
        .map(|p| p.html.as_str())
        .unwrap_or_else(|| panic!("page {n} not found. Document has {} page(s)", pages.len()))
}

/// Non-overlapping occurrences of `needle` in `haystack`.
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// =========================================================================
// Project fixtures
// =========================================================================

/// Write a project root with an uploads directory, a registry, and the
/// given stored files.
///
/// `registry` is the raw JSON content of `uploads/uploads.json`.
pub fn setup_project(registry: &str, files: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let uploads = tmp.path().join("uploads");
    fs::create_dir_all(&uploads).unwrap();
    fs::write(uploads.join("uploads.json"), registry).unwrap();
    for name in files {
        fs::write(uploads.join(name), b"fake image data").unwrap();
    }
    tmp
}
