//! Renderer configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a `config.toml` in the project root overrides any subset
//! of them.
//!
//! ## Config File Location
//!
//! ```text
//! project/
//! ├── config.toml              # Optional, overrides stock defaults
//! ├── uploads/
//! │   ├── uploads.json         # Upload registry (id → stored file)
//! │   └── cover.png
//! └── drafts/
//!     └── novel.txt
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [uploads]
//! dir = "uploads"             # Uploaded assets, relative to the project root
//! registry = "uploads.json"   # Registry file inside `dir`
//! static_prefix = "/uploads/" # URL prefix for stored assets
//! resolve_prefix = "/image/"  # URL prefix for unresolved upload ids
//! id_min_len = 4              # Digit-only tokens in this length range
//! id_max_len = 8              # are treated as upload ids
//!
//! [labels]
//! missing_image = "画像が見つかりません"
//! page_jump = "{page}ページへ"
//! pixiv_link = "pixiv作品 {id} を開く"
//! pixiv_caption = "pixiv作品ID: {id}"
//! pager = "ページ移動"
//!
//! [export]
//! title = "PixiText Export"
//! lang = "ja"
//! stylesheet = "static/style.css"
//! script = "static/app.js"
//! writing_mode = "horizontal" # or "vertical"
//!
//! [processing]
//! max_processes = 4           # Max parallel export workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full renderer configuration.
///
/// All fields have defaults; a user `config.toml` only needs the values it
/// wants to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Upload registry location and URL scheme.
    pub uploads: UploadsConfig,
    /// Text the renderer generates around author content.
    pub labels: Labels,
    /// Standalone export boilerplate.
    pub export: ExportConfig,
    /// Parallel export settings.
    pub processing: ProcessingConfig,
}

impl RenderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uploads.id_min_len == 0 {
            return Err(ConfigError::Validation(
                "uploads.id_min_len must be at least 1".into(),
            ));
        }
        if self.uploads.id_min_len > self.uploads.id_max_len {
            return Err(ConfigError::Validation(
                "uploads.id_min_len must not exceed uploads.id_max_len".into(),
            ));
        }
        if self.uploads.static_prefix.is_empty() || self.uploads.resolve_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "uploads.static_prefix and uploads.resolve_prefix must not be empty".into(),
            ));
        }
        if !matches!(self.export.writing_mode.as_str(), "horizontal" | "vertical") {
            return Err(ConfigError::Validation(format!(
                "export.writing_mode must be \"horizontal\" or \"vertical\", got {:?}",
                self.export.writing_mode
            )));
        }
        Ok(())
    }
}

/// Where uploaded images live and how their URLs are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Uploads directory, relative to the project root.
    pub dir: String,
    /// Registry file name inside `dir`.
    pub registry: String,
    /// URL prefix of directly served assets.
    pub static_prefix: String,
    /// URL prefix of the id-based image route, used for unresolved ids.
    pub resolve_prefix: String,
    /// Shortest digit-only token treated as an upload id.
    pub id_min_len: usize,
    /// Longest digit-only token treated as an upload id.
    pub id_max_len: usize,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            registry: "uploads.json".to_string(),
            static_prefix: "/uploads/".to_string(),
            resolve_prefix: "/image/".to_string(),
            id_min_len: 4,
            id_max_len: 8,
        }
    }
}

/// Generated text. `{page}` and `{id}` are substituted where noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Labels {
    /// Prefix of the placeholder shown for unresolved uploads.
    pub missing_image: String,
    /// Text of page-jump links; `{page}` is the target page number.
    pub page_jump: String,
    /// Text of artwork embed links; `{id}` is the artwork id.
    pub pixiv_link: String,
    /// Caption under artwork embeds; `{id}` is the artwork id.
    pub pixiv_caption: String,
    /// Accessible name of the pager navigation.
    pub pager: String,
}

impl Labels {
    pub fn page_jump(&self, page: &str) -> String {
        self.page_jump.replace("{page}", page)
    }

    pub fn pixiv_link(&self, id: &str) -> String {
        self.pixiv_link.replace("{id}", id)
    }

    pub fn pixiv_caption(&self, id: &str) -> String {
        self.pixiv_caption.replace("{id}", id)
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            missing_image: "画像が見つかりません".to_string(),
            page_jump: "{page}ページへ".to_string(),
            pixiv_link: "pixiv作品 {id} を開く".to_string(),
            pixiv_caption: "pixiv作品ID: {id}".to_string(),
            pager: "ページ移動".to_string(),
        }
    }
}

/// Standalone HTML export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Document `<title>`.
    pub title: String,
    /// `lang` attribute of the `<html>` element.
    pub lang: String,
    /// Stylesheet reference, relative to the exported file.
    pub stylesheet: String,
    /// Script reference, relative to the exported file.
    pub script: String,
    /// Default orientation when none is given on the command line.
    pub writing_mode: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: "PixiText Export".to_string(),
            lang: "ja".to_string(),
            stylesheet: "static/style.css".to_string(),
            script: "static/app.js".to_string(),
            writing_mode: "horizontal".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel export workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RenderConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists in the directory.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RenderConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RenderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<RenderConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!("loaded config from {}", root.display());
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# PixiText Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Uploaded images
# ---------------------------------------------------------------------------
[uploads]
# Directory holding uploaded assets, relative to the project root.
dir = "uploads"

# Registry mapping upload ids to stored file names, inside `dir`.
registry = "uploads.json"

# URL prefix for assets served directly from the uploads directory.
static_prefix = "/uploads/"

# URL prefix for upload ids that could not be resolved.
resolve_prefix = "/image/"

# Digit-only tokens with a length in this range are upload ids;
# every other token is a literal file name.
id_min_len = 4
id_max_len = 8

# ---------------------------------------------------------------------------
# Generated text
# ---------------------------------------------------------------------------
[labels]
# Shown in place of an image whose upload id cannot be resolved.
missing_image = "画像が見つかりません"

# Page-jump link text. {page} is the target page number.
page_jump = "{page}ページへ"

# Artwork embed link and caption. {id} is the artwork id.
pixiv_link = "pixiv作品 {id} を開く"
pixiv_caption = "pixiv作品ID: {id}"

# Accessible name of the page navigation bar.
pager = "ページ移動"

# ---------------------------------------------------------------------------
# Standalone export
# ---------------------------------------------------------------------------
[export]
title = "PixiText Export"
lang = "ja"

# Asset references, relative to the exported HTML file. The export command
# writes both files next to the export.
stylesheet = "static/style.css"
script = "static/app.js"

# "horizontal" or "vertical".
writing_mode = "horizontal"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for export-dir.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
