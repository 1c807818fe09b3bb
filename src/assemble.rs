//! Document assembly and export.
//!
//! Wraps rendered [`Page`]s into a readable document: one `<section>` per
//! page, a bottom pager linking every page, and an orientation wrapper that
//! switches between horizontal and vertical writing.
//!
//! ## Output Forms
//!
//! - **Fragment** ([`to_html_fragment`]): the wrapper `<div>` only, for
//!   embedding in a surrounding page.
//! - **Standalone** ([`to_html_document`]): a full HTML document linking the
//!   stylesheet and script named in `[export]`.
//! - **Text**: the raw document, unchanged.
//! - **JSON**: the rendered pages (`index`, `text`, `html`) as an array.
//!
//! ## Output Structure
//!
//! A standalone export is self-contained once its assets are written
//! alongside it:
//!
//! ```text
//! out/
//! ├── novel.html
//! └── static/
//!     ├── style.css         # Page layout and writing modes
//!     └── app.js            # Pager highlight and #N navigation
//! ```
//!
//! Both assets are embedded at compile time from `static/`.
//!
//! ## Anchors
//!
//! Every page carries two anchors: `#page-N` on the section and a bare `#N`
//! on an invisible span, so `[jump:N]` links and pager links land on the
//! page without any script.

use crate::config::{ExportConfig, Labels, RenderConfig};
use crate::render::Renderer;
use crate::types::{Page, WritingMode};
use crate::upload::UploadStore;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub const STYLE_CSS: &str = include_str!("../static/style.css");
pub const APP_JS: &str = include_str!("../static/app.js");

/// File form of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Standalone HTML document plus static assets
    #[default]
    Html,
    /// Document wrapper only, no boilerplate
    Fragment,
    /// Raw document text
    Text,
    /// Rendered pages as a JSON array
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Html | ExportFormat::Fragment => "html",
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
        }
    }
}

// ============================================================================
// HTML Components
// ============================================================================

fn render_section(page: &Page) -> Markup {
    html! {
        section.page id={ "page-" (page.index) } data-index=(page.index) {
            span id=(page.index) class="page-anchor" aria-hidden="true" {}
            div.page-inner { (PreEscaped(&page.html)) }
        }
    }
}

/// Renders the bottom pager: first-page arrow, one link per page, last-page arrow.
pub fn render_pager(total: usize, labels: &Labels) -> Markup {
    let total = total.max(1);
    html! {
        div.bottom-pager role="navigation" aria-label=(labels.pager) {
            div.pager-center {
                a.page-arrow.prev href="#1" { (PreEscaped("&lsaquo;")) }
                @for i in 1..=total {
                    a.page-number href={ "#" (i) } data-page=(i) { (i) }
                }
                a.page-arrow.next href={ "#" (total) } { (PreEscaped("&rsaquo;")) }
            }
        }
    }
}

fn render_body(pages: &[Page], mode: WritingMode, labels: &Labels) -> Markup {
    html! {
        div class={ "document " (mode) } {
            @for page in pages {
                (render_section(page))
            }
            (render_pager(pages.len(), labels))
        }
    }
}

/// Assemble pages into an embeddable fragment.
pub fn to_html_fragment(pages: &[Page], mode: WritingMode, labels: &Labels) -> String {
    render_body(pages, mode, labels).into_string()
}

/// Assemble pages into a standalone HTML document.
pub fn to_html_document(pages: &[Page], mode: WritingMode, config: &RenderConfig) -> String {
    let export = &config.export;
    let markup = html! {
        (DOCTYPE)
        html lang=(export.lang) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (export.title) }
                link rel="stylesheet" href=(export.stylesheet);
            }
            body {
                (render_body(pages, mode, &config.labels))
                script src=(export.script) {}
            }
        }
    };
    markup.into_string()
}

/// Produce the content of an export in the given format.
pub fn export_string(
    raw: &str,
    pages: &[Page],
    format: ExportFormat,
    mode: WritingMode,
    config: &RenderConfig,
) -> Result<String, ExportError> {
    Ok(match format {
        ExportFormat::Html => to_html_document(pages, mode, config),
        ExportFormat::Fragment => to_html_fragment(pages, mode, &config.labels),
        ExportFormat::Text => raw.to_string(),
        ExportFormat::Json => serde_json::to_string_pretty(pages)?,
    })
}

// ============================================================================
// Files
// ============================================================================

/// Asset paths that point outside the export (absolute or remote) are left
/// to the host.
fn is_local_asset(path: &str) -> bool {
    !(path.is_empty() || path.starts_with('/') || path.contains("://"))
}

/// Write the embedded stylesheet and script under `dir`, at the paths the
/// standalone document links to. Returns the files written.
pub fn write_static_assets(dir: &Path, export: &ExportConfig) -> std::io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (rel, content) in [(&export.stylesheet, STYLE_CSS), (&export.script, APP_JS)] {
        if !is_local_asset(rel) {
            continue;
        }
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        written.push(path);
    }
    Ok(written)
}

/// Write one export to `out`, creating parent directories. HTML exports
/// also get their static assets next to them.
pub fn write_export(
    out: &Path,
    raw: &str,
    pages: &[Page],
    format: ExportFormat,
    mode: WritingMode,
    config: &RenderConfig,
) -> Result<(), ExportError> {
    let dir = out.parent().unwrap_or(Path::new(""));
    fs::create_dir_all(dir)?;
    fs::write(out, export_string(raw, pages, format, mode, config)?)?;
    if format == ExportFormat::Html {
        write_static_assets(dir, &config.export)?;
    }
    tracing::info!("wrote {} ({} page(s))", out.display(), pages.len());
    Ok(())
}

// ============================================================================
// Directory export
// ============================================================================

/// Progress of a directory export, sent once per document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    Exported {
        /// Source path relative to the input directory.
        source: String,
        /// Output path relative to the output directory.
        output: String,
        pages: usize,
        missing_images: Vec<String>,
    },
    Failed {
        source: String,
        error: String,
    },
}

/// Totals of a directory export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub documents: usize,
    pub pages: usize,
    pub failed: usize,
}

/// Every `*.txt` file under `dir`, sorted by path.
pub fn find_documents(dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "txt") {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Export every document under `src_dir` as standalone HTML into `out_dir`,
/// mirroring the directory layout. Documents are rendered in parallel.
///
/// A document that fails to read or write is reported through `progress`
/// and counted, without stopping the others.
pub fn export_tree<S>(
    src_dir: &Path,
    out_dir: &Path,
    store: &S,
    config: &RenderConfig,
    mode: WritingMode,
    progress: Option<Sender<ExportEvent>>,
) -> Result<ExportSummary, ExportError>
where
    S: UploadStore + Sync + ?Sized,
{
    let documents = find_documents(src_dir)?;
    tracing::debug!("found {} document(s) under {}", documents.len(), src_dir.display());

    let events: Vec<ExportEvent> = documents
        .par_iter()
        .map(|path| {
            let event = export_one(path, src_dir, out_dir, store, config, mode);
            if let Some(tx) = &progress {
                tx.send(event.clone()).ok();
            }
            event
        })
        .collect();

    if events
        .iter()
        .any(|e| matches!(e, ExportEvent::Exported { .. }))
    {
        write_static_assets(out_dir, &config.export)?;
    }

    let mut summary = ExportSummary::default();
    for event in &events {
        match event {
            ExportEvent::Exported { pages, .. } => {
                summary.documents += 1;
                summary.pages += pages;
            }
            ExportEvent::Failed { .. } => summary.failed += 1,
        }
    }
    Ok(summary)
}

fn export_one<S>(
    path: &Path,
    src_dir: &Path,
    out_dir: &Path,
    store: &S,
    config: &RenderConfig,
    mode: WritingMode,
) -> ExportEvent
where
    S: UploadStore + ?Sized,
{
    let rel = path.strip_prefix(src_dir).unwrap_or(path);
    let source = rel.display().to_string();
    let out_rel = rel.with_extension(ExportFormat::Html.extension());

    match write_document(path, &out_dir.join(&out_rel), store, config, mode) {
        Ok((pages, missing_images)) => ExportEvent::Exported {
            source,
            output: out_rel.display().to_string(),
            pages,
            missing_images,
        },
        Err(e) => {
            tracing::warn!("export of {source} failed: {e}");
            ExportEvent::Failed {
                source,
                error: e.to_string(),
            }
        }
    }
}

/// Render `path` to a standalone document at `out`. Returns the page count
/// and the unresolved image tokens.
fn write_document<S>(
    path: &Path,
    out: &Path,
    store: &S,
    config: &RenderConfig,
    mode: WritingMode,
) -> Result<(usize, Vec<String>), ExportError>
where
    S: UploadStore + ?Sized,
{
    let raw = fs::read_to_string(path)?;
    let renderer = Renderer::new(store, config);
    let pages = renderer.render_document(&raw);
    let missing = renderer
        .inspect_document(&raw)
        .into_iter()
        .flat_map(|r| r.missing)
        .collect();
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(out, to_html_document(&pages, mode, config))?;
    Ok((pages.len(), missing))
}
