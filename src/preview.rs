//! Single-page view for preview and reading.
//!
//! A reader looks at one page at a time. [`PageView`] picks that page out of
//! a rendered document, clamps the requested number into range, and splits
//! off a leading chapter title so the caller can show it apart from the
//! body. Serializes to the JSON shape served to preview clients:
//!
//! ```json
//! {
//!   "success": true,
//!   "p": 2, "total": 3, "prev": 1, "next": 3, "nums": [1, 2, 3],
//!   "chapter": "Prologue",
//!   "page_text": "It was raining.",
//!   "page_html": "<p>It was raining.</p>",
//!   "writing_mode": "vertical"
//! }
//! ```

use crate::directive;
use crate::types::{Page, WritingMode};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PreviewError {
    #[error("nothing to preview: the document is empty")]
    EmptyDocument,
}

const HEADING_OPEN: &str = r#"<h2 class="chapter">"#;
const HEADING_CLOSE: &str = "</h2>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub success: bool,
    /// Current page, 1-based and always within `1..=total`.
    pub p: usize,
    pub total: usize,
    pub prev: usize,
    pub next: usize,
    /// Every page number, for a pager.
    pub nums: Vec<usize>,
    /// Title of a chapter directive opening the page.
    pub chapter: Option<String>,
    /// Page source after the chapter directive.
    pub page_text: String,
    /// Page HTML without the leading chapter heading.
    pub page_html: String,
    pub writing_mode: WritingMode,
}

/// Clamp a requested page number into `1..=total`.
///
/// An empty document counts as one page.
pub fn clamp_page(requested: i64, total: usize) -> usize {
    let total = total.max(1);
    usize::try_from(requested).unwrap_or(0).clamp(1, total)
}

impl PageView {
    pub fn new(pages: &[Page], requested: i64, mode: WritingMode) -> Self {
        let total = pages.len().max(1);
        let p = clamp_page(requested, total);
        let (text, html) = pages
            .get(p - 1)
            .map(|page| (page.text.as_str(), page.html.as_str()))
            .unwrap_or(("", ""));
        let (chapter, page_text) = split_chapter(text);

        Self {
            success: true,
            p,
            total,
            prev: p.saturating_sub(1).max(1),
            next: (p + 1).min(total),
            nums: (1..=total).collect(),
            chapter: chapter.map(str::to_string),
            page_text: page_text.to_string(),
            page_html: strip_heading(html).to_string(),
            writing_mode: mode,
        }
    }
}

/// View one page of a document, refusing an empty one.
pub fn preview_page(
    raw: &str,
    pages: &[Page],
    requested: i64,
    mode: WritingMode,
) -> Result<PageView, PreviewError> {
    if raw.trim().is_empty() {
        return Err(PreviewError::EmptyDocument);
    }
    Ok(PageView::new(pages, requested, mode))
}

/// Split a leading chapter directive off page source.
fn split_chapter(text: &str) -> (Option<&str>, &str) {
    let start = text.trim_start();
    match directive::match_chapter(start) {
        Some(m) => (Some(m.title), start[m.len..].trim_start()),
        None => (None, text),
    }
}

/// Drop a leading chapter heading from page HTML.
fn strip_heading(html: &str) -> &str {
    let Some(rest) = html.trim_start().strip_prefix(HEADING_OPEN) else {
        return html;
    };
    match rest.find(HEADING_CLOSE) {
        Some(end) => rest[end + HEADING_CLOSE.len()..].trim_start(),
        None => html,
    }
}
