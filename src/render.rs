//! Document rendering: segmentation plus per-block HTML.
//!
//! [`Renderer`] borrows an upload store and a config and turns raw document
//! text into [`Page`]s. Rendering never fails: malformed directives become
//! text and unresolvable images become placeholders.
//!
//! ```text
//! raw ──segment──▶ PageSource[] ──classify_block──▶ BlockItem[] ──render_items──▶ Page.html
//! ```
//!
//! Nothing is cached between calls. Image tokens are resolved against the
//! store on every render, so a registry change shows up immediately.

use crate::block::{self, BlockItem};
use crate::config::{Labels, RenderConfig};
use crate::segment::{self, PageSource};
use crate::types::Page;
use crate::upload::{ImageResolver, UploadStore};
use serde::Serialize;

/// Inventory of one page, for checks and export summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub index: usize,
    pub blocks: usize,
    /// Chapter titles in page order.
    pub chapters: Vec<String>,
    /// Uploaded-image directives, found or not.
    pub images: usize,
    /// Tokens of images that could not be resolved.
    pub missing: Vec<String>,
}

/// Renders documents against one upload store and config.
pub struct Renderer<'a, S: ?Sized> {
    resolver: ImageResolver<'a, S>,
    labels: &'a Labels,
}

impl<'a, S: UploadStore + ?Sized> Renderer<'a, S> {
    pub fn new(store: &'a S, config: &'a RenderConfig) -> Self {
        Self {
            resolver: ImageResolver::new(store, &config.uploads),
            labels: &config.labels,
        }
    }

    /// Render one block to HTML.
    pub fn render_block(&self, block: &str) -> String {
        let items = block::classify_block(block, &self.resolver);
        block::render_items(&items, self.labels)
    }

    /// Render a segmented page. Block outputs are joined with `\n`.
    pub fn render_page(&self, source: &PageSource) -> Page {
        let html = source
            .blocks
            .iter()
            .map(|b| self.render_block(b))
            .collect::<Vec<_>>()
            .join("\n");
        Page {
            index: source.index,
            text: source.text.clone(),
            html,
        }
    }

    /// Segment and render a whole document.
    ///
    /// Always returns at least one page.
    pub fn render_document(&self, raw: &str) -> Vec<Page> {
        let sources = segment::segment(raw);
        let pages: Vec<Page> = sources.iter().map(|s| self.render_page(s)).collect();
        tracing::debug!(
            "rendered {} page(s), {} block(s)",
            pages.len(),
            sources.iter().map(|s| s.blocks.len()).sum::<usize>()
        );
        pages
    }

    /// Classify a document without producing HTML.
    pub fn inspect_document(&self, raw: &str) -> Vec<PageReport> {
        segment::segment(raw)
            .iter()
            .map(|source| {
                let mut report = PageReport {
                    index: source.index,
                    blocks: source.blocks.len(),
                    ..PageReport::default()
                };
                for b in &source.blocks {
                    for item in block::classify_block(b, &self.resolver) {
                        match item {
                            BlockItem::Heading(title) => report.chapters.push(title),
                            BlockItem::Image(image) => {
                                report.images += 1;
                                if !image.found {
                                    report.missing.push(image.alt);
                                }
                            }
                            _ => {}
                        }
                    }
                }
                report
            })
            .collect()
    }
}

/// Render a document in one call.
pub fn parse_document<S>(raw: &str, store: &S, config: &RenderConfig) -> Vec<Page>
where
    S: UploadStore + ?Sized,
{
    Renderer::new(store, config).render_document(raw)
}
