//! # pixitext
//!
//! Renders author-written documents in a small bracket markup into paginated
//! HTML for reading, preview, and export.
//!
//! ```text
//! [chapter:Prologue]
//! It was raining. [[rb:漢字>かんじ]]
//!
//! [uploadedimage:123456]
//! [newpage]
//! See [jump:1].
//! ```
//!
//! # Architecture: Segment, Classify, Render, Assemble
//!
//! ```text
//! 1. Segment    raw text  →  pages → blocks         (line endings, chapter isolation, [newpage])
//! 2. Classify   block     →  BlockItem[]            (headings, images, blank lines, prose)
//! 3. Render     items     →  page HTML              (escape, <br>, inline directives)
//! 4. Assemble   pages     →  fragment / document    (sections, pager, writing mode)
//! ```
//!
//! Stages 1–3 never fail. Malformed directives fall through as text and
//! unresolvable images render as placeholders, so any input produces a page.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`directive`] | Directive grammar: matchers returning borrowed captures |
//! | [`segment`] | Normalization, chapter isolation, page and block splitting |
//! | [`block`] | Block classifier (`BlockItem`) and block HTML |
//! | [`inline`] | Ruby, labeled link, and inline jump substitution on escaped text |
//! | [`upload`] | Upload store trait, JSON registry store, image token resolution |
//! | [`render`] | `Renderer`: drives segmentation and block rendering per page |
//! | [`assemble`] | Page sections, pager, standalone document, exports |
//! | [`preview`] | One-page view with clamping and chapter split |
//! | [`escape`] | HTML escaping and asset path encoding |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Shared types (`Page`, `ImageRef`, `WritingMode`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Escape First, Then Substitute
//!
//! Paragraph text is HTML-escaped before inline directives are substituted,
//! so directive arguments can never inject markup. The price is that the `>`
//! separator of `[[rb:…]]` and `[[jumpuri:…]]` arrives as `&gt;`; the
//! matchers accept both forms.
//!
//! ## Blank Lines Are Content
//!
//! Authors of web fiction use blank lines for pacing. Every empty line inside
//! a block becomes its own marker element instead of collapsing into a
//! paragraph break.
//!
//! ## Block Directives Need a Whole Block
//!
//! `[pixivimage:ID]` and `[jump:N]` render as block elements only when the
//! block body is exactly that directive. Anywhere else `[jump:N]` is an inline
//! link and `[pixivimage:ID]` is text.
//!
//! ## The Upload Store Is a Collaborator
//!
//! Image ids are resolved through the [`upload::UploadStore`] trait on every
//! render. The shipped [`upload::JsonUploadStore`] reads the registry the
//! upload side of an application writes; tests use an in-memory store.

pub mod assemble;
pub mod block;
pub mod config;
pub mod directive;
pub mod escape;
pub mod inline;
pub mod output;
pub mod preview;
pub mod render;
pub mod segment;
pub mod types;
pub mod upload;

pub use render::{Renderer, parse_document};
pub use types::{ImageRef, Page, WritingMode};

#[cfg(test)]
pub(crate) mod test_helpers;
