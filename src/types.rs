//! Shared types passed between the renderer, assembler, and CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One rendered page of a document.
///
/// Pages are numbered from 1 in document order. `text` is the trimmed
/// source of the page and `html` its rendered fragment, blocks joined by
/// a newline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub text: String,
    pub html: String,
}

/// A resolved image directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    pub alt: String,
    /// False when an upload id could not be resolved; rendered as a
    /// "missing image" placeholder instead of an `<img>`.
    pub found: bool,
}

/// Text orientation of the assembled document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingMode {
    #[default]
    Horizontal,
    Vertical,
}

impl WritingMode {
    /// Parse a session value. Anything other than `"vertical"` is horizontal.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim() {
            "vertical" => WritingMode::Vertical,
            _ => WritingMode::Horizontal,
        }
    }

    /// CSS class applied to the document wrapper.
    pub fn as_str(self) -> &'static str {
        match self {
            WritingMode::Horizontal => "horizontal",
            WritingMode::Vertical => "vertical",
        }
    }
}

impl fmt::Display for WritingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
