//! HTML escaping and asset-URL encoding.
//!
//! The renderer escapes author text *before* substituting inline directives,
//! so every function here works on plain `&str` and returns owned strings
//! that can be spliced into hand-built markup.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left untouched in asset paths: unreserved marks plus `/`.
const ASSET_PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Escape HTML special characters, quotes included.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Percent-encode a stored asset name for use as a URL path.
///
/// ```
/// use pixitext::escape::encode_asset_path;
///
/// assert_eq!(encode_asset_path("cover art.png"), "cover%20art.png");
/// assert_eq!(encode_asset_path("sub/dir.png"), "sub/dir.png");
/// ```
#[must_use]
pub fn encode_asset_path(name: &str) -> String {
    utf8_percent_encode(name, ASSET_PATH_SET).to_string()
}
