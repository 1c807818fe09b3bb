//! Directive grammar and matchers.
//!
//! Directives are bracket tokens recognized at three granularities:
//!
//! | Directive | Form | Scope |
//! |---|---|---|
//! | Page break | `[newpage]` | document-wide split token |
//! | Chapter heading | `[chapter:TITLE]` | must start a line |
//! | Uploaded image | `[uploadedimage:TOKEN]` | entire trimmed line |
//! | Artwork embed | `[pixivimage:DIGITS]` | entire block |
//! | Block jump | `[jump:N]` | entire block |
//! | Inline jump | `[jump:N]` | anywhere inline |
//! | Labeled link | `[[jumpuri:LABEL>URL]]` | inline |
//! | Ruby | `[[rb:BASE>READING]]` | inline |
//!
//! Matching is best-effort: anything that does not fit a form exactly is
//! plain text, never an error. Each matcher works on a borrowed slice and
//! returns borrowed captures plus the byte length it consumed, so callers
//! can walk a string without copying.

/// Page-break token. Splits a document into pages wherever it occurs.
pub const NEWPAGE: &str = "[newpage]";

const CHAPTER_OPEN: &str = "[chapter:";
const UPLOADED_OPEN: &str = "[uploadedimage:";
const PIXIV_OPEN: &str = "[pixivimage:";
const JUMP_OPEN: &str = "[jump:";

/// Inline directives written with doubled brackets and a `>` separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairedKind {
    /// `[[rb:BASE>READING]]`
    Ruby,
    /// `[[jumpuri:LABEL>URL]]`
    JumpUri,
}

impl PairedKind {
    fn open(self) -> &'static str {
        match self {
            PairedKind::Ruby => "[[rb:",
            PairedKind::JumpUri => "[[jumpuri:",
        }
    }
}

/// A complete `[chapter:TITLE]` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterMatch<'a> {
    /// Raw title between `[chapter:` and the first `]`.
    pub title: &'a str,
    /// Bytes consumed, closing bracket included.
    pub len: usize,
}

/// A complete paired inline directive (ruby or labeled link).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairedMatch<'a> {
    pub left: &'a str,
    pub right: &'a str,
    pub len: usize,
}

/// Directives that are only recognized when they make up a whole block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDirective<'a> {
    Pixiv(&'a str),
    Jump(u32),
}

/// Line classification used by the block renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// An exactly empty line.
    Blank,
    /// A line that is nothing but an uploaded-image directive.
    Image(&'a str),
    /// Anything else.
    Text,
}

/// Match a chapter directive at the very start of `s`.
///
/// The title must be non-empty and may not contain `]` or a line break.
pub fn match_chapter(s: &str) -> Option<ChapterMatch<'_>> {
    let rest = s.strip_prefix(CHAPTER_OPEN)?;
    let end = rest.find([']', '\n'])?;
    if end == 0 || !rest[end..].starts_with(']') {
        return None;
    }
    Some(ChapterMatch {
        title: &rest[..end],
        len: CHAPTER_OPEN.len() + end + 1,
    })
}

/// Match a chapter directive that opens a line, allowing leading spaces and tabs.
///
/// Returns the indent width alongside the match.
pub fn match_line_chapter(line: &str) -> Option<(usize, ChapterMatch<'_>)> {
    let body = line.trim_start_matches([' ', '\t']);
    let indent = line.len() - body.len();
    match_chapter(body).map(|m| (indent, m))
}

/// Byte ranges of every complete chapter directive in `s`, left to right.
pub fn find_chapters(s: &str) -> Vec<std::ops::Range<usize>> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = s[pos..].find(CHAPTER_OPEN) {
        let start = pos + offset;
        match match_chapter(&s[start..]) {
            Some(m) => {
                found.push(start..start + m.len);
                pos = start + m.len;
            }
            None => pos = start + 1,
        }
    }
    found
}

/// Match a trimmed line that is exactly `[uploadedimage:TOKEN]`.
pub fn match_uploaded_image(line: &str) -> Option<&str> {
    let token = line.strip_prefix(UPLOADED_OPEN)?.strip_suffix(']')?;
    (!token.is_empty()).then_some(token)
}

/// Classify one line of a block.
pub fn classify_line(line: &str) -> LineKind<'_> {
    if line.is_empty() {
        return LineKind::Blank;
    }
    match match_uploaded_image(line.trim()) {
        Some(token) => LineKind::Image(token),
        None => LineKind::Text,
    }
}

fn digits(s: &str) -> Option<&str> {
    (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())).then_some(s)
}

/// Match a whole block against the block-only directives.
///
/// The block must be the directive and nothing else: no surrounding
/// whitespace, no second line.
pub fn match_block_directive(block: &str) -> Option<BlockDirective<'_>> {
    if let Some(id) = block
        .strip_prefix(PIXIV_OPEN)
        .and_then(|r| r.strip_suffix(']'))
        .and_then(digits)
    {
        return Some(BlockDirective::Pixiv(id));
    }
    block
        .strip_prefix(JUMP_OPEN)
        .and_then(|r| r.strip_suffix(']'))
        .and_then(digits)
        .and_then(|n| n.parse().ok())
        .map(BlockDirective::Jump)
}

/// Match an inline `[jump:N]` at the start of `s`, returning the raw digits
/// and the bytes consumed.
pub fn match_inline_jump(s: &str) -> Option<(&str, usize)> {
    let rest = s.strip_prefix(JUMP_OPEN)?;
    let end = rest.find(|c: char| !c.is_ascii_digit())?;
    if end == 0 || !rest[end..].starts_with(']') {
        return None;
    }
    Some((&rest[..end], JUMP_OPEN.len() + end + 1))
}

/// Match a paired directive at the start of `s`.
///
/// The separator between the two arguments is accepted both literally (`>`)
/// and HTML-escaped (`&gt;`), because inline directives are matched after
/// the surrounding text has been escaped. Whitespace around the separator is
/// dropped. The left argument ends at the first separator, the right one at
/// the first `]]`. A match never crosses a line break.
pub fn match_paired(s: &str, kind: PairedKind) -> Option<PairedMatch<'_>> {
    let open = kind.open();
    let body = s.strip_prefix(open)?;
    let line = body.split('\n').next().unwrap_or(body);

    let (sep_at, sep_len) = find_separator(line)?;
    let left = line[..sep_at].trim_end();

    let after = &line[sep_at + sep_len..];
    let right_start = after.len() - after.trim_start().len();
    let right_body = &after[right_start..];
    let close = right_body.find("]]")?;

    let consumed = sep_at + sep_len + right_start + close + 2;
    Some(PairedMatch {
        left,
        right: &right_body[..close],
        len: open.len() + consumed,
    })
}

fn find_separator(s: &str) -> Option<(usize, usize)> {
    s.char_indices().find_map(|(i, c)| match c {
        '>' => Some((i, 1)),
        '&' if s[i..].starts_with("&gt;") => Some((i, 4)),
        _ => None,
    })
}
