//! Document segmentation: normalize, split into pages, split into blocks.
//!
//! ```text
//! raw text
//!   → normalize line endings           (\r\n, \r → \n)
//!   → isolate chapter directives       (force them onto their own paragraph)
//!   → split on [newpage]               (one page per segment, trimmed)
//!   → split each page at chapter lines (one block per chapter)
//! ```
//!
//! Chapter isolation exists because block splitting is anchored to chapter
//! directives that open a line. Authors rarely surround a heading with blank
//! lines, so the preprocessor does it for them:
//!
//! ```text
//! Intro text              Intro text
//! [chapter:One]Body   →
//!                         [chapter:One]
//!
//!                         Body
//! ```

use crate::directive::{self, NEWPAGE};

/// Source of one page after segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    /// 1-based page number.
    pub index: usize,
    /// Trimmed page text.
    pub text: String,
    /// Blocks in order. Empty for a blank page.
    pub blocks: Vec<String>,
}

/// Segment a raw document into pages and blocks.
///
/// Always yields at least one page; the page count is the number of
/// `[newpage]` tokens plus one.
pub fn segment(raw: &str) -> Vec<PageSource> {
    let text = preprocess(raw);
    split_pages(&text)
        .into_iter()
        .enumerate()
        .map(|(i, page)| PageSource {
            index: i + 1,
            text: page.to_string(),
            blocks: split_blocks(page).into_iter().map(str::to_string).collect(),
        })
        .collect()
}

/// Normalize line endings and isolate chapter directives.
pub fn preprocess(raw: &str) -> String {
    isolate_chapters(&normalize_line_endings(raw))
}

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Put every complete chapter directive on its own paragraph.
///
/// - A directive opening a line whose previous line is not blank gets a
///   blank line inserted before it.
/// - Non-whitespace right after the closing `]` is moved two lines down.
/// - A single newline after `]` followed by content becomes a blank line.
pub fn isolate_chapters(text: &str) -> String {
    let ranges = directive::find_chapters(text);
    if ranges.is_empty() {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + ranges.len() * 3);
    let mut pos = 0;

    for range in ranges {
        let line_start = text[..range.start].rfind('\n').map_or(0, |i| i + 1);
        let opens_line = text[line_start..range.start]
            .bytes()
            .all(|b| b == b' ' || b == b'\t');
        let after_content_line =
            line_start >= 1 && (line_start < 2 || bytes[line_start - 2] != b'\n');
        if opens_line && after_content_line && line_start >= pos {
            out.push_str(&text[pos..line_start]);
            out.push('\n');
            pos = line_start;
        }

        out.push_str(&text[pos..range.end]);
        pos = range.end;

        let mut following = text[range.end..].chars();
        match (following.next(), following.next()) {
            (Some(c), _) if !c.is_whitespace() => out.push_str("\n\n"),
            (Some('\n'), Some(c)) if !c.is_whitespace() => {
                out.push_str("\n\n");
                pos += 1;
            }
            _ => {}
        }
    }

    out.push_str(&text[pos..]);
    out
}

/// Split on `[newpage]`, trimming each segment. Empty segments are kept.
pub fn split_pages(text: &str) -> Vec<&str> {
    text.split(NEWPAGE).map(str::trim).collect()
}

/// Split a page into blocks at lines that open with a chapter directive.
///
/// The directive line starts the block that follows it. Empty pieces are
/// discarded, so an empty page has no blocks.
pub fn split_blocks(page: &str) -> Vec<&str> {
    let mut boundaries = vec![0];
    for (newline, _) in page.match_indices('\n') {
        let start = newline + 1;
        if directive::match_line_chapter(&page[start..]).is_some() {
            boundaries.push(start);
        }
    }
    boundaries.push(page.len());

    boundaries
        .windows(2)
        .map(|w| &page[w[0]..w[1]])
        .filter(|b| !b.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_all_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn chapter_after_text_line_gets_blank_line() {
        assert_eq!(
            isolate_chapters("intro\n[chapter:One]\n\nbody"),
            "intro\n\n[chapter:One]\n\nbody"
        );
    }

    #[test]
    fn chapter_after_blank_line_is_untouched() {
        let text = "intro\n\n[chapter:One]\n\nbody";
        assert_eq!(isolate_chapters(text), text);
    }

    #[test]
    fn indented_chapter_gets_blank_line_before_indent() {
        assert_eq!(
            isolate_chapters("intro\n  [chapter:One]"),
            "intro\n\n  [chapter:One]"
        );
    }

    #[test]
    fn content_on_same_line_is_pushed_down() {
        assert_eq!(
            isolate_chapters("[chapter:One]Body"),
            "[chapter:One]\n\nBody"
        );
    }

    #[test]
    fn content_on_next_line_gets_blank_line() {
        assert_eq!(
            isolate_chapters("[chapter:One]\nBody"),
            "[chapter:One]\n\nBody"
        );
    }

    #[test]
    fn space_after_chapter_is_left_alone() {
        assert_eq!(
            isolate_chapters("[chapter:One] Body"),
            "[chapter:One] Body"
        );
    }

    #[test]
    fn mid_line_chapter_only_pushes_following_content() {
        assert_eq!(
            isolate_chapters("text [chapter:X]more"),
            "text [chapter:X]\n\nmore"
        );
    }

    #[test]
    fn adjacent_chapters() {
        assert_eq!(
            isolate_chapters("[chapter:A][chapter:B]"),
            "[chapter:A]\n\n[chapter:B]"
        );
    }

    #[test]
    fn malformed_chapter_is_untouched() {
        let text = "line\n[chapter:open\nnext";
        assert_eq!(isolate_chapters(text), text);
    }

    #[test]
    fn split_pages_keeps_empty_segments() {
        assert_eq!(split_pages("a[newpage][newpage] b "), vec!["a", "", "b"]);
        assert_eq!(split_pages(""), vec![""]);
    }

    #[test]
    fn split_blocks_at_chapter_lines() {
        let page = "intro\n\n[chapter:One]\n\nbody\n\n[chapter:Two]\n\nmore";
        assert_eq!(
            split_blocks(page),
            vec![
                "intro\n\n",
                "[chapter:One]\n\nbody\n\n",
                "[chapter:Two]\n\nmore"
            ]
        );
    }

    #[test]
    fn split_blocks_leading_chapter() {
        assert_eq!(
            split_blocks("[chapter:One]\n\nbody"),
            vec!["[chapter:One]\n\nbody"]
        );
    }

    #[test]
    fn split_blocks_ignores_mid_line_and_malformed_chapters() {
        let page = "a [chapter:X]\n[chapter:broken\nb";
        assert_eq!(split_blocks(page), vec![page]);
    }

    #[test]
    fn split_blocks_empty_page() {
        assert!(split_blocks("").is_empty());
    }

    #[test]
    fn segment_counts_pages() {
        let pages = segment("one[newpage]two\r\n[newpage]");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].index, 1);
        assert_eq!(pages[1].text, "two");
        assert_eq!(pages[2].text, "");
        assert!(pages[2].blocks.is_empty());
    }

    #[test]
    fn segment_scenario_chapter_then_newpage() {
        let pages = segment("[chapter:Prologue]\nIt was raining.\n[newpage]\nChapter two.");
        assert_eq!(pages.len(), 2);
        assert_eq!(
            pages[0].blocks,
            vec!["[chapter:Prologue]\n\nIt was raining.".to_string()]
        );
        assert_eq!(pages[1].blocks, vec!["Chapter two.".to_string()]);
    }
}
