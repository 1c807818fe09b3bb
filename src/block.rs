//! Block classification and rendering.
//!
//! A block is classified into a flat list of [`BlockItem`]s, then each item
//! is rendered to HTML. Classification is a small state machine:
//!
//! 1. **Chapter check.** A block that opens with `[chapter:TITLE]` yields a
//!    [`BlockItem::Heading`]; the rest of the block (leading whitespace
//!    stripped) is classified as an ordinary body. An empty body yields a
//!    single [`BlockItem::BlankLine`].
//! 2. **Whole-body directives.** A body that is exactly `[pixivimage:ID]` or
//!    `[jump:N]` becomes [`BlockItem::PixivEmbed`] or
//!    [`BlockItem::JumpBlock`]. Anywhere else those directives are text (and
//!    `[jump:N]` is then rendered inline).
//! 3. **Line-mixed content.** Lines are buffered as paragraph text until an
//!    image line or an empty line flushes the buffer. Images and blank-line
//!    markers are emitted in line order, so prose and images interleave
//!    freely and every blank line survives as its own marker.

use crate::config::Labels;
use crate::directive::{self, BlockDirective, LineKind};
use crate::escape::escape_html;
use crate::inline::{jump_link, render_inline};
use crate::types::ImageRef;
use crate::upload::{ImageResolver, UploadStore};
use maud::{Markup, PreEscaped, html};

/// Base URL of external artwork pages.
const PIXIV_ARTWORK_URL: &str = "https://www.pixiv.net/artworks/";

/// One unit of block output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockItem {
    /// Chapter heading with its raw (unescaped) title.
    Heading(String),
    /// Uploaded image, resolved or missing.
    Image(ImageRef),
    /// An author's blank line.
    BlankLine,
    /// Paragraph source: consecutive text lines joined with `\n`, unescaped.
    Text(String),
    /// Artwork embed occupying the whole block.
    PixivEmbed(String),
    /// Page jump occupying the whole block.
    JumpBlock(u32),
}

/// Classify a block into items, resolving image tokens on the way.
pub fn classify_block<S>(block: &str, resolver: &ImageResolver<'_, S>) -> Vec<BlockItem>
where
    S: UploadStore + ?Sized,
{
    let block = block.trim_end_matches('\n');
    let mut items = Vec::new();

    let body = match split_heading(block) {
        Some((title, rest)) => {
            items.push(BlockItem::Heading(title.to_string()));
            if rest.is_empty() {
                items.push(BlockItem::BlankLine);
                return items;
            }
            rest
        }
        None => block,
    };

    if let Some(directive) = directive::match_block_directive(body) {
        items.push(match directive {
            BlockDirective::Pixiv(id) => BlockItem::PixivEmbed(id.to_string()),
            BlockDirective::Jump(page) => BlockItem::JumpBlock(page),
        });
        return items;
    }

    let mut pending: Vec<&str> = Vec::new();
    for line in body.split('\n') {
        match directive::classify_line(line) {
            LineKind::Image(token) => {
                flush(&mut pending, &mut items);
                items.push(BlockItem::Image(resolver.resolve(token)));
            }
            LineKind::Blank => {
                flush(&mut pending, &mut items);
                items.push(BlockItem::BlankLine);
            }
            LineKind::Text => pending.push(line),
        }
    }
    flush(&mut pending, &mut items);
    items
}

/// Split a leading chapter directive off a block.
///
/// Returns the raw title and the remainder with all leading whitespace,
/// newlines included, removed.
fn split_heading(block: &str) -> Option<(&str, &str)> {
    let (indent, chapter) = directive::match_line_chapter(block)?;
    let rest = block[indent + chapter.len..].trim_start();
    Some((chapter.title, rest))
}

fn flush(pending: &mut Vec<&str>, items: &mut Vec<BlockItem>) {
    if !pending.is_empty() {
        items.push(BlockItem::Text(pending.join("\n")));
        pending.clear();
    }
}

/// Render classified items. Items are concatenated without separators.
pub fn render_items(items: &[BlockItem], labels: &Labels) -> String {
    let markup = html! {
        @for item in items {
            (render_item(item, labels))
        }
    };
    markup.into_string()
}

fn render_item(item: &BlockItem, labels: &Labels) -> Markup {
    match item {
        BlockItem::Heading(title) => html! {
            h2.chapter { (PreEscaped(escape_html(title))) }
        },
        BlockItem::Image(image) if image.found => html! {
            figure.illustration {
                img src=(image.url) alt=(image.alt);
            }
        },
        BlockItem::Image(image) => html! {
            figure.illustration.missing {
                div.img-missing { (labels.missing_image) ": " (image.alt) }
            }
        },
        BlockItem::BlankLine => html! {
            div.blankline aria-hidden="true" {}
        },
        BlockItem::Text(text) => html! {
            p { (PreEscaped(paragraph_html(text, labels))) }
        },
        BlockItem::PixivEmbed(id) => html! {
            figure.pixiv-illustration {
                a href={ (PIXIV_ARTWORK_URL) (id) } target="_blank" rel="noopener noreferrer" {
                    (labels.pixiv_link(id))
                }
                figcaption { (labels.pixiv_caption(id)) }
            }
        },
        BlockItem::JumpBlock(page) => PreEscaped(jump_link(&page.to_string(), labels)),
    }
}

/// Escape paragraph text and substitute inline directives line by line, then
/// join the lines with `<br>`.
///
/// Substitution runs before the join so a directive can never pair up with
/// the `>` of an inserted `<br>`.
pub fn paragraph_html(text: &str, labels: &Labels) -> String {
    text.split('\n')
        .map(|line| render_inline(&escape_html(line), labels))
        .collect::<Vec<_>>()
        .join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadsConfig;
    use crate::test_helpers::MemoryUploadStore;
    use pretty_assertions::assert_eq;

    fn classify(block: &str, store: &MemoryUploadStore) -> Vec<BlockItem> {
        let config = UploadsConfig::default();
        classify_block(block, &ImageResolver::new(store, &config))
    }

    fn render(block: &str, store: &MemoryUploadStore) -> String {
        render_items(&classify(block, store), &Labels::default())
    }

    fn text(s: &str) -> BlockItem {
        BlockItem::Text(s.to_string())
    }

    #[test]
    fn plain_paragraph() {
        let store = MemoryUploadStore::new();
        assert_eq!(classify("Hello\nWorld", &store), vec![text("Hello\nWorld")]);
        assert_eq!(render("Hello\nWorld", &store), "<p>Hello<br>World</p>");
    }

    #[test]
    fn trailing_newlines_are_trimmed() {
        let store = MemoryUploadStore::new();
        assert_eq!(classify("Hello\n\n\n", &store), vec![text("Hello")]);
    }

    #[test]
    fn each_blank_line_gets_a_marker() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            classify("a\n\n\nb", &store),
            vec![text("a"), BlockItem::BlankLine, BlockItem::BlankLine, text("b")]
        );
    }

    #[test]
    fn whitespace_only_line_is_text() {
        let store = MemoryUploadStore::new();
        assert_eq!(classify("a\n  \nb", &store), vec![text("a\n  \nb")]);
    }

    #[test]
    fn missing_image_between_paragraphs() {
        let store = MemoryUploadStore::new();
        let items = classify("Hello\n\n[uploadedimage:12345]\nWorld", &store);
        assert_eq!(
            items,
            vec![
                text("Hello"),
                BlockItem::BlankLine,
                BlockItem::Image(ImageRef {
                    url: "/image/12345".to_string(),
                    alt: "12345".to_string(),
                    found: false,
                }),
                text("World"),
            ]
        );
        assert_eq!(
            render_items(&items, &Labels::default()),
            concat!(
                "<p>Hello</p>",
                r#"<div class="blankline" aria-hidden="true"></div>"#,
                r#"<figure class="illustration missing"><div class="img-missing">画像が見つかりません: 12345</div></figure>"#,
                "<p>World</p>"
            )
        );
    }

    #[test]
    fn found_image_renders_img() {
        let store = MemoryUploadStore::new().with_asset("123456", "cover.png");
        assert_eq!(
            render("  [uploadedimage:123456]  ", &store),
            r#"<figure class="illustration"><img src="/uploads/cover.png" alt="123456"></figure>"#
        );
    }

    #[test]
    fn image_alt_is_escaped() {
        let store = MemoryUploadStore::new();
        let html = render(r#"[uploadedimage:a"b<c>.png]"#, &store);
        assert!(html.contains(r#"alt="a&quot;b&lt;c&gt;.png""#));
    }

    #[test]
    fn chapter_with_body() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            classify("[chapter:Prologue]\n\nIt was raining.", &store),
            vec![
                BlockItem::Heading("Prologue".to_string()),
                text("It was raining.")
            ]
        );
        assert_eq!(
            render("[chapter:Prologue]\n\nIt was raining.", &store),
            r#"<h2 class="chapter">Prologue</h2><p>It was raining.</p>"#
        );
    }

    #[test]
    fn chapter_alone_emits_blank_marker() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            classify("[chapter:End]\n\n", &store),
            vec![BlockItem::Heading("End".to_string()), BlockItem::BlankLine]
        );
    }

    #[test]
    fn chapter_title_is_escaped() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            render("[chapter:<b>&'s]", &store),
            concat!(
                r#"<h2 class="chapter">&lt;b&gt;&amp;&#x27;s</h2>"#,
                r#"<div class="blankline" aria-hidden="true"></div>"#
            )
        );
    }

    #[test]
    fn chapter_body_continues_line_level() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            classify("[chapter:One] first\nsecond\n\n[uploadedimage:pic.png]", &store),
            vec![
                BlockItem::Heading("One".to_string()),
                text("first\nsecond"),
                BlockItem::BlankLine,
                BlockItem::Image(ImageRef {
                    url: "/uploads/pic.png".to_string(),
                    alt: "pic.png".to_string(),
                    found: true,
                }),
            ]
        );
    }

    #[test]
    fn indented_chapter_is_recognized() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            classify("  [chapter:One]\n\nbody", &store)[0],
            BlockItem::Heading("One".to_string())
        );
    }

    #[test]
    fn malformed_chapter_is_text() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            render("[chapter:never closed", &store),
            "<p>[chapter:never closed</p>"
        );
    }

    #[test]
    fn pixiv_whole_block() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            classify("[pixivimage:998877]", &store),
            vec![BlockItem::PixivEmbed("998877".to_string())]
        );
        assert_eq!(
            render("[pixivimage:998877]", &store),
            concat!(
                r#"<figure class="pixiv-illustration">"#,
                r#"<a href="https://www.pixiv.net/artworks/998877" target="_blank" rel="noopener noreferrer">pixiv作品 998877 を開く</a>"#,
                r#"<figcaption>pixiv作品ID: 998877</figcaption>"#,
                "</figure>"
            )
        );
    }

    #[test]
    fn pixiv_inside_prose_is_text() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            render("see [pixivimage:1]\nhere", &store),
            "<p>see [pixivimage:1]<br>here</p>"
        );
    }

    #[test]
    fn jump_whole_block() {
        let store = MemoryUploadStore::new();
        assert_eq!(classify("[jump:3]", &store), vec![BlockItem::JumpBlock(3)]);
        assert_eq!(
            render("[jump:3]", &store),
            r##"<a class="jump" href="#3">3ページへ</a>"##
        );
    }

    #[test]
    fn jump_in_sentence_is_inline() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            render("Go to [jump:3] now.", &store),
            r##"<p>Go to <a class="jump" href="#3">3ページへ</a> now.</p>"##
        );
    }

    #[test]
    fn jump_after_chapter_is_block_level() {
        let store = MemoryUploadStore::new();
        assert_eq!(
            classify("[chapter:Index]\n\n[jump:2]", &store),
            vec![BlockItem::Heading("Index".to_string()), BlockItem::JumpBlock(2)]
        );
    }

    #[test]
    fn empty_block_is_one_blank_line() {
        let store = MemoryUploadStore::new();
        assert_eq!(classify("", &store), vec![BlockItem::BlankLine]);
    }

    #[test]
    fn paragraph_text_is_escaped_before_inline() {
        assert_eq!(
            paragraph_html("<i>a</i> & [[rb:b>c]]", &Labels::default()),
            "&lt;i&gt;a&lt;/i&gt; &amp; <ruby>b<rt>c</rt></ruby>"
        );
    }

    #[test]
    fn inline_directives_stop_at_line_breaks() {
        let labels = Labels::default();
        assert_eq!(
            paragraph_html("[[rb:oops]] x\n[[rb:本>ほん]]", &labels),
            "[[rb:oops]] x<br><ruby>本<rt>ほん</rt></ruby>"
        );
        assert_eq!(
            paragraph_html("[[jumpuri:label\nmore]] tail", &labels),
            "[[jumpuri:label<br>more]] tail"
        );
        assert_eq!(
            paragraph_html("[[rb:漢\n字>かんじ]]", &labels),
            "[[rb:漢<br>字&gt;かんじ]]"
        );
    }

    #[test]
    fn multiline_paragraph_never_splits_br() {
        let store = MemoryUploadStore::new();
        let html = render("[[rb:a\nb>c]] and [[jumpuri:x\ny>z]]\n[[rb:d>e]]", &store);
        assert!(!html.contains("<br<"), "{html}");
        assert!(html.ends_with("<br><ruby>d<rt>e</rt></ruby></p>"), "{html}");
    }

    #[test]
    fn empty_or_multiline_chapter_title_is_text() {
        let store = MemoryUploadStore::new();
        assert_eq!(classify("[chapter:]\nbody", &store), vec![text("[chapter:]\nbody")]);
        assert_eq!(
            render("[chapter:]\nbody", &store),
            "<p>[chapter:]<br>body</p>"
        );
        assert_eq!(
            classify("[chapter:two\nlines]", &store),
            vec![text("[chapter:two\nlines]")]
        );
    }
}
