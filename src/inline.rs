//! Inline directive substitution.
//!
//! Runs over text that has **already been HTML-escaped**. Three passes, in
//! this order:
//!
//! 1. `[[rb:BASE>READING]]` → `<ruby>BASE<rt>READING</rt></ruby>`
//! 2. `[[jumpuri:LABEL>URL]]` → `<a href="URL" target="_blank" …>LABEL</a>`
//! 3. `[jump:N]` → `<a class="jump" href="#N">…</a>`
//!
//! Because escaping happens first, the `>` separator of the paired
//! directives usually arrives as `&gt;`. Both forms are matched; see
//! [`directive::match_paired`](crate::directive::match_paired).
//!
//! Arguments are spliced in as-is. They came out of the escaper, so they
//! cannot introduce markup or break out of the `href` attribute.

use crate::config::Labels;
use crate::directive::{self, PairedKind};
use crate::escape::escape_html;

/// Apply all inline substitutions to escaped text.
pub fn render_inline(escaped: &str, labels: &Labels) -> String {
    let text = substitute_paired(escaped, PairedKind::Ruby, |base, reading| {
        format!("<ruby>{base}<rt>{reading}</rt></ruby>")
    });
    let text = substitute_paired(&text, PairedKind::JumpUri, |label, url| {
        format!(r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
    });
    substitute_jumps(&text, labels)
}

/// Markup of a link to a page anchor, shared by inline and block jumps.
///
/// `page` must be ASCII digits; the label template comes from config and is
/// escaped.
pub fn jump_link(page: &str, labels: &Labels) -> String {
    format!(
        r##"<a class="jump" href="#{page}">{}</a>"##,
        escape_html(&labels.page_jump(page))
    )
}

fn substitute_paired(text: &str, kind: PairedKind, render: impl Fn(&str, &str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[[") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match directive::match_paired(candidate, kind) {
            Some(m) => {
                out.push_str(&render(m.left, m.right));
                rest = &candidate[m.len..];
            }
            None => {
                out.push('[');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn substitute_jumps(text: &str, labels: &Labels) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[jump:") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match directive::match_inline_jump(candidate) {
            Some((page, len)) => {
                out.push_str(&jump_link(page, labels));
                rest = &candidate[len..];
            }
            None => {
                out.push('[');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(text: &str) -> String {
        render_inline(&escape_html(text), &Labels::default())
    }

    #[test]
    fn ruby_literal_separator() {
        // The escaper turns `>` into `&gt;`, so this exercises the escaped form.
        assert_eq!(
            render("See [[rb:漢字>かんじ]] here."),
            "See <ruby>漢字<rt>かんじ</rt></ruby> here."
        );
    }

    #[test]
    fn ruby_unescaped_separator() {
        // Direct callers may pass text whose separator was never escaped.
        assert_eq!(
            render_inline("[[rb:漢字>かんじ]]", &Labels::default()),
            "<ruby>漢字<rt>かんじ</rt></ruby>"
        );
    }

    #[test]
    fn ruby_escaped_separator_in_source() {
        // An author who typed `&gt;` gets `&amp;gt;` after escaping: not a separator.
        assert_eq!(render("[[rb:a&gt;b]]"), "[[rb:a&amp;gt;b]]");
        // But text that arrives already escaped is accepted.
        assert_eq!(
            render_inline("[[rb:a &gt; b]]", &Labels::default()),
            "<ruby>a<rt>b</rt></ruby>"
        );
    }

    #[test]
    fn jumpuri_renders_anchor() {
        assert_eq!(
            render("Visit [[jumpuri:my site > https://example.com/?a=1&b=2]] now"),
            r#"Visit <a href="https://example.com/?a=1&amp;b=2" target="_blank" rel="noopener noreferrer">my site</a> now"#
        );
    }

    #[test]
    fn jumpuri_cannot_break_out_of_href() {
        let html = render(r#"[[jumpuri:x>"onmouseover="alert(1)]]"#);
        assert!(html.contains(r#"href="&quot;onmouseover=&quot;alert(1)""#));
    }

    #[test]
    fn inline_jumps_anywhere() {
        assert_eq!(
            render("go [jump:2] or [jump:10]."),
            r##"go <a class="jump" href="#2">2ページへ</a> or <a class="jump" href="#10">10ページへ</a>."##
        );
    }

    #[test]
    fn inline_jump_keeps_raw_digits() {
        assert_eq!(
            render("[jump:007]"),
            r##"<a class="jump" href="#007">007ページへ</a>"##
        );
    }

    #[test]
    fn malformed_directives_stay_verbatim() {
        assert_eq!(render("[[rb:no separator]]"), "[[rb:no separator]]");
        assert_eq!(render("[[jumpuri:x>y"), "[[jumpuri:x&gt;y");
        assert_eq!(render("[jump:x]"), "[jump:x]");
        assert_eq!(render("[[[rb:a>b]]"), "[<ruby>a<rt>b</rt></ruby>");
    }

    #[test]
    fn mixed_directives() {
        assert_eq!(
            render("[[rb:本>ほん]] [[jumpuri:L>u]] [jump:1]"),
            r##"<ruby>本<rt>ほん</rt></ruby> <a href="u" target="_blank" rel="noopener noreferrer">L</a> <a class="jump" href="#1">1ページへ</a>"##
        );
    }

    #[test]
    fn custom_jump_label() {
        let labels = Labels {
            page_jump: "to page {page}".to_string(),
            ..Labels::default()
        };
        assert_eq!(
            render_inline("[jump:4]", &labels),
            r##"<a class="jump" href="#4">to page 4</a>"##
        );
    }
}
