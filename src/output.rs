//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is organized around document structure, not files: every page is
//! shown by its position and the chapters it opens, with counts and missing
//! images as indented context lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! novel.txt (2 pages)
//! 001 Prologue
//!     Blocks: 2
//!     Images: 2 (1 missing)
//!     Missing: 9999
//! 002 (untitled)
//!     Blocks: 1
//!
//! 1 missing image
//! ```
//!
//! ## Export
//!
//! ```text
//! a.txt → a.html (2 pages)
//! book/b.txt → book/b.html (1 page)
//!     Missing: 4444
//! broken.txt failed: IO error: permission denied
//!
//! Exported 2 documents, 3 pages
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::assemble::{ExportEvent, ExportSummary};
use crate::render::PageReport;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Page header: position plus the chapters the page opens.
///
/// ```text
/// 001 Prologue
/// 002 One, Two
/// 003 (untitled)
/// ```
fn page_header(report: &PageReport) -> String {
    if report.chapters.is_empty() {
        format!("{} (untitled)", format_index(report.index))
    } else {
        format!("{} {}", format_index(report.index), report.chapters.join(", "))
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the inventory of one document.
pub fn format_check_output(source: &str, reports: &[PageReport]) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", source, plural(reports.len(), "page", "pages"))];
    let mut missing_total = 0;

    for report in reports {
        lines.push(page_header(report));
        lines.push(format!("{}Blocks: {}", indent(1), report.blocks));
        if report.images > 0 {
            if report.missing.is_empty() {
                lines.push(format!("{}Images: {}", indent(1), report.images));
            } else {
                lines.push(format!(
                    "{}Images: {} ({} missing)",
                    indent(1),
                    report.images,
                    report.missing.len()
                ));
                lines.push(format!("{}Missing: {}", indent(1), report.missing.join(", ")));
            }
        }
        missing_total += report.missing.len();
    }

    lines.push(String::new());
    if missing_total == 0 {
        lines.push("All images resolved".to_string());
    } else {
        lines.push(plural(missing_total, "missing image", "missing images"));
    }
    lines
}

/// Print check output to stdout.
pub fn print_check_output(source: &str, reports: &[PageReport]) {
    for line in format_check_output(source, reports) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

/// Format a single directory-export progress event.
pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Exported {
            source,
            output,
            pages,
            missing_images,
        } => {
            let mut lines = vec![format!(
                "{} \u{2192} {} ({})",
                source,
                output,
                plural(*pages, "page", "pages")
            )];
            if !missing_images.is_empty() {
                lines.push(format!("{}Missing: {}", indent(1), missing_images.join(", ")));
            }
            lines
        }
        ExportEvent::Failed { source, error } => vec![format!("{} failed: {}", source, error)],
    }
}

/// Format the closing totals of a directory export.
pub fn format_export_summary(summary: &ExportSummary) -> Vec<String> {
    let mut line = format!(
        "Exported {}, {}",
        plural(summary.documents, "document", "documents"),
        plural(summary.pages, "page", "pages")
    );
    if summary.failed > 0 {
        line.push_str(&format!(", {} failed", summary.failed));
    }
    vec![String::new(), line]
}

/// Print the closing totals of a directory export.
pub fn print_export_summary(summary: &ExportSummary) {
    for line in format_export_summary(summary) {
        println!("{}", line);
    }
}

/// Format the confirmation of a single-file export.
pub fn format_export_written(output: &str, pages: usize) -> Vec<String> {
    vec![format!("Wrote {} ({})", output, plural(pages, "page", "pages"))]
}
