//! Regex cleanup passes over converted markdown.

use regex::Regex;
use std::sync::LazyLock;

/// Upper bound on stored markdown, ellipsis included.
pub const MAX_MARKDOWN_CHARS: usize = 50_000;

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("BUG: invalid newline regex"));
static LIST_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\s*)[-*+]\s+").expect("BUG: invalid list marker regex"));
static EMPTY_LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(\s*\)").expect("BUG: invalid empty link regex"));
static EXCESS_ASTERISKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{3,}").expect("BUG: invalid asterisk regex"));
static EXCESS_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{3,}").expect("BUG: invalid underscore regex"));

/// Normalize converted markdown: collapse blank-line runs, unify list
/// markers to `- `, strip empty links, tame emphasis runs, and cap length
/// at [`MAX_MARKDOWN_CHARS`].
#[must_use]
pub fn postprocess_markdown(markdown: &str) -> String {
    let mut text = markdown.to_string();

    // Collapsing can create new triples, so loop to a fixed point.
    loop {
        let collapsed = EXCESS_NEWLINES.replace_all(&text, "\n\n").into_owned();
        if collapsed == text {
            break;
        }
        text = collapsed;
    }

    let mut text = text.trim().to_string();
    text = LIST_MARKERS.replace_all(&text, "${1}- ").into_owned();
    text = EMPTY_LINKS.replace_all(&text, "$1").into_owned();
    text = EXCESS_ASTERISKS.replace_all(&text, "**").into_owned();
    text = EXCESS_UNDERSCORES.replace_all(&text, "__").into_owned();

    truncate_with_ellipsis(&text, MAX_MARKDOWN_CHARS)
}

/// Truncate by character count so the ellipsis-terminated result fits the
/// limit. Char-based rather than byte-based so multibyte text never splits.
fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
