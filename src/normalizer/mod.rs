//! HTML to markdown conversion for isolated page content.
//!
//! Walks the parsed fragment tree directly rather than round-tripping through
//! serialized HTML, emitting ATX headings, dash bullets, inline links and
//! emphasis. Output is then cleaned up by [`postprocess`].

mod postprocess;

pub use postprocess::{postprocess_markdown, MAX_MARKDOWN_CHARS};

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Convert an HTML fragment to normalized markdown.
///
/// Empty input yields an empty string without parsing.
#[must_use]
pub fn html_to_markdown(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for child in fragment.tree.root().children() {
        walk_node(child, &mut out, 0);
    }
    postprocess_markdown(&out)
}

fn walk_node(node: NodeRef<'_, Node>, out: &mut String, list_depth: usize) {
    match node.value() {
        Node::Text(text) => {
            push_collapsed(text, out);
        }
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                walk_element(element, out, list_depth);
            }
        }
        _ => {}
    }
}

fn walk_element(element: ElementRef<'_>, out: &mut String, list_depth: usize) {
    let name = element.value().name();
    match name {
        "script" | "style" => {}
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(2);
            emit_heading(out, level, &subtree_text(element));
        }
        "div" => {
            // Sites frequently style headings as classed divs; promote the
            // recognizable ones instead of flattening them into body text.
            if let Some(level) = heading_level_from_class(element) {
                emit_heading(out, level, &subtree_text(element));
            } else {
                walk_children(element, out, list_depth);
            }
        }
        "p" => {
            ensure_block_break(out);
            walk_children(element, out, list_depth);
            out.push_str("\n\n");
        }
        "ul" | "ol" => {
            ensure_block_break(out);
            walk_children(element, out, list_depth + 1);
            out.push('\n');
        }
        "li" => {
            if !out.ends_with('\n') && !out.is_empty() {
                out.push('\n');
            }
            let indent = list_depth.saturating_sub(1) * 2;
            out.push_str(&" ".repeat(indent));
            out.push_str("- ");
            walk_children(element, out, list_depth);
            out.push('\n');
        }
        "a" => {
            let text = subtree_text(element);
            let href = element.value().attr("href").unwrap_or_default();
            if text.is_empty() {
                return;
            }
            if href.is_empty() {
                pad_inline(out);
                out.push_str(&text);
            } else {
                pad_inline(out);
                out.push_str(&format!("[{text}]({href})"));
            }
        }
        "strong" | "b" => {
            let text = subtree_text(element);
            if !text.is_empty() {
                pad_inline(out);
                out.push_str(&format!("**{text}**"));
            }
        }
        "em" | "i" => {
            let text = subtree_text(element);
            if !text.is_empty() {
                pad_inline(out);
                out.push_str(&format!("*{text}*"));
            }
        }
        "blockquote" => {
            let mut inner = String::new();
            walk_children(element, &mut inner, list_depth);
            ensure_block_break(out);
            for line in inner.trim().lines() {
                out.push_str("> ");
                out.push_str(line.trim());
                out.push('\n');
            }
            out.push('\n');
        }
        "br" => {
            out.push(' ');
        }
        _ => {
            // Skip structural wrappers with nothing worth rendering; unwrap
            // the rest.
            if subtree_text(element).is_empty() && !has_image_descendant(element) {
                return;
            }
            walk_children(element, out, list_depth);
        }
    }
}

fn walk_children(element: ElementRef<'_>, out: &mut String, list_depth: usize) {
    for child in element.children() {
        walk_node(child, out, list_depth);
    }
}

fn emit_heading(out: &mut String, level: usize, text: &str) {
    if text.is_empty() {
        return;
    }
    ensure_block_break(out);
    out.push_str(&"#".repeat(level.clamp(1, 6)));
    out.push(' ');
    out.push_str(text);
    out.push_str("\n\n");
}

/// Map a classed div to a heading level when its class names look like a
/// styled heading. `title`/`heading`/`header` classes qualify; `main` or
/// `primary` promote to h1, `sub` or `secondary` demote to h3, the rest
/// land on h2.
fn heading_level_from_class(element: ElementRef<'_>) -> Option<usize> {
    let class = element.value().attr("class")?.to_ascii_lowercase();
    let looks_like_heading = ["title", "heading", "header"]
        .iter()
        .any(|kw| class.contains(kw));
    if !looks_like_heading {
        return None;
    }
    if class.contains("main") || class.contains("primary") {
        Some(1)
    } else if class.contains("sub") || class.contains("secondary") {
        Some(3)
    } else {
        Some(2)
    }
}

fn subtree_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_image_descendant(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "img")
}

/// Append text with runs of whitespace collapsed to single spaces,
/// preserving a single leading/trailing space as an inline separator.
fn push_collapsed(text: &str, out: &mut String) {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return;
    }
    if text.starts_with(char::is_whitespace) {
        pad_inline(out);
    }
    out.push_str(&collapsed);
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

/// Guarantee a paragraph break before a block element.
fn ensure_block_break(out: &mut String) {
    if out.is_empty() {
        return;
    }
    while out.ends_with(' ') {
        out.pop();
    }
    if out.ends_with("\n\n") {
        return;
    }
    if out.ends_with('\n') {
        out.push('\n');
    } else {
        out.push_str("\n\n");
    }
}

/// Single space before inline content when the output doesn't already end
/// with whitespace or an opening bracket boundary.
fn pad_inline(out: &mut String) {
    if out.is_empty() {
        return;
    }
    if !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}
