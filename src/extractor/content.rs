//! Main-content isolation for markdown conversion.
//!
//! Strips navigation chrome and noise elements, then picks the most
//! content-dense container: a readability-style candidate scan first, falling
//! back through `<main>`, `<article>`, content-class containers, and finally
//! the whole document.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Tags removed outright before any container selection.
const STRIP_TAGS: &[&str] = &["nav", "header", "footer", "aside", "script", "style"];

/// Class substrings that mark non-content noise.
const NOISE_CLASS_KEYWORDS: &[&str] = &[
    "nav", "menu", "footer", "sidebar", "widget", "ad", "advertisement", "banner", "popup",
    "modal", "cookie", "consent",
];

/// Minimum paragraph text length for a readability candidate to win.
const MIN_CANDIDATE_TEXT: usize = 250;

// Hardcoded selectors never fail to parse; a failure here is a bug.
static MAIN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main").expect("BUG: invalid selector 'main'"));
static ARTICLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article").expect("BUG: invalid selector 'article'"));
static CANDIDATE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("main, article, section, div").expect("BUG: invalid candidate selector")
});
static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("BUG: invalid selector 'p'"));
static CONTENT_CLASS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[class*='content'], [class*='main']")
        .expect("BUG: invalid content-class selector")
});
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("BUG: invalid selector 'body'"));

/// Isolate the main content of `html`, returning a cleaned HTML string with
/// navigation, chrome, and noise-class elements removed.
#[must_use]
pub fn isolate_main_content(html: &str) -> String {
    let document = Html::parse_document(html);
    let to_remove = collect_noise_nodes(&document);

    // Readability-style pass: the candidate container with the most paragraph
    // text wins, provided it clears a minimum density.
    if let Some(best) = best_candidate(&document, &to_remove) {
        return serialize_excluding(&best, &to_remove);
    }

    for selector in [&*MAIN_SELECTOR, &*ARTICLE_SELECTOR, &*CONTENT_CLASS_SELECTOR] {
        if let Some(element) = document
            .select(selector)
            .find(|el| !to_remove.contains(&el.id()))
        {
            return serialize_excluding(&element, &to_remove);
        }
    }

    if let Some(body) = document.select(&BODY_SELECTOR).next() {
        return serialize_excluding(&body, &to_remove);
    }

    html.to_string()
}

/// Collect node ids of stripped tags and noise-class elements.
fn collect_noise_nodes(document: &Html) -> HashSet<NodeId> {
    let mut to_remove = HashSet::new();
    for element in document.tree.nodes().filter_map(ElementRef::wrap) {
        let name = element.value().name();
        if STRIP_TAGS.contains(&name) {
            to_remove.insert(element.id());
            continue;
        }
        if let Some(class) = element.value().attr("class") {
            let class = class.to_ascii_lowercase();
            if NOISE_CLASS_KEYWORDS.iter().any(|kw| class.contains(kw)) {
                to_remove.insert(element.id());
            }
        }
    }
    to_remove
}

/// Pick the candidate container with the highest paragraph text mass.
fn best_candidate<'a>(document: &'a Html, to_remove: &HashSet<NodeId>) -> Option<ElementRef<'a>> {
    let mut best: Option<(usize, ElementRef<'a>)> = None;
    for candidate in document.select(&CANDIDATE_SELECTOR) {
        if to_remove.contains(&candidate.id()) {
            continue;
        }
        let score: usize = candidate
            .select(&PARAGRAPH_SELECTOR)
            .filter(|p| !to_remove.contains(&p.id()))
            .map(|p| p.text().map(str::trim).map(str::len).sum::<usize>())
            .sum();
        if score >= MIN_CANDIDATE_TEXT && best.as_ref().is_none_or(|(s, _)| score > *s) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, element)| element)
}

/// Serialize an element's children to HTML, skipping removed subtrees.
fn serialize_excluding(element: &ElementRef, to_remove: &HashSet<NodeId>) -> String {
    let mut out = String::new();
    serialize_children(element, to_remove, &mut out);
    out
}

fn serialize_children(element: &ElementRef, to_remove: &HashSet<NodeId>, out: &mut String) {
    use scraper::node::Node;

    const VOID_ELEMENTS: &[&str] = &[
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ];

    for child in element.children() {
        match child.value() {
            Node::Text(text) => escape_into(text, out),
            Node::Element(_) => {
                if let Some(child_elem) = ElementRef::wrap(child) {
                    if to_remove.contains(&child_elem.id()) {
                        continue;
                    }
                    let name = child_elem.value().name();
                    out.push('<');
                    out.push_str(name);
                    for (attr, value) in child_elem.value().attrs() {
                        out.push(' ');
                        out.push_str(attr);
                        out.push_str("=\"");
                        escape_into(value, out);
                        out.push('"');
                    }
                    out.push('>');
                    if VOID_ELEMENTS.contains(&name) {
                        continue;
                    }
                    serialize_children(&child_elem, to_remove, out);
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
            _ => {}
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_navigation_chrome() {
        let html = r"
            <html><body>
                <nav>Menu</nav>
                <main><p>Body text</p></main>
                <footer>Footer</footer>
            </body></html>
        ";
        let result = isolate_main_content(html);
        assert!(result.contains("Body text"));
        assert!(!result.contains("Menu"));
        assert!(!result.contains("Footer"));
    }

    #[test]
    fn strips_noise_classes() {
        let html = r#"
            <html><body><main>
                <div class="cookie-banner">Accept cookies</div>
                <p>Real content</p>
            </main></body></html>
        "#;
        let result = isolate_main_content(html);
        assert!(result.contains("Real content"));
        assert!(!result.contains("Accept cookies"));
    }

    #[test]
    fn falls_back_to_whole_document() {
        let html = "<p>Loose markup</p>";
        let result = isolate_main_content(html);
        assert!(result.contains("Loose markup"));
    }
}
