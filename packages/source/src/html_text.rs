//! Renders report HTML to plain text, one line per block element.
//!
//! The parser works on lines: section headings and entries must each start
//! on their own line, the way a browser's `innerText` lays them out. Block
//! elements and `<br>` become line breaks, runs of whitespace (including
//! non-breaking spaces) become a single space, and scripts and styles are
//! dropped.

use scraper::{ElementRef, Html, Node, Selector};

/// Selector for the report body on politi.dk pages.
pub const REPORT_BODY_SELECTOR: &str = ".rich-text";

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

const SKIPPED_ELEMENTS: &[&str] = &["head", "noscript", "script", "style", "template"];

/// Renders the first element matching `selector`, falling back to `body`.
///
/// Returns `None` if neither exists or the selector is invalid.
#[must_use]
pub fn render_selected(html: &str, selector: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selected = Selector::parse(selector).ok()?;
    let body = Selector::parse("body").ok()?;

    let root = document
        .select(&selected)
        .next()
        .or_else(|| document.select(&body).next())?;

    Some(render_element(root))
}

/// Renders a report page's body text.
#[must_use]
pub fn render_report(html: &str) -> Option<String> {
    render_selected(html, REPORT_BODY_SELECTOR)
}

/// Renders one element and its descendants to text.
#[must_use]
pub fn render_element(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    walk(element, &mut out);

    let mut text = String::with_capacity(out.len());
    let mut blank_run = false;
    for line in out.lines().map(str::trim) {
        if line.is_empty() {
            blank_run = !text.is_empty();
            continue;
        }
        if blank_run {
            text.push('\n');
            blank_run = false;
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(line);
    }
    text
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }
            if name == "br" {
                out.push('\n');
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                line_break(out);
            }
            walk(child_element, out);
            if block {
                line_break(out);
            }
        } else if let Node::Text(text) = child.value() {
            push_collapsed(out, text);
        }
    }
}

/// Ends the current line unless it is already ended.
fn line_break(out: &mut String) {
    if !out.ends_with('\n') {
        out.push('\n');
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.ends_with([' ', '\n']) && !out.is_empty() {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}
