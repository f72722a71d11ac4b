//! Sanitization of backend-authored HTML.
//!
//! # Pipeline
//!
//! ```text
//! raw → unescape literals (x2) → decode entities (x2) → parse
//!     → sanitize tree → repair lists → serialize → trim
//! ```
//!
//! The output only contains tags from [`rules::ALLOWED_TAGS`], carries no
//! event handler or `style` attributes, and every `<a>` has
//! `rel="noopener noreferrer"`. Sanitizing an already sanitized string
//! returns it unchanged.

mod rules;
mod tree;

use std::borrow::Cow;

use html_escape::decode_html_entities;

pub use rules::{ALLOWED_TAGS, EM_MARKER_CLASS, FORBIDDEN_TAGS, UNWRAP_TAGS};
use tree::{Element, Node};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer;

impl Sanitizer {
    pub fn new() -> Self {
        Self
    }

    pub fn sanitize(&self, raw: &str) -> String {
        let decoded = decode(raw);

        let nodes = sanitize_nodes(tree::parse_fragment(&decoded));
        let nodes = repair_lists(nodes);

        tree::serialize(&nodes).trim().to_string()
    }

    /// Sanitize an optional record field in place.
    pub fn sanitize_field(&self, field: &mut Option<String>) {
        if let Some(value) = field.as_mut() {
            *value = self.sanitize(value);
        }
    }
}

/// Undo JSON-in-JSON and entity double encoding.
fn decode(raw: &str) -> String {
    let once = unescape_literals(raw);
    let twice = unescape_literals(&once);
    let entities = decode_html_entities(&twice);
    decode_html_entities(&entities).into_owned()
}

/// Turn literal `\n`, `\t` and `\uXXXX` sequences into the characters they name.
fn unescape_literals(input: &str) -> Cow<'_, str> {
    if !input.contains('\\') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().map(|&(_, next)| next) {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            Some('u') => {
                let hex = input.get(idx + 2..idx + 6);
                match hex
                    .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                    .and_then(char::from_u32)
                {
                    Some(decoded) => {
                        out.push(decoded);
                        // skip 'u' and four hex digits
                        for _ in 0..5 {
                            chars.next();
                        }
                    }
                    None => out.push(c),
                }
            }
            _ => out.push(c),
        }
    }

    Cow::Owned(out)
}

/// Every direct child of `<ul>`/`<ol>` becomes an `<li>`. Consecutive stray
/// children share one synthesized item; blank text is dropped. An `<li>`
/// nested directly in another is hoisted next to it, since a parser would
/// split them apart anyway.
///
/// Runs after sanitization so unwrapped wrappers can't leave `<li>` inside `<li>`.
fn repair_lists(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        let Node::Element(mut el) = node else {
            out.push(node);
            continue;
        };

        el.children = repair_lists(std::mem::take(&mut el.children));
        if el.name == "ul" || el.name == "ol" {
            el.children = wrap_stray_items(std::mem::take(&mut el.children));
        }

        if el.name == "li" {
            out.extend(split_nested_items(el));
        } else {
            out.push(Node::Element(el));
        }
    }

    out
}

fn wrap_stray_items(children: Vec<Node>) -> Vec<Node> {
    let mut repaired = Vec::with_capacity(children.len());
    let mut stray: Vec<Node> = Vec::new();

    for child in children.into_iter().filter(|c| !c.is_blank_text()) {
        if child.is_element("li") {
            if !stray.is_empty() {
                repaired.push(Node::Element(Element::new("li", std::mem::take(&mut stray))));
            }
            repaired.push(child);
        } else {
            stray.push(child);
        }
    }
    if !stray.is_empty() {
        repaired.push(Node::Element(Element::new("li", stray)));
    }

    repaired
}

/// `<li>a<li>b</li>c</li>` becomes `<li>a</li><li>b</li><li>c</li>`.
/// Runs of blank content between hoisted items are dropped.
fn split_nested_items(mut item: Element) -> Vec<Node> {
    if !item.children.iter().any(|c| c.is_element("li")) {
        return vec![Node::Element(item)];
    }

    let children = std::mem::take(&mut item.children);
    let mut out = Vec::new();
    let mut run: Vec<Node> = Vec::new();

    for child in children {
        if child.is_element("li") {
            if run.iter().any(|c| !c.is_blank_text()) {
                out.push(Node::Element(Element::new("li", std::mem::take(&mut run))));
            }
            run.clear();
            out.push(child);
        } else {
            run.push(child);
        }
    }
    if run.iter().any(|c| !c.is_blank_text()) {
        out.push(Node::Element(Element::new("li", run)));
    }

    out
}

fn sanitize_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => out.push(Node::Text(text)),
            Node::Element(el) => sanitize_element(el, &mut out),
        }
    }
    out
}

fn sanitize_element(mut el: Element, out: &mut Vec<Node>) {
    if FORBIDDEN_TAGS.contains(&el.name.as_str()) {
        return;
    }

    if el.name == "span" {
        let emphasis = el.attr("style").map(rules::style_emphasis).unwrap_or_default();
        if emphasis.any() {
            out.push(emphasis_wrapper(emphasis, sanitize_nodes(el.children)));
            return;
        }
    } else if el.name == "i" {
        el.name = "em".to_string();
    } else if el.name == "b" {
        el.name = "strong".to_string();
    }

    let name = el.name.as_str();
    if UNWRAP_TAGS.contains(&name) || !ALLOWED_TAGS.contains(&name) {
        out.extend(sanitize_nodes(el.children));
        return;
    }

    rules::filter_attributes(&mut el);
    if el.name == "em" {
        rules::ensure_em_marker(&mut el);
    } else if el.name == "a" {
        rules::rewrite_link(&mut el);
    } else if el.name == "img" {
        rules::rewrite_image(&mut el);
    }

    el.children = sanitize_nodes(std::mem::take(&mut el.children));
    out.push(Node::Element(el));
}

/// `<em>`, `<strong>` or `<strong><em>` around already sanitized children.
fn emphasis_wrapper(emphasis: rules::Emphasis, children: Vec<Node>) -> Node {
    let mut inner = children;
    if emphasis.italic {
        let mut em = Element::new("em", inner);
        rules::ensure_em_marker(&mut em);
        inner = vec![Node::Element(em)];
    }
    if emphasis.bold {
        inner = vec![Node::Element(Element::new("strong", inner))];
    }
    // A single wrapper was always pushed above
    inner.pop().unwrap_or(Node::Text(String::new()))
}
