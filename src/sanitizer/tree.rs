//! Owned fragment tree built from the html5ever parse, and its serializer.

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html};

/// Elements nested deeper than this are flattened to their text content.
pub const MAX_DEPTH: usize = 256;

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str, children: Vec<Node>) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replace an attribute's value in place, or append it.
    pub fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }
}

impl Node {
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }

    pub fn is_element(&self, name: &str) -> bool {
        matches!(self, Node::Element(el) if el.name == name)
    }
}

/// Parse an HTML fragment the way a browser parses `innerHTML` in a `<body>`.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(html);
    convert_children(fragment.root_element(), 0)
}

fn convert_children(parent: ElementRef<'_>, depth: usize) -> Vec<Node> {
    let mut nodes = Vec::new();

    for child in parent.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                let text: &str = text;
                nodes.push(Node::Text(text.to_string()));
            }
            scraper::Node::Element(el) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                if depth >= MAX_DEPTH {
                    nodes.push(Node::Text(element.text().collect()));
                    continue;
                }
                nodes.push(Node::Element(Element {
                    name: el.name().to_ascii_lowercase(),
                    attrs: el
                        .attrs()
                        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                        .collect(),
                    children: convert_children(element, depth + 1),
                }));
            }
            // Comments, doctypes and processing instructions never survive.
            _ => {}
        }
    }

    nodes
}

pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&encode_text(text)),
            Node::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&el.name.as_str()) {
                    continue;
                }

                write_nodes(&el.children, out);
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_simple() {
        let nodes = parse_fragment(r#"<p class="x">Hi <b>there</b></p>"#);
        assert_eq!(serialize(&nodes), r#"<p class="x">Hi <b>there</b></p>"#);
    }

    #[test]
    fn test_comments_are_dropped() {
        let nodes = parse_fragment("a<!-- hidden -->b");
        assert_eq!(serialize(&nodes), "ab");
    }

    #[test]
    fn test_void_elements_have_no_close_tag() {
        let nodes = parse_fragment(r#"x<br>y<img src="a.png">"#);
        assert_eq!(serialize(&nodes), r#"x<br>y<img src="a.png">"#);
    }

    #[test]
    fn test_text_is_escaped() {
        let nodes = vec![Node::Text("a < b & c".into())];
        assert_eq!(serialize(&nodes), "a &lt; b &amp; c");
    }

    #[test]
    fn test_deep_nesting_is_flattened() {
        let depth = MAX_DEPTH + 20;
        let html = format!("{}deep{}", "<span>".repeat(depth), "</span>".repeat(depth));
        let out = serialize(&parse_fragment(&html));
        assert!(out.contains("deep"));
        assert_eq!(out.matches("<span>").count(), MAX_DEPTH);
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut el = Element::new("a", Vec::new());
        el.set_attr("href", "/a".into());
        el.set_attr("rel", "x".into());
        el.set_attr("href", "/b".into());
        assert_eq!(el.attrs, vec![("href".into(), "/b".into()), ("rel".into(), "x".into())]);
        el.remove_attr("href");
        assert_eq!(el.attr("href"), None);
    }
}
