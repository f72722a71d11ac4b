//! Allow-lists and attribute rules for backend-authored HTML.

use crate::sanitizer::tree::Element;

/// Removed together with their whole subtree.
pub const FORBIDDEN_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "link", "meta", "noscript", "template",
    "frame", "frameset", "base", "svg", "math",
];

/// Structural wrappers whose children are kept in place.
pub const UNWRAP_TAGS: &[&str] = &[
    "div", "section", "article", "header", "footer", "main", "aside", "nav",
];

pub const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "strong", "b", "em", "i", "u", "s", "span", "blockquote", "ul", "ol", "li", "h1",
    "h2", "h3", "h4", "h5", "h6", "table", "thead", "tbody", "tfoot", "tr", "th", "td", "img",
    "a", "figure", "figcaption", "code", "pre", "sup", "sub", "hr",
];

/// Class added to every surviving `<em>`.
pub const EM_MARKER_CLASS: &str = "rich-em";

const SAFE_REL: [&str; 2] = ["noopener", "noreferrer"];

/// Attributes kept per tag, in output order.
fn allowed_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "title", "target", "rel"],
        "img" => &["src", "alt", "title", "loading"],
        "td" => &["colspan", "rowspan"],
        "th" => &["colspan", "rowspan", "scope"],
        "ol" => &["start"],
        "em" | "strong" | "span" | "code" | "pre" => &["class"],
        _ => &[],
    }
}

fn is_allowed_class(tag: &str, class: &str) -> bool {
    match tag {
        "em" => class == EM_MARKER_CLASS,
        "code" | "pre" => class.starts_with("language-") && class.len() > "language-".len(),
        _ => false,
    }
}

/// Drop event handlers, inline styles and anything not on the tag's allow-list.
pub fn filter_attributes(el: &mut Element) {
    let allowed = allowed_attributes(&el.name);
    let mut kept = Vec::with_capacity(allowed.len());

    for name in allowed {
        if name.starts_with("on") || *name == "style" {
            continue;
        }
        let Some(value) = el.attr(name) else {
            continue;
        };
        if *name == "class" {
            let classes: Vec<&str> = value
                .split_ascii_whitespace()
                .filter(|c| is_allowed_class(&el.name, c))
                .collect();
            if !classes.is_empty() {
                kept.push((name.to_string(), classes.join(" ")));
            }
        } else {
            kept.push((name.to_string(), value.to_string()));
        }
    }

    el.attrs = kept;
}

/// Lowercased value with whitespace and control characters removed, as a
/// browser would see the scheme.
fn scheme_view(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_script_url(view: &str) -> bool {
    view.starts_with("javascript:") || view.starts_with("vbscript:")
}

/// Href rewrite for anchors. `None` means the attribute is removed.
pub fn safe_href(href: &str) -> Option<String> {
    let href = href.trim();
    let view = scheme_view(href);

    if is_script_url(&view) {
        return None;
    }

    let root_relative =
        view.starts_with('/') && !view.starts_with("//") && !view.starts_with("/\\");
    let allowed = view.starts_with("http://")
        || view.starts_with("https://")
        || view.starts_with("mailto:")
        || view.starts_with('#')
        || root_relative;

    Some(if allowed { href.to_string() } else { "#".to_string() })
}

pub fn rewrite_link(el: &mut Element) {
    if let Some(href) = el.attr("href").map(str::to_string) {
        match safe_href(&href) {
            Some(safe) => el.set_attr("href", safe),
            None => el.remove_attr("href"),
        }
    }

    let mut rel: Vec<String> = el
        .attr("rel")
        .map(|r| r.split_ascii_whitespace().map(String::from).collect())
        .unwrap_or_default();
    for token in SAFE_REL {
        if !rel.iter().any(|t| t.eq_ignore_ascii_case(token)) {
            rel.push(token.to_string());
        }
    }
    el.set_attr("rel", rel.join(" "));
}

pub fn rewrite_image(el: &mut Element) {
    let scripted = el.attr("src").is_some_and(|src| is_script_url(&scheme_view(src)));
    if scripted {
        el.remove_attr("src");
    }
}

pub fn ensure_em_marker(el: &mut Element) {
    let class = match el.attr("class") {
        Some(existing) if existing.split_ascii_whitespace().any(|c| c == EM_MARKER_CLASS) => return,
        Some(existing) => format!("{existing} {EM_MARKER_CLASS}"),
        None => EM_MARKER_CLASS.to_string(),
    };
    el.set_attr("class", class);
}

/// Italic/bold implied by an inline `style` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emphasis {
    pub italic: bool,
    pub bold: bool,
}

impl Emphasis {
    pub fn any(self) -> bool {
        self.italic || self.bold
    }
}

fn is_bold_weight(value: &str) -> bool {
    match value {
        "bold" | "bolder" => true,
        other => other.parse::<u32>().is_ok_and(|w| w >= 600),
    }
}

pub fn style_emphasis(style: &str) -> Emphasis {
    let mut emphasis = Emphasis::default();

    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim().trim_end_matches("!important").trim().to_ascii_lowercase();

        match property.as_str() {
            "font-style" => {
                emphasis.italic |= value == "italic" || value.starts_with("oblique");
            }
            "font-weight" => emphasis.bold |= is_bold_weight(&value),
            "font" => {
                for token in value.split_ascii_whitespace() {
                    emphasis.italic |= token == "italic" || token == "oblique";
                    emphasis.bold |= is_bold_weight(token);
                }
            }
            _ => {}
        }
    }

    emphasis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str, attrs: &[(&str, &str)]) -> Element {
        let mut el = Element::new(name, Vec::new());
        el.attrs = attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        el
    }

    #[test]
    fn test_safe_href() {
        assert_eq!(safe_href("https://example.com/x"), Some("https://example.com/x".into()));
        assert_eq!(safe_href("HTTP://EXAMPLE.COM"), Some("HTTP://EXAMPLE.COM".into()));
        assert_eq!(safe_href("mailto:a@b.c"), Some("mailto:a@b.c".into()));
        assert_eq!(safe_href("#top"), Some("#top".into()));
        assert_eq!(safe_href(" /articles/1 "), Some("/articles/1".into()));
        assert_eq!(safe_href("//evil.example"), Some("#".into()));
        assert_eq!(safe_href("/\\evil.example"), Some("#".into()));
        assert_eq!(safe_href("relative/page"), Some("#".into()));
        assert_eq!(safe_href("data:text/html,x"), Some("#".into()));
        assert_eq!(safe_href("javascript:alert(1)"), None);
        assert_eq!(safe_href(" JaVa\tScRiPt:alert(1)"), None);
    }

    #[test]
    fn test_rel_is_augmented_once() {
        let mut el = element("a", &[("href", "/x"), ("rel", "nofollow NOOPENER")]);
        rewrite_link(&mut el);
        assert_eq!(el.attr("rel"), Some("nofollow NOOPENER noreferrer"));

        let mut el = element("a", &[]);
        rewrite_link(&mut el);
        assert_eq!(el.attr("rel"), Some("noopener noreferrer"));
        assert_eq!(el.attr("href"), None);
    }

    #[test]
    fn test_filter_attributes_per_tag() {
        let mut el = element(
            "img",
            &[("onerror", "x()"), ("src", "/a.png"), ("style", "width:1px"), ("alt", "A"), ("width", "10")],
        );
        filter_attributes(&mut el);
        assert_eq!(el.attrs, vec![("src".into(), "/a.png".into()), ("alt".into(), "A".into())]);

        let mut el = element("p", &[("class", "lead"), ("id", "x")]);
        filter_attributes(&mut el);
        assert!(el.attrs.is_empty());
    }

    #[test]
    fn test_class_allow_list() {
        let mut el = element("code", &[("class", "language-rust hljs")]);
        filter_attributes(&mut el);
        assert_eq!(el.attr("class"), Some("language-rust"));

        let mut el = element("span", &[("class", "highlight")]);
        filter_attributes(&mut el);
        assert_eq!(el.attr("class"), None);
    }

    #[test]
    fn test_em_marker() {
        let mut el = element("em", &[]);
        ensure_em_marker(&mut el);
        ensure_em_marker(&mut el);
        assert_eq!(el.attr("class"), Some(EM_MARKER_CLASS));
    }

    #[test]
    fn test_style_emphasis() {
        assert_eq!(style_emphasis("font-style: italic"), Emphasis { italic: true, bold: false });
        assert_eq!(style_emphasis("FONT-WEIGHT:700;color:red"), Emphasis { italic: false, bold: true });
        assert_eq!(
            style_emphasis("font-weight: bold !important; font-style: oblique 10deg"),
            Emphasis { italic: true, bold: true }
        );
        assert_eq!(style_emphasis("font: italic bold 12px serif"), Emphasis { italic: true, bold: true });
        assert!(!style_emphasis("font-weight: 400; color: blue").any());
        assert!(!style_emphasis("garbage").any());
    }
}
