//! Fragment parsing and serialization with per-node substitutions.
//!
//! Every rewriting step in the crate works the same way: parse the HTML once
//! into a scraper tree, decide which nodes to replace, then serialize the tree
//! back out, emitting the replacement string in place of each chosen node.

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef};
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html};

use crate::record::{PlaceholderKey, Provider};

/// Marker attribute carried by image placeholders.
pub const IMAGE_MARKER_ATTR: &str = "data-content-image";

/// Guard attribute set on a placeholder once its widget has been mounted.
pub const MOUNTED_ATTR: &str = "data-island-mounted";

/// HTML5 void elements that must not have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are serialized without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Parents that only admit phrasing content; a `div` inside them would be
/// split out of the parent when the HTML is parsed again.
const PHRASING_PARENTS: &[&str] = &[
    "p", "span", "a", "em", "strong", "b", "i", "u", "s", "small", "label", "q", "cite", "h1",
    "h2", "h3", "h4", "h5", "h6",
];

pub(crate) type Replacements = HashMap<NodeId, String>;

/// Parse an HTML fragment in `<body>` context.
pub(crate) fn parse(html: &str) -> Html {
    Html::parse_fragment(html)
}

/// Serialize a parsed fragment, swapping each node in `replacements` (and its
/// whole subtree) for the mapped string. An empty string removes the node.
pub(crate) fn serialize(html: &Html, replacements: &Replacements) -> String {
    let mut out = String::new();
    // parse_fragment wraps the content in a synthetic <html> element
    for child in html.root_element().children() {
        serialize_node(child, replacements, &mut out);
    }
    out
}

fn serialize_node(node: NodeRef<Node>, replacements: &Replacements, out: &mut String) {
    if let Some(replacement) = replacements.get(&node.id()) {
        out.push_str(replacement);
        return;
    }

    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                serialize_node(child, replacements, out);
            }
        }
        Node::Element(el) => {
            out.push_str(&start_tag(el, &[]));

            if VOID_ELEMENTS.contains(&el.name()) {
                return;
            }

            for child in node.children() {
                serialize_node(child, replacements, out);
            }

            out.push_str(&end_tag(el));
        }
        Node::Text(text) => {
            let raw = node
                .parent()
                .and_then(|p| p.value().as_element().map(|el| el.name()))
                .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
            let text: &str = text.as_ref();
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&html_escape::encode_text(text));
            }
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment.as_ref());
            out.push_str("-->");
        }
        _ => {}
    }
}

/// Opening tag for `el` with its attributes, followed by `extra` attributes.
pub(crate) fn start_tag(el: &Element, extra: &[(&str, &str)]) -> String {
    let mut out = String::from("<");
    out.push_str(el.name());
    for (k, v) in el.attrs() {
        push_attr(&mut out, k, v);
    }
    for (k, v) in extra {
        push_attr(&mut out, k, v);
    }
    out.push('>');
    out
}

pub(crate) fn end_tag(el: &Element) -> String {
    format!("</{}>", el.name())
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}

/// `<name attrs...>inner</name>`, or just the start tag for void elements.
/// `inner` is inserted verbatim.
pub(crate) fn element(name: &str, attrs: &[(&str, &str)], inner: &str) -> String {
    let mut out = format!("<{name}");
    for (k, v) in attrs {
        push_attr(&mut out, k, v);
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&name) {
        return out;
    }
    out.push_str(inner);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
    out
}

/// Empty placeholder element carrying a single marker attribute.
pub(crate) fn placeholder(tag: &str, class: &str, key: &PlaceholderKey) -> String {
    let (attr, value) = key.marker();
    let mut out = format!("<{tag}");
    push_attr(&mut out, "class", class);
    push_attr(&mut out, attr, &value);
    out.push_str("></");
    out.push_str(tag);
    out.push('>');
    out
}

/// `span` when the node sits inside phrasing-only content, `div` otherwise.
pub(crate) fn placeholder_tag(node: NodeRef<Node>) -> &'static str {
    let inline = node
        .ancestors()
        .find_map(|a| a.value().as_element().map(|el| el.name()))
        .is_some_and(|name| PHRASING_PARENTS.contains(&name));
    if inline { "span" } else { "div" }
}

/// Placeholder key carried by `el`, if it is a marker element.
pub(crate) fn marker_key(el: &Element) -> Option<PlaceholderKey> {
    el.attrs().find_map(|(name, value)| {
        if name == IMAGE_MARKER_ATTR {
            return value.parse().ok().map(PlaceholderKey::Image);
        }
        Provider::from_marker_attr(name).map(|p| PlaceholderKey::Embed(p, value.to_string()))
    })
}

/// Whether `name` is one of the attributes this crate uses to mark
/// placeholders. Content must never carry them on its own.
pub(crate) fn is_reserved_attr(name: &str) -> bool {
    name.eq_ignore_ascii_case(IMAGE_MARKER_ATTR)
        || name.eq_ignore_ascii_case(MOUNTED_ATTR)
        || Provider::from_marker_attr(&name.to_ascii_lowercase()).is_some()
}

/// All marker keys in `html`, in document order.
pub(crate) fn find_markers(html: &str) -> Vec<PlaceholderKey> {
    let document = parse(html);
    document
        .root_element()
        .descendants()
        .filter_map(|node| node.value().as_element().and_then(marker_key))
        .collect()
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c.eq_ignore_ascii_case(class))
}

pub(crate) fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Concatenated, trimmed text content of `el`.
pub(crate) fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
