//! Minimal structured markup produced by the section renderers.
//!
//! Renderers build [`Node`] trees; adapters turn them into HTML for the web
//! dashboard or into plain text lines for the terminal. All text and
//! attribute values are escaped on the way out.

use v_htmlescape::escape;

/// Elements that never have children or a closing tag.
const VOID_TAGS: &[&str] = &["img", "br", "hr", "input"];

/// Elements that start a new line in plain-text output.
const BLOCK_TAGS: &[&str] = &["div", "p", "h3", "h4", "li", "section"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(Node::text(value))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// `<p><strong>{label}</strong> {value}</p>`: the labelled line used by
/// several sections.
pub fn labelled(label: &str, value: impl Into<String>) -> Element {
    Element::new("p")
        .child(Element::new("strong").text(label))
        .text(format!(" {}", value.into()))
}

// ---------------------------------------------------------------------------
// HTML output
// ---------------------------------------------------------------------------

/// Serialize nodes as HTML.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_html(node, &mut out);
    }
    out
}

fn write_html(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape(text).to_string()),
        Node::Element(el) => {
            out.push('<');
            out.push_str(el.tag);
            for (name, value) in &el.attrs {
                out.push_str(&format!(" {name}=\"{}\"", escape(value)));
            }
            if VOID_TAGS.contains(&el.tag) {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in &el.children {
                write_html(child, out);
            }
            out.push_str(&format!("</{}>", el.tag));
        }
    }
}

// ---------------------------------------------------------------------------
// Plain-text output
// ---------------------------------------------------------------------------

/// Flatten nodes into their visible text, one line per block element.
///
/// Images contribute their `alt` text in brackets.
pub fn text_lines(nodes: &[Node]) -> Vec<String> {
    let mut buf = String::new();
    for node in nodes {
        write_text(node, &mut buf);
    }
    buf.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// All visible text joined into a single string.
pub fn text_content(nodes: &[Node]) -> String {
    text_lines(nodes).join("\n")
}

fn write_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Element(el) => {
            let block = BLOCK_TAGS.contains(&el.tag);
            if block {
                out.push('\n');
            }
            if el.tag == "img"
                && let Some(alt) = el.get_attr("alt")
            {
                out.push_str(&format!("[{alt}]"));
            }
            for child in &el.children {
                write_text(child, out);
            }
            if block {
                out.push('\n');
            }
        }
    }
}
