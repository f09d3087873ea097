//! HTML5-correct serializer for the arena DOM.
//!
//! Follows HTML5 serialization rules:
//!
//! - Void elements never get end tags
//! - Text content is properly escaped
//! - Attribute values are escaped and double-quoted
//! - Raw text elements (script, style) are not escaped
//! - RCDATA elements (title, textarea) escape only `&` and `<`
//! - Foreign content (SVG/MathML) can use self-closing syntax
//!
//! The walk uses an explicit stack, so arbitrarily deep trees serialize
//! without growing the call stack.

use indextree::NodeId;
use std::fmt::Write;

use crate::dom::{Document, ElementData, Namespace, NodeKind};

/// Options for HTML serialization.
#[derive(Clone, Debug)]
pub struct SerializeOptions {
    /// Whether to sort attributes alphabetically (default: false, source order).
    pub sort_attributes: bool,
    /// Whether to escape `</script` sequences in script content (default: true for safety)
    pub escape_script_end_tags: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            sort_attributes: false,
            escape_script_end_tags: true,
        }
    }
}

impl SerializeOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable sorting attributes alphabetically for deterministic output.
    pub fn sort_attributes(mut self) -> Self {
        self.sort_attributes = true;
        self
    }

    /// Disable escaping `</script` in script content (not recommended).
    pub fn no_escape_script_end_tags(mut self) -> Self {
        self.escape_script_end_tags = false;
        self
    }
}

/// Serialize a node and its subtree to an HTML string.
pub fn serialize_node(doc: &Document, id: NodeId, opts: &SerializeOptions) -> String {
    let mut out = String::new();
    Serializer::new(&mut out, doc, opts).write_tree(id);
    out
}

/// Serialize only the children of a node (its "inner HTML").
pub fn serialize_children(doc: &Document, id: NodeId, opts: &SerializeOptions) -> String {
    let mut out = String::new();
    let mut ser = Serializer::new(&mut out, doc, opts);
    for child in doc.children(id) {
        ser.write_tree(child);
    }
    out
}

/// HTML5 void elements - these never have end tags.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Raw text elements - content is not escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// RCDATA elements - only `&` and `<` are escaped.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

fn is_rcdata_element(tag: &str) -> bool {
    RCDATA_ELEMENTS.contains(&tag)
}

enum Visit {
    Open(NodeId),
    Close(NodeId),
}

struct Serializer<'a, W: Write> {
    out: &'a mut W,
    doc: &'a Document,
    options: &'a SerializeOptions,
}

impl<'a, W: Write> Serializer<'a, W> {
    fn new(out: &'a mut W, doc: &'a Document, options: &'a SerializeOptions) -> Self {
        Self { out, doc, options }
    }

    fn write_tree(&mut self, id: NodeId) {
        let mut stack = vec![Visit::Open(id)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Open(node) => {
                    if self.open(node) {
                        stack.push(Visit::Close(node));
                        let children: Vec<NodeId> = self.doc.children(node).collect();
                        stack.extend(children.into_iter().rev().map(Visit::Open));
                    }
                }
                Visit::Close(node) => self.close(node),
            }
        }
    }

    /// Write the opening part of a node. Returns true if its children still
    /// need to be visited (followed by a matching `close`).
    fn open(&mut self, id: NodeId) -> bool {
        let data = self.doc.get(id);
        match &data.kind {
            NodeKind::Document => true,
            NodeKind::Text(text) => {
                let parent_tag = self.doc.parent(id).and_then(|p| self.doc.tag(p));
                match parent_tag {
                    Some(tag) if is_raw_text_element(tag) => self.write_raw_text(text, tag),
                    Some(tag) if is_rcdata_element(tag) => self.write_rcdata_escaped(text),
                    _ => self.write_text_escaped(text),
                }
                false
            }
            NodeKind::Comment(text) => {
                let _ = write!(self.out, "<!--{}-->", text);
                false
            }
            NodeKind::Element(elem) => self.open_element(id, elem, data.ns),
        }
    }

    fn open_element(&mut self, id: NodeId, elem: &ElementData, ns: Namespace) -> bool {
        let tag = elem.tag.as_ref();
        let _ = write!(self.out, "<{}", tag);

        if self.options.sort_attributes {
            let mut attrs: Vec<_> = elem.attrs.iter().collect();
            attrs.sort_by_key(|(k, _)| *k);
            for (name, value) in attrs {
                self.write_attr(name, value);
            }
        } else {
            for (name, value) in &elem.attrs {
                self.write_attr(name, value);
            }
        }

        if ns == Namespace::Html && is_void_element(tag) {
            let _ = write!(self.out, ">");
            return false;
        }

        if ns != Namespace::Html && self.doc.first_child(id).is_none() {
            let _ = write!(self.out, "/>");
            return false;
        }

        let _ = write!(self.out, ">");
        true
    }

    fn close(&mut self, id: NodeId) {
        if let Some(tag) = self.doc.tag(id) {
            let _ = write!(self.out, "</{}>", tag);
        }
    }

    /// Escape text content for normal HTML elements.
    fn write_text_escaped(&mut self, text: &str) {
        for c in text.chars() {
            let _ = match c {
                '&' => self.out.write_str("&amp;"),
                '<' => self.out.write_str("&lt;"),
                '>' => self.out.write_str("&gt;"),
                _ => self.out.write_char(c),
            };
        }
    }

    /// Escape text content for RCDATA elements (only & and <).
    fn write_rcdata_escaped(&mut self, text: &str) {
        for c in text.chars() {
            let _ = match c {
                '&' => self.out.write_str("&amp;"),
                '<' => self.out.write_str("&lt;"),
                _ => self.out.write_char(c),
            };
        }
    }

    /// Write raw text content, optionally escaping script end tags.
    fn write_raw_text(&mut self, text: &str, tag: &str) {
        if self.options.escape_script_end_tags && tag == "script" {
            // ASCII case-insensitive match on the original bytes keeps indices aligned
            const PATTERN: &[u8] = b"</script";
            let bytes = text.as_bytes();
            let mut last_end = 0;
            let mut i = 0;
            while i + PATTERN.len() <= bytes.len() {
                if bytes[i..i + PATTERN.len()].eq_ignore_ascii_case(PATTERN) {
                    let _ = self.out.write_str(&text[last_end..i]);
                    let _ = self.out.write_str("<\\/script");
                    last_end = i + PATTERN.len();
                    i = last_end;
                } else {
                    i += 1;
                }
            }
            let _ = self.out.write_str(&text[last_end..]);
        } else {
            let _ = self.out.write_str(text);
        }
    }

    /// Escape attribute value and write it double-quoted.
    fn write_attr(&mut self, name: &str, value: &str) {
        let _ = write!(self.out, " {}=\"", name);
        for c in value.chars() {
            let _ = match c {
                '&' => self.out.write_str("&amp;"),
                '<' => self.out.write_str("&lt;"),
                '>' => self.out.write_str("&gt;"),
                '"' => self.out.write_str("&quot;"),
                _ => self.out.write_char(c),
            };
        }
        let _ = self.out.write_char('"');
    }
}
