//! HTML5 parsing into the arena DOM via html5ever's TreeSink.
//!
//! html5ever's tree construction algorithm gives browser-compatible error
//! recovery, so anything a browser accepts produces the same tree here.

use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName};
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use std::borrow::Cow;
use std::cell::RefCell;
use tendril::{StrTendril, TendrilSink};

use crate::Stem;
use crate::dom::{Document, ElementData, Namespace, NodeData, NodeKind};

/// Parse a full HTML document. The document's `root` is the `<html>` element.
pub fn parse_document(html: &str) -> Document {
    let sink = ArenaSink::new();
    html5ever::parse_document(sink, Default::default()).one(StrTendril::from(html))
}

/// Parse markup as body content. The returned document's `root` is the
/// `<body>` element holding the parsed nodes.
///
/// Metadata-only elements (`<title>`, `<meta>`, ...) that precede any body
/// content are placed in `<head>` by the HTML5 algorithm and are therefore
/// not part of the fragment.
pub fn parse_fragment(html: &str) -> Document {
    let mut doc = parse_document(html);
    if let Some(body) = doc.body() {
        doc.root = body;
    }
    doc
}

/// Parse markup the way the contents of a `<template>` element are parsed.
///
/// Any element can come out on top, including table parts (`<tr>`, `<td>`,
/// `<thead>`) and head-only elements (`<title>`, `<style>`, `<template>`).
/// The returned document's `root` is the element holding the parsed nodes.
pub fn parse_template_contents(html: &str) -> Document {
    let sink = ArenaSink::new();
    let context = QualName::new(
        None,
        html5ever::Namespace::from(Namespace::Html.url()),
        LocalName::from("template"),
    );
    html5ever::parse_fragment(sink, Default::default(), context, Vec::new(), false)
        .one(StrTendril::from(html))
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink implementation for building the arena DOM
struct ArenaSink {
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,

    doctype: RefCell<Option<StrTendril>>,
}

impl ArenaSink {
    fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });

        ArenaSink {
            arena: RefCell::new(arena),
            document,
            doctype: RefCell::new(None),
        }
    }

    fn new_text(arena: &mut Arena<NodeData>, text: StrTendril) -> NodeId {
        arena.new_node(NodeData {
            kind: NodeKind::Text(Stem::from(text)),
            ns: Namespace::Html,
        })
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let arena = self.arena.into_inner();

        let root = self
            .document
            .children(&arena)
            .find(|&id| matches!(arena[id].get().kind, NodeKind::Element(_)))
            .unwrap_or(self.document);

        Document::from_parts(arena, root, self.doctype.into_inner())
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers on its own
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let node = arena[*target].get();

        let (local, ns) = match &node.kind {
            NodeKind::Element(elem) => (elem.tag.clone(), node.ns),
            _ => (LocalName::from(""), Namespace::Html),
        };

        OwnedElemName(QualName::new(
            None,
            html5ever::Namespace::from(ns.url()),
            local,
        ))
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let ns = Namespace::from_url(name.ns.as_ref());

        // First occurrence of a duplicated attribute wins, as in browsers
        let mut attr_map = IndexMap::with_capacity(attrs.len());
        for attr in attrs {
            attr_map
                .entry(attr.name.local.to_string())
                .or_insert_with(|| Stem::from(attr.value));
        }

        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Element(ElementData {
                tag: name.local,
                attrs: attr_map,
            }),
            ns,
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(Stem::from(text)),
            ns: Namespace::Html,
        })
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions only exist in XML; keep the slot as an empty comment
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(Stem::new()),
            ns: Namespace::Html,
        })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // Merge with a preceding text node, like the DOM does
                if let Some(last_child) = arena[*parent].last_child()
                    && let NodeKind::Text(existing) = &mut arena[last_child].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }

                let text_node = Self::new_text(&mut arena, text);
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => {
                sibling.insert_before(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                if let Some(prev) = arena[*sibling].previous_sibling()
                    && let NodeKind::Text(existing) = &mut arena[prev].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }

                let text_node = Self::new_text(&mut arena, text);
                sibling.insert_before(text_node, &mut arena);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.arena.borrow()[*element].parent().is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        *self.doctype.borrow_mut() = Some(name);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents are kept inline as the element's children
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in attrs {
                elem.attrs
                    .entry(attr.name.local.to_string())
                    .or_insert_with(|| Stem::from(attr.value));
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            child.detach(&mut arena);
            new_parent.append(child, &mut arena);
        }
    }
}
