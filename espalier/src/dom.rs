//! Arena-based DOM that the morph engine patches in place.
//!
//! This module provides the Document representation shared by the parser,
//! the serializer and the morph engine. Key features:
//! - **indextree Arena**: All nodes in contiguous memory, identity is the `NodeId`
//! - **Side table**: Per-node runtime state (reactive scope, transition flags,
//!   teleport destinations) lives next to the arena rather than on the nodes
//! - **Cross-document cloning**: Subtrees from a transient target document are
//!   imported into the live document when new DOM has to be created

use html5ever::LocalName;
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use rapidhash::RapidHashMap;
use tendril::StrTendril;

use crate::Stem;
use crate::serialize::{SerializeOptions, serialize_children, serialize_node};

/// Document = Arena + side table of runtime node state.
#[derive(Debug, Clone)]
pub struct Document {
    /// THE tree - all nodes live here
    pub arena: Arena<NodeData>,

    /// Root node (`<html>` for parsed documents, `<body>` for fragments)
    pub root: NodeId,

    /// DOCTYPE if present (usually "html")
    pub doctype: Option<StrTendril>,

    /// Runtime state keyed by node identity
    states: RapidHashMap<NodeId, NodeState>,

    /// Teleport destination -> origin
    origins: RapidHashMap<NodeId, NodeId>,
}

/// What goes in each arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub ns: Namespace,
}

/// Node types
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Element with tag and attributes
    Element(ElementData),
    /// Text content
    Text(Stem),
    /// HTML comment
    Comment(Stem),
}

/// Element data (tag + attributes)
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name, interned
    pub tag: LocalName,

    /// Attributes - names are unique, IndexMap keeps source order for serialization
    pub attrs: IndexMap<String, Stem>,
}

/// XML namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html,
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

/// Opaque handle to a reactive data scope owned by the host framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u64);

/// Runtime state attached to a node.
///
/// The DOM itself only carries markup; everything a reactive host wants to
/// remember about a node is stored here, keyed by the node's id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeState {
    /// Reactive scope seeded onto this node
    pub scope: Option<ScopeId>,
    /// An enter/leave transition is running; attributes must not be patched
    pub transitioning: bool,
    /// Result of the last visibility toggle, if the node has one
    pub shown: Option<bool>,
    /// Where this node's content was teleported to (same arena)
    pub teleport: Option<NodeId>,
}

impl NodeState {
    fn is_empty(&self) -> bool {
        *self == NodeState::default()
    }
}

/// Borrowed read-only view of a node, handed to hooks and key extractors.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn kind(&self) -> &'a NodeKind {
        &self.doc.get(self.id).kind
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind(), NodeKind::Element(_))
    }

    /// Tag name for elements, `None` otherwise.
    pub fn tag(&self) -> Option<&'a str> {
        self.doc.tag(self.id)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.doc.attr(self.id, name)
    }

    /// Value of a text or comment node.
    pub fn text(&self) -> Option<&'a str> {
        self.doc.text(self.id)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.doc.parent(self.id)
    }

    pub fn state(&self) -> Option<&'a NodeState> {
        self.doc.state(self.id)
    }

    pub fn outer_html(&self) -> String {
        self.doc.outer_html(self.id)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            NodeKind::Document => write!(f, "#document({:?})", self.id),
            NodeKind::Element(elem) => write!(f, "<{}>({:?})", elem.tag, self.id),
            NodeKind::Text(t) => write!(f, "#text({:?}, {:?})", self.id, t),
            NodeKind::Comment(t) => write!(f, "#comment({:?}, {:?})", self.id, t),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the invisible document node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });
        Document {
            arena,
            root,
            doctype: None,
            states: RapidHashMap::default(),
            origins: RapidHashMap::default(),
        }
    }

    pub(crate) fn from_parts(
        arena: Arena<NodeData>,
        root: NodeId,
        doctype: Option<StrTendril>,
    ) -> Self {
        Document {
            arena,
            root,
            doctype,
            states: RapidHashMap::default(),
            origins: RapidHashMap::default(),
        }
    }

    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    /// Whether `id` names a live (not removed) node of this arena.
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some_and(|node| !node.is_removed())
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// Iterate children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].first_child()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].next_sibling()
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).find(|&child| self.is_element(child))
    }

    /// Get the `<body>` element if present
    pub fn body(&self) -> Option<NodeId> {
        if self.tag(self.root) == Some("body") {
            return Some(self.root);
        }
        self.children(self.root)
            .find(|&id| self.tag(id) == Some("body"))
    }

    /// Get the `<head>` element if present
    pub fn head(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.tag(id) == Some("head"))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.get(id).kind, NodeKind::Element(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.get(id).kind {
            NodeKind::Element(elem) => Some(elem.tag.as_ref()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.get(id).kind {
            NodeKind::Element(elem) => elem.attrs.get(name).map(Stem::as_str),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id).kind {
            NodeKind::Text(t) | NodeKind::Comment(t) => Some(t.as_str()),
            _ => None,
        }
    }

    // --- construction ----------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_ns(tag, Namespace::Html)
    }

    pub fn create_element_ns(&mut self, tag: &str, ns: Namespace) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Element(ElementData {
                tag: LocalName::from(tag),
                attrs: IndexMap::new(),
            }),
            ns,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Text(Stem::from(text)),
            ns: Namespace::Html,
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Comment(Stem::from(text)),
            ns: Namespace::Html,
        })
    }

    /// Set an attribute; a no-op on non-elements.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<Stem>) {
        if let NodeKind::Element(elem) = &mut self.get_mut(id).kind {
            elem.attrs.insert(name.to_owned(), value.into());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<Stem> {
        match &mut self.get_mut(id).kind {
            NodeKind::Element(elem) => elem.attrs.shift_remove(name),
            _ => None,
        }
    }

    /// Replace the value of a text or comment node; a no-op on other kinds.
    pub fn set_text(&mut self, id: NodeId, value: impl Into<Stem>) {
        if let NodeKind::Text(t) | NodeKind::Comment(t) = &mut self.get_mut(id).kind {
            *t = value.into();
        }
    }

    // --- tree surgery ----------------------------------------------------

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    /// Insert `node` right before `reference`, detaching it first.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        reference.insert_before(node, &mut self.arena);
    }

    /// Put `replacement` where `old` is and detach `old`.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) {
        old.insert_before(replacement, &mut self.arena);
        old.detach(&mut self.arena);
    }

    /// Unlink a node (and its subtree) from its parent. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    /// Detach a subtree, drop its side-table entries and free its arena slots.
    pub fn discard(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        let subtree: Vec<NodeId> = id.descendants(&self.arena).collect();
        for node in subtree {
            if let Some(destination) = self.states.remove(&node).and_then(|s| s.teleport)
                && self.origins.get(&destination) == Some(&node)
            {
                self.origins.remove(&destination);
            }
            if let Some(origin) = self.origins.remove(&node)
                && let Some(state) = self.states.get_mut(&origin)
            {
                state.teleport = None;
            }
        }
        id.remove_subtree(&mut self.arena);
    }

    // --- side table ------------------------------------------------------

    pub fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.states.get(&id)
    }

    /// Mutable state for `id`, created empty on first access.
    pub fn state_mut(&mut self, id: NodeId) -> &mut NodeState {
        self.states.entry(id).or_default()
    }

    pub fn scope(&self, id: NodeId) -> Option<ScopeId> {
        self.state(id).and_then(|s| s.scope)
    }

    pub fn set_scope(&mut self, id: NodeId, scope: ScopeId) {
        self.state_mut(id).scope = Some(scope);
    }

    pub fn is_transitioning(&self, id: NodeId) -> bool {
        self.state(id).is_some_and(|s| s.transitioning)
    }

    pub fn set_transitioning(&mut self, id: NodeId, transitioning: bool) {
        self.state_mut(id).transitioning = transitioning;
    }

    /// Visibility as last toggled; nodes that were never toggled count as hidden.
    pub fn is_shown(&self, id: NodeId) -> bool {
        self.state(id).and_then(|s| s.shown).unwrap_or(false)
    }

    pub fn set_shown(&mut self, id: NodeId, shown: bool) {
        self.state_mut(id).shown = Some(shown);
    }

    pub fn teleport(&self, id: NodeId) -> Option<NodeId> {
        self.state(id).and_then(|s| s.teleport)
    }

    /// Record that `id` renders its content at `destination`.
    pub fn set_teleport(&mut self, id: NodeId, destination: NodeId) {
        if let Some(previous) = self.state_mut(id).teleport.replace(destination)
            && self.origins.get(&previous) == Some(&id)
        {
            self.origins.remove(&previous);
        }
        self.origins.insert(destination, id);
    }

    /// The node whose teleport destination is `id`.
    pub fn teleport_origin(&self, id: NodeId) -> Option<NodeId> {
        self.origins
            .get(&id)
            .copied()
            .filter(|&origin| self.teleport(origin) == Some(id))
    }

    // --- cloning and comparison ------------------------------------------

    /// Deep-clone a subtree of `src` into this arena, returning the detached copy.
    ///
    /// Side-table state is carried over except teleport destinations, which
    /// only mean something inside their own arena.
    pub fn import(&mut self, src: &Document, id: NodeId) -> NodeId {
        let root = self.import_one(src, id);
        let mut stack = vec![(id, root)];
        while let Some((src_parent, dst_parent)) = stack.pop() {
            for child in src_parent.children(&src.arena) {
                let copy = self.import_one(src, child);
                dst_parent.append(copy, &mut self.arena);
                stack.push((child, copy));
            }
        }
        root
    }

    fn import_one(&mut self, src: &Document, id: NodeId) -> NodeId {
        let copy = self.arena.new_node(src.get(id).clone());
        if let Some(state) = src.state(id) {
            let carried = NodeState {
                teleport: None,
                ..state.clone()
            };
            if !carried.is_empty() {
                self.states.insert(copy, carried);
            }
        }
        copy
    }

    /// Structural equality in the sense of DOM `isEqualNode`: same kind, tag,
    /// namespace, attribute set and value, with pairwise-equal children.
    /// Identity and side-table state are ignored.
    pub fn is_equal_node(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let mut stack = vec![(a, b)];
        while let Some((x, y)) = stack.pop() {
            let (left, right) = (self.get(x), other.get(y));
            let same = match (&left.kind, &right.kind) {
                (NodeKind::Document, NodeKind::Document) => true,
                (NodeKind::Element(p), NodeKind::Element(q)) => {
                    p.tag == q.tag
                        && left.ns == right.ns
                        && p.attrs.len() == q.attrs.len()
                        && p.attrs.iter().all(|(k, v)| q.attrs.get(k) == Some(v))
                }
                (NodeKind::Text(p), NodeKind::Text(q)) => p == q,
                (NodeKind::Comment(p), NodeKind::Comment(q)) => p == q,
                _ => false,
            };
            if !same {
                return false;
            }

            let mut xs = x.children(&self.arena);
            let mut ys = y.children(&other.arena);
            loop {
                match (xs.next(), ys.next()) {
                    (Some(cx), Some(cy)) => stack.push((cx, cy)),
                    (None, None) => break,
                    _ => return false,
                }
            }
        }
        true
    }

    // --- serialization ---------------------------------------------------

    /// Serialize to HTML string (body content only, no doctype)
    pub fn to_html(&self) -> String {
        match self.body() {
            Some(body) => serialize_children(self, body, &SerializeOptions::default()),
            None => serialize_node(self, self.root, &SerializeOptions::default()),
        }
    }

    /// Serialize a node together with its own markup.
    pub fn outer_html(&self, id: NodeId) -> String {
        serialize_node(self, id, &SerializeOptions::default())
    }
}
