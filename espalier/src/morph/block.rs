//! Conditional regions and sibling walks.
//!
//! A conditional-rendering layer brackets each branch it renders with a pair
//! of comment markers. The reconciler treats such a pair as a [`Block`]: a
//! virtual parent whose children are the nodes strictly between the markers.
//! Blocks nest; a nested pair is skipped as one opaque unit by balanced
//! counting.

use indextree::NodeId;

use crate::dom::{Document, NodeKind};

/// Comment text opening a conditional region.
pub const BLOCK_START: &str = " __BLOCK__ ";

/// Comment text closing a conditional region.
pub const BLOCK_END: &str = " __ENDBLOCK__ ";

pub fn is_block_start(doc: &Document, id: NodeId) -> bool {
    matches!(&doc.get(id).kind, NodeKind::Comment(text) if text == BLOCK_START)
}

pub fn is_block_end(doc: &Document, id: NodeId) -> bool {
    matches!(&doc.get(id).kind, NodeKind::Comment(text) if text == BLOCK_END)
}

/// Live view of the nodes between two marker comments (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: NodeId,
    pub end: NodeId,
}

impl Block {
    pub fn new(start: NodeId, end: NodeId) -> Self {
        Self { start, end }
    }

    pub fn first_child(&self, doc: &Document) -> Option<NodeId> {
        self.next_node(doc, self.start)
    }

    /// The node after `reference` inside the block, `None` at the end marker.
    pub fn next_node(&self, doc: &Document, reference: NodeId) -> Option<NodeId> {
        let parent = doc.parent(self.start)?;
        effective_next(doc, parent, reference).filter(|&next| next != self.end)
    }

    pub fn children(&self, doc: &Document) -> Vec<NodeId> {
        let mut children = Vec::new();
        let mut cursor = self.first_child(doc);
        while let Some(node) = cursor {
            children.push(node);
            cursor = self.next_node(doc, node);
        }
        children
    }

    /// Place `node` right before the end marker.
    pub fn append_child(&self, doc: &mut Document, node: NodeId) {
        doc.insert_before(self.end, node);
    }
}

/// Next node in traversal order among the children of `parent`.
///
/// A node whose teleport destination lives under another parent hands over to
/// that destination, which stands in the origin's place. Leaving the
/// destination resumes at the origin's literal next sibling.
fn effective_next(doc: &Document, parent: NodeId, node: NodeId) -> Option<NodeId> {
    if doc.parent(node) != Some(parent) {
        let origin = doc.teleport_origin(node)?;
        return (doc.parent(origin) == Some(parent))
            .then(|| doc.next_sibling(origin))
            .flatten();
    }
    match doc.teleport(node) {
        Some(destination)
            if destination != node
                && doc.contains(destination)
                && doc.parent(destination) != Some(parent) =>
        {
            Some(destination)
        }
        _ => doc.next_sibling(node),
    }
}

/// The sibling scope a children walk operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
    Parent(NodeId),
    Block(Block),
}

impl Region {
    pub(crate) fn first(&self, doc: &Document) -> Option<NodeId> {
        match self {
            Region::Parent(parent) => doc.first_child(*parent),
            Region::Block(block) => block.first_child(doc),
        }
    }

    /// The DOM parent of the region's nodes.
    pub(crate) fn parent(&self, doc: &Document) -> Option<NodeId> {
        match self {
            Region::Parent(parent) => Some(*parent),
            Region::Block(block) => doc.parent(block.start),
        }
    }

    pub(crate) fn next(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        match self {
            Region::Parent(parent) => effective_next(doc, *parent, node),
            Region::Block(block) => block.next_node(doc, node),
        }
    }

    pub(crate) fn append(&self, doc: &mut Document, node: NodeId) {
        match self {
            Region::Parent(parent) => doc.append(*parent, node),
            Region::Block(block) => block.append_child(doc, node),
        }
    }

    pub(crate) fn insert_before(&self, doc: &mut Document, node: NodeId, reference: NodeId) {
        doc.insert_before(reference, node);
    }

    /// Find the marker closing the block opened at `start`, skipping nested
    /// pairs. `None` if the region runs out first.
    pub(crate) fn block_end(&self, doc: &Document, start: NodeId) -> Option<NodeId> {
        let mut depth = 0usize;
        let mut cursor = start;
        loop {
            let next = self.next(doc, cursor)?;
            if is_block_start(doc, next) {
                depth += 1;
            } else if is_block_end(doc, next) {
                if depth == 0 {
                    return Some(next);
                }
                depth -= 1;
            }
            cursor = next;
        }
    }
}
