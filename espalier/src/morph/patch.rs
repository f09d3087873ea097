//! Node-level patching and the work-stack driver.
//!
//! `patch` and children reconciliation call into each other for every level
//! of the tree. Instead of recursing, both push [`Frame`]s onto an explicit
//! stack, so nesting depth never touches the call stack.

use indextree::NodeId;

use super::block::Region;
use super::children::ChildrenWalk;
use super::host::Host;
use super::key::key_of;
use super::options::MorphOptions;
use super::MorphError;
use crate::dom::{Document, NodeKind};

/// A unit of pending work.
pub(crate) enum Frame {
    /// Make the live node `from` match the target node `to`.
    Patch { from: NodeId, to: NodeId },
    /// A suspended children walk, resumed once the frames above it finish.
    Children(ChildrenWalk),
}

/// What `patch` did with the live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Patched {
    InPlace,
    Swapped(NodeId),
    Skipped,
}

/// Where a freshly cloned node goes.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Insertion {
    Append,
    Before(NodeId),
}

pub(crate) struct Patcher<'a, 'h> {
    pub(crate) doc: &'a mut Document,
    pub(crate) target: &'a mut Document,
    pub(crate) options: MorphOptions<'h>,
    pub(crate) host: &'a mut dyn Host,
    /// Nodes taken out of the live tree. Their arena slots are only freed
    /// once the walk is over, so a stale id can never alias a new node.
    graveyard: Vec<NodeId>,
}

impl<'a, 'h> Patcher<'a, 'h> {
    pub(crate) fn new(
        doc: &'a mut Document,
        target: &'a mut Document,
        options: MorphOptions<'h>,
        host: &'a mut dyn Host,
    ) -> Self {
        Self {
            doc,
            target,
            options,
            host,
            graveyard: Vec::new(),
        }
    }

    /// Patch `from` against `to` and everything below them. Returns the live
    /// root, which differs from `from` only when the root was swapped.
    pub(crate) fn run(mut self, from: NodeId, to: NodeId) -> Result<NodeId, MorphError> {
        let result = self.drive(from, to);
        self.finish();
        result
    }

    fn drive(&mut self, from: NodeId, to: NodeId) -> Result<NodeId, MorphError> {
        let mut stack = Vec::new();
        let root = match self.patch(from, to, &mut stack)? {
            Patched::Swapped(clone) => clone,
            Patched::InPlace | Patched::Skipped => from,
        };

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Patch { from, to } => {
                    self.patch(from, to, &mut stack)?;
                }
                Frame::Children(mut walk) => {
                    if let Some(nested) = walk.step(self)? {
                        stack.push(Frame::Children(walk));
                        stack.push(nested);
                    }
                }
            }
        }
        Ok(root)
    }

    /// Free every buried node that nobody put back into a tree.
    fn finish(&mut self) {
        for id in std::mem::take(&mut self.graveyard) {
            if id != self.doc.root && self.doc.contains(id) && self.doc.parent(id).is_none() {
                self.doc.discard(id);
            }
        }
    }

    pub(crate) fn bury(&mut self, id: NodeId) {
        self.graveyard.push(id);
    }

    pub(crate) fn walk(&self, from: Region, to: Region) -> ChildrenWalk {
        ChildrenWalk::new(self.doc, self.target, &self.options.key, from, to)
    }

    pub(crate) fn patch(
        &mut self,
        from: NodeId,
        to: NodeId,
        stack: &mut Vec<Frame>,
    ) -> Result<Patched, MorphError> {
        if self.differs(from, to) {
            return self.swap(from, to);
        }

        let update = self
            .options
            .hooks
            .updating(self.doc.node(from), self.target.node(to));
        if update.is_skipped() {
            trace!("update of {:?} skipped by hook", from);
            return Ok(Patched::Skipped);
        }

        if let Some(wanted) = self.target.text(to) {
            if self.doc.text(from) != Some(wanted) {
                self.doc.set_text(from, wanted);
            }
            self.options
                .hooks
                .updated(self.doc.node(from), self.target.node(to));
            return Ok(Patched::InPlace);
        }

        if self.doc.is_element(from) {
            self.host.seed_clone(self.doc, from, self.target, to);
            if !update.is_children_only() {
                self.patch_attributes(from, to);
            }
        }

        self.options
            .hooks
            .updated(self.doc.node(from), self.target.node(to));

        if update.is_skipping_children() {
            return Ok(Patched::InPlace);
        }

        stack.push(Frame::Children(
            self.walk(Region::Parent(from), Region::Parent(to)),
        ));
        // Teleported content is patched against its counterpart before the
        // origin's own children.
        if let (Some(live), Some(wanted)) = (self.doc.teleport(from), self.target.teleport(to))
            && live != from
            && wanted != to
            && self.doc.contains(live)
            && self.target.contains(wanted)
        {
            stack.push(Frame::Patch {
                from: live,
                to: wanted,
            });
        }
        Ok(Patched::InPlace)
    }

    /// Whether `from` has to be replaced rather than updated: a different
    /// node type, tag, namespace or key.
    fn differs(&self, from: NodeId, to: NodeId) -> bool {
        let (live, wanted) = (self.doc.get(from), self.target.get(to));
        let same_shape = match (&live.kind, &wanted.kind) {
            (NodeKind::Element(a), NodeKind::Element(b)) => a.tag == b.tag && live.ns == wanted.ns,
            (NodeKind::Text(_), NodeKind::Text(_))
            | (NodeKind::Comment(_), NodeKind::Comment(_))
            | (NodeKind::Document, NodeKind::Document) => true,
            _ => false,
        };
        !same_shape
            || key_of(&self.options.key, self.doc, from)
                != key_of(&self.options.key, self.target, to)
    }

    fn swap(&mut self, from: NodeId, to: NodeId) -> Result<Patched, MorphError> {
        if self.options.hooks.removing(self.doc.node(from)).is_skipped() {
            debug!("swap of {:?} vetoed by removing hook", from);
            return Ok(Patched::Skipped);
        }
        if self.doc.parent(from).is_none() {
            return Err(MorphError::DetachedRoot);
        }

        let clone = self.doc.import(self.target, to);
        if self.options.hooks.adding(self.doc.node(clone)).is_skipped() {
            debug!("swap of {:?} vetoed by adding hook", from);
            self.bury(clone);
            return Ok(Patched::Skipped);
        }

        debug!("swapping {:?} for {:?}", from, clone);
        self.doc.replace(from, clone);
        self.host.init_tree(self.doc, clone);
        self.options.hooks.removed(self.doc.node(from));
        self.options.hooks.added(self.doc.node(clone));
        self.bury(from);
        Ok(Patched::Swapped(clone))
    }

    /// Make the attribute set of `from` equal to that of `to`.
    fn patch_attributes(&mut self, from: NodeId, to: NodeId) {
        // A running transition or visibility toggle owns the attributes for now
        if self.doc.is_transitioning(from) || self.doc.is_shown(from) != self.target.is_shown(to) {
            trace!("attributes of {:?} left to a running transition", from);
            return;
        }

        let NodeKind::Element(wanted) = &self.target.get(to).kind else {
            return;
        };
        let NodeKind::Element(live) = &mut self.doc.get_mut(from).kind else {
            return;
        };

        live.attrs.retain(|name, _| wanted.attrs.contains_key(name));
        for (name, value) in &wanted.attrs {
            if live.attrs.get(name) != Some(value) {
                live.attrs.insert(name.clone(), value.clone());
            }
        }
    }

    /// Clone the target node `to` into the live tree, subject to the
    /// `adding` hook. Returns the inserted clone.
    pub(crate) fn insert_clone(
        &mut self,
        region: Region,
        to: NodeId,
        at: Insertion,
    ) -> Option<NodeId> {
        let clone = self.doc.import(self.target, to);
        if self.options.hooks.adding(self.doc.node(clone)).is_skipped() {
            trace!("insertion of {:?} vetoed by adding hook", to);
            self.bury(clone);
            return None;
        }

        match at {
            Insertion::Append => region.append(self.doc, clone),
            Insertion::Before(reference) => region.insert_before(self.doc, clone, reference),
        }
        self.host.init_tree(self.doc, clone);
        self.options.hooks.added(self.doc.node(clone));
        Some(clone)
    }
}
