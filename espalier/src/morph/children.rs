//! Children reconciliation.
//!
//! Two cursors walk the live and target children of a [`Region`] left to
//! right. Each step either recurses (a nested patch or a nested block),
//! creates DOM for a target node, or moves a keyed live node into place.
//! Keyed live nodes that are in the way get detached into a holdover table
//! so a later target sibling with the same key can pick them up again.

use indexmap::IndexMap;
use indextree::NodeId;
use rapidhash::RapidHashMap;
use smallvec::SmallVec;

use super::block::{Block, Region, is_block_end, is_block_start};
use super::key::{KeyFn, key_of};
use super::patch::{Frame, Insertion, Patcher};
use super::{MorphError, Side};
use crate::dom::Document;

pub(crate) struct ChildrenWalk {
    from: Region,
    to: Region,
    cur_from: Option<NodeId>,
    cur_to: Option<NodeId>,
    /// Keyed live nodes of this region, first occurrence of a key wins.
    index: RapidHashMap<String, NodeId>,
    /// Keyed live nodes detached during this walk, waiting to be reclaimed.
    holdovers: IndexMap<String, NodeId>,
}

impl ChildrenWalk {
    pub(crate) fn new(
        doc: &Document,
        target: &Document,
        key: &KeyFn<'_>,
        from: Region,
        to: Region,
    ) -> Self {
        Self {
            from,
            to,
            cur_from: from.first(doc),
            cur_to: to.first(target),
            index: key_index(doc, key, from),
            holdovers: IndexMap::new(),
        }
    }

    /// Advance until the walk needs a nested frame, which is returned. `None`
    /// means the region is done and cleaned up.
    pub(crate) fn step(&mut self, p: &mut Patcher<'_, '_>) -> Result<Option<Frame>, MorphError> {
        loop {
            let Some(to_node) = self.cur_to else {
                self.remove_leftovers(p);
                return Ok(None);
            };
            // Teleported content is patched together with its origin
            if p.target.parent(to_node) != self.to.parent(p.target) {
                self.cur_to = self.to.next(p.target, to_node);
                continue;
            }

            let Some(mut from_node) = self.cur_from else {
                self.cur_to = self.to.next(p.target, to_node);
                let held = key_of(&p.options.key, p.target, to_node)
                    .and_then(|key| self.holdovers.shift_remove(&key));
                if let Some(held) = held {
                    debug!("reusing held over {:?}", held);
                    self.from.append(p.doc, held);
                    return Ok(Some(Frame::Patch {
                        from: held,
                        to: to_node,
                    }));
                }
                p.insert_clone(self.from, to_node, Insertion::Append);
                continue;
            };
            if p.doc.parent(from_node) != self.from.parent(p.doc) {
                self.cur_from = self.from.next(p.doc, from_node);
                continue;
            }

            if is_block_start(p.doc, from_node) && is_block_start(p.target, to_node) {
                let from_end = self
                    .from
                    .block_end(p.doc, from_node)
                    .ok_or(MorphError::UnbalancedBlock { side: Side::Live })?;
                let to_end = self
                    .to
                    .block_end(p.target, to_node)
                    .ok_or(MorphError::UnbalancedBlock { side: Side::Target })?;
                trace!("entering block {:?}..{:?}", from_node, from_end);
                // The end markers are patched like any other comment once the
                // nested walk returns.
                self.cur_from = Some(from_end);
                self.cur_to = Some(to_end);
                return Ok(Some(Frame::Children(p.walk(
                    Region::Block(Block::new(from_node, from_end)),
                    Region::Block(Block::new(to_node, to_end)),
                ))));
            }

            if p.options.lookahead
                && p.doc.is_element(from_node)
                && !p.doc.is_equal_node(from_node, p.target, to_node)
                && self.equal_ahead(p, from_node, to_node)
                && let Some(clone) = p.insert_clone(self.from, to_node, Insertion::Before(from_node))
            {
                trace!("lookahead placed {:?} before {:?}", clone, from_node);
                from_node = clone;
            }

            let from_key = key_of(&p.options.key, p.doc, from_node);
            let to_key = key_of(&p.options.key, p.target, to_node);
            match (to_key, from_key) {
                (None, Some(from_key)) => {
                    self.set_aside(p, from_node, to_node, from_key);
                    continue;
                }
                (Some(to_key), None) => {
                    if let Some(keyed) = self.reclaim(p, &to_key) {
                        self.from.insert_before(p.doc, keyed, from_node);
                        from_node = keyed;
                    }
                }
                (Some(to_key), Some(from_key)) if to_key != from_key => {
                    match self.reclaim(p, &to_key) {
                        Some(keyed) => {
                            p.doc.replace(from_node, keyed);
                            self.hold_over(p, from_key, from_node);
                            from_node = keyed;
                        }
                        None => {
                            self.set_aside(p, from_node, to_node, from_key);
                            continue;
                        }
                    }
                }
                _ => {}
            }

            if let Some(key) = key_of(&p.options.key, p.doc, from_node)
                && self.index.get(&key) == Some(&from_node)
            {
                self.index.remove(&key);
            }

            // Computed before patching: a swap replaces `from_node` in place
            self.cur_from = self.from.next(p.doc, from_node);
            self.cur_to = self.to.next(p.target, to_node);
            return Ok(Some(Frame::Patch {
                from: from_node,
                to: to_node,
            }));
        }
    }

    /// Whether a later target sibling is structurally equal to `from_node`.
    fn equal_ahead(&self, p: &Patcher<'_, '_>, from_node: NodeId, to_node: NodeId) -> bool {
        let parent = self.to.parent(p.target);
        let mut ahead = self.to.next(p.target, to_node);
        while let Some(candidate) = ahead {
            if p.target.parent(candidate) == parent
                && p.doc.is_equal_node(from_node, p.target, candidate)
            {
                return true;
            }
            ahead = self.to.next(p.target, candidate);
        }
        false
    }

    /// Put a clone of `to_node` where the keyed `from_node` is and hold the
    /// live node over under its key.
    fn set_aside(&mut self, p: &mut Patcher<'_, '_>, from_node: NodeId, to_node: NodeId, key: String) {
        let after = self.from.next(p.doc, from_node);
        p.insert_clone(self.from, to_node, Insertion::Before(from_node));
        p.doc.detach(from_node);
        trace!("holding over {:?} under {:?}", from_node, key);
        self.hold_over(p, key, from_node);
        self.cur_from = after;
        self.cur_to = self.to.next(p.target, to_node);
    }

    fn hold_over(&mut self, p: &mut Patcher<'_, '_>, key: String, node: NodeId) {
        if let Some(previous) = self.holdovers.insert(key, node)
            && previous != node
            && p.doc.parent(previous).is_none()
        {
            p.options.hooks.removed(p.doc.node(previous));
            p.bury(previous);
        }
    }

    /// A live node with `key` that can be moved to the cursor: a held over
    /// node first, then an untouched sibling further along.
    fn reclaim(&mut self, p: &Patcher<'_, '_>, key: &str) -> Option<NodeId> {
        if let Some(held) = self.holdovers.shift_remove(key) {
            debug!("reclaiming held over {:?} for key {:?}", held, key);
            return Some(held);
        }
        let node = self.index.remove(key)?;
        if !p.doc.contains(node) || p.doc.parent(node) != self.from.parent(p.doc) {
            return None;
        }
        debug!("moving keyed {:?} into place for key {:?}", node, key);
        Some(node)
    }

    /// Remove what the target no longer has, then drop unclaimed holdovers.
    fn remove_leftovers(&mut self, p: &mut Patcher<'_, '_>) {
        let parent = self.from.parent(p.doc);
        let mut leftovers: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut cursor = self.cur_from.take();
        while let Some(node) = cursor {
            cursor = self.from.next(p.doc, node);
            // A teleport may lead the cursor out of the region
            if p.doc.parent(node) == parent {
                leftovers.push(node);
            }
        }

        for node in leftovers {
            if p.options.hooks.removing(p.doc.node(node)).is_skipped() {
                trace!("removal of {:?} vetoed by hook", node);
                continue;
            }
            debug!("removing {:?}", node);
            p.doc.detach(node);
            p.options.hooks.removed(p.doc.node(node));
            p.bury(node);
        }

        for (_, node) in self.holdovers.drain(..) {
            if p.doc.contains(node) && p.doc.parent(node).is_none() {
                debug!("dropping unclaimed holdover {:?}", node);
                p.options.hooks.removed(p.doc.node(node));
                p.bury(node);
            }
        }
    }
}

/// Keyed live nodes of `region`, skipping the contents of nested blocks,
/// which reconcile on their own.
fn key_index(doc: &Document, key: &KeyFn<'_>, region: Region) -> RapidHashMap<String, NodeId> {
    let mut index = RapidHashMap::default();
    let parent = region.parent(doc);
    let mut depth = 0usize;
    let mut cursor = region.first(doc);
    while let Some(node) = cursor {
        cursor = region.next(doc, node);
        // Teleport destinations belong to another parent
        if doc.parent(node) != parent {
            continue;
        }
        if is_block_start(doc, node) {
            depth += 1;
        } else if is_block_end(doc, node) {
            depth = depth.saturating_sub(1);
        } else if depth == 0
            && let Some(k) = key_of(key, doc, node)
        {
            index.entry(k).or_insert(node);
        }
    }
    index
}
