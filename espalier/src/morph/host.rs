//! Hooks into the reactive framework that owns the live DOM.
//!
//! The morph engine never evaluates anything itself. It asks the host to
//! carry runtime state onto target nodes before they are compared, to
//! initialize subtrees it has just inserted, and to resolve the scope a node
//! lives in.

use indextree::NodeId;

use crate::dom::{Document, ScopeId};

pub trait Host {
    /// Seed runtime state of the live node `from` onto the target node `to`
    /// so the target renders the same way the live node does.
    ///
    /// The default copies the reactive scope and the visibility flag when the
    /// target does not have its own.
    fn seed_clone(&mut self, live: &Document, from: NodeId, target: &mut Document, to: NodeId) {
        if target.scope(to).is_none()
            && let Some(scope) = live.scope(from)
        {
            target.set_scope(to, scope);
        }
        if target.state(to).and_then(|s| s.shown).is_none()
            && let Some(shown) = live.state(from).and_then(|s| s.shown)
        {
            target.set_shown(to, shown);
        }
    }

    /// Initialize a subtree that was just inserted into the live document.
    fn init_tree(&mut self, doc: &mut Document, node: NodeId) {
        let _ = (doc, node);
    }

    /// Nearest reactive scope at or above `node`.
    fn closest_scope(&self, doc: &Document, node: NodeId) -> Option<ScopeId> {
        node.ancestors(&doc.arena).find_map(|id| doc.scope(id))
    }
}

/// Host that relies on every default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHost;

impl Host for NoHost {}
