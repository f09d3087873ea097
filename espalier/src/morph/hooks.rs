//! Lifecycle hooks invoked around every mutation the morph engine makes.
//!
//! `updating`, `removing` and `adding` run before the mutation and can veto
//! it through the handle they receive; `updated`, `removed` and `added`
//! report what happened. The engine checks a veto immediately after the hook
//! returns and never applies part of a vetoed step.

use crate::dom::NodeRef;

/// Veto handle passed to `removing` and `adding`.
#[derive(Debug, Default)]
pub struct Skip {
    skipped: bool,
}

impl Skip {
    /// Leave the node alone.
    pub fn skip(&mut self) {
        self.skipped = true;
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }
}

/// Control handle passed to `updating`.
#[derive(Debug, Default)]
pub struct Update {
    skip: bool,
    children_only: bool,
    skip_children: bool,
}

impl Update {
    /// Leave the node and its whole subtree untouched.
    pub fn skip(&mut self) {
        self.skip = true;
    }

    /// Do not patch this node's attributes, but still reconcile its children.
    pub fn children_only(&mut self) {
        self.children_only = true;
    }

    /// Patch this node's attributes but leave its children alone.
    pub fn skip_children(&mut self) {
        self.skip_children = true;
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    pub fn is_children_only(&self) -> bool {
        self.children_only
    }

    pub fn is_skipping_children(&self) -> bool {
        self.skip_children
    }
}

pub type UpdatingHook<'h> = Box<dyn FnMut(NodeRef<'_>, NodeRef<'_>, &mut Update) + 'h>;
pub type UpdatedHook<'h> = Box<dyn FnMut(NodeRef<'_>, NodeRef<'_>) + 'h>;
pub type VetoHook<'h> = Box<dyn FnMut(NodeRef<'_>, &mut Skip) + 'h>;
pub type NotifyHook<'h> = Box<dyn FnMut(NodeRef<'_>) + 'h>;

/// The six user callbacks. Unset hooks are no-ops.
#[derive(Default)]
pub struct Hooks<'h> {
    pub(crate) updating: Option<UpdatingHook<'h>>,
    pub(crate) updated: Option<UpdatedHook<'h>>,
    pub(crate) removing: Option<VetoHook<'h>>,
    pub(crate) removed: Option<NotifyHook<'h>>,
    pub(crate) adding: Option<VetoHook<'h>>,
    pub(crate) added: Option<NotifyHook<'h>>,
}

impl Hooks<'_> {
    pub(crate) fn updating(&mut self, from: NodeRef<'_>, to: NodeRef<'_>) -> Update {
        let mut update = Update::default();
        if let Some(hook) = &mut self.updating {
            hook(from, to, &mut update);
        }
        update
    }

    pub(crate) fn updated(&mut self, from: NodeRef<'_>, to: NodeRef<'_>) {
        if let Some(hook) = &mut self.updated {
            hook(from, to);
        }
    }

    pub(crate) fn removing(&mut self, node: NodeRef<'_>) -> Skip {
        let mut skip = Skip::default();
        if let Some(hook) = &mut self.removing {
            hook(node, &mut skip);
        }
        skip
    }

    pub(crate) fn removed(&mut self, node: NodeRef<'_>) {
        if let Some(hook) = &mut self.removed {
            hook(node);
        }
    }

    pub(crate) fn adding(&mut self, node: NodeRef<'_>) -> Skip {
        let mut skip = Skip::default();
        if let Some(hook) = &mut self.adding {
            hook(node, &mut skip);
        }
        skip
    }

    pub(crate) fn added(&mut self, node: NodeRef<'_>) {
        if let Some(hook) = &mut self.added {
            hook(node);
        }
    }
}

impl std::fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("updating", &self.updating.is_some())
            .field("updated", &self.updated.is_some())
            .field("removing", &self.removing.is_some())
            .field("removed", &self.removed.is_some())
            .field("adding", &self.adding.is_some())
            .field("added", &self.added.is_some())
            .finish()
    }
}
