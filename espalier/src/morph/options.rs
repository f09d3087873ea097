//! Morph configuration.

use super::hooks::{Hooks, Skip, Update};
use super::key::{KeyFn, attribute_key};
use crate::dom::NodeRef;

/// Options for a single `morph` call.
///
/// Built with a consuming builder:
///
/// ```rust
/// use espalier::MorphOptions;
///
/// let options = MorphOptions::new()
///     .lookahead(true)
///     .key(|node| node.attr("id").map(str::to_owned))
///     .removing(|node, skip| {
///         if node.attr("data-keep").is_some() {
///             skip.skip();
///         }
///     });
/// # let _ = options;
/// ```
pub struct MorphOptions<'h> {
    pub(crate) key: KeyFn<'h>,
    pub(crate) lookahead: bool,
    pub(crate) hooks: Hooks<'h>,
}

impl Default for MorphOptions<'_> {
    fn default() -> Self {
        Self {
            key: Box::new(attribute_key),
            lookahead: false,
            hooks: Hooks::default(),
        }
    }
}

impl<'h> MorphOptions<'h> {
    /// Default options: `key` attribute identity, no lookahead, no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the key extractor.
    pub fn key(mut self, key: impl Fn(NodeRef<'_>) -> Option<String> + 'h) -> Self {
        self.key = Box::new(key);
        self
    }

    /// Scan ahead for structurally equal siblings before recreating nodes.
    /// Worst case quadratic in the number of siblings.
    pub fn lookahead(mut self, lookahead: bool) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn updating(
        mut self,
        hook: impl FnMut(NodeRef<'_>, NodeRef<'_>, &mut Update) + 'h,
    ) -> Self {
        self.hooks.updating = Some(Box::new(hook));
        self
    }

    pub fn updated(mut self, hook: impl FnMut(NodeRef<'_>, NodeRef<'_>) + 'h) -> Self {
        self.hooks.updated = Some(Box::new(hook));
        self
    }

    pub fn removing(mut self, hook: impl FnMut(NodeRef<'_>, &mut Skip) + 'h) -> Self {
        self.hooks.removing = Some(Box::new(hook));
        self
    }

    pub fn removed(mut self, hook: impl FnMut(NodeRef<'_>) + 'h) -> Self {
        self.hooks.removed = Some(Box::new(hook));
        self
    }

    pub fn adding(mut self, hook: impl FnMut(NodeRef<'_>, &mut Skip) + 'h) -> Self {
        self.hooks.adding = Some(Box::new(hook));
        self
    }

    pub fn added(mut self, hook: impl FnMut(NodeRef<'_>) + 'h) -> Self {
        self.hooks.added = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for MorphOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MorphOptions")
            .field("lookahead", &self.lookahead)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
