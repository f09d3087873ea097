//! In-place DOM morphing.
//!
//! [`morph`] mutates a live subtree until it matches a target tree while
//! keeping as many live nodes as possible: matching nodes are updated in
//! place, keyed nodes are moved rather than recreated, and only what is
//! genuinely new gets cloned in from the target.
//!
//! ```rust
//! use espalier::{MorphOptions, morph, parse_fragment};
//!
//! let mut doc = parse_fragment(r#"<ul><li key="a">A</li><li key="b">B</li></ul>"#);
//! let ul = doc.first_element_child(doc.root).unwrap();
//! let b = doc.children(ul).nth(1).unwrap();
//!
//! morph(&mut doc, ul, r#"<ul><li key="b">B!</li><li key="a">A</li></ul>"#, MorphOptions::new()).unwrap();
//!
//! assert_eq!(doc.to_html(), r#"<ul><li key="b">B!</li><li key="a">A</li></ul>"#);
//! assert_eq!(doc.children(ul).next(), Some(b));
//! ```

mod block;
mod children;
mod hooks;
mod host;
mod key;
mod options;
mod patch;

pub use block::{BLOCK_END, BLOCK_START, Block, is_block_end, is_block_start};
pub use hooks::{Hooks, NotifyHook, Skip, Update, UpdatedHook, UpdatingHook, VetoHook};
pub use host::{Host, NoHost};
pub use key::{KEY_ATTRIBUTE, KeyFn, attribute_key};
pub use options::MorphOptions;

use indextree::NodeId;

use crate::dom::Document;
use crate::parser::parse_template_contents;
use patch::Patcher;

/// Which tree a malformed region was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Live,
    Target,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Live => f.write_str("live"),
            Side::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MorphError {
    /// A block start marker has no matching end marker among its siblings.
    #[error("block start marker without a matching end marker in the {side} tree")]
    UnbalancedBlock { side: Side },

    /// The target markup contains no element to morph into.
    #[error("target markup contains no element")]
    EmptyTarget,

    /// The live root has to be replaced but has no parent to be replaced in.
    #[error("cannot replace a live root that has no parent")]
    DetachedRoot,

    /// A node id that does not belong to the document it was used with.
    #[error("node {0:?} is not part of the document")]
    UnknownNode(NodeId),
}

/// The tree a live subtree is morphed into.
#[derive(Debug)]
pub enum MorphTarget<'t> {
    /// Markup, parsed like template contents; its first element is the
    /// target root.
    Html(&'t str),
    /// A whole document; its `root` is the target root.
    Document(Document),
    /// A specific node of a document.
    Node(Document, NodeId),
}

impl<'t> From<&'t str> for MorphTarget<'t> {
    fn from(html: &'t str) -> Self {
        MorphTarget::Html(html)
    }
}

impl<'t> From<&'t String> for MorphTarget<'t> {
    fn from(html: &'t String) -> Self {
        MorphTarget::Html(html)
    }
}

impl From<Document> for MorphTarget<'_> {
    fn from(doc: Document) -> Self {
        MorphTarget::Document(doc)
    }
}

impl From<(Document, NodeId)> for MorphTarget<'_> {
    fn from((doc, node): (Document, NodeId)) -> Self {
        MorphTarget::Node(doc, node)
    }
}

impl MorphTarget<'_> {
    fn into_tree(self) -> Result<(Document, NodeId), MorphError> {
        match self {
            MorphTarget::Html(html) => {
                let doc = parse_template_contents(html);
                let root = doc
                    .first_element_child(doc.root)
                    .ok_or(MorphError::EmptyTarget)?;
                Ok((doc, root))
            }
            MorphTarget::Document(doc) => {
                let root = doc.root;
                Ok((doc, root))
            }
            MorphTarget::Node(doc, node) => {
                if !doc.contains(node) {
                    return Err(MorphError::UnknownNode(node));
                }
                Ok((doc, node))
            }
        }
    }
}

/// Morph the live subtree rooted at `from` into `to`.
///
/// Returns the live root afterwards. That is `from` itself unless the root
/// had to be replaced because its tag or key changed.
pub fn morph<'t>(
    doc: &mut Document,
    from: NodeId,
    to: impl Into<MorphTarget<'t>>,
    options: MorphOptions<'_>,
) -> Result<NodeId, MorphError> {
    morph_with_host(doc, from, to, options, &mut NoHost)
}

/// [`morph`] with a reactive host that seeds state, initializes inserted
/// subtrees and resolves scopes.
pub fn morph_with_host<'t>(
    doc: &mut Document,
    from: NodeId,
    to: impl Into<MorphTarget<'t>>,
    options: MorphOptions<'_>,
    host: &mut dyn Host,
) -> Result<NodeId, MorphError> {
    if !doc.contains(from) {
        return Err(MorphError::UnknownNode(from));
    }
    let (mut target, to) = to.into().into_tree()?;

    // State living on an ancestor outside the morphed subtree still applies
    if doc.scope(from).is_none()
        && let Some(scope) = host.closest_scope(doc, from)
    {
        target.set_scope(to, scope);
        host.seed_clone(doc, from, &mut target, to);
    }

    debug!("morph {:?} (lookahead: {})", from, options.lookahead);
    let root = Patcher::new(doc, &mut target, options, host).run(from, to)?;
    debug!("morph done, root {:?}", root);
    Ok(root)
}
