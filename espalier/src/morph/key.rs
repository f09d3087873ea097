//! Node identity keys.

use indextree::NodeId;

use crate::dom::{Document, NodeRef};

/// Derives a stable identity key for an element. `None` means unkeyed.
pub type KeyFn<'h> = Box<dyn Fn(NodeRef<'_>) -> Option<String> + 'h>;

/// Attribute read by the default key extractor.
pub const KEY_ATTRIBUTE: &str = "key";

/// Default key extractor: the value of the `key` attribute.
pub fn attribute_key(node: NodeRef<'_>) -> Option<String> {
    node.attr(KEY_ATTRIBUTE).map(str::to_owned)
}

/// Key of `id` as seen by the reconciler. Only elements are keyed, and an
/// empty key counts as no key.
pub(crate) fn key_of(extract: &KeyFn<'_>, doc: &Document, id: NodeId) -> Option<String> {
    if !doc.is_element(id) {
        return None;
    }
    extract(doc.node(id)).filter(|key| !key.is_empty())
}
