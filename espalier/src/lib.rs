//! In-place DOM morphing over an arena tree.
//!
//! espalier provides:
//! - **Arena DOM**: `indextree`-backed document with a per-node side table for
//!   runtime state (reactive scope, transitions, teleports)
//! - **Parsing**: Browser-compatible HTML5 parsing via html5ever with full error recovery
//! - **Serialization**: HTML5-correct serialization with proper escaping
//! - **Morphing**: patch a live subtree into the shape of a target tree while
//!   keeping node identity, with keyed moves, lookahead, conditional blocks
//!   and veto hooks
//!
//! # Example
//!
//! ```rust
//! use espalier::{MorphOptions, morph, parse_fragment};
//!
//! let mut doc = parse_fragment(r#"<div class="card"><span>old</span></div>"#);
//! let card = doc.first_element_child(doc.root).unwrap();
//! let span = doc.first_child(card).unwrap();
//!
//! let root = morph(
//!     &mut doc,
//!     card,
//!     r#"<div class="card active"><span>new</span></div>"#,
//!     MorphOptions::new(),
//! )
//! .unwrap();
//!
//! assert_eq!(root, card);
//! assert_eq!(doc.first_child(card), Some(span));
//! assert_eq!(doc.to_html(), r#"<div class="card active"><span>new</span></div>"#);
//! ```

#[macro_use]
mod tracing_macros;

pub mod dom;
pub mod morph;
mod parser;
pub mod serialize;
mod stem;

pub use stem::Stem;

// Re-export parsing functions
pub use parser::{parse_document, parse_fragment, parse_template_contents};

// Re-export serialization
pub use serialize::{SerializeOptions, serialize_children, serialize_node};

// Re-export DOM types at crate root for convenience
pub use dom::{Document, ElementData, Namespace, NodeData, NodeKind, NodeRef, NodeState, ScopeId};

pub use morph::{
    Block, Host, MorphError, MorphOptions, MorphTarget, NoHost, Side, Skip, Update, morph,
    morph_with_host,
};

pub use indextree::NodeId;
pub use tendril::StrTendril;
