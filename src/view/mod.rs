//! Presentation adapters.
//!
//! Plain data derived from the store for whatever draws it: the bug list
//! ([`tree`]) and per-file inline markers ([`decoration`]). Both are
//! recomputed from the store on demand; they hold no state of their own.

pub mod decoration;
pub mod tree;

pub use decoration::{Decoration, decorations_for};
pub use tree::{JumpTarget, TreeItem, build_items, build_tree};
