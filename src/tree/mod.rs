//! Content tree handed to the engine by the outline provider.
//!
//! Nodes are owned by value; `LayoutTree::new` assigns path ids to anonymous
//! nodes and rejects trees the packer could not handle.

mod core;

pub use core::{LayoutNode, LayoutTree, NodeId};
