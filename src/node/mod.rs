//! Node handles, the read-only node interface consumed by the checker, and
//! the arena that stores nodes for the directory tree.

mod arena;
mod tree_nodes;

pub use arena::NodeArena;
pub use tree_nodes::{ChildLookupError, NodeId, TreeNodes};
