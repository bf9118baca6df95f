//! Directory tree manager built on the node arena.
//!
//! Every mutation keeps children sorted and runs the tree checker in debug
//! builds afterwards.

mod tree;

pub use tree::{DirectoryTree, TreeError};
