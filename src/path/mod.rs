//! Hierarchical paths as seen by the tree and its checker.
//!
//! The checker only relies on the [`TreePath`] trait; [`DtPath`] is the
//! slash-separated implementation used by the directory tree and manifests.

mod dt_path;
mod tree_path;

pub use dt_path::{DtPath, PathError};
pub use tree_path::TreePath;
