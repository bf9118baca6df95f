use derive_more::{Display, From};
use snafu::Snafu;

use crate::path::TreePath;

/// Handle to a node stored in a [`TreeNodes`] implementation.
///
/// A handle may be dangling, in which case [`TreeNodes::node_path`] returns
/// `None` for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("#{_0}")]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Read access to the nodes of a directory tree.
pub trait TreeNodes {
    type Path: TreePath;

    /// Path of a live node, `None` when the handle does not resolve.
    fn node_path(&self, node: NodeId) -> Option<&Self::Path>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Number of children the node claims to have.
    fn num_children(&self, node: NodeId) -> usize;

    /// Child stored at `index`.
    fn child(&self, node: NodeId, index: usize) -> Result<NodeId, ChildLookupError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
pub enum ChildLookupError {
    #[snafu(display("Child index {} is out of range for {} children", index, len))]
    OutOfRange { index: usize, len: usize },
    #[snafu(display("Child slot {} is empty", index))]
    Vacant { index: usize },
}
