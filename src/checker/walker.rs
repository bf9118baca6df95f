use std::collections::HashSet;

use crate::checker::Violation;
use crate::node::{NodeId, TreeNodes};
use crate::path::TreePath;

/// Lazy pre-order walk over the nodes reachable from a start node.
///
/// A node's children are fetched only when the walk moves past it, so a
/// caller can inspect each yielded node before its children are touched.
/// Faults found while expanding a node, and nodes reached a second time, are
/// yielded as `Err`; the walk carries on with the remaining nodes.
pub struct PreOrder<'t, T: TreeNodes + ?Sized> {
    tree: &'t T,
    stack: Vec<NodeId>,
    pending: Option<NodeId>,
    visited: HashSet<NodeId>,
}

impl<'t, T: TreeNodes + ?Sized> PreOrder<'t, T> {
    pub fn new(tree: &'t T, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![start],
            pending: None,
            visited: HashSet::new(),
        }
    }

    /// Pushes the children of `node` and returns the fault at the lowest
    /// failing index, if any.
    fn expand(&mut self, node: NodeId) -> Option<Violation> {
        let claimed = self.tree.num_children(node);
        let mut fault = None;

        for index in (0..claimed).rev() {
            match self.tree.child(node, index) {
                Ok(child) => self.stack.push(child),
                Err(cause) => {
                    fault = Some(Violation::from_lookup(
                        &pathname_of(self.tree, node),
                        claimed,
                        index,
                        cause,
                    ));
                }
            }
        }

        fault
    }
}

impl<T: TreeNodes + ?Sized> Iterator for PreOrder<'_, T> {
    type Item = Result<NodeId, Violation>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(node) = self.pending.take() {
            if let Some(fault) = self.expand(node) {
                return Some(Err(fault));
            }
        }

        let node = self.stack.pop()?;
        if !self.visited.insert(node) {
            return Some(Err(Violation::NodeRevisited {
                path: pathname_of(self.tree, node),
            }));
        }

        self.pending = Some(node);
        Some(Ok(node))
    }
}

/// Pathname of a node for diagnostics, with a placeholder for dangling
/// handles.
pub(crate) fn pathname_of<T: TreeNodes + ?Sized>(tree: &T, node: NodeId) -> String {
    tree.node_path(node)
        .map(|path| path.pathname().to_string())
        .unwrap_or_else(|| format!("<null {node}>"))
}
