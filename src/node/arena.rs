use std::cmp::Ordering;

use tracing::trace;

use crate::node::{ChildLookupError, NodeId, TreeNodes};
use crate::path::TreePath;

#[derive(Debug, Clone)]
struct NodeEntry<P> {
    path: P,
    parent: Option<NodeId>,
    children: Vec<Option<NodeId>>,
    reported_children: Option<usize>,
}

/// Slot-based node storage.
///
/// Linking is explicit: [`NodeArena::insert`] creates a detached node and the
/// caller wires parents and children. Nothing here enforces the tree
/// invariants, so the arena can also hold malformed trees for the checker to
/// diagnose. Removed slots are never reused and their handles dangle.
#[derive(Debug, Clone)]
pub struct NodeArena<P> {
    slots: Vec<Option<NodeEntry<P>>>,
    live: usize,
}

impl<P> Default for NodeArena<P> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }
}

impl<P: TreePath> NodeArena<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes, reachable or not.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn insert(&mut self, path: P) -> NodeId {
        let id = NodeId::new(self.slots.len());
        self.slots.push(Some(NodeEntry {
            path,
            parent: None,
            children: Vec::new(),
            reported_children: None,
        }));
        self.live += 1;
        id
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.entry(node).is_some()
    }

    /// Appends `child` to the children of `parent` and points it back.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.push(Some(child));
        }
        self.set_parent(child, Some(parent));
    }

    /// Inserts `child` into the children of `parent` at the position that
    /// keeps them sorted, and points it back. Returns the position used.
    pub fn attach_sorted(&mut self, parent: NodeId, child: NodeId) -> usize {
        let index = match self.node_path(child) {
            Some(path) => self.sorted_position(parent, path),
            None => self.children(parent).len(),
        };
        self.insert_child(parent, index, Some(child));
        self.set_parent(child, Some(parent));
        index
    }

    /// Inserts a raw slot without touching the child's parent link.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: Option<NodeId>) {
        if let Some(entry) = self.entry_mut(parent) {
            let index = index.min(entry.children.len());
            entry.children.insert(index, child);
        }
    }

    pub fn push_vacant_child(&mut self, parent: NodeId) {
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.push(None);
        }
    }

    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        if let Some(entry) = self.entry_mut(node) {
            entry.parent = parent;
        }
    }

    /// Makes [`TreeNodes::num_children`] report `count` instead of the
    /// number of stored slots. `None` restores the real count.
    pub fn override_child_count(&mut self, node: NodeId, count: Option<usize>) {
        if let Some(entry) = self.entry_mut(node) {
            entry.reported_children = count;
        }
    }

    /// Stored child slots of a node, empty for dangling handles.
    pub fn children(&self, node: NodeId) -> &[Option<NodeId>] {
        self.entry(node)
            .map(|entry| entry.children.as_slice())
            .unwrap_or_default()
    }

    /// Finds the child of `parent` whose path compares equal to `path`.
    pub fn find_child(&self, parent: NodeId, path: &P) -> Option<NodeId> {
        let children = self.children(parent);
        children
            .binary_search_by(|slot| self.compare_slot(*slot, path))
            .ok()
            .and_then(|index| children[index])
    }

    /// Removes `child` from the children of `parent`, leaving `child` itself
    /// in place.
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(entry) = self.entry_mut(parent) else {
            return false;
        };
        match entry.children.iter().position(|slot| *slot == Some(child)) {
            Some(index) => {
                entry.children.remove(index);
                true
            }
            None => false,
        }
    }

    /// Frees `node` and everything below it. Returns the number of freed
    /// nodes.
    pub fn remove_subtree(&mut self, node: NodeId) -> usize {
        let mut stack = vec![node];
        let mut freed = 0;

        while let Some(current) = stack.pop() {
            let Some(entry) = self.slots.get_mut(current.index()).and_then(Option::take) else {
                continue;
            };
            stack.extend(entry.children.into_iter().flatten());
            freed += 1;
        }

        self.live -= freed;
        trace!("Freed {} nodes below {}", freed, node);
        freed
    }

    fn sorted_position(&self, parent: NodeId, path: &P) -> usize {
        let children = self.children(parent);
        match children.binary_search_by(|slot| self.compare_slot(*slot, path)) {
            Ok(index) | Err(index) => index,
        }
    }

    fn compare_slot(&self, slot: Option<NodeId>, path: &P) -> Ordering {
        match slot.and_then(|id| self.node_path(id)) {
            Some(existing) => existing.compare_path(path),
            None => Ordering::Less,
        }
    }

    fn entry(&self, node: NodeId) -> Option<&NodeEntry<P>> {
        self.slots.get(node.index()).and_then(Option::as_ref)
    }

    fn entry_mut(&mut self, node: NodeId) -> Option<&mut NodeEntry<P>> {
        self.slots.get_mut(node.index()).and_then(Option::as_mut)
    }
}

impl<P: TreePath> TreeNodes for NodeArena<P> {
    type Path = P;

    fn node_path(&self, node: NodeId) -> Option<&P> {
        self.entry(node).map(|entry| &entry.path)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.entry(node).and_then(|entry| entry.parent)
    }

    fn num_children(&self, node: NodeId) -> usize {
        self.entry(node)
            .map(|entry| entry.reported_children.unwrap_or(entry.children.len()))
            .unwrap_or(0)
    }

    fn child(&self, node: NodeId, index: usize) -> Result<NodeId, ChildLookupError> {
        let children = self.children(node);
        match children.get(index) {
            Some(Some(child)) => Ok(*child),
            Some(None) => Err(ChildLookupError::Vacant { index }),
            None => Err(ChildLookupError::OutOfRange {
                index,
                len: children.len(),
            }),
        }
    }
}
