use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, warn};

use crate::checker::{DiagnosticSink, PreOrder, TracingSink, TreeChecker};
use crate::node::{NodeArena, NodeId, TreeNodes};
use crate::path::{DtPath, PathError, TreePath};

/// In-memory directory tree keyed by slash-separated paths.
///
/// All nodes share the first component of the root path. Children are kept
/// sorted, and every mutation is followed by a full invariant check in debug
/// builds.
#[derive(Debug, Clone, Default)]
pub struct DirectoryTree {
    nodes: NodeArena<DtPath>,
    root: Option<NodeId>,
    count: usize,
    initialized: bool,
}

impl DirectoryTree {
    /// Creates an uninitialized tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an initialized tree from `paths`, skipping those that cannot
    /// be inserted.
    pub fn try_from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut tree = Self {
            initialized: true,
            ..Self::default()
        };

        for path in paths {
            let path = path.as_ref();
            if let Err(e) = tree.insert(path) {
                warn!("Failed to insert path '{}': {}", path, e);
            }
        }

        debug!("Built tree with {} nodes", tree.count);
        tree
    }

    pub fn init(&mut self) -> Result<(), TreeError> {
        ensure!(!self.initialized, AlreadyInitializedSnafu);
        self.initialized = true;
        self.debug_assert_valid();
        Ok(())
    }

    /// Drops every node and returns to the uninitialized state.
    pub fn destroy(&mut self) -> Result<(), TreeError> {
        ensure!(self.initialized, NotInitializedSnafu);
        *self = Self::default();
        self.debug_assert_valid();
        Ok(())
    }

    /// Inserts `pathname` along with any missing ancestors.
    pub fn insert(&mut self, pathname: &str) -> Result<(), TreeError> {
        ensure!(self.initialized, NotInitializedSnafu);
        let path = DtPath::new(pathname).context(BadPathSnafu)?;

        let furthest = self.traverse(&path)?;
        let mut parent = furthest;
        let first_new_depth = match furthest.and_then(|id| self.nodes.node_path(id)) {
            Some(existing) => {
                ensure!(
                    existing.depth() < path.depth(),
                    AlreadyInTreeSnafu { path: pathname }
                );
                existing.depth() + 1
            }
            None => 1,
        };

        for depth in first_new_depth..=path.depth() {
            let prefix = path.prefix(depth).context(BadPathSnafu)?;
            let node = self.nodes.insert(prefix);
            match parent {
                Some(parent) => {
                    self.nodes.attach_sorted(parent, node);
                }
                None => self.root = Some(node),
            }
            self.count += 1;
            parent = Some(node);
        }

        debug!(
            "Inserted '{}' ({} new nodes)",
            pathname,
            path.depth() + 1 - first_new_depth
        );
        self.debug_assert_valid();
        Ok(())
    }

    pub fn contains(&self, pathname: &str) -> bool {
        self.find(pathname).is_ok()
    }

    /// Removes `pathname` and everything below it.
    pub fn remove(&mut self, pathname: &str) -> Result<(), TreeError> {
        let node = self.find(pathname)?;

        match self.nodes.parent(node) {
            Some(parent) => {
                self.nodes.detach_child(parent, node);
            }
            None => self.root = None,
        }
        let freed = self.nodes.remove_subtree(node);
        self.count -= freed;

        debug!("Removed '{}' ({} nodes)", pathname, freed);
        self.debug_assert_valid();
        Ok(())
    }

    /// Pre-order listing of every pathname, one per line.
    pub fn render(&self) -> Result<String, TreeError> {
        ensure!(self.initialized, NotInitializedSnafu);
        let Some(root) = self.root else {
            return Ok(String::new());
        };

        let mut rendered = String::new();
        for node in PreOrder::new(&self.nodes, root).flatten() {
            if let Some(path) = self.nodes.node_path(node) {
                rendered.push_str(path.pathname());
                rendered.push('\n');
            }
        }
        Ok(rendered)
    }

    pub fn validate(&self, sink: impl DiagnosticSink) -> bool {
        TreeChecker::new(&self.nodes).validate_tree(self.initialized, self.root, self.count, sink)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn nodes(&self) -> &NodeArena<DtPath> {
        &self.nodes
    }

    fn find(&self, pathname: &str) -> Result<NodeId, TreeError> {
        ensure!(self.initialized, NotInitializedSnafu);
        let path = DtPath::new(pathname).context(BadPathSnafu)?;

        self.traverse(&path)?
            .filter(|&node| self.nodes.node_path(node) == Some(&path))
            .ok_or_else(|| NoSuchPathSnafu { path: pathname }.build())
    }

    /// Deepest existing node whose path is a prefix of `path`.
    fn traverse(&self, path: &DtPath) -> Result<Option<NodeId>, TreeError> {
        let Some(root) = self.root else {
            return Ok(None);
        };
        let root_matches = self
            .nodes
            .node_path(root)
            .is_some_and(|root_path| root_path.shared_prefix_depth(path) >= 1);
        ensure!(
            root_matches,
            ConflictingPathSnafu {
                path: path.pathname()
            }
        );

        let mut current = root;
        for depth in 2..=path.depth() {
            let prefix = path.prefix(depth).context(BadPathSnafu)?;
            match self.nodes.find_child(current, &prefix) {
                Some(child) => current = child,
                None => break,
            }
        }
        Ok(Some(current))
    }

    fn debug_assert_valid(&self) {
        debug_assert!(
            self.validate(TracingSink),
            "directory tree invariants are broken"
        );
    }
}

#[derive(Debug, Snafu)]
pub enum TreeError {
    #[snafu(display("The tree is not initialized"))]
    NotInitialized,
    #[snafu(display("The tree is already initialized"))]
    AlreadyInitialized,
    #[snafu(display("Invalid path"))]
    BadPath { source: PathError },
    #[snafu(display("Path '{}' does not share the root of the tree", path))]
    ConflictingPath { path: String },
    #[snafu(display("Path '{}' is already in the tree", path))]
    AlreadyInTree { path: String },
    #[snafu(display("Path '{}' is not in the tree", path))]
    NoSuchPath { path: String },
}
