use snafu::ensure;
use tracing::{debug, trace};

use crate::checker::violation::*;
use crate::checker::walker::pathname_of;
use crate::checker::{DiagnosticSink, PreOrder, Violation};
use crate::node::{ChildLookupError, NodeId, TreeNodes};
use crate::path::TreePath;

/// Read-only verifier of directory tree invariants.
///
/// The checker borrows the node storage for the duration of a call and keeps
/// no state between calls, so repeated checks of an unchanged tree give the
/// same verdict.
pub struct TreeChecker<'t, T: TreeNodes + ?Sized> {
    tree: &'t T,
}

impl<'t, T: TreeNodes + ?Sized> TreeChecker<'t, T> {
    pub fn new(tree: &'t T) -> Self {
        Self { tree }
    }

    /// Checks a whole tree and reports the first violation to `sink`.
    pub fn validate_tree(
        &self,
        is_initialized: bool,
        root: Option<NodeId>,
        claimed_count: usize,
        mut sink: impl DiagnosticSink,
    ) -> bool {
        self.check_tree(is_initialized, root, claimed_count)
            .map_err(|violation| sink.report(&violation))
            .is_ok()
    }

    /// Checks a single node and its subtree-wide path prefixes, reporting the
    /// first violation to `sink`.
    pub fn validate_node(&self, node: NodeId, mut sink: impl DiagnosticSink) -> bool {
        self.check_node(node)
            .map_err(|violation| sink.report(&violation))
            .is_ok()
    }

    /// Tree-level invariants, then every reachable node in pre-order, then
    /// the reachable count against `claimed_count`.
    pub fn check_tree(
        &self,
        is_initialized: bool,
        root: Option<NodeId>,
        claimed_count: usize,
    ) -> Result<(), Violation> {
        if !is_initialized {
            ensure!(
                claimed_count == 0,
                UninitializedWithNodesSnafu {
                    count: claimed_count
                }
            );
            if let Some(root) = root {
                return UninitializedWithRootSnafu {
                    root: pathname_of(self.tree, root),
                }
                .fail();
            }
        }

        let Some(root) = root else {
            ensure!(
                claimed_count == 0,
                CountMismatchSnafu {
                    claimed: claimed_count,
                    actual: 0usize,
                }
            );
            return Ok(());
        };

        debug!("Checking tree rooted at {}", pathname_of(self.tree, root));
        self.check_root(root)?;

        let mut actual = 0;
        for node in PreOrder::new(self.tree, root) {
            self.check_node(node?)?;
            actual += 1;
        }

        ensure!(
            actual == claimed_count,
            CountMismatchSnafu {
                claimed: claimed_count,
                actual,
            }
        );

        debug!("Tree with {} nodes is valid", actual);
        Ok(())
    }

    /// Every invariant that concerns `node`: node-local checks first, then
    /// the prefix relation between `node` and each of its descendants.
    pub fn check_node(&self, node: NodeId) -> Result<(), Violation> {
        let path = self
            .tree
            .node_path(node)
            .ok_or(Violation::NullNode { node })?;
        trace!("Checking node {}", path.pathname());

        if let Some(parent) = self.tree.parent(node) {
            self.check_parent_path(parent, path)?;
        }

        let children = self.collect_children(node, path)?;
        let child_paths = children
            .iter()
            .map(|&child| {
                self.tree
                    .node_path(child)
                    .ok_or(Violation::NullNode { node: child })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::check_sorted(path, &child_paths)?;
        Self::check_distinct(path, &child_paths)?;

        for (&child, child_path) in children.iter().zip(&child_paths) {
            ensure!(
                self.tree.parent(child) == Some(node),
                ParentBackrefSnafu {
                    parent: path.pathname(),
                    child: child_path.pathname(),
                }
            );
        }

        self.check_descendant_prefixes(node, path)
    }

    /// The root is the only node without a parent.
    fn check_root(&self, root: NodeId) -> Result<(), Violation> {
        let Some(parent) = self.tree.parent(root) else {
            return Ok(());
        };
        RootHasParentSnafu {
            root: pathname_of(self.tree, root),
            parent: pathname_of(self.tree, parent),
        }
        .fail()
    }

    fn check_parent_path(&self, parent: NodeId, path: &T::Path) -> Result<(), Violation> {
        let parent_path = self
            .tree
            .node_path(parent)
            .ok_or(Violation::NullNode { node: parent })?;
        let shared = path.shared_prefix_depth(parent_path);

        ensure!(
            shared == parent_path.depth() && Some(shared) == path.depth().checked_sub(1),
            ParentPathMismatchSnafu {
                parent: parent_path.pathname(),
                child: path.pathname(),
            }
        );
        Ok(())
    }

    /// Fetches every child the count accessor claims and makes sure the
    /// indexed accessor has nothing beyond it.
    fn collect_children(&self, node: NodeId, path: &T::Path) -> Result<Vec<NodeId>, Violation> {
        let claimed = self.tree.num_children(node);
        let children = (0..claimed)
            .map(|index| {
                self.tree.child(node, index).map_err(|cause| {
                    Violation::from_lookup(path.pathname(), claimed, index, cause)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match self.tree.child(node, claimed) {
            Err(ChildLookupError::OutOfRange { .. }) => Ok(children),
            _ => ChildCountUnderstatedSnafu {
                parent: path.pathname(),
                claimed,
            }
            .fail(),
        }
    }

    fn check_sorted(parent: &T::Path, child_paths: &[&T::Path]) -> Result<(), Violation> {
        for pair in child_paths.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            ensure!(
                earlier.compare_path(later).is_le(),
                UnsortedChildrenSnafu {
                    parent: parent.pathname(),
                    earlier: earlier.pathname(),
                    later: later.pathname(),
                }
            );
        }
        Ok(())
    }

    /// Compares all children regardless of their stored order.
    fn check_distinct(parent: &T::Path, child_paths: &[&T::Path]) -> Result<(), Violation> {
        let mut sorted = child_paths.to_vec();
        sorted.sort_by(|left, right| left.compare_path(right));

        match sorted
            .windows(2)
            .find(|pair| pair[0].compare_path(pair[1]).is_eq())
        {
            Some(pair) => DuplicateChildrenSnafu {
                parent: parent.pathname(),
                path: pair[0].pathname(),
            }
            .fail(),
            None => Ok(()),
        }
    }

    /// Every descendant keeps `path` as a prefix of matching depth.
    ///
    /// Structural faults below `node` are skipped here; they belong to the
    /// node that owns them and are reported when that node is checked.
    fn check_descendant_prefixes(&self, node: NodeId, path: &T::Path) -> Result<(), Violation> {
        let depth = path.depth();

        for descendant in PreOrder::new(self.tree, node).skip(1).flatten() {
            let Some(descendant_path) = self.tree.node_path(descendant) else {
                continue;
            };
            ensure!(
                path.shared_prefix_depth(descendant_path) == depth,
                AncestorPrefixSnafu {
                    ancestor: path.pathname(),
                    descendant: descendant_path.pathname(),
                }
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::ViolationKind;
    use crate::node::NodeArena;
    use crate::path::DtPath;
    use rstest::*;

    /// Builds an arena from `(path, parent index)` pairs, attaching children
    /// in the order given.
    fn build(nodes: &[(&str, Option<usize>)]) -> (NodeArena<DtPath>, Vec<NodeId>) {
        let mut arena = NodeArena::new();
        let mut ids = Vec::new();
        for (pathname, parent) in nodes {
            let id = arena.insert(DtPath::new(pathname).expect("valid path"));
            if let Some(parent) = parent {
                arena.attach(ids[*parent], id);
            }
            ids.push(id);
        }
        (arena, ids)
    }

    fn first_violation(
        arena: &NodeArena<DtPath>,
        root: Option<NodeId>,
        count: usize,
    ) -> Option<Violation> {
        let mut sink: Vec<Violation> = Vec::new();
        let valid = TreeChecker::new(arena).validate_tree(true, root, count, &mut sink);
        assert_eq!(valid, sink.is_empty());
        assert!(sink.len() <= 1);
        sink.pop()
    }

    #[fixture]
    fn well_formed() -> (NodeArena<DtPath>, Vec<NodeId>) {
        build(&[
            ("/a", None),
            ("/a/b", Some(0)),
            ("/a/b/x", Some(1)),
            ("/a/b/y", Some(1)),
            ("/a/c", Some(0)),
            ("/a/c/z", Some(4)),
        ])
    }

    #[rstest]
    fn well_formed_tree_is_valid(well_formed: (NodeArena<DtPath>, Vec<NodeId>)) {
        let (arena, ids) = well_formed;
        assert_eq!(first_violation(&arena, Some(ids[0]), 6), None);
        assert_eq!(TreeChecker::new(&arena).check_node(ids[0]), Ok(()));
    }

    #[test]
    fn empty_uninitialized_tree_is_valid() {
        let arena = NodeArena::<DtPath>::new();
        let mut sink: Vec<Violation> = Vec::new();
        assert!(TreeChecker::new(&arena).validate_tree(false, None, 0, &mut sink));
        assert!(sink.is_empty());
    }

    #[test]
    fn empty_initialized_tree_is_valid() {
        let arena = NodeArena::<DtPath>::new();
        assert_eq!(first_violation(&arena, None, 0), None);
    }

    #[test]
    fn uninitialized_tree_with_count_is_invalid() {
        let arena = NodeArena::<DtPath>::new();
        let mut sink: Vec<Violation> = Vec::new();
        assert!(!TreeChecker::new(&arena).validate_tree(false, None, 5, &mut sink));
        assert_eq!(sink, vec![Violation::UninitializedWithNodes { count: 5 }]);
        assert_eq!(sink[0].kind(), ViolationKind::InitializationInvariantViolation);
    }

    #[test]
    fn uninitialized_tree_with_root_is_invalid() {
        let (arena, ids) = build(&[("/a", None)]);
        let result = TreeChecker::new(&arena).check_tree(false, Some(ids[0]), 0);
        assert_eq!(
            result,
            Err(Violation::UninitializedWithRoot { root: "/a".into() })
        );
    }

    #[test]
    fn initialized_empty_tree_with_count_is_invalid() {
        let arena = NodeArena::<DtPath>::new();
        assert_eq!(
            first_violation(&arena, None, 2),
            Some(Violation::CountMismatch {
                claimed: 2,
                actual: 0
            })
        );
    }

    #[test]
    fn children_in_insertion_order_are_unsorted() {
        let (arena, ids) = build(&[("/a", None), ("/a/c", Some(0)), ("/a/b", Some(0))]);
        let checker = TreeChecker::new(&arena);

        let mut sink: Vec<Violation> = Vec::new();
        assert!(!checker.validate_node(ids[0], &mut sink));
        assert_eq!(
            sink,
            vec![Violation::UnsortedChildren {
                parent: "/a".into(),
                earlier: "/a/c".into(),
                later: "/a/b".into(),
            }]
        );
    }

    #[test]
    fn sorted_children_are_valid() {
        let (arena, ids) = build(&[("/a", None), ("/a/b", Some(0)), ("/a/c", Some(0))]);
        let mut sink: Vec<Violation> = Vec::new();
        assert!(TreeChecker::new(&arena).validate_node(ids[0], &mut sink));
        assert!(sink.is_empty());
    }

    #[test]
    fn equal_children_are_duplicates() {
        let (arena, ids) = build(&[("/a", None), ("/a/b", Some(0)), ("/a/b", Some(0))]);
        let result = TreeChecker::new(&arena).check_node(ids[0]);
        assert_eq!(
            result,
            Err(Violation::DuplicateChildren {
                parent: "/a".into(),
                path: "/a/b".into(),
            })
        );
    }

    #[test]
    fn skipped_level_is_a_parent_path_mismatch() {
        let (arena, ids) = build(&[("/a", None), ("/a/b/c", Some(0))]);
        let result = TreeChecker::new(&arena).check_node(ids[1]);
        assert_eq!(
            result.map_err(|violation| violation.kind()),
            Err(ViolationKind::ParentPathMismatch)
        );
    }

    #[rstest]
    #[case("/x/b")]
    #[case("/a")]
    #[case("/a/b/c")]
    #[case("a/b")]
    fn child_must_extend_parent_by_one(#[case] child: &str) {
        let (arena, ids) = build(&[("/a", None), (child, Some(0))]);
        assert!(matches!(
            TreeChecker::new(&arena).check_node(ids[1]),
            Err(Violation::ParentPathMismatch { .. })
        ));
    }

    #[test]
    fn ancestor_prefix_is_checked_across_the_whole_subtree() {
        let (arena, ids) = build(&[("/a", None), ("/a/b", Some(0)), ("/x/y", Some(1))]);

        assert_eq!(
            first_violation(&arena, Some(ids[0]), 3),
            Some(Violation::AncestorPrefix {
                ancestor: "/a".into(),
                descendant: "/x/y".into(),
            })
        );
    }

    #[test]
    fn claimed_count_one_short_is_a_count_mismatch() {
        let (arena, ids) = well_formed();
        assert_eq!(
            first_violation(&arena, Some(ids[0]), 5),
            Some(Violation::CountMismatch {
                claimed: 5,
                actual: 6
            })
        );
    }

    #[test]
    fn dangling_root_is_a_null_node() {
        let (mut arena, ids) = build(&[("/a", None)]);
        arena.remove_subtree(ids[0]);
        assert_eq!(
            first_violation(&arena, Some(ids[0]), 1).map(|v| v.kind()),
            Some(ViolationKind::StructuralNull)
        );
    }

    #[test]
    fn dangling_child_is_a_null_node() {
        let (mut arena, ids) = build(&[("/a", None), ("/a/b", Some(0))]);
        arena.remove_subtree(ids[1]);
        assert_eq!(
            TreeChecker::new(&arena).check_node(ids[0]),
            Err(Violation::NullNode { node: ids[1] })
        );
    }

    #[test]
    fn overstated_child_count_is_an_accessor_inconsistency() {
        let (mut arena, ids) = build(&[("/a", None), ("/a/b", Some(0))]);
        arena.override_child_count(ids[0], Some(2));

        let violation = TreeChecker::new(&arena).check_node(ids[0]).unwrap_err();
        assert!(matches!(
            violation,
            Violation::ChildCountOverstated {
                claimed: 2,
                index: 1,
                ..
            }
        ));
        assert_eq!(violation.kind(), ViolationKind::ChildAccessorInconsistency);
    }

    #[test]
    fn understated_child_count_is_an_accessor_inconsistency() {
        let (mut arena, ids) = build(&[("/a", None), ("/a/b", Some(0)), ("/a/c", Some(0))]);
        arena.override_child_count(ids[0], Some(1));

        assert_eq!(
            TreeChecker::new(&arena).check_node(ids[0]),
            Err(Violation::ChildCountUnderstated {
                parent: "/a".into(),
                claimed: 1,
            })
        );
    }

    #[test]
    fn vacant_child_slot_is_an_accessor_inconsistency() {
        let (mut arena, ids) = build(&[("/a", None)]);
        arena.push_vacant_child(ids[0]);

        assert_eq!(
            TreeChecker::new(&arena).check_node(ids[0]),
            Err(Violation::VacantChild {
                parent: "/a".into(),
                index: 0,
            })
        );
    }

    #[test]
    fn wrong_parent_backref_is_reported() {
        let (mut arena, ids) = build(&[
            ("/a", None),
            ("/a/b", Some(0)),
            ("/a/c", Some(0)),
            ("/a/b/x", Some(1)),
        ]);
        // "/a/b/x" stays under "/a/b" but points at "/a/c"
        arena.set_parent(ids[3], Some(ids[2]));

        assert_eq!(
            first_violation(&arena, Some(ids[0]), 4),
            Some(Violation::ParentBackref {
                parent: "/a/b".into(),
                child: "/a/b/x".into(),
            })
        );
    }

    #[test]
    fn root_with_parent_is_reported() {
        let (arena, ids) = build(&[("/a", None), ("/a/b", Some(0))]);
        let result = TreeChecker::new(&arena).check_tree(true, Some(ids[1]), 1);
        assert_eq!(
            result,
            Err(Violation::RootHasParent {
                root: "/a/b".into(),
                parent: "/a".into(),
            })
        );
    }

    #[test]
    fn cycles_terminate_with_a_violation() {
        let (mut arena, ids) = build(&[("/a", None), ("/a/b", Some(0))]);
        arena.insert_child(ids[1], 0, Some(ids[0]));

        assert!(first_violation(&arena, Some(ids[0]), 2).is_some());
    }

    #[test]
    fn first_violation_in_pre_order_wins() {
        // "/a/b" has unsorted children and "/a/c" has duplicates
        let (arena, ids) = build(&[
            ("/a", None),
            ("/a/b", Some(0)),
            ("/a/b/z", Some(1)),
            ("/a/b/y", Some(1)),
            ("/a/c", Some(0)),
            ("/a/c/x", Some(4)),
            ("/a/c/x", Some(4)),
        ]);

        assert_eq!(
            first_violation(&arena, Some(ids[0]), 7).map(|v| v.kind()),
            Some(ViolationKind::UnsortedChildren)
        );
    }

    #[rstest]
    #[case::valid(6, None)]
    #[case::short(5, Some(ViolationKind::CountMismatch))]
    #[case::long(7, Some(ViolationKind::CountMismatch))]
    fn repeated_checks_agree(#[case] count: usize, #[case] expected: Option<ViolationKind>) {
        let (arena, ids) = well_formed();
        let first = first_violation(&arena, Some(ids[0]), count);
        let second = first_violation(&arena, Some(ids[0]), count);

        assert_eq!(first.as_ref().map(Violation::kind), expected);
        assert_eq!(first, second);
    }

    #[test]
    fn long_chains_are_walked_iteratively() {
        let mut arena = NodeArena::new();
        let mut pathname = String::from("/n");
        let root = arena.insert(DtPath::new(&pathname).unwrap());
        let mut parent = root;
        for _ in 1..500 {
            pathname.push_str("/n");
            let child = arena.insert(DtPath::new(&pathname).unwrap());
            arena.attach(parent, child);
            parent = child;
        }

        assert_eq!(first_violation(&arena, Some(root), 500), None);
    }
}
