use derive_more::Display;
use snafu::Snafu;

use crate::node::{ChildLookupError, NodeId};

/// Class of a broken tree invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ViolationKind {
    StructuralNull,
    ParentPathMismatch,
    UnsortedChildren,
    DuplicateChildren,
    AncestorPrefixViolation,
    ChildAccessorInconsistency,
    ParentBackrefMismatch,
    CountMismatch,
    InitializationInvariantViolation,
    SharedNode,
}

/// The first broken invariant found in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Violation {
    #[snafu(display("Node {} does not resolve to a live node", node))]
    NullNode { node: NodeId },

    #[snafu(display(
        "Parent and child are not exactly one level apart: ({}) ({})",
        parent,
        child
    ))]
    ParentPathMismatch { parent: String, child: String },

    #[snafu(display(
        "Children of ({}) are not stored lexicographically: ({}) before ({})",
        parent,
        earlier,
        later
    ))]
    UnsortedChildren {
        parent: String,
        earlier: String,
        later: String,
    },

    #[snafu(display("Node ({}) has more than one child at ({})", parent, path))]
    DuplicateChildren { parent: String, path: String },

    #[snafu(display(
        "Descendant ({}) does not extend the path of its ancestor ({})",
        descendant,
        ancestor
    ))]
    AncestorPrefix { ancestor: String, descendant: String },

    #[snafu(display(
        "Node ({}) reports {} children but child {} cannot be retrieved: {}",
        parent,
        claimed,
        index,
        cause
    ))]
    ChildCountOverstated {
        parent: String,
        claimed: usize,
        index: usize,
        cause: ChildLookupError,
    },

    #[snafu(display(
        "Node ({}) reports {} children but more can be retrieved",
        parent,
        claimed
    ))]
    ChildCountUnderstated { parent: String, claimed: usize },

    #[snafu(display("Node ({}) has an empty child slot at index {}", parent, index))]
    VacantChild { parent: String, index: usize },

    #[snafu(display(
        "The parent of child ({}) is not the node it is stored under ({})",
        child,
        parent
    ))]
    ParentBackref { parent: String, child: String },

    #[snafu(display("Root ({}) has a parent ({})", root, parent))]
    RootHasParent { root: String, parent: String },

    #[snafu(display("Node ({}) is reachable more than once", path))]
    NodeRevisited { path: String },

    #[snafu(display(
        "Claimed node count {} differs from the {} reachable nodes",
        claimed,
        actual
    ))]
    CountMismatch { claimed: usize, actual: usize },

    #[snafu(display("Tree is not initialized but its count is {}", count))]
    UninitializedWithNodes { count: usize },

    #[snafu(display("Tree is not initialized but has a root ({})", root))]
    UninitializedWithRoot { root: String },
}

impl Violation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            Violation::NullNode { .. } => ViolationKind::StructuralNull,
            Violation::ParentPathMismatch { .. } => ViolationKind::ParentPathMismatch,
            Violation::UnsortedChildren { .. } => ViolationKind::UnsortedChildren,
            Violation::DuplicateChildren { .. } => ViolationKind::DuplicateChildren,
            Violation::AncestorPrefix { .. } => ViolationKind::AncestorPrefixViolation,
            Violation::ChildCountOverstated { .. }
            | Violation::ChildCountUnderstated { .. }
            | Violation::VacantChild { .. } => ViolationKind::ChildAccessorInconsistency,
            Violation::ParentBackref { .. } | Violation::RootHasParent { .. } => {
                ViolationKind::ParentBackrefMismatch
            }
            Violation::NodeRevisited { .. } => ViolationKind::SharedNode,
            Violation::CountMismatch { .. } => ViolationKind::CountMismatch,
            Violation::UninitializedWithNodes { .. } | Violation::UninitializedWithRoot { .. } => {
                ViolationKind::InitializationInvariantViolation
            }
        }
    }

    /// Maps a failed child lookup below the claimed count.
    pub(crate) fn from_lookup(
        parent: &str,
        claimed: usize,
        index: usize,
        cause: ChildLookupError,
    ) -> Self {
        match cause {
            ChildLookupError::Vacant { index } => Violation::VacantChild {
                parent: parent.to_string(),
                index,
            },
            ChildLookupError::OutOfRange { .. } => Violation::ChildCountOverstated {
                parent: parent.to_string(),
                claimed,
                index,
                cause,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_errors_map_to_accessor_violations() {
        let vacant = Violation::from_lookup("/a", 2, 1, ChildLookupError::Vacant { index: 1 });
        assert_eq!(
            vacant,
            Violation::VacantChild {
                parent: "/a".into(),
                index: 1
            }
        );

        let overstated = Violation::from_lookup(
            "/a",
            3,
            2,
            ChildLookupError::OutOfRange { index: 2, len: 2 },
        );
        assert!(matches!(
            overstated,
            Violation::ChildCountOverstated {
                claimed: 3,
                index: 2,
                ..
            }
        ));
        assert_eq!(overstated.kind(), ViolationKind::ChildAccessorInconsistency);
    }

    #[test]
    fn display_names_offending_paths() {
        let violation = Violation::ParentPathMismatch {
            parent: "/a".into(),
            child: "/a/b/c".into(),
        };
        let message = violation.to_string();
        assert!(message.contains("(/a)"));
        assert!(message.contains("(/a/b/c)"));
    }
}
