use std::cmp::Ordering;

/// Read-only view of a hierarchical path.
///
/// A path is an ordered sequence of components. Two paths that share their
/// first `n` components have a shared prefix depth of `n`.
pub trait TreePath {
    /// Number of components in the path.
    fn depth(&self) -> usize;

    /// Number of leading components that are identical in both paths.
    fn shared_prefix_depth(&self, other: &Self) -> usize;

    /// Full textual form of the path, used in diagnostics.
    fn pathname(&self) -> &str;

    /// Total lexicographic order used to sort siblings.
    fn compare_path(&self, other: &Self) -> Ordering {
        self.pathname().cmp(other.pathname())
    }
}
