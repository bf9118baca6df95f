//! Verification of directory tree invariants.
//!
//! [`TreeChecker`] walks a tree exposed through [`TreeNodes`](crate::node::TreeNodes)
//! and stops at the first broken invariant, which it hands to a
//! [`DiagnosticSink`] before returning `false`.

mod checker;
mod diagnostics;
mod violation;
mod walker;

pub use checker::TreeChecker;
pub use diagnostics::{DiagnosticSink, StreamSink, TracingSink};
pub use violation::{Violation, ViolationKind};
pub use walker::PreOrder;
