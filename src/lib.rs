//! Consistency checking for in-memory directory trees.
//!
//! The [`checker`] walks any tree exposed through [`node::TreeNodes`] and
//! reports the first broken invariant. [`filesystem::DirectoryTree`] is a
//! tree manager that runs the checker after each mutation, and
//! [`config::TreeManifest`] describes arbitrary (possibly malformed) trees
//! in YAML.

#![allow(clippy::module_inception)]

pub mod checker;
pub mod config;
pub mod filesystem;
pub mod node;
pub mod path;
