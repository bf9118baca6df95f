mod manifest;

pub use manifest::{ManifestError, ManifestTree, NodeManifest, TreeManifest};
