use colored::Colorize;
use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use dtcheck::checker::{PreOrder, StreamSink, TreeChecker};
use dtcheck::config::{ManifestError, TreeManifest};
use dtcheck::filesystem::{DirectoryTree, TreeError};
use dtcheck::node::{NodeId, TreeNodes};
use dtcheck::path::TreePath;

use crate::application::{RuntimeConfig, TreeSource};

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        colored::control::set_override(app_config.color);
        debug!("Runtime config: {:?}", app_config);

        let (valid, count) = match &app_config.source {
            TreeSource::Manifest(file) => {
                let tree = TreeManifest::read(file)
                    .await
                    .context(ManifestSnafu)?
                    .into_tree()
                    .context(ManifestSnafu)?;
                info!("Loaded manifest with {} nodes", tree.nodes.len());

                if app_config.print_tree {
                    print!("{}", Self::outline(&tree.nodes, tree.root));
                }

                let valid = TreeChecker::new(&tree.nodes).validate_tree(
                    tree.initialized,
                    tree.root,
                    tree.count,
                    StreamSink::stderr(),
                );
                (valid, tree.count)
            }
            TreeSource::Paths(paths) => {
                let tree = DirectoryTree::try_from_paths(paths);
                info!("Built tree with {} nodes", tree.len());

                if app_config.print_tree {
                    print!("{}", tree.render().context(RenderSnafu)?);
                }

                (tree.validate(StreamSink::stderr()), tree.len())
            }
        };

        if valid {
            println!("{} ({} nodes)", "valid".green().bold(), count);
        } else {
            println!("{}", "invalid".red().bold());
        }

        ensure!(valid, InvalidTreeSnafu);
        Ok(())
    }

    /// Pathnames in pre-order, indented by depth below the root.
    fn outline<T: TreeNodes>(nodes: &T, root: Option<NodeId>) -> String {
        let Some(root) = root else {
            return String::new();
        };
        let base_depth = nodes.node_path(root).map_or(0, |path| path.depth());

        PreOrder::new(nodes, root)
            .flatten()
            .filter_map(|node| nodes.node_path(node))
            .map(|path| {
                let indent = path.depth().saturating_sub(base_depth) * 2;
                format!("{:indent$}{}\n", "", path.pathname(), indent = indent)
            })
            .collect()
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the manifest"))]
    ManifestError { source: ManifestError },
    #[snafu(display("Failed to render the tree"))]
    RenderError { source: TreeError },
    #[snafu(display("The tree breaks at least one invariant"))]
    InvalidTree,
}
