use std::path::PathBuf;

use crate::cli::{Cli, SourceCommand};

/// Where the tree to check comes from.
#[derive(Debug, Clone)]
pub enum TreeSource {
    Manifest(PathBuf),
    Paths(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub source: TreeSource,
    pub print_tree: bool,
    pub color: bool,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        let source = match cli.source {
            SourceCommand::Manifest { file } => TreeSource::Manifest(file),
            SourceCommand::Paths { paths } => TreeSource::Paths(paths),
        };

        Self {
            source,
            print_tree: cli.print_tree,
            color: supports_color::on(supports_color::Stream::Stdout).is_some(),
        }
    }
}
