use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::data::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Check the invariants of a directory tree")]
pub struct Cli {
    #[command(subcommand)]
    pub source: SourceCommand,
    #[clap(long, short, default_value = "warn", value_enum, global = true)]
    pub log_level: LogLevel,

    /// Print every pathname of the tree before checking it
    #[clap(long, short, global = true)]
    pub print_tree: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SourceCommand {
    /// Check a tree described node by node in a YAML manifest
    Manifest { file: PathBuf },
    /// Build a tree by inserting each path in order, then check it
    Paths {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}
