mod cli;

pub use cli::{Cli, SourceCommand};
