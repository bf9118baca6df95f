use std::cmp::Ordering;

use derive_more::Display;
use snafu::{Snafu, ensure};

use crate::path::TreePath;

const SEPARATOR: char = '/';

/// A slash-separated path such as `/a/b/c` or `a/b/c`.
///
/// A single leading separator marks the path as absolute. Absolute and
/// relative paths never share a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{pathname}")]
pub struct DtPath {
    pathname: String,
    components: Vec<String>,
    absolute: bool,
}

impl DtPath {
    pub fn new(pathname: impl AsRef<str>) -> Result<Self, PathError> {
        let pathname = pathname.as_ref();
        ensure!(!pathname.is_empty(), EmptySnafu);

        let (absolute, rest) = match pathname.strip_prefix(SEPARATOR) {
            Some(rest) => (true, rest),
            None => (false, pathname),
        };

        let components = rest
            .split(SEPARATOR)
            .map(|component| -> Result<String, PathError> {
                ensure!(!component.is_empty(), EmptyComponentSnafu { pathname });
                Ok(component.to_string())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pathname: pathname.to_string(),
            components,
            absolute,
        })
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Returns the path made of the first `depth` components.
    pub fn prefix(&self, depth: usize) -> Result<Self, PathError> {
        ensure!(
            depth >= 1 && depth <= self.components.len(),
            PrefixDepthSnafu {
                pathname: &self.pathname,
                depth,
            }
        );

        let components = self.components[..depth].to_vec();
        let joined = components.join("/");
        let pathname = if self.absolute {
            format!("{SEPARATOR}{joined}")
        } else {
            joined
        };

        Ok(Self {
            pathname,
            components,
            absolute: self.absolute,
        })
    }
}

impl TreePath for DtPath {
    fn depth(&self) -> usize {
        self.components.len()
    }

    fn shared_prefix_depth(&self, other: &Self) -> usize {
        if self.absolute != other.absolute {
            return 0;
        }
        self.components
            .iter()
            .zip(&other.components)
            .take_while(|(ours, theirs)| ours == theirs)
            .count()
    }

    fn pathname(&self) -> &str {
        &self.pathname
    }

    fn compare_path(&self, other: &Self) -> Ordering {
        self.pathname.as_bytes().cmp(other.pathname.as_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum PathError {
    #[snafu(display("A path cannot be empty"))]
    Empty,
    #[snafu(display("Path '{}' contains an empty component", pathname))]
    EmptyComponent { pathname: String },
    #[snafu(display("Path '{}' has no prefix of depth {}", pathname, depth))]
    PrefixDepth { pathname: String, depth: usize },
}
