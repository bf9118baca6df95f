use std::{borrow::Cow, path::Path};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

use crate::node::{NodeArena, NodeId};
use crate::path::{DtPath, PathError};

const INITIALIZED_KEY: &str = "initialized";
const COUNT_KEY: &str = "count";
const ROOT_KEY: &str = "root";
const PATH_KEY: &str = "path";
const CHILDREN_KEY: &str = "children";

/// Literal description of a tree, including trees that break invariants.
///
/// ```yaml
/// initialized: true
/// count: 3
/// root:
///   path: /a
///   children:
///     - path: /a/c
///     - path: /a/b
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeManifest {
    pub initialized: bool,
    pub count: Option<usize>,
    pub root: Option<NodeManifest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeManifest {
    pub path: String,
    pub children: Vec<NodeManifest>,
}

/// A manifest laid out in a node arena, ready to be checked.
#[derive(Debug, Clone)]
pub struct ManifestTree {
    pub nodes: NodeArena<DtPath>,
    pub root: Option<NodeId>,
    pub count: usize,
    pub initialized: bool,
}

impl TreeManifest {
    pub async fn read(path: &Path) -> Result<Self, ManifestError> {
        debug!("Reading tree manifest: {}", path.display());
        let bytes = fs::read(path).await.context(ReadSnafu {
            file_path: path.display().to_string(),
        })?;
        debug!("Successfully read tree manifest: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(InvalidUtf8Snafu)?;
        contents.as_str().try_into()
    }

    /// Lays the nodes out exactly as written: children keep their order and
    /// nothing is deduplicated. The count defaults to the number of nodes.
    pub fn into_tree(self) -> Result<ManifestTree, ManifestError> {
        let mut nodes = NodeArena::new();
        let root = self
            .root
            .map(|root| Self::build_node(&mut nodes, root, None))
            .transpose()?;

        Ok(ManifestTree {
            count: self.count.unwrap_or(nodes.len()),
            nodes,
            root,
            initialized: self.initialized,
        })
    }

    fn build_node(
        nodes: &mut NodeArena<DtPath>,
        manifest: NodeManifest,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ManifestError> {
        let path = DtPath::new(&manifest.path).context(BadPathSnafu {
            path: manifest.path.clone(),
        })?;
        let node = nodes.insert(path);
        if let Some(parent) = parent {
            nodes.attach(parent, node);
        }

        for child in manifest.children {
            Self::build_node(nodes, child, Some(node))?;
        }
        Ok(node)
    }

    fn parse_node(yaml: &Yaml) -> Result<NodeManifest, ManifestError> {
        let mapping = yaml.as_mapping().context(NodeNotMapSnafu)?;

        let path = get(mapping, PATH_KEY)
            .and_then(|v| v.as_str())
            .context(MissingPathSnafu)?
            .to_string();

        let children = match get(mapping, CHILDREN_KEY) {
            None => Vec::new(),
            Some(Yaml::Value(Scalar::Null)) => Vec::new(),
            Some(children) => children
                .as_sequence()
                .context(ChildrenNotSequenceSnafu { path: &path })?
                .iter()
                .map(Self::parse_node)
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(NodeManifest { path, children })
    }
}

impl TryFrom<&str> for TreeManifest {
    type Error = ManifestError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let contents_vec =
            Yaml::load_from_str(contents).map_err(|e| ManifestError::ParseError { source: e })?;
        let contents = contents_vec
            .first()
            .ok_or(ManifestError::MalformedManifest)?;

        let top_level = contents
            .as_mapping()
            .ok_or(ManifestError::TopLevelNotMap)?;

        let initialized = match get(top_level, INITIALIZED_KEY) {
            None => true,
            Some(Yaml::Value(Scalar::Boolean(flag))) => *flag,
            Some(_) => return InvalidFlagSnafu.fail(),
        };

        let count = match get(top_level, COUNT_KEY) {
            None => None,
            Some(Yaml::Value(Scalar::Integer(count))) => Some(
                usize::try_from(*count)
                    .ok()
                    .context(InvalidCountSnafu)?,
            ),
            Some(_) => return InvalidCountSnafu.fail(),
        };

        let root = match get(top_level, ROOT_KEY) {
            None => None,
            Some(Yaml::Value(Scalar::Null)) => None,
            Some(root) => Some(Self::parse_node(root)?),
        };

        debug!(
            "Parsed manifest: initialized={}, count={:?}, root present={}",
            initialized,
            count,
            root.is_some()
        );
        Ok(TreeManifest {
            initialized,
            count,
            root,
        })
    }
}

fn get<'a, 'y>(
    mapping: &'a LinkedHashMap<Yaml<'y>, Yaml<'y>>,
    key: &'static str,
) -> Option<&'a Yaml<'y>> {
    mapping.get(&Yaml::Value(Scalar::String(Cow::Borrowed(key))))
}

#[derive(Debug, Snafu)]
pub enum ManifestError {
    #[snafu(display("Failed to read the manifest file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The manifest file is not valid UTF-8"))]
    InvalidUtf8 { source: std::string::FromUtf8Error },
    #[snafu(display("Failed to parse the manifest"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted manifest"))]
    MalformedManifest,
    #[snafu(display("Top level of the manifest should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Every node should be a map"))]
    NodeNotMap,
    #[snafu(display("A node is missing its 'path' string"))]
    MissingPath,
    #[snafu(display("Children of '{}' should be a sequence", path))]
    ChildrenNotSequence { path: String },
    #[snafu(display("'count' should be a non-negative integer"))]
    InvalidCount,
    #[snafu(display("'initialized' should be a boolean"))]
    InvalidFlag,
    #[snafu(display("Node path '{}' is invalid", path))]
    BadPath { path: String, source: PathError },
}
