//! Uniform content trees
//!
//! [`ContentNode`] walks a directory of files the same way whether it lives
//! on local disk ([`PathNode`]) or inside a commit of a cloned repository
//! ([`GitNode`]). Nodes compare and hash by URL, so they work as map keys.

pub mod git_node;
pub mod ignore;
pub mod path_node;

pub use git_node::{GitNode, TreeSource};
pub use ignore::{walk, UrIgnore, IGNORE_FILE};
pub use path_node::PathNode;

use crate::error::{UrError, UrResult};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

/// Extensions tried, in order, when a module name is looked up in a directory
pub const MODULE_SUFFIXES: &[&str] = &["", ".ipynb", ".py"];

/// A file or directory in a content tree
#[derive(Clone)]
pub enum ContentNode {
    Path(PathNode),
    Git(GitNode),
}

impl ContentNode {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathNode::new(path))
    }

    /// Lazily opened root of the tree `source` provides
    pub fn git_root(source: Arc<dyn TreeSource>) -> Self {
        Self::Git(GitNode::root(source))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Path(node) => node.name(),
            Self::Git(node) => node.name(),
        }
    }

    /// Identity of the node: a web URL for git content, the path otherwise
    pub fn url(&self) -> &str {
        match self {
            Self::Path(node) => node.url(),
            Self::Git(node) => node.url(),
        }
    }

    pub fn is_dir(&self) -> bool {
        match self {
            Self::Path(node) => node.is_dir(),
            Self::Git(node) => node.is_dir(),
        }
    }

    pub fn is_file(&self) -> bool {
        match self {
            Self::Path(node) => node.is_file(),
            Self::Git(node) => node.is_file(),
        }
    }

    /// Entries of a directory, by name
    pub fn children(&self) -> UrResult<BTreeMap<String, ContentNode>> {
        Ok(match self {
            Self::Path(node) => node
                .children()?
                .into_iter()
                .map(|(name, child)| (name, Self::Path(child)))
                .collect(),
            Self::Git(node) => node
                .children()?
                .into_iter()
                .map(|(name, child)| (name, Self::Git(child)))
                .collect(),
        })
    }

    /// Contents of a file
    pub fn read(&self) -> UrResult<Vec<u8>> {
        match self {
            Self::Path(node) => node.read(),
            Self::Git(node) => node.read(),
        }
    }

    pub fn read_text(&self) -> UrResult<String> {
        String::from_utf8(self.read()?).map_err(|e| UrError::Decode {
            path: PathBuf::from(self.url()),
            reason: e.to_string(),
        })
    }

    /// Lines without their terminators; `nonempty` drops blank lines
    pub fn read_lines(&self, nonempty: bool) -> UrResult<Vec<String>> {
        Ok(self
            .read_text()?
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !nonempty || !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Direct child `name`
    pub fn child(&self, name: &str) -> UrResult<ContentNode> {
        self.children()?
            .remove(name)
            .ok_or_else(|| UrError::not_found(name, self.url()))
    }

    /// Descendant at the `/`-separated relative `path`; empty means `self`
    pub fn locate(&self, path: &str) -> UrResult<ContentNode> {
        let mut node = self.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.child(segment)?;
        }
        Ok(node)
    }

    /// Follow module names downwards, accepting `name`, `name.ipynb` or
    /// `name.py` at each level
    pub fn find_module<S: AsRef<str>>(&self, names: &[S]) -> UrResult<ContentNode> {
        let mut node = self.clone();
        for name in names.iter().map(AsRef::as_ref) {
            let mut children = node.children()?;
            node = MODULE_SUFFIXES
                .iter()
                .find_map(|suffix| children.remove(&format!("{}{}", name, suffix)))
                .ok_or_else(|| UrError::not_found(name, node.url()))?;
        }
        Ok(node)
    }
}

impl PartialEq for ContentNode {
    fn eq(&self, other: &Self) -> bool {
        self.url() == other.url()
    }
}

impl Eq for ContentNode {}

impl Hash for ContentNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url().hash(state);
    }
}

impl fmt::Display for ContentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.url())
    }
}

impl fmt::Debug for ContentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
