//! Content nodes over git tree objects

use crate::error::{UrError, UrResult};
use crate::git::{GitRepo, ObjectKind};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Something that can produce a commit tree on demand, typically by cloning
pub trait TreeSource: Send + Sync {
    /// Canonical URL of the root tree; child URLs extend it with `/<name>`
    fn url(&self) -> String;

    /// Make the tree available locally, returning the clone and the id of
    /// the root tree object
    fn open(&self) -> UrResult<(GitRepo, String)>;
}

/// State shared by every node of one commit tree
struct GitTree {
    source: Arc<dyn TreeSource>,
    opened: Mutex<Option<(GitRepo, String)>>,
}

impl GitTree {
    /// Open the source on first use; later calls reuse the result
    fn opened(&self) -> UrResult<(GitRepo, String)> {
        let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(opened) = opened.as_ref() {
            return Ok(opened.clone());
        }

        debug!("Opening tree {}", self.source.url());
        let fresh = self.source.open()?;
        *opened = Some(fresh.clone());
        Ok(fresh)
    }
}

/// A blob or tree inside a cloned repository
#[derive(Clone)]
pub struct GitNode {
    tree: Arc<GitTree>,
    url: String,
    name: String,
    kind: ObjectKind,
    // None for the root, whose tree id is only known once the source opens
    oid: Option<String>,
}

impl GitNode {
    /// Root of the tree `source` provides; nothing is fetched until the
    /// first traversal
    pub fn root(source: Arc<dyn TreeSource>) -> Self {
        let url = source.url();
        let name = url.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            tree: Arc::new(GitTree {
                source,
                opened: Mutex::new(None),
            }),
            url,
            name,
            kind: ObjectKind::Tree,
            oid: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == ObjectKind::Blob
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ObjectKind::Tree
    }

    fn object(&self) -> UrResult<(GitRepo, String)> {
        let (repo, root) = self.tree.opened()?;
        Ok((repo, self.oid.clone().unwrap_or(root)))
    }

    /// Blob and subtree entries by name
    pub fn children(&self) -> UrResult<BTreeMap<String, GitNode>> {
        if !self.is_dir() {
            return Err(UrError::ChildrenOfFile(self.url.clone()));
        }

        let (repo, oid) = self.object()?;
        let children = repo
            .list_tree(&oid)?
            .into_iter()
            .map(|entry| {
                let node = GitNode {
                    tree: Arc::clone(&self.tree),
                    url: format!("{}/{}", self.url, entry.name),
                    name: entry.name.clone(),
                    kind: entry.kind,
                    oid: Some(entry.oid),
                };
                (entry.name, node)
            })
            .collect();
        Ok(children)
    }

    pub fn read(&self) -> UrResult<Vec<u8>> {
        if !self.is_file() {
            return Err(UrError::ReadDirectory(self.url.clone()));
        }
        let (repo, oid) = self.object()?;
        repo.read_blob(&oid)
    }
}

impl fmt::Debug for GitNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitNode")
            .field("url", &self.url)
            .field("kind", &self.kind)
            .field("oid", &self.oid)
            .finish()
    }
}
