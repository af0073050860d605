//! Content nodes over the local filesystem

use crate::error::{UrError, UrResult};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// A file or directory on local disk, identified by its path
#[derive(Debug, Clone)]
pub struct PathNode {
    path: PathBuf,
    url: String,
    name: String,
}

impl PathNode {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let url = path.to_string_lossy().into_owned();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.clone());
        Self { path, url, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_file(&self) -> bool {
        self.path.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.path.is_dir()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Directory entries by name
    pub fn children(&self) -> UrResult<BTreeMap<String, PathNode>> {
        if !self.is_dir() {
            if !self.exists() {
                return Err(UrError::PathNotFound(self.path.clone()));
            }
            return Err(UrError::ChildrenOfFile(self.url.clone()));
        }

        let read = fs::read_dir(&self.path)
            .map_err(|e| UrError::io(format!("listing {}", self.path.display()), e))?;
        let mut children = BTreeMap::new();
        for entry in read {
            let entry = entry.map_err(|e| UrError::io(format!("listing {}", self.path.display()), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            children.insert(name, PathNode::new(entry.path()));
        }
        Ok(children)
    }

    pub fn read(&self) -> UrResult<Vec<u8>> {
        if self.is_dir() {
            return Err(UrError::ReadDirectory(self.url.clone()));
        }
        fs::read(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => UrError::PathNotFound(self.path.clone()),
            _ => UrError::io(format!("reading {}", self.path.display()), e),
        })
    }
}
