//! Process-wide cache manager
//!
//! Maps entity types to `<cache_root>/<TypeName>/` and primary keys to
//! per-instance directories beneath them. The mapping is a pure function of
//! the cache root, so separate processes sharing a root see each other's
//! fields without coordinating.
//!
//! Keys may contain `/` (`org/repo`, `grp/sub/proj`). Each key becomes a
//! single directory name with `%` and `/` percent-encoded, so no entity
//! directory can sit inside another or collide with a field file.

use crate::cache::record::Record;
use crate::error::{UrError, UrResult};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Default cache directory, relative to the current directory
pub const DEFAULT_CACHE_DIR: &str = ".objs";

/// Environment variable overriding the cache root
pub const CACHE_ROOT_ENV: &str = "UR_CACHE_ROOT";

/// Environment variable forcing cache-skipping for every entity
pub const SKIP_CACHE_ENV: &str = "UR_SKIP_CACHE";

/// Owner of the on-disk cache tree
#[derive(Debug)]
pub struct CacheManager {
    root: PathBuf,
    skip_cache: bool,
    type_dirs: Mutex<BTreeMap<&'static str, PathBuf>>,
}

/// One cached entity found on disk
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub type_name: String,
    pub key: String,
    pub fields: Vec<String>,
    pub modified: Option<DateTime<Local>>,
}

impl CacheManager {
    /// Create a manager rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skip_cache: false,
            type_dirs: Mutex::new(BTreeMap::new()),
        }
    }

    /// Force every entity created through this manager to skip the cache
    pub fn with_skip_cache(mut self, skip: bool) -> Self {
        self.skip_cache = skip;
        self
    }

    /// `$UR_CACHE_ROOT`, else `.objs` in the current directory
    pub fn default_root() -> PathBuf {
        match std::env::var_os(CACHE_ROOT_ENV) {
            Some(root) if !root.is_empty() => PathBuf::from(root),
            _ => PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }

    /// Whether `$UR_SKIP_CACHE` is set to a truthy value
    pub fn skip_from_env() -> bool {
        std::env::var(SKIP_CACHE_ENV)
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn skips_cache(&self) -> bool {
        self.skip_cache
    }

    /// Directory holding every instance of `type_name`; created on first use
    pub fn type_dir(&self, type_name: &'static str) -> UrResult<PathBuf> {
        let mut dirs = self.type_dirs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dir) = dirs.get(type_name) {
            return Ok(dir.clone());
        }

        let dir = self.root.join(type_name);
        fs::create_dir_all(&dir)
            .map_err(|e| UrError::io(format!("creating cache directory {}", dir.display()), e))?;
        debug!("Cache dir for {}: {}", type_name, dir.display());

        dirs.insert(type_name, dir.clone());
        Ok(dir)
    }

    /// Cache state for the entity `(type_name, key)`.
    ///
    /// `skip` requests cache-skipping for this instance; the manager-wide
    /// setting forces it on.
    pub fn record(&self, type_name: &'static str, key: &str, skip: bool) -> UrResult<Record> {
        validate_key(key)?;
        let dir = self.type_dir(type_name)?.join(encode_key(key));
        Ok(Record::new(
            type_name,
            key.to_string(),
            dir,
            skip || self.skip_cache,
        ))
    }

    /// Build an entity of type `E` for `key`, handing it `ctx`
    pub fn get_or_create<E: FromRecord<C>, C>(&self, key: &str, skip: bool, ctx: C) -> UrResult<E> {
        let record = self.record(<E as FromRecord<C>>::TYPE_NAME, key, skip)?;
        Ok(E::from_record(record, ctx))
    }

    /// Every cached entity under the root that holds at least one field,
    /// in path order
    pub fn entries(&self) -> UrResult<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        if !self.root.exists() {
            return Ok(entries);
        }

        for type_dir in sorted_dirs(&self.root)? {
            let type_name = file_name(&type_dir);
            for dir in sorted_dirs(&type_dir)? {
                if let Some(entry) = read_entry(&type_name, &dir)? {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    /// Log what this process touched. Nothing is buffered, so there is
    /// nothing to write; cache contents are never deleted here.
    pub fn flush(&self) {
        let dirs = self.type_dirs.lock().unwrap_or_else(PoisonError::into_inner);
        if !dirs.is_empty() {
            let names: Vec<&str> = dirs.keys().copied().collect();
            info!("Cache {} used for: {}", self.root.display(), names.join(", "));
        }
    }
}

/// Entity types with a fixed cache type name, built from their record plus
/// whatever collaborators `C` they need
pub trait FromRecord<C>: Sized {
    const TYPE_NAME: &'static str;

    fn from_record(record: Record, ctx: C) -> Self;
}

/// Reject keys that would escape the type directory
fn validate_key(key: &str) -> UrResult<()> {
    let invalid = |reason: &str| UrError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if key.starts_with('/') || key.contains('\\') || key.contains('\0') {
        return Err(invalid("must be a relative path without backslashes"));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid("must not contain empty, '.' or '..' segments"));
    }
    Ok(())
}

/// Directory name for `key`
fn encode_key(key: &str) -> String {
    key.replace('%', "%25").replace('/', "%2F")
}

/// Key stored in the directory name `name`
fn decode_key(name: &str) -> String {
    name.replace("%2F", "/").replace("%25", "%")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sorted_dirs(dir: &Path) -> UrResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let read = fs::read_dir(dir)
        .map_err(|e| UrError::io(format!("reading cache directory {}", dir.display()), e))?;
    for entry in read {
        let entry = entry.map_err(|e| UrError::io("reading cache entry", e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn read_entry(type_name: &str, dir: &Path) -> UrResult<Option<CacheEntry>> {
    let read = fs::read_dir(dir)
        .map_err(|e| UrError::io(format!("reading cache directory {}", dir.display()), e))?;
    let mut fields = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| UrError::io("reading cache entry", e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".part") {
            fields.push(name);
        }
    }
    if fields.is_empty() {
        return Ok(None);
    }
    fields.sort();

    let modified = fs::metadata(dir)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Local>::from);
    Ok(Some(CacheEntry {
        type_name: type_name.to_string(),
        key: decode_key(&file_name(dir)),
        fields,
        modified,
    }))
}
