//! Serializers between in-memory field values and cache files

use crate::error::{UrError, UrResult};
use crate::http::write_atomically;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// A load/save pair for one representation of a cached value.
///
/// Implementations are stateless; the field engine calls them through
/// function pointers, so both methods are associated functions.
pub trait Serializer<V> {
    /// Read a value back from `path`
    fn load(path: &Path) -> UrResult<V>;

    /// Write `value` to `path`
    fn save(path: &Path, value: &V) -> UrResult<()>;
}

/// UTF-8 JSON documents (the default)
pub struct Json;

impl<V: Serialize + DeserializeOwned> Serializer<V> for Json {
    fn load(path: &Path) -> UrResult<V> {
        let content = fs::read(path)
            .map_err(|e| UrError::io(format!("reading cache file {}", path.display()), e))?;
        serde_json::from_slice(&content).map_err(|e| UrError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn save(path: &Path, value: &V) -> UrResult<()> {
        let content = serde_json::to_vec(value)?;
        write_cache_file(path, &content)
    }
}

/// Raw bytes, written verbatim
pub struct Bytes;

impl Serializer<Vec<u8>> for Bytes {
    fn load(path: &Path) -> UrResult<Vec<u8>> {
        fs::read(path).map_err(|e| UrError::io(format!("reading cache file {}", path.display()), e))
    }

    fn save(path: &Path, value: &Vec<u8>) -> UrResult<()> {
        write_cache_file(path, value)
    }
}

/// UTF-8 text, written verbatim
pub struct Text;

impl Serializer<String> for Text {
    fn load(path: &Path) -> UrResult<String> {
        let bytes = Bytes::load(path)?;
        String::from_utf8(bytes).map_err(|e| UrError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn save(path: &Path, value: &String) -> UrResult<()> {
        write_cache_file(path, value.as_bytes())
    }
}

/// Field files appear whole or not at all
fn write_cache_file(path: &Path, content: &[u8]) -> UrResult<()> {
    write_atomically(path, |file| file.write_all(content))
}
