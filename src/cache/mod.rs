//! Lazy persistent-field cache
//!
//! Entities (gists, repositories, commits, fetched URLs) declare derived
//! attributes as [`Field`]s and fetched artifacts as [`DirectField`]s. The
//! first access computes or downloads the value and writes it under the
//! cache root; later accesses, in this process or another, read it back.
//!
//! # Layout
//!
//! ```text
//! <cache_root>/<EntityType>/<primary_key>/<field_name>
//! <cache_root>/<EntityType>/<primary_key>/clone/
//! ```
//!
//! A key containing `/` is one directory, with `/` written as `%2F`.
//!
//! # Resolution order
//!
//! | Step | Field | DirectField |
//! |------|-------|-------------|
//! | in memory | return it | re-parse |
//! | file exists | load | parse |
//! | file missing | compute, save, keep | download, parse |
//!
//! Cache-skipping entities never read or write field files; for direct
//! fields they force one fresh download per instance.

pub mod field;
pub mod manager;
pub mod record;
pub mod serializer;

pub use field::{DirectField, Field, FieldContext};
pub use manager::{CacheEntry, CacheManager, FromRecord, CACHE_ROOT_ENV, DEFAULT_CACHE_DIR, SKIP_CACHE_ENV};
pub use record::{resolve_direct, resolve_field, Entity, FieldValue, Record};
pub use serializer::{Bytes, Json, Serializer, Text};
