//! Field descriptors
//!
//! A [`Field`] is a lazily computed attribute persisted to
//! `<entity dir>/<name>`; a [`DirectField`] is a lazily *fetched* artifact
//! whose raw download is persisted and re-parsed on every access.
//!
//! Descriptors are plain data (names plus function pointers), so entity
//! types declare them as associated constants:
//!
//! ```rust,ignore
//! impl Gist {
//!     pub const USER: Field<Gist, String> = Field::new("user", Gist::scrape_user);
//! }
//!
//! let user = gist.get(&Gist::USER)?;
//! ```

use crate::cache::serializer::{Json, Serializer};
use crate::error::UrResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Everything a compute/load/save/download function may need, passed
/// explicitly instead of being bound by parameter name.
pub struct FieldContext<'a, E> {
    /// Entity the field belongs to
    pub entity: &'a E,
    /// Entity primary key
    pub key: &'a str,
    /// Field name (also the cache file name)
    pub name: &'static str,
    /// Cache path for this field
    pub path: &'a Path,
}

pub type ComputeFn<E, V> = fn(&E) -> UrResult<V>;
pub type LoadFn<E, V> = fn(&FieldContext<'_, E>) -> UrResult<V>;
pub type SaveFn<E, V> = fn(&FieldContext<'_, E>, &V) -> UrResult<()>;
pub type DownloadFn<E> = fn(&FieldContext<'_, E>) -> UrResult<()>;

fn serializer_load<E, V, S: Serializer<V>>(ctx: &FieldContext<'_, E>) -> UrResult<V> {
    S::load(ctx.path)
}

fn serializer_save<E, V, S: Serializer<V>>(ctx: &FieldContext<'_, E>, value: &V) -> UrResult<()> {
    S::save(ctx.path, value)
}

/// A lazily computed, disk-persisted attribute of entity type `E`
pub struct Field<E, V> {
    name: &'static str,
    compute: ComputeFn<E, V>,
    load: LoadFn<E, V>,
    save: Option<SaveFn<E, V>>,
}

impl<E, V: Serialize + DeserializeOwned> Field<E, V> {
    /// A field persisted as JSON
    pub const fn new(name: &'static str, compute: ComputeFn<E, V>) -> Self {
        Self::with_serializer::<Json>(name, compute)
    }
}

impl<E, V> Field<E, V> {
    /// A field persisted with serializer `S`
    pub const fn with_serializer<S: Serializer<V>>(
        name: &'static str,
        compute: ComputeFn<E, V>,
    ) -> Self {
        Self {
            name,
            compute,
            load: serializer_load::<E, V, S>,
            save: Some(serializer_save::<E, V, S>),
        }
    }

    /// Override how the cache file is read back
    pub const fn load_with(self, load: LoadFn<E, V>) -> Self {
        Self { load, ..self }
    }

    /// Never write this field; it is recomputed by every new entity
    pub const fn no_save(self) -> Self {
        Self { save: None, ..self }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn compute(&self, entity: &E) -> UrResult<V> {
        (self.compute)(entity)
    }

    pub(crate) fn load(&self, ctx: &FieldContext<'_, E>) -> UrResult<V> {
        (self.load)(ctx)
    }

    pub(crate) fn saver(&self) -> Option<SaveFn<E, V>> {
        self.save
    }
}

/// A lazily fetched artifact: `download` populates the cache path once,
/// `parse` turns it into an in-memory value on every access.
pub struct DirectField<E, V> {
    name: &'static str,
    download: DownloadFn<E>,
    parse: LoadFn<E, V>,
}

impl<E, V> DirectField<E, V> {
    pub const fn new(name: &'static str, download: DownloadFn<E>, parse: LoadFn<E, V>) -> Self {
        Self {
            name,
            download,
            parse,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn download(&self, ctx: &FieldContext<'_, E>) -> UrResult<()> {
        (self.download)(ctx)
    }

    pub(crate) fn parse(&self, ctx: &FieldContext<'_, E>) -> UrResult<V> {
        (self.parse)(ctx)
    }
}
