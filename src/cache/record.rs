//! Per-instance cache state and the field resolution engine

use crate::cache::field::{DirectField, Field, FieldContext};
use crate::error::{UrError, UrResult};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Values a field may hold in memory
pub trait FieldValue: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> FieldValue for T {}

/// An identified object whose derived attributes are cached on disk.
///
/// Implementors only expose their [`Record`]; field access goes through
/// [`Entity::get`] and [`Entity::fetch`].
pub trait Entity: Sized {
    fn record(&self) -> &Record;

    /// Primary key
    fn key(&self) -> &str {
        self.record().key()
    }

    /// Resolve a computed field: memory, then disk, then `compute`
    fn get<V: FieldValue>(&self, field: &Field<Self, V>) -> UrResult<V> {
        resolve_field(self, field)
    }

    /// Resolve a fetched field: download if absent, then parse
    fn fetch<V: FieldValue>(&self, field: &DirectField<Self, V>) -> UrResult<V> {
        resolve_direct(self, field)
    }
}

struct Slot {
    value: Arc<dyn Any + Send + Sync>,
    shown: String,
}

/// Cache bookkeeping owned by each entity instance: its key, its directory
/// and the field values materialized so far.
pub struct Record {
    type_name: &'static str,
    key: String,
    dir: PathBuf,
    skip_cache: bool,
    slots: Mutex<BTreeMap<&'static str, Slot>>,
    downloaded: Mutex<BTreeSet<&'static str>>,
}

impl Record {
    pub(crate) fn new(type_name: &'static str, key: String, dir: PathBuf, skip_cache: bool) -> Self {
        Self {
            type_name,
            key,
            dir,
            skip_cache,
            slots: Mutex::new(BTreeMap::new()),
            downloaded: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `<cache_root>/<TypeName>/<key>`; may not exist yet
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn skips_cache(&self) -> bool {
        self.skip_cache
    }

    pub fn field_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Names of fields resolved on this instance
    pub fn materialized(&self) -> Vec<&'static str> {
        self.lock().keys().copied().collect()
    }

    fn ensure_dir(&self) -> UrResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            UrError::io(format!("creating cache directory {}", self.dir.display()), e)
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<&'static str, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `name` still needs its one forced refresh on this instance
    fn claim_refresh(&self, name: &'static str) -> bool {
        self.skip_cache
            && self
                .downloaded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(name)
    }

    fn cached<V: FieldValue>(&self, name: &str) -> Option<V> {
        self.lock()
            .get(name)
            .and_then(|slot| slot.value.downcast_ref::<V>().cloned())
    }

    fn store<V: FieldValue>(&self, name: &'static str, value: V) {
        let shown = format!("{:?}", value);
        self.lock().insert(
            name,
            Slot {
                value: Arc::new(value),
                shown,
            },
        );
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(id={}", self.type_name, self.key)?;
        for (name, slot) in self.lock().iter() {
            write!(f, ", {}={}", name, slot.shown)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Resolve `field` on `entity`.
///
/// A value already held in memory wins; otherwise an existing cache file
/// is loaded; otherwise the value is computed and (unless the entity skips
/// the cache or the field is no-save) written before being returned.
pub fn resolve_field<E: Entity, V: FieldValue>(entity: &E, field: &Field<E, V>) -> UrResult<V> {
    let record = entity.record();
    let name = field.name();

    if let Some(value) = record.cached::<V>(name) {
        return Ok(value);
    }

    let path = record.field_path(name);
    let ctx = FieldContext {
        entity,
        key: record.key(),
        name,
        path: &path,
    };

    let value = if !record.skips_cache() && path.exists() {
        debug!("Loading {}.{} from {}", record.type_name(), name, path.display());
        field.load(&ctx)?
    } else {
        debug!("Computing {}.{} for {}", record.type_name(), name, record.key());
        let value = field.compute(entity)?;
        if !record.skips_cache() {
            if let Some(save) = field.saver() {
                record.ensure_dir()?;
                save(&ctx, &value)?;
                debug!("Saved {}.{} to {}", record.type_name(), name, path.display());
            }
        }
        value
    };

    record.store(name, value.clone());
    Ok(value)
}

/// Resolve a fetched `field` on `entity`.
///
/// The artifact is downloaded when its cache path is missing. An entity
/// that skips the cache refreshes it on first access only. It is parsed on
/// every call.
pub fn resolve_direct<E: Entity, V: FieldValue>(
    entity: &E,
    field: &DirectField<E, V>,
) -> UrResult<V> {
    let record = entity.record();
    let name = field.name();
    let path = record.field_path(name);
    let ctx = FieldContext {
        entity,
        key: record.key(),
        name,
        path: &path,
    };

    if record.claim_refresh(name) || !path.exists() {
        debug!("Downloading {}.{} to {}", record.type_name(), name, path.display());
        record.ensure_dir()?;
        field.download(&ctx)?;
    }

    let value = field.parse(&ctx)?;
    record.store(name, value.clone());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::serializer::{Serializer, Text};
    use crate::cache::CacheManager;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Foo {
        record: Record,
        computed: Arc<AtomicUsize>,
    }

    impl Foo {
        const S: Field<Foo, String> = Field::new("s", Foo::double_id);
        const SHOUT: Field<Foo, String> =
            Field::with_serializer::<Text>("shout", Foo::shout).no_save();
        const LEN: Field<Foo, usize> = Field::new("len", Foo::len).load_with(Foo::load_len);

        fn open(cache: &CacheManager, key: &str, skip: bool, computed: &Arc<AtomicUsize>) -> Self {
            Self {
                record: cache.record("Foo", key, skip).unwrap(),
                computed: Arc::clone(computed),
            }
        }

        fn double_id(&self) -> UrResult<String> {
            self.computed.fetch_add(1, Ordering::SeqCst);
            Ok(self.key().repeat(2))
        }

        fn shout(&self) -> UrResult<String> {
            self.computed.fetch_add(1, Ordering::SeqCst);
            Ok(self.key().to_uppercase())
        }

        fn len(&self) -> UrResult<usize> {
            Ok(self.key().len())
        }

        fn load_len(ctx: &FieldContext<'_, Foo>) -> UrResult<usize> {
            // Stored as JSON, but read back doubled to prove the override runs
            let stored: usize = serde_json::from_slice(&fs::read(ctx.path).unwrap())?;
            Ok(stored * 2)
        }
    }

    impl Entity for Foo {
        fn record(&self) -> &Record {
            &self.record
        }
    }

    struct Page {
        record: Record,
        downloads: Arc<AtomicUsize>,
        parses: Arc<AtomicUsize>,
    }

    impl Page {
        const BODY: DirectField<Page, String> =
            DirectField::new("body", Page::download, Page::parse);

        fn download(ctx: &FieldContext<'_, Page>) -> UrResult<()> {
            ctx.entity.downloads.fetch_add(1, Ordering::SeqCst);
            fs::write(ctx.path, format!("<html>{}</html>", ctx.key)).unwrap();
            Ok(())
        }

        fn parse(ctx: &FieldContext<'_, Page>) -> UrResult<String> {
            ctx.entity.parses.fetch_add(1, Ordering::SeqCst);
            Text::load(ctx.path)
        }
    }

    impl Entity for Page {
        fn record(&self) -> &Record {
            &self.record
        }
    }

    fn page(cache: &CacheManager, key: &str, skip: bool) -> Page {
        Page {
            record: cache.record("Page", key, skip).unwrap(),
            downloads: Arc::new(AtomicUsize::new(0)),
            parses: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[test]
    fn field_computed_once_across_instances() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());
        let computed = Arc::new(AtomicUsize::new(0));

        let foo = Foo::open(&cache, "4", false, &computed);
        assert_eq!(computed.load(Ordering::SeqCst), 0);
        assert_eq!(foo.key(), "4");

        assert_eq!(foo.get(&Foo::S).unwrap(), "44");
        assert_eq!(computed.load(Ordering::SeqCst), 1);
        assert_eq!(foo.get(&Foo::S).unwrap(), "44");
        assert_eq!(computed.load(Ordering::SeqCst), 1);

        let foo2 = Foo::open(&cache, "4", false, &computed);
        assert_eq!(foo2.get(&Foo::S).unwrap(), "44");
        assert_eq!(computed.load(Ordering::SeqCst), 1);

        let foo3 = Foo::open(&cache, "4", true, &computed);
        assert_eq!(foo3.get(&Foo::S).unwrap(), "44");
        assert_eq!(computed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cache_layout_and_contents() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());
        let computed = Arc::new(AtomicUsize::new(0));

        Foo::open(&cache, "4", false, &computed).get(&Foo::S).unwrap();

        let types: Vec<_> = fs::read_dir(root.path()).unwrap().collect();
        assert_eq!(types.len(), 1);
        let file = root.path().join("Foo").join("4").join("s");
        assert_eq!(fs::read(&file).unwrap(), b"\"44\"");
        let entries: Vec<_> = fs::read_dir(root.path().join("Foo").join("4"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["s"]);
    }

    #[test]
    fn reload_uses_cache_file() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());
        let computed = Arc::new(AtomicUsize::new(0));

        {
            let foo = Foo::open(&cache, "7", false, &computed);
            foo.get(&Foo::S).unwrap();
        }

        // Tamper with the file: a fresh instance must load, not recompute
        fs::write(root.path().join("Foo/7/s"), b"\"cached\"").unwrap();
        let fresh = Foo::open(&cache, "7", false, &computed);
        assert_eq!(fresh.get(&Foo::S).unwrap(), "cached");
        assert_eq!(computed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn skip_cache_writes_nothing() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());
        let computed = Arc::new(AtomicUsize::new(0));

        let foo = Foo::open(&cache, "9", true, &computed);
        assert_eq!(foo.get(&Foo::S).unwrap(), "99");
        assert!(!root.path().join("Foo/9").exists());
    }

    #[test]
    fn no_save_field_recomputes_per_instance() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());
        let computed = Arc::new(AtomicUsize::new(0));

        let a = Foo::open(&cache, "ab", false, &computed);
        assert_eq!(a.get(&Foo::SHOUT).unwrap(), "AB");
        assert_eq!(a.get(&Foo::SHOUT).unwrap(), "AB");
        let b = Foo::open(&cache, "ab", false, &computed);
        assert_eq!(b.get(&Foo::SHOUT).unwrap(), "AB");

        assert_eq!(computed.load(Ordering::SeqCst), 2);
        assert!(!root.path().join("Foo/ab/shout").exists());
    }

    #[test]
    fn load_override_applies_on_cache_hit() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());
        let computed = Arc::new(AtomicUsize::new(0));

        assert_eq!(Foo::open(&cache, "abc", false, &computed).get(&Foo::LEN).unwrap(), 3);
        assert_eq!(Foo::open(&cache, "abc", false, &computed).get(&Foo::LEN).unwrap(), 6);
    }

    #[test]
    fn corrupt_cache_file_surfaces_decode_error() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());
        let computed = Arc::new(AtomicUsize::new(0));
        fs::create_dir_all(root.path().join("Foo/5")).unwrap();
        fs::write(root.path().join("Foo/5/s"), b"\"5").unwrap();

        let err = Foo::open(&cache, "5", false, &computed).get(&Foo::S).unwrap_err();
        assert!(matches!(err, UrError::Decode { .. }));
        assert_eq!(computed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn direct_field_downloads_once_parses_every_access() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());

        let page = page(&cache, "home", false);
        assert_eq!(page.fetch(&Page::BODY).unwrap(), "<html>home</html>");
        assert_eq!(page.fetch(&Page::BODY).unwrap(), "<html>home</html>");

        assert_eq!(page.downloads.load(Ordering::SeqCst), 1);
        assert_eq!(page.parses.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn direct_field_reuses_artifact_from_other_instance() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());

        page(&cache, "home", false).fetch(&Page::BODY).unwrap();
        let second = page(&cache, "home", false);
        second.fetch(&Page::BODY).unwrap();
        assert_eq!(second.downloads.load(Ordering::SeqCst), 0);

        let refreshed = page(&cache, "home", true);
        refreshed.fetch(&Page::BODY).unwrap();
        assert_eq!(refreshed.downloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn skip_cache_refreshes_once_per_instance() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());
        page(&cache, "home", false).fetch(&Page::BODY).unwrap();

        let refreshed = page(&cache, "home", true);
        for _ in 0..3 {
            assert_eq!(refreshed.fetch(&Page::BODY).unwrap(), "<html>home</html>");
        }
        assert_eq!(refreshed.downloads.load(Ordering::SeqCst), 1);
        assert_eq!(refreshed.parses.load(Ordering::SeqCst), 3);

        let again = page(&cache, "home", true);
        again.fetch(&Page::BODY).unwrap();
        assert_eq!(again.downloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn display_lists_materialized_fields() {
        let root = TempDir::new().unwrap();
        let cache = CacheManager::new(root.path());
        let computed = Arc::new(AtomicUsize::new(0));

        let foo = Foo::open(&cache, "4", false, &computed);
        assert_eq!(foo.record().to_string(), "Foo(id=4)");
        foo.get(&Foo::S).unwrap();
        assert_eq!(foo.record().to_string(), "Foo(id=4, s=\"44\")");
        assert_eq!(foo.record().materialized(), vec!["s"]);
    }
}
