//! Content-addressed caching of fetched and parsed stylesheets.
//!
//! The store itself is a [`CacheBackend`]; the engine only talks to it
//! through [`CacheAdapter::get_or_compute`], which degrades to plain
//! computation whenever the backend misbehaves.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use css::Stylesheet;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use sha2::{Digest, Sha256};

use crate::error::CacheError;

/// A cached value. Entries are never mutated once stored.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    /// Raw stylesheet text, keyed by its URL.
    Text(Arc<str>),
    /// A parsed stylesheet, keyed by the hash of its text.
    Stylesheet(Arc<Stylesheet>),
}

/// Key-value store with per-entry TTL. Implementations must be safe to share
/// between threads.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    fn set(&self, key: &str, value: CacheEntry, ttl: Duration) -> Result<(), CacheError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Backends
// ─────────────────────────────────────────────────────────────────────────────

/// In-process cache. Expired entries read as absent; a `get` that finds one
/// drops it, and every `set` sweeps the rest.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (CacheEntry, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self.entries.upgradable_read();
        let fresh = match entries.get(key) {
            Some((entry, expires)) => (Instant::now() < *expires).then(|| entry.clone()),
            None => return Ok(None),
        };
        if fresh.is_none() {
            RwLockUpgradableReadGuard::upgrade(entries).remove(key);
        }
        Ok(fresh)
    }

    fn set(&self, key: &str, value: CacheEntry, ttl: Duration) -> Result<(), CacheError> {
        let Some(expires) = Instant::now().checked_add(ttl) else {
            return Ok(());
        };
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, (_, expires)| now < *expires);
        entries.insert(key.to_string(), (value, expires));
        Ok(())
    }
}

/// Stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl CacheBackend for NullCache {
    fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: CacheEntry, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}

/// The process-wide `default` cache.
pub fn shared_memory_cache() -> Arc<MemoryCache> {
    static SHARED: OnceLock<Arc<MemoryCache>> = OnceLock::new();
    Arc::clone(SHARED.get_or_init(|| Arc::new(MemoryCache::new())))
}

/// Look up a backend by its configured name: `default` is the shared
/// in-process cache, `dummy` disables caching. Unknown names fall back to
/// `default`.
pub fn backend_by_name(name: &str) -> Arc<dyn CacheBackend> {
    match name {
        "" | "default" => shared_memory_cache(),
        "dummy" | "none" => Arc::new(NullCache),
        other => {
            tracing::error!(
                backend = other,
                "unknown cache backend, falling back to the default one"
            );
            shared_memory_cache()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────────────────────────────────────

/// Values that can live in a [`CacheEntry`].
pub trait Cacheable: Clone {
    fn into_entry(self) -> CacheEntry;
    fn from_entry(entry: CacheEntry) -> Option<Self>;
}

impl Cacheable for Arc<str> {
    fn into_entry(self) -> CacheEntry {
        CacheEntry::Text(self)
    }

    fn from_entry(entry: CacheEntry) -> Option<Self> {
        match entry {
            CacheEntry::Text(text) => Some(text),
            CacheEntry::Stylesheet(_) => None,
        }
    }
}

impl Cacheable for Arc<Stylesheet> {
    fn into_entry(self) -> CacheEntry {
        CacheEntry::Stylesheet(self)
    }

    fn from_entry(entry: CacheEntry) -> Option<Self> {
        match entry {
            CacheEntry::Stylesheet(sheet) => Some(sheet),
            CacheEntry::Text(_) => None,
        }
    }
}

/// Result of a cache lookup.
#[derive(Debug)]
pub struct Lookup<T> {
    pub value: T,
    pub hit: bool,
    /// First backend failure seen; the value was computed directly.
    pub error: Option<CacheError>,
}

#[derive(Clone)]
pub struct CacheAdapter {
    backend: Arc<dyn CacheBackend>,
}

impl CacheAdapter {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn from_name(name: &str) -> Self {
        Self::new(backend_by_name(name))
    }

    /// Return the cached value for `key`, or compute and store it.
    pub fn get_or_compute<T: Cacheable>(
        &self,
        key: &str,
        ttl: Duration,
        compute: impl FnOnce() -> T,
    ) -> Lookup<T> {
        match self.try_get_or_compute(key, ttl, || Ok::<T, std::convert::Infallible>(compute())) {
            Ok(lookup) => lookup,
            Err(never) => match never {},
        }
    }

    /// Like [`get_or_compute`](Self::get_or_compute), for computations that
    /// can fail. Failures are returned and not cached.
    pub fn try_get_or_compute<T: Cacheable, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<Lookup<T>, E> {
        let mut error = None;
        match self.backend.get(key) {
            Ok(Some(entry)) => {
                if let Some(value) = T::from_entry(entry) {
                    tracing::trace!(key, "cache hit");
                    return Ok(Lookup {
                        value,
                        hit: true,
                        error: None,
                    });
                }
                tracing::debug!(key, "cache entry has the wrong type, recomputing");
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(key, %err, "cache get failed");
                error = Some(err);
            }
        }

        let value = compute()?;
        if error.is_none() {
            if let Err(err) = self.backend.set(key, value.clone().into_entry(), ttl) {
                tracing::warn!(key, %err, "cache set failed");
                error = Some(err);
            }
        }
        Ok(Lookup {
            value,
            hit: false,
            error,
        })
    }
}

/// `prefix` followed by the hex SHA-256 of `content`.
pub fn content_key(prefix: &str, content: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let digest = Sha256::digest(content.as_bytes());
    let mut out = String::with_capacity(prefix.len() + 64);
    out.push_str(prefix);
    for &b in digest.iter() {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct BrokenCache;

    impl CacheBackend for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        fn set(&self, _key: &str, _value: CacheEntry, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    fn text(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn computes_once_then_hits() {
        let adapter = CacheAdapter::new(Arc::new(MemoryCache::new()));
        let calls = Cell::new(0);
        let ttl = Duration::from_secs(60);
        for _ in 0..3 {
            let lookup = adapter.get_or_compute("k", ttl, || {
                calls.set(calls.get() + 1);
                text("body")
            });
            assert_eq!(&*lookup.value, "body");
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let cache = MemoryCache::new();
        cache
            .set("k", CacheEntry::Text(text("x")), Duration::ZERO)
            .unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("k").unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn set_sweeps_expired_entries() {
        let cache = MemoryCache::new();
        for key in ["a", "b"] {
            cache
                .set(key, CacheEntry::Text(text(key)), Duration::ZERO)
                .unwrap();
        }
        cache
            .set("c", CacheEntry::Text(text("c")), Duration::from_secs(60))
            .unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("c").unwrap().is_some());
    }

    #[test]
    fn wrong_entry_type_is_a_miss() {
        let cache = Arc::new(MemoryCache::new());
        let adapter = CacheAdapter::new(cache.clone());
        let ttl = Duration::from_secs(60);
        adapter.get_or_compute("k", ttl, || text("raw"));
        let lookup = adapter.get_or_compute("k", ttl, || Arc::new(Stylesheet::default()));
        assert!(!lookup.hit);
    }

    #[test]
    fn broken_backend_degrades_to_compute() {
        let adapter = CacheAdapter::new(Arc::new(BrokenCache));
        let lookup = adapter.get_or_compute("k", Duration::from_secs(1), || text("v"));
        assert_eq!(&*lookup.value, "v");
        assert!(!lookup.hit);
        assert!(matches!(lookup.error, Some(CacheError::Unavailable(_))));
    }

    #[test]
    fn failed_computation_is_not_cached() {
        let adapter = CacheAdapter::new(Arc::new(MemoryCache::new()));
        let ttl = Duration::from_secs(60);
        let failed: Result<Lookup<Arc<str>>, &str> =
            adapter.try_get_or_compute("k", ttl, || Err("boom"));
        assert!(failed.is_err());
        let lookup = adapter.get_or_compute("k", ttl, || text("later"));
        assert!(!lookup.hit);
        assert_eq!(&*lookup.value, "later");
    }

    #[test]
    fn content_keys_are_stable_hashes() {
        let a = content_key("p_", "body { color: red }");
        assert!(a.starts_with("p_"));
        assert_eq!(a.len(), 2 + 64);
        assert_eq!(a, content_key("p_", "body { color: red }"));
        assert_ne!(a, content_key("p_", "body { color: blue }"));
        assert_eq!(
            content_key("", ""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn unknown_backend_falls_back_to_default() {
        let a = backend_by_name("memcached");
        let b = backend_by_name("default");
        let key = content_key("fallback_test_", "x");
        a.set(&key, CacheEntry::Text(text("shared")), Duration::from_secs(60))
            .unwrap();
        assert!(b.get(&key).unwrap().is_some());
    }
}
