use bytes::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

const DEFAULT_CACHE_CAPACITY: usize = 64;

/// A fetched image, kept as its encoded bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub source_url: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Bitmap {
    pub fn new(source_url: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            source_url: source_url.into(),
            content_type,
            data,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// In-memory LRU of bitmaps keyed by source URL.
#[derive(Debug)]
pub struct BitmapCache {
    entries: Mutex<LruCache<String, Arc<Bitmap>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl BitmapCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    // The cache holds no invariants a panicking holder could break
    fn entries(&self) -> MutexGuard<'_, LruCache<String, Arc<Bitmap>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<Arc<Bitmap>> {
        let found = self.entries().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains(key)
    }

    pub fn put(&self, key: impl Into<String>, bitmap: Arc<Bitmap>) {
        let key = key.into();
        if let Some((evicted, _)) = self.entries().push(key.clone(), bitmap) {
            if evicted != key {
                trace!("Evicted bitmap {}", evicted);
            }
        }
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Bitmap>> {
        self.entries().pop(key)
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries().cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
