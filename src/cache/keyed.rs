//! One independent `TimedCache` per key.

use crate::cache::timed::{Fetch, TimedCache};
use crate::config::CacheConfig;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

type KeyedFetch<K, T, E> = Arc<dyn Fn(&K) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Parameterised timed cache: `refresh(key)` is memoized per key, with the
/// same TTL and single-flight guarantees as [`TimedCache`].
pub struct KeyedTimedCache<K, T, E> {
    ttl: Duration,
    refresh: KeyedFetch<K, T, E>,
    caches: Mutex<HashMap<K, Arc<TimedCache<T, E>>>>,
}

impl<K, T, E> KeyedTimedCache<K, T, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Memoize `refresh(key)` for `ttl`, independently per key.
    pub fn new<F, Fut>(ttl: Duration, refresh: F) -> Self
    where
        F: Fn(&K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            ttl,
            refresh: Arc::new(move |key: &K| refresh(key).boxed()),
            caches: Mutex::new(HashMap::new()),
        }
    }

    /// Same as [`new`](Self::new), with the TTL taken from `config`.
    pub fn from_config<F, Fut>(config: &CacheConfig, refresh: F) -> Self
    where
        F: Fn(&K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(config.ttl(), refresh)
    }

    /// Fresh value for `key`, fetching it if needed.
    pub async fn get(&self, key: &K) -> Result<T, E> {
        let cache = self.cache_for(key);
        cache.get().await
    }

    /// Fresh value for `key`, without fetching.
    pub fn peek(&self, key: &K) -> Option<T> {
        self.caches.lock().get(key).and_then(|cache| cache.peek())
    }

    /// Force the next `get(key)` to fetch.
    pub fn invalidate(&self, key: &K) {
        if let Some(cache) = self.caches.lock().get(key) {
            cache.invalidate();
        }
    }

    /// Force the next `get` of every key to fetch.
    pub fn invalidate_all(&self) {
        for cache in self.caches.lock().values() {
            cache.invalidate();
        }
    }

    fn cache_for(&self, key: &K) -> Arc<TimedCache<T, E>> {
        let mut caches = self.caches.lock();
        let cache = caches.entry(key.clone()).or_insert_with(|| {
            let refresh = Arc::clone(&self.refresh);
            let key = key.clone();
            let fetch: Fetch<T, E> = Arc::new(move || refresh(&key));
            Arc::new(TimedCache::with_fetch(self.ttl, fetch))
        });
        Arc::clone(cache)
    }
}
