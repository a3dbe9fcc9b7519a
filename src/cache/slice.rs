//! Cache of ordered identifier lists.
//!
//! Lists are stored whole and replaced whole; a mutation that changes a
//! relation invalidates the affected keys instead of patching them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;

use super::config::CacheSettings;
use super::error::CacheError;
use super::sweep::ManagedCache;
use super::ttl::TtlCache;

const METRIC_CACHE_HIT: &str = "fedcache_cache_hit_total";
const METRIC_CACHE_MISS: &str = "fedcache_cache_miss_total";

pub struct SliceCache<T> {
    lists: TtlCache<String, Arc<[T]>>,
}

impl<T> SliceCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, settings: CacheSettings) -> Result<Self, CacheError> {
        Ok(Self {
            lists: TtlCache::new(name, settings)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.lists.name()
    }

    pub fn ttl(&self) -> Duration {
        self.lists.ttl()
    }

    /// Cached list under `key`, running `loader` on a miss.
    ///
    /// Empty lists are cached like any other; loader errors are returned and
    /// nothing is stored.
    pub async fn load<F, Fut, E>(&self, key: &str, loader: F) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let list = self.fetch(key, loader).await?;
        Ok(list.to_vec())
    }

    /// Like [`SliceCache::load`], cloning only the part selected by `window`.
    pub async fn load_range<F, Fut, E, W>(
        &self,
        key: &str,
        loader: F,
        window: W,
    ) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        W: for<'a> FnOnce(&'a [T]) -> &'a [T],
    {
        let list = self.fetch(key, loader).await?;
        Ok(window(&list[..]).to_vec())
    }

    pub fn invalidate(&self, key: &str) {
        self.lists.invalidate(key);
    }

    pub fn invalidate_all(&self) {
        self.lists.clear();
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn start(&self, freq: Duration) -> Result<(), CacheError> {
        self.lists.start(freq)
    }

    pub async fn stop(&self) -> Result<(), CacheError> {
        self.lists.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.lists.is_running()
    }

    async fn fetch<F, Fut, E>(&self, key: &str, loader: F) -> Result<Arc<[T]>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(list) = self.lists.get(key) {
            counter!(METRIC_CACHE_HIT, "cache" => self.lists.name()).increment(1);
            return Ok(list);
        }
        counter!(METRIC_CACHE_MISS, "cache" => self.lists.name()).increment(1);

        // Concurrent misses may both load; the last store wins.
        let list: Arc<[T]> = loader().await?.into();
        self.lists.set(key.to_string(), Arc::clone(&list));
        Ok(list)
    }
}

#[async_trait]
impl<T> ManagedCache for SliceCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.lists.name()
    }

    fn ttl(&self) -> Duration {
        self.lists.ttl()
    }

    fn len(&self) -> usize {
        self.lists.len()
    }

    fn start_sweep(&self, freq: Duration) -> Result<(), CacheError> {
        self.lists.start(freq)
    }

    async fn stop_sweep(&self) -> Result<(), CacheError> {
        self.lists.stop().await
    }

    fn is_sweeping(&self) -> bool {
        self.lists.is_running()
    }
}

impl<T> std::fmt::Debug for SliceCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceCache")
            .field("lists", &self.lists)
            .finish()
    }
}
