//! Single-key cache with expiry and a size bound.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;

use super::config::CacheSettings;
use super::error::CacheError;
use super::lock::mutex_lock;
use super::sweep::{ManagedCache, Sweep, SweepLoop};

const METRIC_CACHE_EVICT: &str = "fedcache_cache_evict_total";

struct Timed<V> {
    value: V,
    expires_at: Instant,
}

struct Inner<K: Hash + Eq, V> {
    name: &'static str,
    max_size: usize,
    ttl: Duration,
    entries: Mutex<LruCache<K, Timed<V>>>,
}

impl<K, V> Sweep for Inner<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, self.name, "ttl.sweep");
        let expired: Vec<K> = entries
            .iter()
            .filter(|(_, timed)| now >= timed.expires_at)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }
}

/// Key/value cache whose entries live for a fixed TTL.
pub struct TtlCache<K: Hash + Eq, V> {
    inner: Arc<Inner<K, V>>,
    sweeper: SweepLoop,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(name: &'static str, settings: CacheSettings) -> Result<Self, CacheError> {
        settings.validate(name)?;
        Ok(Self {
            inner: Arc::new(Inner {
                name,
                max_size: settings.max_size,
                ttl: settings.ttl,
                entries: Mutex::new(LruCache::unbounded()),
            }),
            sweeper: SweepLoop::new(name),
        })
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn max_size(&self) -> usize {
        self.inner.max_size
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.inner.entries, self.inner.name, "ttl.get");
        let expired = match entries.get(key) {
            Some(timed) if now < timed.expires_at => return Some(timed.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    /// Store `value`, replacing any previous value under `key`.
    pub fn set(&self, key: K, value: V) {
        let expires_at = Instant::now() + self.inner.ttl;
        let mut entries = mutex_lock(&self.inner.entries, self.inner.name, "ttl.set");
        if !entries.contains(&key)
            && entries.len() >= self.inner.max_size
            && entries.pop_lru().is_some()
        {
            counter!(METRIC_CACHE_EVICT, "cache" => self.inner.name).increment(1);
        }
        entries.put(key, Timed { value, expires_at });
    }

    pub fn invalidate<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        mutex_lock(&self.inner.entries, self.inner.name, "ttl.invalidate").pop(key);
    }

    pub fn clear(&self) {
        mutex_lock(&self.inner.entries, self.inner.name, "ttl.clear").clear();
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.inner.entries, self.inner.name, "ttl.len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn start(&self, freq: Duration) -> Result<(), CacheError> {
        self.sweeper.start(Arc::downgrade(&self.inner), freq)
    }

    pub async fn stop(&self) -> Result<(), CacheError> {
        self.sweeper.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.sweeper.is_running()
    }

    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }
}

#[async_trait]
impl<K, V> ManagedCache for TtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.inner.name
    }

    fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    fn len(&self) -> usize {
        TtlCache::len(self)
    }

    fn start_sweep(&self, freq: Duration) -> Result<(), CacheError> {
        self.start(freq)
    }

    async fn stop_sweep(&self) -> Result<(), CacheError> {
        self.stop().await
    }

    fn is_sweeping(&self) -> bool {
        self.sweeper.is_running()
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.inner.name)
            .field("max_size", &self.inner.max_size)
            .field("ttl", &self.inner.ttl)
            .finish()
    }
}
