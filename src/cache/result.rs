//! Multi-index result cache.
//!
//! One [`ResultCache`] holds values of a single entity type. Every value is
//! stored once in an LRU-ordered slot and registered under each configured
//! [`Index`]; removing a slot unregisters it from every index at once. Loader
//! errors accepted by the negative filter are remembered as absent entries so
//! repeated lookups of missing rows do not reach the store.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::config::CacheSettings;
use super::error::CacheError;
use super::index::{Index, IndexTable};
use super::lock::mutex_lock;
use super::sweep::{ManagedCache, Sweep, SweepLoop};

const METRIC_CACHE_HIT: &str = "fedcache_cache_hit_total";
const METRIC_CACHE_MISS: &str = "fedcache_cache_miss_total";
const METRIC_CACHE_NEGATIVE_HIT: &str = "fedcache_cache_negative_hit_total";
const METRIC_CACHE_EVICT: &str = "fedcache_cache_evict_total";

/// Decides whether a loader error records a confirmed absence.
pub type NegativeFilter<E> = fn(&E) -> bool;

struct Entry<V, E> {
    result: Result<V, E>,
    expires_at: Instant,
    keys: Vec<(usize, String)>,
}

impl<V, E> Entry<V, E> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Store<V, E> {
    entries: LruCache<u64, Entry<V, E>>,
    indices: IndexTable,
    next_slot: u64,
}

impl<V, E> Store<V, E> {
    fn remove_slot(&mut self, slot: u64) -> bool {
        let Some(entry) = self.entries.pop(&slot) else {
            return false;
        };
        for (index, key) in &entry.keys {
            self.indices.remove(*index, key, slot);
        }
        true
    }

    fn remove_key(&mut self, index: usize, key: &str) -> usize {
        let slots = self.indices.slots(index, key).to_vec();
        slots
            .into_iter()
            .filter(|slot| self.remove_slot(*slot))
            .count()
    }

    fn insert(&mut self, entry: Entry<V, E>) -> u64 {
        let slot = self.next_slot;
        self.next_slot = self.next_slot.wrapping_add(1);
        for (index, key) in &entry.keys {
            self.indices.insert(*index, key.clone(), slot);
        }
        self.entries.push(slot, entry);
        slot
    }
}

enum Lookup<V, E> {
    Hit(V),
    Negative(E),
    Miss,
}

struct Inner<V, E> {
    name: &'static str,
    indices: Vec<Index<V>>,
    max_size: usize,
    ttl: Duration,
    negative: Option<NegativeFilter<E>>,
    store: Mutex<Store<V, E>>,
}

impl<V, E> Inner<V, E>
where
    V: Clone,
    E: Clone,
{
    fn position(&self, index: &str) -> Option<usize> {
        let position = self.indices.iter().position(|idx| idx.name() == index);
        if position.is_none() {
            warn!(cache = self.name, index, "lookup on unknown cache index");
        }
        position
    }

    fn lookup(&self, index: usize, key: &str) -> Lookup<V, E> {
        let now = Instant::now();
        let mut store = mutex_lock(&self.store, self.name, "result.lookup");
        let Some(&slot) = store.indices.slots(index, key).first() else {
            return Lookup::Miss;
        };

        let expired = match store.entries.get(&slot) {
            Some(entry) if !entry.is_expired(now) => {
                return match &entry.result {
                    Ok(value) => Lookup::Hit(value.clone()),
                    Err(err) => Lookup::Negative(err.clone()),
                };
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            store.remove_slot(slot);
        }
        Lookup::Miss
    }

    fn remember(&self, result: Result<V, E>, keys: Vec<(usize, String)>) {
        if keys.is_empty() {
            return;
        }

        let now = Instant::now();
        let mut store = mutex_lock(&self.store, self.name, "result.store");

        // A unique key names one entry, so an older holder of any of our
        // unique keys is replaced along with every index it was under.
        for (index, key) in &keys {
            if !self.indices[*index].is_multi() {
                store.remove_key(*index, key);
            }
        }

        let mut evicted = 0u64;
        while store.entries.len() >= self.max_size {
            let Some((slot, entry)) = store.entries.pop_lru() else {
                break;
            };
            for (index, key) in &entry.keys {
                store.indices.remove(*index, key, slot);
            }
            evicted += 1;
        }
        if evicted > 0 {
            counter!(METRIC_CACHE_EVICT, "cache" => self.name).increment(evicted);
            trace!(cache = self.name, evicted, "evicted least recently used entries");
        }

        store.insert(Entry {
            result,
            expires_at: now + self.ttl,
            keys,
        });
    }

    fn keys_of(&self, value: &V) -> Vec<(usize, String)> {
        self.indices
            .iter()
            .enumerate()
            .filter_map(|(position, index)| index.key_of(value).map(|key| (position, key)))
            .collect()
    }
}

impl<V, E> Sweep for Inner<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut store = mutex_lock(&self.store, self.name, "result.sweep");
        let expired: Vec<u64> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(slot, _)| *slot)
            .collect();
        expired
            .into_iter()
            .filter(|slot| store.remove_slot(*slot))
            .count()
    }
}

/// Cache of entity values reachable through several indices.
///
/// Values are cloned on the way in and out; callers never share a value with
/// the cache.
pub struct ResultCache<V, E> {
    inner: Arc<Inner<V, E>>,
    sweeper: SweepLoop,
}

impl<V, E> ResultCache<V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Build a cache over `indices`; the first index is treated as primary.
    pub fn new(
        name: &'static str,
        indices: Vec<Index<V>>,
        settings: CacheSettings,
    ) -> Result<Self, CacheError> {
        settings.validate(name)?;
        if indices.is_empty() {
            return Err(CacheError::invalid_config(
                name,
                "a result cache needs at least one index",
            ));
        }
        for (i, index) in indices.iter().enumerate() {
            if indices[..i].iter().any(|other| other.name() == index.name()) {
                return Err(CacheError::invalid_config(
                    name,
                    format!("index `{}` is declared twice", index.name()),
                ));
            }
        }

        let table = IndexTable::new(indices.len());
        Ok(Self {
            inner: Arc::new(Inner {
                name,
                indices,
                max_size: settings.max_size,
                ttl: settings.ttl,
                negative: None,
                store: Mutex::new(Store {
                    entries: LruCache::unbounded(),
                    indices: table,
                    next_slot: 0,
                }),
            }),
            sweeper: SweepLoop::new(name),
        })
    }

    /// Remember loader errors accepted by `filter` as confirmed absences.
    ///
    /// Must be called before the cache is shared.
    #[must_use]
    pub fn with_negative_filter(mut self, filter: NegativeFilter<E>) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.negative = Some(filter),
            None => warn!(
                cache = self.inner.name,
                "negative filter ignored on a shared cache"
            ),
        }
        self
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

    pub fn caches_negative(&self) -> bool {
        self.inner.negative.is_some()
    }

    /// Number of stored entries, negative and not yet swept ones included.
    pub fn len(&self) -> usize {
        mutex_lock(&self.inner.store, self.inner.name, "result.len")
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cloned value stored under `key` in the unique index `index`.
    pub fn get(&self, index: &str, key: &str) -> Option<V> {
        let position = self.inner.position(index)?;
        match self.inner.lookup(position, key) {
            Lookup::Hit(value) => {
                counter!(METRIC_CACHE_HIT, "cache" => self.inner.name).increment(1);
                Some(value)
            }
            Lookup::Negative(_) | Lookup::Miss => {
                counter!(METRIC_CACHE_MISS, "cache" => self.inner.name).increment(1);
                None
            }
        }
    }

    /// Clones of every live value registered under `key`, oldest first.
    pub fn get_multi(&self, index: &str, key: &str) -> Vec<V> {
        let Some(position) = self.inner.position(index) else {
            return Vec::new();
        };

        let now = Instant::now();
        let mut store = mutex_lock(&self.inner.store, self.inner.name, "result.get_multi");
        let slots = store.indices.slots(position, key).to_vec();
        let mut values = Vec::with_capacity(slots.len());
        let mut expired = Vec::new();
        for slot in slots {
            match store.entries.get(&slot) {
                Some(entry) if entry.is_expired(now) => expired.push(slot),
                Some(Entry {
                    result: Ok(value), ..
                }) => values.push(value.clone()),
                _ => {}
            }
        }
        for slot in expired {
            store.remove_slot(slot);
        }
        values
    }

    /// Store a clone of `value` under every index it yields a key for.
    pub fn put(&self, value: &V) {
        let keys = self.inner.keys_of(value);
        if keys.is_empty() {
            debug!(cache = self.inner.name, "value yields no index keys, not cached");
            return;
        }
        self.inner.remember(Ok(value.clone()), keys);
    }

    /// Remove every entry reachable through `key`, from all indices.
    pub fn invalidate(&self, index: &str, key: &str) {
        let Some(position) = self.inner.position(index) else {
            return;
        };
        let removed = mutex_lock(&self.inner.store, self.inner.name, "result.invalidate")
            .remove_key(position, key);
        if removed > 0 {
            trace!(cache = self.inner.name, index, removed, "invalidated cache entries");
        }
    }

    pub fn clear(&self) {
        let mut store = mutex_lock(&self.inner.store, self.inner.name, "result.clear");
        store.entries.clear();
        store.indices.clear();
    }

    /// Cached lookup through a unique index, falling back to `loader`.
    ///
    /// The loader runs without the cache lock held. Its value is stored under
    /// every index; an error accepted by the negative filter is stored under
    /// `(index, key)` only, anything else is returned without being cached.
    pub async fn load<F, Fut>(&self, index: &str, key: &str, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let Some(position) = self.inner.position(index) else {
            return loader().await;
        };

        match self.inner.lookup(position, key) {
            Lookup::Hit(value) => {
                counter!(METRIC_CACHE_HIT, "cache" => self.inner.name).increment(1);
                return Ok(value);
            }
            Lookup::Negative(err) => {
                counter!(METRIC_CACHE_NEGATIVE_HIT, "cache" => self.inner.name).increment(1);
                return Err(err);
            }
            Lookup::Miss => {
                counter!(METRIC_CACHE_MISS, "cache" => self.inner.name).increment(1);
            }
        }

        match loader().await {
            Ok(value) => {
                self.put(&value);
                Ok(value)
            }
            Err(err) => {
                let remember = !self.inner.indices[position].is_multi()
                    && self.inner.negative.is_some_and(|accept| accept(&err));
                if remember {
                    self.inner
                        .remember(Err(err.clone()), vec![(position, key.to_string())]);
                }
                Err(err)
            }
        }
    }

    /// Start the background sweep with period `freq`.
    pub fn start(&self, freq: Duration) -> Result<(), CacheError> {
        self.sweeper.start(Arc::downgrade(&self.inner), freq)
    }

    pub async fn stop(&self) -> Result<(), CacheError> {
        self.sweeper.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.sweeper.is_running()
    }

    /// Evict every expired entry now.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }
}

#[async_trait]
impl<V, E> ManagedCache for ResultCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.inner.name
    }

    fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    fn len(&self) -> usize {
        ResultCache::len(self)
    }

    fn caches_negative(&self) -> bool {
        self.inner.negative.is_some()
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

impl<V, E> std::fmt::Debug for ResultCache<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("name", &self.inner.name)
            .field("indices", &self.inner.indices)
            .field("max_size", &self.inner.max_size)
            .field("ttl", &self.inner.ttl)
            .finish()
    }
}
