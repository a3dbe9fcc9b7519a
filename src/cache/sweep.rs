//! Background expiry sweeping shared by every cache type.

use std::sync::{Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::error::CacheError;
use super::lock::mutex_lock;

const METRIC_CACHE_SWEEP_EVICT: &str = "fedcache_cache_sweep_evict_total";

/// Implemented by cache internals that can drop their expired entries.
pub trait Sweep: Send + Sync + 'static {
    /// Evict every expired entry, returning how many were removed.
    fn sweep(&self) -> usize;
}

/// Uniform control over a cache owned by the registry.
#[async_trait]
pub trait ManagedCache: Send + Sync {
    fn name(&self) -> &'static str;

    fn ttl(&self) -> Duration;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether confirmed absences are remembered.
    fn caches_negative(&self) -> bool {
        false
    }

    fn start_sweep(&self, freq: Duration) -> Result<(), CacheError>;

    async fn stop_sweep(&self) -> Result<(), CacheError>;

    fn is_sweeping(&self) -> bool;
}

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the periodic sweep task of a single cache.
pub(crate) struct SweepLoop {
    cache: &'static str,
    running: Mutex<Option<Running>>,
}

impl SweepLoop {
    pub(crate) fn new(cache: &'static str) -> Self {
        Self {
            cache,
            running: Mutex::new(None),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        mutex_lock(&self.running, self.cache, "sweep.is_running").is_some()
    }

    /// Spawn the sweep task on the current tokio runtime.
    ///
    /// The task holds only a weak reference so a dropped cache ends its loop.
    pub(crate) fn start<S: Sweep>(
        &self,
        target: Weak<S>,
        freq: Duration,
    ) -> Result<(), CacheError> {
        if freq.is_zero() {
            return Err(CacheError::invalid_config(
                self.cache,
                "sweep frequency must be greater than zero to start a sweep loop",
            ));
        }

        let mut running = mutex_lock(&self.running, self.cache, "sweep.start");
        if running.is_some() {
            return Err(CacheError::AlreadyStarted { cache: self.cache });
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let cache = self.cache;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(freq);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // first tick fires immediately

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(target) = target.upgrade() else {
                            debug!(cache, "cache dropped, ending sweep loop");
                            break;
                        };
                        let evicted = target.sweep();
                        if evicted > 0 {
                            counter!(METRIC_CACHE_SWEEP_EVICT, "cache" => cache)
                                .increment(evicted as u64);
                            debug!(cache, evicted, "swept expired cache entries");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        info!(cache, sweep_freq_ms = freq.as_millis() as u64, "cache sweep loop started");
        *running = Some(Running { shutdown, handle });
        Ok(())
    }

    /// Signal the sweep task and wait for any in-flight sweep to finish.
    pub(crate) async fn stop(&self) -> Result<(), CacheError> {
        let running = mutex_lock(&self.running, self.cache, "sweep.stop").take();
        let Some(Running { shutdown, handle }) = running else {
            return Err(CacheError::NotStarted { cache: self.cache });
        };

        // The receiver may already be gone if the cache was dropped.
        let _ = shutdown.send(true);
        if let Err(err) = handle.await {
            error!(cache = self.cache, error = %err, "cache sweep task ended abnormally");
        }

        info!(cache = self.cache, "cache sweep loop stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counting {
        sweeps: AtomicUsize,
    }

    impl Sweep for Counting {
        fn sweep(&self) -> usize {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_on_every_tick_until_stopped() {
        let target = Arc::new(Counting::default());
        let sweeper = SweepLoop::new("test");

        sweeper
            .start(Arc::downgrade(&target), Duration::from_secs(10))
            .expect("start sweep loop");
        assert!(sweeper.is_running());

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(target.sweeps.load(Ordering::SeqCst), 3);

        sweeper.stop().await.expect("stop sweep loop");
        assert!(!sweeper.is_running());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(target.sweeps.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn double_start_is_a_state_error() {
        let target = Arc::new(Counting::default());
        let sweeper = SweepLoop::new("test");

        sweeper
            .start(Arc::downgrade(&target), Duration::from_secs(60))
            .expect("first start");
        let err = sweeper
            .start(Arc::downgrade(&target), Duration::from_secs(60))
            .expect_err("second start rejected");
        assert_eq!(err, CacheError::AlreadyStarted { cache: "test" });

        sweeper.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn stop_without_start_is_a_state_error() {
        let sweeper = SweepLoop::new("test");
        let err = sweeper.stop().await.expect_err("stop rejected");
        assert_eq!(err, CacheError::NotStarted { cache: "test" });
        assert!(err.is_state_error());
    }

    #[tokio::test]
    async fn zero_frequency_cannot_start() {
        let target = Arc::new(Counting::default());
        let sweeper = SweepLoop::new("test");
        let err = sweeper
            .start(Arc::downgrade(&target), Duration::ZERO)
            .expect_err("zero frequency rejected");
        assert!(matches!(err, CacheError::InvalidConfig { .. }));
        assert!(!sweeper.is_running());
    }
}
