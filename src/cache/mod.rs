//! In-process caches between the business logic and the database.
//!
//! - **Result caches**: entity values reachable through several indices, with
//!   TTL expiry, LRU size bounds and negative caching of absent rows.
//! - **ID-list caches**: ordered ID collections such as a follower list.
//! - **Registry**: owns one cache of each kind for the process lifetime.
//!
//! ## Configuration
//!
//! Every cache is sized and timed independently in `fedcache.toml`:
//!
//! ```toml
//! [cache.account]
//! max_size = 2000
//! ttl_seconds = 1800
//! sweep_freq_seconds = 60
//! ```

mod config;
mod domain;
mod error;
mod index;
pub mod keys;
pub(crate) mod lock;
mod registry;
mod result;
mod slice;
mod sweep;
mod ttl;

pub use config::{CacheConfig, CacheKind, CacheSettings};
pub use domain::DomainBlockCache;
pub use error::CacheError;
pub use index::{Index, KEY_SEPARATOR, composite, composite_allow_empty, key};
pub use registry::{CacheRegistry, EntityCache, IdListCache};
pub use result::{NegativeFilter, ResultCache};
pub use slice::SliceCache;
pub use sweep::{ManagedCache, Sweep};
pub use ttl::TtlCache;
