//! Cached data access.
//!
//! [`CachedStore`] is the only way the rest of the application reads or
//! writes entities. Reads go through the registry's caches with the matching
//! repository call as loader; writes go to the repository first and then drop
//! or replace every cached value derived from the changed rows.

mod accounts;
mod lists;
mod relationships;

use std::sync::Arc;

use tracing::warn;

use crate::application::repos::{AccountsRepo, ListsRepo, RelationshipsRepo, RepoError};
use crate::cache::CacheRegistry;

#[derive(Clone)]
pub struct CachedStore {
    caches: Arc<CacheRegistry>,
    accounts: Arc<dyn AccountsRepo>,
    relationships: Arc<dyn RelationshipsRepo>,
    lists: Arc<dyn ListsRepo>,
}

impl CachedStore {
    pub fn new(
        caches: Arc<CacheRegistry>,
        accounts: Arc<dyn AccountsRepo>,
        relationships: Arc<dyn RelationshipsRepo>,
        lists: Arc<dyn ListsRepo>,
    ) -> Self {
        Self {
            caches,
            accounts,
            relationships,
            lists,
        }
    }

    pub fn caches(&self) -> &CacheRegistry {
        &self.caches
    }
}

impl std::fmt::Debug for CachedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedStore")
            .field("caches", &self.caches)
            .finish_non_exhaustive()
    }
}

/// Resolve `ids` one by one, skipping rows that vanished since the ID list
/// was cached.
async fn resolve_each<T, F, Fut>(
    kind: &'static str,
    ids: &[String],
    mut get: F,
) -> Result<Vec<T>, RepoError>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = Result<T, RepoError>>,
{
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        match get(id.clone()).await {
            Ok(value) => out.push(value),
            Err(RepoError::NotFound) => {
                warn!(kind, id = %id, "cached id list references a missing row, skipping");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(out)
}
