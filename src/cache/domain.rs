//! Blocked domain set.
//!
//! The whole set is loaded on first use and kept until cleared; a block on
//! `example.org` also covers every subdomain of it.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, RwLock};

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "domain_block";

#[derive(Debug, Default)]
pub struct DomainBlockCache {
    blocked: RwLock<Option<Arc<HashSet<String>>>>,
}

impl DomainBlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `domain` or any parent domain of it is blocked.
    ///
    /// `loader` runs only while the set is not cached; its error is returned
    /// and the set stays unloaded.
    pub async fn is_blocked<F, Fut, E>(&self, domain: &str, loader: F) -> Result<bool, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, E>>,
    {
        let domain = normalize(domain);
        if domain.is_empty() {
            return Ok(false);
        }

        let blocked = match self.cached() {
            Some(blocked) => blocked,
            None => {
                let loaded: HashSet<String> = loader()
                    .await?
                    .iter()
                    .map(|d| normalize(d))
                    .filter(|d| !d.is_empty())
                    .collect();
                let loaded = Arc::new(loaded);
                *rw_write(&self.blocked, SOURCE, "is_blocked.store") = Some(Arc::clone(&loaded));
                loaded
            }
        };

        Ok(parents(&domain).any(|candidate| blocked.contains(candidate)))
    }

    /// Drop the cached set; the next lookup reloads it.
    pub fn clear(&self) {
        *rw_write(&self.blocked, SOURCE, "clear") = None;
    }

    pub fn is_loaded(&self) -> bool {
        rw_read(&self.blocked, SOURCE, "is_loaded").is_some()
    }

    fn cached(&self) -> Option<Arc<HashSet<String>>> {
        rw_read(&self.blocked, SOURCE, "cached").clone()
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// `a.b.c`, `b.c`, `c`.
fn parents(domain: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(domain), |d| d.split_once('.').map(|(_, rest)| rest))
}
