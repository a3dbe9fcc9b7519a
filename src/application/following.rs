use serde::Serialize;
use tracing::{debug, warn};

use crate::application::error::AppError;
use crate::application::repos::RepoError;
use crate::application::store::CachedStore;

const ACTIVITY_STREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

/// ActivityStreams collection of the actors a local account follows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowingCollection {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "totalItems")]
    pub total_items: usize,
    pub items: Vec<String>,
    /// Owner of the collection.
    #[serde(skip)]
    pub account_id: String,
}

#[derive(Clone, Debug)]
pub struct FollowingService {
    store: CachedStore,
}

impl FollowingService {
    pub fn new(store: CachedStore) -> Self {
        Self { store }
    }

    /// URIs of every account the local `username` follows, newest follow
    /// first. Follows whose target account is gone are left out.
    pub async fn following(&self, username: &str) -> Result<FollowingCollection, AppError> {
        let account = self
            .store
            .get_account_by_username_domain(username, "")
            .await?;
        let follows = self.store.get_account_follows(&account.id).await?;

        let mut items = Vec::with_capacity(follows.len());
        for follow in &follows {
            match self.store.get_account_by_id(&follow.target_account_id).await {
                Ok(target) => items.push(target.uri),
                Err(RepoError::NotFound) => {
                    warn!(
                        follow_id = %follow.id,
                        target_account_id = %follow.target_account_id,
                        "follow missing target account, skipping"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        debug!(username, total = items.len(), "built following collection");
        Ok(FollowingCollection {
            context: ACTIVITY_STREAMS_CONTEXT,
            id: account.following_uri,
            kind: "Collection",
            total_items: items.len(),
            items,
            account_id: account.id,
        })
    }
}
