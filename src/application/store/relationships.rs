use tracing::debug;

use crate::application::repos::RepoError;
use crate::cache::composite;
use crate::cache::keys::{self, FollowDirection};
use crate::domain::entities::{Block, Follow, FollowRequest};

use super::{CachedStore, resolve_each};

impl CachedStore {
    // ========================================================================
    // Follows
    // ========================================================================

    pub async fn get_follow_by_id(&self, id: &str) -> Result<Follow, RepoError> {
        self.caches
            .follow()
            .load("ID", id, || self.relationships.get_follow_by_id(id))
            .await
    }

    pub async fn get_follow(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<Follow, RepoError> {
        let Some(key) = composite(&[account_id, target_account_id]) else {
            return Err(RepoError::NotFound);
        };
        self.caches
            .follow()
            .load("AccountID.TargetAccountID", &key, || {
                self.relationships.get_follow(account_id, target_account_id)
            })
            .await
    }

    pub async fn is_following(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<bool, RepoError> {
        match self.get_follow(account_id, target_account_id).await {
            Ok(_) => Ok(true),
            Err(RepoError::NotFound) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Follow IDs of `account_id` in `direction`, newest first.
    pub async fn get_follow_ids(
        &self,
        account_id: &str,
        direction: FollowDirection,
    ) -> Result<Vec<String>, RepoError> {
        self.caches
            .follow_ids()
            .load(&keys::follow_ids(direction, account_id), || {
                self.relationships.get_follow_ids(account_id, direction)
            })
            .await
    }

    /// Follows created by `account_id`, newest first.
    pub async fn get_account_follows(&self, account_id: &str) -> Result<Vec<Follow>, RepoError> {
        let ids = self
            .get_follow_ids(account_id, FollowDirection::Following)
            .await?;
        resolve_each("follow", &ids, |id| async move {
            self.get_follow_by_id(&id).await
        })
        .await
    }

    /// Follows targeting `account_id`, newest first.
    pub async fn get_account_followers(
        &self,
        account_id: &str,
    ) -> Result<Vec<Follow>, RepoError> {
        let ids = self
            .get_follow_ids(account_id, FollowDirection::Followers)
            .await?;
        resolve_each("follow", &ids, |id| async move {
            self.get_follow_by_id(&id).await
        })
        .await
    }

    pub async fn put_follow(&self, follow: &Follow) -> Result<(), RepoError> {
        self.relationships.put_follow(follow).await?;
        self.caches.follow().put(follow);
        self.invalidate_follow_ids(&follow.account_id, &follow.target_account_id);
        Ok(())
    }

    /// Delete a follow along with the list entries made from it.
    pub async fn delete_follow_by_id(&self, id: &str) -> Result<(), RepoError> {
        let follow = self.get_follow_by_id(id).await?;
        self.relationships.delete_follow_by_id(id).await?;

        self.caches.follow().invalidate("ID", id);
        self.invalidate_follow_ids(&follow.account_id, &follow.target_account_id);

        // Entries of this follow may sit in lists whose entries were never
        // cached individually, so every list membership is dropped.
        self.caches.list_entry().invalidate("FollowID", id);
        self.caches.list_entry_ids().invalidate_all();
        Ok(())
    }

    fn invalidate_follow_ids(&self, account_id: &str, target_account_id: &str) {
        for key in keys::affected_follow_ids(account_id, target_account_id) {
            self.caches.follow_ids().invalidate(&key);
        }
    }

    // ========================================================================
    // Follow requests
    // ========================================================================

    pub async fn get_follow_request_by_id(&self, id: &str) -> Result<FollowRequest, RepoError> {
        self.caches
            .follow_request()
            .load("ID", id, || self.relationships.get_follow_request_by_id(id))
            .await
    }

    pub async fn get_follow_request(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<FollowRequest, RepoError> {
        let Some(key) = composite(&[account_id, target_account_id]) else {
            return Err(RepoError::NotFound);
        };
        self.caches
            .follow_request()
            .load("AccountID.TargetAccountID", &key, || {
                self.relationships
                    .get_follow_request(account_id, target_account_id)
            })
            .await
    }

    pub async fn get_follow_request_ids(
        &self,
        account_id: &str,
        direction: FollowDirection,
    ) -> Result<Vec<String>, RepoError> {
        self.caches
            .follow_request_ids()
            .load(&keys::follow_ids(direction, account_id), || {
                self.relationships
                    .get_follow_request_ids(account_id, direction)
            })
            .await
    }

    pub async fn put_follow_request(&self, request: &FollowRequest) -> Result<(), RepoError> {
        self.relationships.put_follow_request(request).await?;
        self.caches.follow_request().put(request);
        self.invalidate_follow_request_ids(&request.account_id, &request.target_account_id);
        Ok(())
    }

    pub async fn delete_follow_request_by_id(&self, id: &str) -> Result<(), RepoError> {
        let request = self.get_follow_request_by_id(id).await?;
        self.relationships.delete_follow_request_by_id(id).await?;
        self.caches.follow_request().invalidate("ID", id);
        self.invalidate_follow_request_ids(&request.account_id, &request.target_account_id);
        Ok(())
    }

    /// Turn a pending request into a follow carrying the same ID and URI.
    pub async fn accept_follow_request(&self, id: &str) -> Result<Follow, RepoError> {
        let request = self.get_follow_request_by_id(id).await?;
        let follow = Follow {
            id: request.id.clone(),
            created_at: request.created_at,
            uri: request.uri.clone(),
            account_id: request.account_id.clone(),
            target_account_id: request.target_account_id.clone(),
            show_reblogs: true,
            notify: false,
        };

        self.delete_follow_request_by_id(id).await?;
        self.put_follow(&follow).await?;
        debug!(follow_id = %follow.id, "follow request accepted");
        Ok(follow)
    }

    fn invalidate_follow_request_ids(&self, account_id: &str, target_account_id: &str) {
        for key in keys::affected_follow_ids(account_id, target_account_id) {
            self.caches.follow_request_ids().invalidate(&key);
        }
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    pub async fn get_block_by_id(&self, id: &str) -> Result<Block, RepoError> {
        self.caches
            .block()
            .load("ID", id, || self.relationships.get_block_by_id(id))
            .await
    }

    pub async fn get_block(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<Block, RepoError> {
        let Some(key) = composite(&[account_id, target_account_id]) else {
            return Err(RepoError::NotFound);
        };
        self.caches
            .block()
            .load("AccountID.TargetAccountID", &key, || {
                self.relationships.get_block(account_id, target_account_id)
            })
            .await
    }

    /// Whether either account blocks the other.
    pub async fn is_either_blocked(&self, a: &str, b: &str) -> Result<bool, RepoError> {
        for (account_id, target_account_id) in [(a, b), (b, a)] {
            match self.get_block(account_id, target_account_id).await {
                Ok(_) => return Ok(true),
                Err(RepoError::NotFound) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(false)
    }

    pub async fn get_block_ids(&self, account_id: &str) -> Result<Vec<String>, RepoError> {
        self.caches
            .block_ids()
            .load(&keys::block_ids(account_id), || {
                self.relationships.get_block_ids(account_id)
            })
            .await
    }

    pub async fn put_block(&self, block: &Block) -> Result<(), RepoError> {
        self.relationships.put_block(block).await?;
        self.caches.block().put(block);
        self.caches
            .block_ids()
            .invalidate(&keys::block_ids(&block.account_id));
        Ok(())
    }

    pub async fn delete_block_by_id(&self, id: &str) -> Result<(), RepoError> {
        let block = self.get_block_by_id(id).await?;
        self.relationships.delete_block_by_id(id).await?;
        self.caches.block().invalidate("ID", id);
        self.caches
            .block_ids()
            .invalidate(&keys::block_ids(&block.account_id));
        Ok(())
    }

    // ========================================================================
    // Domain blocks
    // ========================================================================

    /// Whether `domain` or one of its parent domains is blocked.
    pub async fn is_domain_blocked(&self, domain: &str) -> Result<bool, RepoError> {
        self.caches
            .domain_block()
            .is_blocked(domain, || self.relationships.get_blocked_domains())
            .await
    }

    pub async fn put_domain_block(&self, domain: &str) -> Result<(), RepoError> {
        self.relationships.put_domain_block(domain).await?;
        self.caches.domain_block().clear();
        debug!(domain, "domain blocked");
        Ok(())
    }

    pub async fn delete_domain_block(&self, domain: &str) -> Result<(), RepoError> {
        self.relationships.delete_domain_block(domain).await?;
        self.caches.domain_block().clear();
        Ok(())
    }
}
