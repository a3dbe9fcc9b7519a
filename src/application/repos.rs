//! Repository traits describing persistence adapters.
//!
//! Lookups of a single row return `RepoError::NotFound` when the row does not
//! exist; that is the only error the caches remember.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{Account, Block, Follow, FollowRequest, List, ListEntry};
use crate::domain::types::FollowDirection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("resource not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("database timeout")]
    Timeout,
    #[error("operation cancelled")]
    Cancelled,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// Permanent absence, as opposed to a failure to find out.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

#[async_trait]
pub trait AccountsRepo: Send + Sync {
    async fn get_account_by_id(&self, id: &str) -> Result<Account, RepoError>;

    async fn get_account_by_uri(&self, uri: &str) -> Result<Account, RepoError>;

    /// `domain` is empty for local accounts.
    async fn get_account_by_username_domain(
        &self,
        username: &str,
        domain: &str,
    ) -> Result<Account, RepoError>;

    async fn put_account(&self, account: &Account) -> Result<(), RepoError>;

    async fn delete_account(&self, id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait RelationshipsRepo: Send + Sync {
    async fn get_follow_by_id(&self, id: &str) -> Result<Follow, RepoError>;

    async fn get_follow(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<Follow, RepoError>;

    /// Follow IDs owned by `account_id` in `direction`, newest first.
    async fn get_follow_ids(
        &self,
        account_id: &str,
        direction: FollowDirection,
    ) -> Result<Vec<String>, RepoError>;

    async fn put_follow(&self, follow: &Follow) -> Result<(), RepoError>;

    async fn delete_follow_by_id(&self, id: &str) -> Result<(), RepoError>;

    async fn get_follow_request_by_id(&self, id: &str) -> Result<FollowRequest, RepoError>;

    async fn get_follow_request(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<FollowRequest, RepoError>;

    /// Follow request IDs owned by `account_id` in `direction`, newest first.
    async fn get_follow_request_ids(
        &self,
        account_id: &str,
        direction: FollowDirection,
    ) -> Result<Vec<String>, RepoError>;

    async fn put_follow_request(&self, request: &FollowRequest) -> Result<(), RepoError>;

    async fn delete_follow_request_by_id(&self, id: &str) -> Result<(), RepoError>;

    async fn get_block_by_id(&self, id: &str) -> Result<Block, RepoError>;

    async fn get_block(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<Block, RepoError>;

    /// IDs of the blocks created by `account_id`, newest first.
    async fn get_block_ids(&self, account_id: &str) -> Result<Vec<String>, RepoError>;

    async fn put_block(&self, block: &Block) -> Result<(), RepoError>;

    async fn delete_block_by_id(&self, id: &str) -> Result<(), RepoError>;

    /// Every blocked domain, in no particular order.
    async fn get_blocked_domains(&self) -> Result<Vec<String>, RepoError>;

    async fn put_domain_block(&self, domain: &str) -> Result<(), RepoError>;

    async fn delete_domain_block(&self, domain: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ListsRepo: Send + Sync {
    async fn get_list_by_id(&self, id: &str) -> Result<List, RepoError>;

    async fn put_list(&self, list: &List) -> Result<(), RepoError>;

    /// Entries are removed along with the list.
    async fn delete_list(&self, id: &str) -> Result<(), RepoError>;

    async fn get_list_entry_by_id(&self, id: &str) -> Result<ListEntry, RepoError>;

    /// IDs of the entries of `list_id`, newest first.
    async fn get_list_entry_ids(&self, list_id: &str) -> Result<Vec<String>, RepoError>;

    async fn put_list_entry(&self, entry: &ListEntry) -> Result<(), RepoError>;

    async fn delete_list_entry(&self, id: &str) -> Result<(), RepoError>;
}
