//! In-memory persistence used by the demo server and the test suites.
//!
//! Every table is a [`DashMap`] keyed by row ID. Secondary lookups scan the
//! table, which is fine at demo scale. Reads are counted so tests can tell
//! cache hits from repository round trips, and a failure can be injected to
//! exercise error paths.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use crate::application::repos::{AccountsRepo, ListsRepo, RelationshipsRepo, RepoError};
use crate::cache::lock::mutex_lock;
use crate::domain::entities::{Account, Block, Follow, FollowRequest, List, ListEntry};
use crate::domain::types::FollowDirection;

#[derive(Debug, Default)]
pub struct MemoryRepositories {
    accounts: DashMap<String, Account>,
    follows: DashMap<String, Follow>,
    follow_requests: DashMap<String, FollowRequest>,
    blocks: DashMap<String, Block>,
    domain_blocks: DashSet<String>,
    lists: DashMap<String, List>,
    list_entries: DashMap<String, ListEntry>,
    reads: AtomicUsize,
    failure: Mutex<Option<RepoError>>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read calls served so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Make every following read fail with `error` until cleared with `None`.
    pub fn fail_reads(&self, error: Option<RepoError>) {
        *mutex_lock(&self.failure, "memory_repositories", "fail_reads") = error;
    }

    fn read(&self) -> Result<(), RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match mutex_lock(&self.failure, "memory_repositories", "read").as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn is_local(&self, account_id: &str) -> bool {
        self.accounts
            .get(account_id)
            .is_some_and(|account| account.is_local())
    }

    fn relation_ids<'a, I>(
        &self,
        rows: I,
        account_id: &str,
        direction: FollowDirection,
    ) -> Vec<String>
    where
        I: Iterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let ids = rows
            .filter(|(_, origin, target)| {
                let (owner, other) = if direction.is_outgoing() {
                    (origin, target)
                } else {
                    (target, origin)
                };
                *owner == account_id && (!direction.local_only() || self.is_local(other))
            })
            .map(|(id, _, _)| id.to_string())
            .collect();
        newest_first(ids)
    }
}

fn newest_first(mut ids: Vec<String>) -> Vec<String> {
    ids.sort_unstable_by(|a, b| b.cmp(a));
    ids
}

fn cloned<T: Clone>(row: Option<dashmap::mapref::one::Ref<'_, String, T>>) -> Result<T, RepoError> {
    row.map(|row| row.value().clone()).ok_or(RepoError::NotFound)
}

fn find<T: Clone>(
    table: &DashMap<String, T>,
    matches: impl Fn(&T) -> bool,
) -> Result<T, RepoError> {
    table
        .iter()
        .find(|row| matches(row.value()))
        .map(|row| row.value().clone())
        .ok_or(RepoError::NotFound)
}

fn remove<T>(table: &DashMap<String, T>, id: &str) -> Result<(), RepoError> {
    table.remove(id).map(|_| ()).ok_or(RepoError::NotFound)
}

#[async_trait]
impl AccountsRepo for MemoryRepositories {
    async fn get_account_by_id(&self, id: &str) -> Result<Account, RepoError> {
        self.read()?;
        cloned(self.accounts.get(id))
    }

    async fn get_account_by_uri(&self, uri: &str) -> Result<Account, RepoError> {
        self.read()?;
        find(&self.accounts, |account| account.uri == uri)
    }

    async fn get_account_by_username_domain(
        &self,
        username: &str,
        domain: &str,
    ) -> Result<Account, RepoError> {
        self.read()?;
        find(&self.accounts, |account| {
            account.username == username && account.domain == domain
        })
    }

    async fn put_account(&self, account: &Account) -> Result<(), RepoError> {
        self.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn delete_account(&self, id: &str) -> Result<(), RepoError> {
        remove(&self.accounts, id)
    }
}

#[async_trait]
impl RelationshipsRepo for MemoryRepositories {
    async fn get_follow_by_id(&self, id: &str) -> Result<Follow, RepoError> {
        self.read()?;
        cloned(self.follows.get(id))
    }

    async fn get_follow(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<Follow, RepoError> {
        self.read()?;
        find(&self.follows, |follow| {
            follow.account_id == account_id && follow.target_account_id == target_account_id
        })
    }

    async fn get_follow_ids(
        &self,
        account_id: &str,
        direction: FollowDirection,
    ) -> Result<Vec<String>, RepoError> {
        self.read()?;
        let rows: Vec<Follow> = self.follows.iter().map(|row| row.value().clone()).collect();
        Ok(self.relation_ids(
            rows.iter().map(|f| {
                (
                    f.id.as_str(),
                    f.account_id.as_str(),
                    f.target_account_id.as_str(),
                )
            }),
            account_id,
            direction,
        ))
    }

    async fn put_follow(&self, follow: &Follow) -> Result<(), RepoError> {
        self.follows.insert(follow.id.clone(), follow.clone());
        Ok(())
    }

    async fn delete_follow_by_id(&self, id: &str) -> Result<(), RepoError> {
        remove(&self.follows, id)?;
        self.list_entries.retain(|_, entry| entry.follow_id != id);
        Ok(())
    }

    async fn get_follow_request_by_id(&self, id: &str) -> Result<FollowRequest, RepoError> {
        self.read()?;
        cloned(self.follow_requests.get(id))
    }

    async fn get_follow_request(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<FollowRequest, RepoError> {
        self.read()?;
        find(&self.follow_requests, |request| {
            request.account_id == account_id && request.target_account_id == target_account_id
        })
    }

    async fn get_follow_request_ids(
        &self,
        account_id: &str,
        direction: FollowDirection,
    ) -> Result<Vec<String>, RepoError> {
        self.read()?;
        let rows: Vec<FollowRequest> = self
            .follow_requests
            .iter()
            .map(|row| row.value().clone())
            .collect();
        Ok(self.relation_ids(
            rows.iter().map(|r| {
                (
                    r.id.as_str(),
                    r.account_id.as_str(),
                    r.target_account_id.as_str(),
                )
            }),
            account_id,
            direction,
        ))
    }

    async fn put_follow_request(&self, request: &FollowRequest) -> Result<(), RepoError> {
        self.follow_requests
            .insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn delete_follow_request_by_id(&self, id: &str) -> Result<(), RepoError> {
        remove(&self.follow_requests, id)
    }

    async fn get_block_by_id(&self, id: &str) -> Result<Block, RepoError> {
        self.read()?;
        cloned(self.blocks.get(id))
    }

    async fn get_block(
        &self,
        account_id: &str,
        target_account_id: &str,
    ) -> Result<Block, RepoError> {
        self.read()?;
        find(&self.blocks, |block| {
            block.account_id == account_id && block.target_account_id == target_account_id
        })
    }

    async fn get_block_ids(&self, account_id: &str) -> Result<Vec<String>, RepoError> {
        self.read()?;
        let ids = self
            .blocks
            .iter()
            .filter(|row| row.account_id == account_id)
            .map(|row| row.id.clone())
            .collect();
        Ok(newest_first(ids))
    }

    async fn put_block(&self, block: &Block) -> Result<(), RepoError> {
        self.blocks.insert(block.id.clone(), block.clone());
        Ok(())
    }

    async fn delete_block_by_id(&self, id: &str) -> Result<(), RepoError> {
        remove(&self.blocks, id)
    }

    async fn get_blocked_domains(&self) -> Result<Vec<String>, RepoError> {
        self.read()?;
        Ok(self.domain_blocks.iter().map(|domain| domain.key().clone()).collect())
    }

    async fn put_domain_block(&self, domain: &str) -> Result<(), RepoError> {
        self.domain_blocks.insert(domain.to_string());
        Ok(())
    }

    async fn delete_domain_block(&self, domain: &str) -> Result<(), RepoError> {
        self.domain_blocks
            .remove(domain)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl ListsRepo for MemoryRepositories {
    async fn get_list_by_id(&self, id: &str) -> Result<List, RepoError> {
        self.read()?;
        cloned(self.lists.get(id))
    }

    async fn put_list(&self, list: &List) -> Result<(), RepoError> {
        self.lists.insert(list.id.clone(), list.clone());
        Ok(())
    }

    async fn delete_list(&self, id: &str) -> Result<(), RepoError> {
        remove(&self.lists, id)?;
        self.list_entries.retain(|_, entry| entry.list_id != id);
        Ok(())
    }

    async fn get_list_entry_by_id(&self, id: &str) -> Result<ListEntry, RepoError> {
        self.read()?;
        cloned(self.list_entries.get(id))
    }

    async fn get_list_entry_ids(&self, list_id: &str) -> Result<Vec<String>, RepoError> {
        self.read()?;
        let ids = self
            .list_entries
            .iter()
            .filter(|row| row.list_id == list_id)
            .map(|row| row.id.clone())
            .collect();
        Ok(newest_first(ids))
    }

    async fn put_list_entry(&self, entry: &ListEntry) -> Result<(), RepoError> {
        self.list_entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn delete_list_entry(&self, id: &str) -> Result<(), RepoError> {
        remove(&self.list_entries, id)
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn account(id: &str, domain: &str) -> Account {
        Account {
            id: id.into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            username: format!("user{id}"),
            domain: domain.into(),
            display_name: String::new(),
            uri: format!("https://{domain}/users/{id}"),
            url: String::new(),
            public_key_uri: String::new(),
            inbox_uri: String::new(),
            outbox_uri: String::new(),
            followers_uri: String::new(),
            following_uri: String::new(),
        }
    }

    fn follow(id: &str, account_id: &str, target_account_id: &str) -> Follow {
        Follow {
            id: id.into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            uri: format!("https://example.org/follows/{id}"),
            account_id: account_id.into(),
            target_account_id: target_account_id.into(),
            show_reblogs: true,
            notify: false,
        }
    }

    #[tokio::test]
    async fn follow_ids_are_newest_first_and_filter_local_targets() {
        let repos = MemoryRepositories::new();
        repos.put_account(&account("A", "")).await.unwrap();
        repos.put_account(&account("B", "")).await.unwrap();
        repos.put_account(&account("R", "remote.example")).await.unwrap();
        repos.put_follow(&follow("01", "A", "B")).await.unwrap();
        repos.put_follow(&follow("03", "A", "R")).await.unwrap();
        repos.put_follow(&follow("02", "R", "A")).await.unwrap();

        let following = repos
            .get_follow_ids("A", FollowDirection::Following)
            .await
            .unwrap();
        assert_eq!(following, vec!["03", "01"]);

        let local = repos
            .get_follow_ids("A", FollowDirection::LocalFollowing)
            .await
            .unwrap();
        assert_eq!(local, vec!["01"]);

        let local_followers = repos
            .get_follow_ids("A", FollowDirection::LocalFollowers)
            .await
            .unwrap();
        assert!(local_followers.is_empty());
        let followers = repos
            .get_follow_ids("A", FollowDirection::Followers)
            .await
            .unwrap();
        assert_eq!(followers, vec!["02"]);
    }

    #[tokio::test]
    async fn deleting_a_follow_removes_its_list_entries() {
        let repos = MemoryRepositories::new();
        repos.put_follow(&follow("F1", "A", "B")).await.unwrap();
        repos
            .put_list_entry(&ListEntry {
                id: "E1".into(),
                list_id: "L1".into(),
                follow_id: "F1".into(),
            })
            .await
            .unwrap();

        repos.delete_follow_by_id("F1").await.unwrap();

        assert_eq!(
            repos.get_list_entry_by_id("E1").await,
            Err(RepoError::NotFound)
        );
        assert!(repos.get_list_entry_ids("L1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_failures_apply_to_reads_until_cleared() {
        let repos = MemoryRepositories::new();
        repos.put_account(&account("A", "")).await.unwrap();

        repos.fail_reads(Some(RepoError::Timeout));
        assert_eq!(repos.get_account_by_id("A").await, Err(RepoError::Timeout));

        repos.fail_reads(None);
        assert!(repos.get_account_by_id("A").await.is_ok());
        assert_eq!(repos.reads(), 2);
    }
}
