use crate::application::repos::RepoError;
use crate::cache::composite_allow_empty;
use crate::domain::entities::Account;

use super::CachedStore;

impl CachedStore {
    pub async fn get_account_by_id(&self, id: &str) -> Result<Account, RepoError> {
        self.caches
            .account()
            .load("ID", id, || self.accounts.get_account_by_id(id))
            .await
    }

    pub async fn get_account_by_uri(&self, uri: &str) -> Result<Account, RepoError> {
        self.caches
            .account()
            .load("URI", uri, || self.accounts.get_account_by_uri(uri))
            .await
    }

    /// `domain` is empty for local accounts.
    pub async fn get_account_by_username_domain(
        &self,
        username: &str,
        domain: &str,
    ) -> Result<Account, RepoError> {
        let Some(key) = composite_allow_empty(&[username, domain]) else {
            return Err(RepoError::NotFound);
        };
        self.caches
            .account()
            .load("Username.Domain", &key, || {
                self.accounts.get_account_by_username_domain(username, domain)
            })
            .await
    }

    /// Insert or update an account.
    ///
    /// The cached copy is replaced, which also drops any remembered absence
    /// under the account's keys.
    pub async fn put_account(&self, account: &Account) -> Result<(), RepoError> {
        self.accounts.put_account(account).await?;
        self.caches.account().put(account);
        Ok(())
    }

    /// Relations pointing at the account are kept; readers skip follows whose
    /// target is gone.
    pub async fn delete_account(&self, id: &str) -> Result<(), RepoError> {
        self.accounts.delete_account(id).await?;
        self.caches.account().invalidate("ID", id);
        Ok(())
    }
}
