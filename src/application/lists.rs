use tracing::warn;
use url::Url;

use crate::application::error::AppError;
use crate::application::pagination::{PageLinks, PageParams};
use crate::application::repos::RepoError;
use crate::application::store::CachedStore;
use crate::domain::entities::Account;

/// One page of the accounts in a list.
#[derive(Debug, Clone)]
pub struct ListAccountsPage {
    /// In list-entry order, newest entry first.
    pub accounts: Vec<Account>,
    pub links: Option<PageLinks>,
}

#[derive(Clone, Debug)]
pub struct ListsService {
    store: CachedStore,
}

impl ListsService {
    pub fn new(store: CachedStore) -> Self {
        Self { store }
    }

    /// Accounts followed through the entries of `list_id`, windowed by `page`.
    ///
    /// `base` is the absolute request URL; page links are derived from it.
    /// Entries whose follow or target account has disappeared are skipped.
    pub async fn list_accounts(
        &self,
        list_id: &str,
        page: &PageParams,
        base: &Url,
    ) -> Result<ListAccountsPage, AppError> {
        // Unknown lists are a 404 rather than an empty page.
        self.store.get_list_by_id(list_id).await?;

        let entries = self.store.get_list_entries(list_id, page).await?;
        let entry_ids: Vec<&str> = entries.iter().map(|entry| entry.id.as_str()).collect();
        let links = page.links(base, &entry_ids);

        let mut accounts = Vec::with_capacity(entries.len());
        for entry in &entries {
            let follow = match self.store.get_follow_by_id(&entry.follow_id).await {
                Ok(follow) => follow,
                Err(RepoError::NotFound) => {
                    warn!(
                        list_id,
                        entry_id = %entry.id,
                        follow_id = %entry.follow_id,
                        "list entry references a missing follow, skipping"
                    );
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            match self.store.get_account_by_id(&follow.target_account_id).await {
                Ok(account) => accounts.push(account),
                Err(RepoError::NotFound) => {
                    warn!(
                        list_id,
                        follow_id = %follow.id,
                        account_id = %follow.target_account_id,
                        "followed account no longer exists, skipping"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(ListAccountsPage { accounts, links })
    }
}
