use crate::application::pagination::PageParams;
use crate::application::repos::RepoError;
use crate::cache::keys;
use crate::domain::entities::{List, ListEntry};

use super::{CachedStore, resolve_each};

impl CachedStore {
    pub async fn get_list_by_id(&self, id: &str) -> Result<List, RepoError> {
        self.caches
            .list()
            .load("ID", id, || self.lists.get_list_by_id(id))
            .await
    }

    pub async fn put_list(&self, list: &List) -> Result<(), RepoError> {
        self.lists.put_list(list).await?;
        self.caches.list().put(list);
        Ok(())
    }

    pub async fn delete_list(&self, id: &str) -> Result<(), RepoError> {
        self.lists.delete_list(id).await?;
        self.caches.list().invalidate("ID", id);
        self.caches.list_entry().invalidate("ListID", id);
        self.caches
            .list_entry_ids()
            .invalidate(&keys::list_entry_ids(id));
        Ok(())
    }

    pub async fn get_list_entry_by_id(&self, id: &str) -> Result<ListEntry, RepoError> {
        self.caches
            .list_entry()
            .load("ID", id, || self.lists.get_list_entry_by_id(id))
            .await
    }

    /// Every entry ID of `list_id`, newest first.
    pub async fn get_list_entry_ids(&self, list_id: &str) -> Result<Vec<String>, RepoError> {
        self.caches
            .list_entry_ids()
            .load(&keys::list_entry_ids(list_id), || {
                self.lists.get_list_entry_ids(list_id)
            })
            .await
    }

    /// The entries of `list_id` selected by `page`, newest first.
    ///
    /// The full ID list is cached; only the requested window is resolved.
    pub async fn get_list_entries(
        &self,
        list_id: &str,
        page: &PageParams,
    ) -> Result<Vec<ListEntry>, RepoError> {
        let ids = self
            .caches
            .list_entry_ids()
            .load_range(
                &keys::list_entry_ids(list_id),
                || self.lists.get_list_entry_ids(list_id),
                |all| page.window(all),
            )
            .await?;

        resolve_each("list_entry", &ids, |id| async move {
            self.get_list_entry_by_id(&id).await
        })
        .await
    }

    pub async fn put_list_entries(&self, entries: &[ListEntry]) -> Result<(), RepoError> {
        for entry in entries {
            self.lists.put_list_entry(entry).await?;
            self.caches.list_entry().put(entry);
            self.caches
                .list_entry_ids()
                .invalidate(&keys::list_entry_ids(&entry.list_id));
        }
        Ok(())
    }

    pub async fn delete_list_entry(&self, id: &str) -> Result<(), RepoError> {
        let entry = self.get_list_entry_by_id(id).await?;
        self.lists.delete_list_entry(id).await?;
        self.caches.list_entry().invalidate("ID", id);
        self.caches
            .list_entry_ids()
            .invalidate(&keys::list_entry_ids(&entry.list_id));
        Ok(())
    }
}
