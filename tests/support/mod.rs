#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use fedcache::application::repos::{AccountsRepo, ListsRepo, RelationshipsRepo};
use fedcache::application::store::CachedStore;
use fedcache::cache::{CacheConfig, CacheRegistry};
use fedcache::domain::entities::{Account, Follow, List, ListEntry};
use fedcache::infra::http::{self, PageLimits, RouterState};
use fedcache::infra::memory::MemoryRepositories;
use time::OffsetDateTime;
use url::Url;

pub const PUBLIC_URL: &str = "http://localhost:8080";

pub const ZORK_ID: &str = "01F8MH1H7YV1Z7D2C8K2730QBF";
pub const ADMIN_ID: &str = "01F8MH17FWEB39HZJ76B6VXSKF";
pub const REMOTE_ID: &str = "01F8MH5ZK5VRH73AKHQM6Y9VNX";

pub const FOLLOW_ADMIN_ID: &str = "01F8PY8RHWRQZV038T4E8T9YK8";
pub const FOLLOW_REMOTE_ID: &str = "01F8PYDCE8XE23GRE5DPZJDZDP";

pub const LIST_ID: &str = "01H0G8E4Q2J3FE3JDWJVWEDCD1";
pub const NEWER_ENTRY_ID: &str = "01H0G8FFM1AGQDRNGBGGX8CYJQ";
pub const OLDER_ENTRY_ID: &str = "01H0G89MWVQE0M58VD2HQYMQWH";

pub fn account(id: &str, username: &str, domain: &str) -> Account {
    let base = if domain.is_empty() {
        PUBLIC_URL.to_string()
    } else {
        format!("http://{domain}")
    };
    let uri = format!("{base}/users/{username}");
    Account {
        id: id.to_string(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        username: username.to_string(),
        domain: domain.to_string(),
        display_name: username.to_string(),
        url: format!("{base}/@{username}"),
        public_key_uri: format!("{uri}#main-key"),
        inbox_uri: format!("{uri}/inbox"),
        outbox_uri: format!("{uri}/outbox"),
        followers_uri: format!("{uri}/followers"),
        following_uri: format!("{uri}/following"),
        uri,
    }
}

pub fn follow(id: &str, account_id: &str, target_account_id: &str) -> Follow {
    Follow {
        id: id.to_string(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        uri: format!("{PUBLIC_URL}/follows/{id}"),
        account_id: account_id.to_string(),
        target_account_id: target_account_id.to_string(),
        show_reblogs: true,
        notify: false,
    }
}

pub fn list_entry(id: &str, list_id: &str, follow_id: &str) -> ListEntry {
    ListEntry {
        id: id.to_string(),
        list_id: list_id.to_string(),
        follow_id: follow_id.to_string(),
    }
}

/// Repositories, caches and the cached store over them.
pub struct Fixture {
    pub repos: Arc<MemoryRepositories>,
    pub caches: Arc<CacheRegistry>,
    pub store: CachedStore,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        let repos = Arc::new(MemoryRepositories::new());
        let caches = Arc::new(CacheRegistry::init(config).expect("valid cache config"));
        let store = CachedStore::new(caches.clone(), repos.clone(), repos.clone(), repos.clone());
        Self {
            repos,
            caches,
            store,
        }
    }

    /// A local account following one local and one remote account, with
    /// both follows in a list. The follow of the admin is the newer entry.
    pub async fn seeded() -> Self {
        let fixture = Self::new();
        fixture.seed().await;
        fixture
    }

    pub async fn seed(&self) {
        let repos = self.repos.as_ref();
        for account in [
            account(ZORK_ID, "the_mighty_zork", ""),
            account(ADMIN_ID, "admin", ""),
            account(REMOTE_ID, "foss_satan", "fossbros-anonymous.io"),
        ] {
            AccountsRepo::put_account(repos, &account)
                .await
                .expect("seed account");
        }

        for follow in [
            follow(FOLLOW_ADMIN_ID, ZORK_ID, ADMIN_ID),
            follow(FOLLOW_REMOTE_ID, ZORK_ID, REMOTE_ID),
        ] {
            RelationshipsRepo::put_follow(repos, &follow)
                .await
                .expect("seed follow");
        }

        ListsRepo::put_list(
            repos,
            &List {
                id: LIST_ID.to_string(),
                title: "Cool Ass Posters From This Instance".to_string(),
                account_id: ZORK_ID.to_string(),
            },
        )
        .await
        .expect("seed list");

        for entry in [
            list_entry(NEWER_ENTRY_ID, LIST_ID, FOLLOW_ADMIN_ID),
            list_entry(OLDER_ENTRY_ID, LIST_ID, FOLLOW_REMOTE_ID),
        ] {
            ListsRepo::put_list_entry(repos, &entry)
                .await
                .expect("seed list entry");
        }
    }

    pub fn router(&self) -> Router {
        self.router_at(PUBLIC_URL)
    }

    /// Router whose page links are built under `public_url`.
    pub fn router_at(&self, public_url: &str) -> Router {
        let public_url = Url::parse(public_url).expect("valid public url");
        http::build_router(RouterState::new(
            self.store.clone(),
            public_url,
            PageLimits::default(),
        ))
    }
}
