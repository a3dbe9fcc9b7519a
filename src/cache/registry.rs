//! Process-wide cache registry.
//!
//! Owns one result cache per entity type and one ID-list cache per relation
//! kind. The registry is built once at startup, started before traffic is
//! served and stopped during shutdown.

use std::sync::Mutex;

use tracing::{debug, error, info};

use crate::application::repos::RepoError;
use crate::domain::entities::{
    Account, AccountNote, Block, Emoji, EmojiCategory, Follow, FollowRequest, Instance, List,
    ListEntry, Marker, MediaAttachment, Mention, Notification, Report, Status, StatusFave, Tag,
    Tombstone, User,
};

use super::config::{CacheConfig, CacheKind, CacheSettings};
use super::domain::DomainBlockCache;
use super::error::CacheError;
use super::index::{Index, composite, composite_allow_empty, key};
use super::lock::mutex_lock;
use super::result::ResultCache;
use super::slice::SliceCache;
use super::sweep::ManagedCache;
use super::ttl::TtlCache;

const SOURCE: &str = "cache::registry";

/// Result cache of an entity loaded through a repository.
pub type EntityCache<V> = ResultCache<V, RepoError>;

/// Cache of ordered ID lists.
pub type IdListCache = SliceCache<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Initialized,
    Started,
    Stopped,
}

pub struct CacheRegistry {
    account: EntityCache<Account>,
    account_note: EntityCache<AccountNote>,
    block: EntityCache<Block>,
    block_ids: IdListCache,
    domain_block: DomainBlockCache,
    emoji: EntityCache<Emoji>,
    emoji_category: EntityCache<EmojiCategory>,
    follow: EntityCache<Follow>,
    follow_ids: IdListCache,
    follow_request: EntityCache<FollowRequest>,
    follow_request_ids: IdListCache,
    instance: EntityCache<Instance>,
    list: EntityCache<List>,
    list_entry: EntityCache<ListEntry>,
    list_entry_ids: IdListCache,
    marker: EntityCache<Marker>,
    media: EntityCache<MediaAttachment>,
    mention: EntityCache<Mention>,
    notification: EntityCache<Notification>,
    report: EntityCache<Report>,
    status: EntityCache<Status>,
    status_fave: EntityCache<StatusFave>,
    tag: EntityCache<Tag>,
    tombstone: EntityCache<Tombstone>,
    user: EntityCache<User>,
    webfinger: TtlCache<String, String>,
    config: CacheConfig,
    state: Mutex<Lifecycle>,
}

fn entity_cache<V>(
    config: &CacheConfig,
    kind: CacheKind,
    indices: Vec<Index<V>>,
) -> Result<EntityCache<V>, CacheError>
where
    V: Clone + Send + 'static,
{
    let settings = config.get(kind);
    let cache = ResultCache::new(kind.name(), indices, settings)?;
    Ok(if settings.negative {
        cache.with_negative_filter(RepoError::is_not_found)
    } else {
        cache
    })
}

fn id_list_cache(config: &CacheConfig, kind: CacheKind) -> Result<IdListCache, CacheError> {
    SliceCache::new(kind.name(), config.get(kind))
}

impl CacheRegistry {
    /// Allocate every cache from its own entry in `config`.
    pub fn init(config: CacheConfig) -> Result<Self, CacheError> {
        let registry = Self {
            account: entity_cache(&config, CacheKind::Account, account_indices())?,
            account_note: entity_cache(&config, CacheKind::AccountNote, account_note_indices())?,
            block: entity_cache(&config, CacheKind::Block, block_indices())?,
            block_ids: id_list_cache(&config, CacheKind::BlockIds)?,
            domain_block: DomainBlockCache::new(),
            emoji: entity_cache(&config, CacheKind::Emoji, emoji_indices())?,
            emoji_category: entity_cache(
                &config,
                CacheKind::EmojiCategory,
                emoji_category_indices(),
            )?,
            follow: entity_cache(&config, CacheKind::Follow, follow_indices())?,
            follow_ids: id_list_cache(&config, CacheKind::FollowIds)?,
            follow_request: entity_cache(
                &config,
                CacheKind::FollowRequest,
                follow_request_indices(),
            )?,
            follow_request_ids: id_list_cache(&config, CacheKind::FollowRequestIds)?,
            instance: entity_cache(&config, CacheKind::Instance, instance_indices())?,
            list: entity_cache(&config, CacheKind::List, list_indices())?,
            list_entry: entity_cache(&config, CacheKind::ListEntry, list_entry_indices())?,
            list_entry_ids: id_list_cache(&config, CacheKind::ListEntryIds)?,
            marker: entity_cache(&config, CacheKind::Marker, marker_indices())?,
            media: entity_cache(&config, CacheKind::Media, media_indices())?,
            mention: entity_cache(&config, CacheKind::Mention, mention_indices())?,
            notification: entity_cache(&config, CacheKind::Notification, notification_indices())?,
            report: entity_cache(&config, CacheKind::Report, report_indices())?,
            status: entity_cache(&config, CacheKind::Status, status_indices())?,
            status_fave: entity_cache(&config, CacheKind::StatusFave, status_fave_indices())?,
            tag: entity_cache(&config, CacheKind::Tag, tag_indices())?,
            tombstone: entity_cache(&config, CacheKind::Tombstone, tombstone_indices())?,
            user: entity_cache(&config, CacheKind::User, user_indices())?,
            webfinger: TtlCache::new(
                CacheKind::Webfinger.name(),
                config.get(CacheKind::Webfinger),
            )?,
            config,
            state: Mutex::new(Lifecycle::Initialized),
        };

        info!(caches = CacheKind::ALL.len(), "cache registry initialised");
        Ok(registry)
    }

    /// Every cache with a configurable lifecycle, in [`CacheKind::ALL`] order.
    pub fn managed(&self) -> [(CacheKind, &dyn ManagedCache); 25] {
        [
            (CacheKind::Account, &self.account),
            (CacheKind::AccountNote, &self.account_note),
            (CacheKind::Block, &self.block),
            (CacheKind::BlockIds, &self.block_ids),
            (CacheKind::Emoji, &self.emoji),
            (CacheKind::EmojiCategory, &self.emoji_category),
            (CacheKind::Follow, &self.follow),
            (CacheKind::FollowIds, &self.follow_ids),
            (CacheKind::FollowRequest, &self.follow_request),
            (CacheKind::FollowRequestIds, &self.follow_request_ids),
            (CacheKind::Instance, &self.instance),
            (CacheKind::List, &self.list),
            (CacheKind::ListEntry, &self.list_entry),
            (CacheKind::ListEntryIds, &self.list_entry_ids),
            (CacheKind::Marker, &self.marker),
            (CacheKind::Media, &self.media),
            (CacheKind::Mention, &self.mention),
            (CacheKind::Notification, &self.notification),
            (CacheKind::Report, &self.report),
            (CacheKind::Status, &self.status),
            (CacheKind::StatusFave, &self.status_fave),
            (CacheKind::Tag, &self.tag),
            (CacheKind::Tombstone, &self.tombstone),
            (CacheKind::User, &self.user),
            (CacheKind::Webfinger, &self.webfinger),
        ]
    }

    /// Settings the cache of `kind` was built from.
    pub fn settings(&self, kind: CacheKind) -> CacheSettings {
        self.config.get(kind)
    }

    /// Start the sweep loop of every cache with a non-zero sweep frequency.
    ///
    /// On failure the loops started so far are stopped again and the
    /// registry stays startable.
    pub async fn start(&self) -> Result<(), CacheError> {
        {
            let state = mutex_lock(&self.state, SOURCE, "start");
            match *state {
                Lifecycle::Initialized => {}
                Lifecycle::Started => {
                    return Err(CacheError::lifecycle("cache registry is already started"));
                }
                Lifecycle::Stopped => {
                    return Err(CacheError::lifecycle("cache registry was already stopped"));
                }
            }
        }

        let mut started = Vec::new();
        let mut failure = None;
        for (kind, cache) in self.managed() {
            let freq = self.config.get(kind).sweep_freq;
            if freq.is_zero() {
                debug!(cache = kind.name(), "sweep disabled, relying on lookup expiry");
                continue;
            }
            match cache.start_sweep(freq) {
                Ok(()) => started.push(cache),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if let Some(err) = failure {
            error!(error = %err, "cache registry failed to start, rolling back");
            for cache in started {
                if let Err(stop_err) = cache.stop_sweep().await {
                    error!(
                        cache = cache.name(),
                        error = %stop_err,
                        "failed to stop cache during rollback"
                    );
                }
            }
            return Err(err);
        }

        *mutex_lock(&self.state, SOURCE, "start.commit") = Lifecycle::Started;
        info!(sweeping = started.len(), "cache registry started");
        Ok(())
    }

    /// Stop every sweep loop the registry started, waiting for in-flight
    /// sweeps.
    ///
    /// A loop that fails to stop does not keep the others running; the first
    /// failure is returned once every loop has been visited.
    pub async fn stop(&self) -> Result<(), CacheError> {
        {
            let mut state = mutex_lock(&self.state, SOURCE, "stop");
            if *state != Lifecycle::Started {
                return Err(CacheError::lifecycle("cache registry is not running"));
            }
            *state = Lifecycle::Stopped;
        }

        let mut first_failure = None;
        for (kind, cache) in self.managed() {
            if self.config.get(kind).sweep_freq.is_zero() {
                continue;
            }
            if let Err(err) = cache.stop_sweep().await {
                error!(cache = kind.name(), error = %err, "failed to stop cache sweep loop");
                first_failure.get_or_insert(err);
            }
        }

        if let Some(err) = first_failure {
            return Err(err);
        }
        info!("cache registry stopped");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        *mutex_lock(&self.state, SOURCE, "is_started") == Lifecycle::Started
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn account(&self) -> &EntityCache<Account> {
        &self.account
    }

    pub fn account_note(&self) -> &EntityCache<AccountNote> {
        &self.account_note
    }

    pub fn block(&self) -> &EntityCache<Block> {
        &self.block
    }

    /// Block IDs keyed by [`super::keys::block_ids`].
    pub fn block_ids(&self) -> &IdListCache {
        &self.block_ids
    }

    pub fn domain_block(&self) -> &DomainBlockCache {
        &self.domain_block
    }

    pub fn emoji(&self) -> &EntityCache<Emoji> {
        &self.emoji
    }

    pub fn emoji_category(&self) -> &EntityCache<EmojiCategory> {
        &self.emoji_category
    }

    pub fn follow(&self) -> &EntityCache<Follow> {
        &self.follow
    }

    /// Follow IDs keyed by [`super::keys::follow_ids`].
    pub fn follow_ids(&self) -> &IdListCache {
        &self.follow_ids
    }

    pub fn follow_request(&self) -> &EntityCache<FollowRequest> {
        &self.follow_request
    }

    pub fn follow_request_ids(&self) -> &IdListCache {
        &self.follow_request_ids
    }

    pub fn instance(&self) -> &EntityCache<Instance> {
        &self.instance
    }

    pub fn list(&self) -> &EntityCache<List> {
        &self.list
    }

    pub fn list_entry(&self) -> &EntityCache<ListEntry> {
        &self.list_entry
    }

    /// Entry IDs keyed by [`super::keys::list_entry_ids`].
    pub fn list_entry_ids(&self) -> &IdListCache {
        &self.list_entry_ids
    }

    pub fn marker(&self) -> &EntityCache<Marker> {
        &self.marker
    }

    pub fn media(&self) -> &EntityCache<MediaAttachment> {
        &self.media
    }

    pub fn mention(&self) -> &EntityCache<Mention> {
        &self.mention
    }

    pub fn notification(&self) -> &EntityCache<Notification> {
        &self.notification
    }

    pub fn report(&self) -> &EntityCache<Report> {
        &self.report
    }

    pub fn status(&self) -> &EntityCache<Status> {
        &self.status
    }

    pub fn status_fave(&self) -> &EntityCache<StatusFave> {
        &self.status_fave
    }

    pub fn tag(&self) -> &EntityCache<Tag> {
        &self.tag
    }

    pub fn tombstone(&self) -> &EntityCache<Tombstone> {
        &self.tombstone
    }

    pub fn user(&self) -> &EntityCache<User> {
        &self.user
    }

    /// Resolved actor URIs keyed by `user@domain`.
    pub fn webfinger(&self) -> &TtlCache<String, String> {
        &self.webfinger
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("state", &*mutex_lock(&self.state, SOURCE, "debug"))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Index definitions
// ============================================================================

fn account_indices() -> Vec<Index<Account>> {
    vec![
        Index::unique("ID", |a: &Account| key(&a.id)),
        Index::unique("URI", |a: &Account| key(&a.uri)),
        Index::unique("URL", |a: &Account| key(&a.url)),
        Index::unique("Username.Domain", |a: &Account| {
            composite_allow_empty(&[&a.username, &a.domain])
        }),
        Index::unique("PublicKeyURI", |a: &Account| key(&a.public_key_uri)),
        Index::unique("InboxURI", |a: &Account| key(&a.inbox_uri)),
        Index::unique("OutboxURI", |a: &Account| key(&a.outbox_uri)),
        Index::unique("FollowersURI", |a: &Account| key(&a.followers_uri)),
        Index::unique("FollowingURI", |a: &Account| key(&a.following_uri)),
    ]
}

fn account_note_indices() -> Vec<Index<AccountNote>> {
    vec![
        Index::unique("ID", |n: &AccountNote| key(&n.id)),
        Index::unique("AccountID.TargetAccountID", |n: &AccountNote| {
            composite(&[&n.account_id, &n.target_account_id])
        }),
    ]
}

fn block_indices() -> Vec<Index<Block>> {
    vec![
        Index::unique("ID", |b: &Block| key(&b.id)),
        Index::unique("URI", |b: &Block| key(&b.uri)),
        Index::unique("AccountID.TargetAccountID", |b: &Block| {
            composite(&[&b.account_id, &b.target_account_id])
        }),
        Index::multi("AccountID", |b: &Block| key(&b.account_id)),
        Index::multi("TargetAccountID", |b: &Block| key(&b.target_account_id)),
    ]
}

fn emoji_indices() -> Vec<Index<Emoji>> {
    vec![
        Index::unique("ID", |e: &Emoji| key(&e.id)),
        Index::unique("URI", |e: &Emoji| key(&e.uri)),
        Index::unique("Shortcode.Domain", |e: &Emoji| {
            composite_allow_empty(&[&e.shortcode, &e.domain])
        }),
        Index::unique("ImageStaticURL", |e: &Emoji| key(&e.image_static_url)),
        Index::multi("CategoryID", |e: &Emoji| key(&e.category_id)),
    ]
}

fn emoji_category_indices() -> Vec<Index<EmojiCategory>> {
    vec![
        Index::unique("ID", |c: &EmojiCategory| key(&c.id)),
        Index::unique("Name", |c: &EmojiCategory| key(&c.name)),
    ]
}

fn follow_indices() -> Vec<Index<Follow>> {
    vec![
        Index::unique("ID", |f: &Follow| key(&f.id)),
        Index::unique("URI", |f: &Follow| key(&f.uri)),
        Index::unique("AccountID.TargetAccountID", |f: &Follow| {
            composite(&[&f.account_id, &f.target_account_id])
        }),
        Index::multi("AccountID", |f: &Follow| key(&f.account_id)),
        Index::multi("TargetAccountID", |f: &Follow| key(&f.target_account_id)),
    ]
}

fn follow_request_indices() -> Vec<Index<FollowRequest>> {
    vec![
        Index::unique("ID", |f: &FollowRequest| key(&f.id)),
        Index::unique("URI", |f: &FollowRequest| key(&f.uri)),
        Index::unique("AccountID.TargetAccountID", |f: &FollowRequest| {
            composite(&[&f.account_id, &f.target_account_id])
        }),
        Index::multi("AccountID", |f: &FollowRequest| key(&f.account_id)),
        Index::multi("TargetAccountID", |f: &FollowRequest| {
            key(&f.target_account_id)
        }),
    ]
}

fn instance_indices() -> Vec<Index<Instance>> {
    vec![
        Index::unique("ID", |i: &Instance| key(&i.id)),
        Index::unique("Domain", |i: &Instance| key(&i.domain)),
    ]
}

fn list_indices() -> Vec<Index<List>> {
    vec![Index::unique("ID", |l: &List| key(&l.id))]
}

fn list_entry_indices() -> Vec<Index<ListEntry>> {
    vec![
        Index::unique("ID", |e: &ListEntry| key(&e.id)),
        Index::multi("ListID", |e: &ListEntry| key(&e.list_id)),
        Index::multi("FollowID", |e: &ListEntry| key(&e.follow_id)),
    ]
}

fn marker_indices() -> Vec<Index<Marker>> {
    vec![Index::unique("AccountID.Name", |m: &Marker| {
        composite(&[&m.account_id, &m.name])
    })]
}

fn media_indices() -> Vec<Index<MediaAttachment>> {
    vec![Index::unique("ID", |m: &MediaAttachment| key(&m.id))]
}

fn mention_indices() -> Vec<Index<Mention>> {
    vec![Index::unique("ID", |m: &Mention| key(&m.id))]
}

fn notification_indices() -> Vec<Index<Notification>> {
    vec![
        Index::unique("ID", |n: &Notification| key(&n.id)),
        Index::unique(
            "NotificationType.TargetAccountID.OriginAccountID.StatusID",
            |n: &Notification| {
                // Notifications about accounts carry no status.
                composite_allow_empty(&[
                    n.notification_type.as_str(),
                    &n.target_account_id,
                    &n.origin_account_id,
                    &n.status_id,
                ])
            },
        ),
    ]
}

fn report_indices() -> Vec<Index<Report>> {
    vec![Index::unique("ID", |r: &Report| key(&r.id))]
}

fn status_indices() -> Vec<Index<Status>> {
    vec![
        Index::unique("ID", |s: &Status| key(&s.id)),
        Index::unique("URI", |s: &Status| key(&s.uri)),
        Index::unique("URL", |s: &Status| key(&s.url)),
    ]
}

fn status_fave_indices() -> Vec<Index<StatusFave>> {
    vec![
        Index::unique("ID", |f: &StatusFave| key(&f.id)),
        Index::unique("AccountID.StatusID", |f: &StatusFave| {
            composite(&[&f.account_id, &f.status_id])
        }),
    ]
}

fn tag_indices() -> Vec<Index<Tag>> {
    vec![
        Index::unique("ID", |t: &Tag| key(&t.id)),
        Index::unique("Name", |t: &Tag| key(&t.name)),
    ]
}

fn tombstone_indices() -> Vec<Index<Tombstone>> {
    vec![
        Index::unique("ID", |t: &Tombstone| key(&t.id)),
        Index::unique("URI", |t: &Tombstone| key(&t.uri)),
    ]
}

fn user_indices() -> Vec<Index<User>> {
    vec![
        Index::unique("ID", |u: &User| key(&u.id)),
        Index::unique("AccountID", |u: &User| key(&u.account_id)),
        Index::unique("Email", |u: &User| key(&u.email)),
        Index::unique("ConfirmationToken", |u: &User| key(&u.confirmation_token)),
        Index::unique("ExternalID", |u: &User| key(&u.external_id)),
    ]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    /// Distinct settings for every cache so any cross-wiring is visible.
    fn distinct_config() -> CacheConfig {
        CacheKind::ALL
            .into_iter()
            .enumerate()
            .fold(CacheConfig::default(), |config, (i, kind)| {
                let minutes = (i as u64) + 1;
                config.with(
                    kind,
                    CacheSettings {
                        max_size: 10 + i,
                        ttl: Duration::from_secs(minutes * 60),
                        sweep_freq: Duration::from_secs(minutes),
                        negative: i % 2 == 0,
                    },
                )
            })
    }

    #[test]
    fn every_cache_uses_its_own_settings() {
        let config = distinct_config();
        let registry = CacheRegistry::init(config.clone()).expect("init");

        for (kind, cache) in registry.managed() {
            let settings = config.get(kind);
            assert_eq!(cache.name(), kind.name());
            assert_eq!(cache.ttl(), settings.ttl, "ttl of {kind}");
        }
    }

    #[test]
    fn negative_policy_follows_each_cache() {
        let config = distinct_config();
        let registry = CacheRegistry::init(config.clone()).expect("init");

        for (kind, cache) in registry.managed() {
            let is_entity_cache = !matches!(
                kind,
                CacheKind::BlockIds
                    | CacheKind::FollowIds
                    | CacheKind::FollowRequestIds
                    | CacheKind::ListEntryIds
                    | CacheKind::Webfinger
            );
            let expected = is_entity_cache && config.get(kind).negative;
            assert_eq!(cache.caches_negative(), expected, "negative policy of {kind}");
        }
    }

    #[test]
    fn managed_caches_follow_kind_order() {
        let registry = CacheRegistry::init(CacheConfig::default()).expect("init");
        let kinds: Vec<CacheKind> = registry.managed().iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, CacheKind::ALL.to_vec());
    }

    #[test]
    fn invalid_settings_fail_init() {
        let config = CacheConfig::default().with(
            CacheKind::Tombstone,
            CacheSettings {
                max_size: 0,
                ..CacheKind::Tombstone.defaults()
            },
        );
        let err = CacheRegistry::init(config).expect_err("invalid config");
        assert_eq!(
            err,
            CacheError::invalid_config("tombstone", "max_size must be greater than zero")
        );
    }

    #[tokio::test]
    async fn lifecycle_is_applied_once_in_order() {
        let registry = CacheRegistry::init(CacheConfig::default()).expect("init");

        let err = registry.stop().await.expect_err("stop before start");
        assert!(err.is_state_error());

        registry.start().await.expect("start");
        assert!(registry.is_started());
        assert!(registry.managed().iter().all(|(_, c)| c.is_sweeping()));

        let err = registry.start().await.expect_err("second start");
        assert!(err.is_state_error());

        registry.stop().await.expect("stop");
        assert!(registry.managed().iter().all(|(_, c)| !c.is_sweeping()));

        assert!(registry.stop().await.is_err());
        assert!(registry.start().await.is_err());
    }

    #[tokio::test]
    async fn zero_frequency_caches_are_not_swept() {
        let config = CacheConfig::default().with(
            CacheKind::Marker,
            CacheSettings {
                sweep_freq: Duration::ZERO,
                ..CacheKind::Marker.defaults()
            },
        );
        let registry = CacheRegistry::init(config).expect("init");
        registry.start().await.expect("start");

        for (kind, cache) in registry.managed() {
            assert_eq!(cache.is_sweeping(), kind != CacheKind::Marker, "{kind}");
        }

        registry.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn failed_start_rolls_back_started_loops() {
        let registry = CacheRegistry::init(CacheConfig::default()).expect("init");
        // Occupy one loop so the registry cannot start it.
        registry
            .status()
            .start(Duration::from_secs(60))
            .expect("pre-start status sweep");

        let err = registry.start().await.expect_err("start fails");
        assert_eq!(err, CacheError::AlreadyStarted { cache: "status" });
        assert!(!registry.is_started());
        assert!(!registry.account().is_running());
        assert!(!registry.follow_ids().is_running());

        registry.status().stop().await.expect("stop status sweep");
    }

    #[tokio::test]
    async fn stop_reaches_every_loop_past_a_failure() {
        let registry = CacheRegistry::init(CacheConfig::default()).expect("init");
        registry.start().await.expect("start");
        // Stopped behind the registry's back, so stopping it again fails.
        registry.account().stop().await.expect("stop account sweep");

        let err = registry.stop().await.expect_err("account loop already stopped");
        assert_eq!(err, CacheError::NotStarted { cache: "account" });
        assert!(!registry.is_started());
        for (kind, cache) in registry.managed() {
            assert!(!cache.is_sweeping(), "{kind} still sweeping");
        }
    }

    #[test]
    fn local_accounts_are_indexed_by_username() {
        let registry = CacheRegistry::init(CacheConfig::default()).expect("init");
        let account = Account {
            id: "01LOCAL".into(),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
            username: "alice".into(),
            domain: String::new(),
            display_name: "Alice".into(),
            uri: "https://local.test/users/alice".into(),
            url: "https://local.test/@alice".into(),
            public_key_uri: "https://local.test/users/alice#main-key".into(),
            inbox_uri: "https://local.test/users/alice/inbox".into(),
            outbox_uri: "https://local.test/users/alice/outbox".into(),
            followers_uri: "https://local.test/users/alice/followers".into(),
            following_uri: "https://local.test/users/alice/following".into(),
        };
        registry.account().put(&account);

        let by_name = composite_allow_empty(&["alice", ""]).expect("key");
        assert_eq!(
            registry.account().get("Username.Domain", &by_name),
            Some(account.clone())
        );
        assert_eq!(
            registry.account().get("InboxURI", &account.inbox_uri),
            Some(account)
        );
    }
}
