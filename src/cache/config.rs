//! Cache configuration.
//!
//! Every cache owned by the registry is sized and timed independently via the
//! `[cache.<name>]` tables of `fedcache.toml`.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use super::error::CacheError;

const MINUTE: Duration = Duration::from_secs(60);
const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Identifies one cache owned by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Account,
    AccountNote,
    Block,
    BlockIds,
    Emoji,
    EmojiCategory,
    Follow,
    FollowIds,
    FollowRequest,
    FollowRequestIds,
    Instance,
    List,
    ListEntry,
    ListEntryIds,
    Marker,
    Media,
    Mention,
    Notification,
    Report,
    Status,
    StatusFave,
    Tag,
    Tombstone,
    User,
    Webfinger,
}

impl CacheKind {
    pub const ALL: [CacheKind; 25] = [
        CacheKind::Account,
        CacheKind::AccountNote,
        CacheKind::Block,
        CacheKind::BlockIds,
        CacheKind::Emoji,
        CacheKind::EmojiCategory,
        CacheKind::Follow,
        CacheKind::FollowIds,
        CacheKind::FollowRequest,
        CacheKind::FollowRequestIds,
        CacheKind::Instance,
        CacheKind::List,
        CacheKind::ListEntry,
        CacheKind::ListEntryIds,
        CacheKind::Marker,
        CacheKind::Media,
        CacheKind::Mention,
        CacheKind::Notification,
        CacheKind::Report,
        CacheKind::Status,
        CacheKind::StatusFave,
        CacheKind::Tag,
        CacheKind::Tombstone,
        CacheKind::User,
        CacheKind::Webfinger,
    ];

    /// Name used in configuration tables, logs and metric labels.
    pub const fn name(self) -> &'static str {
        match self {
            CacheKind::Account => "account",
            CacheKind::AccountNote => "account_note",
            CacheKind::Block => "block",
            CacheKind::BlockIds => "block_ids",
            CacheKind::Emoji => "emoji",
            CacheKind::EmojiCategory => "emoji_category",
            CacheKind::Follow => "follow",
            CacheKind::FollowIds => "follow_ids",
            CacheKind::FollowRequest => "follow_request",
            CacheKind::FollowRequestIds => "follow_request_ids",
            CacheKind::Instance => "instance",
            CacheKind::List => "list",
            CacheKind::ListEntry => "list_entry",
            CacheKind::ListEntryIds => "list_entry_ids",
            CacheKind::Marker => "marker",
            CacheKind::Media => "media",
            CacheKind::Mention => "mention",
            CacheKind::Notification => "notification",
            CacheKind::Report => "report",
            CacheKind::Status => "status",
            CacheKind::StatusFave => "status_fave",
            CacheKind::Tag => "tag",
            CacheKind::Tombstone => "tombstone",
            CacheKind::User => "user",
            CacheKind::Webfinger => "webfinger",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Built-in settings used when the configuration does not mention a cache.
    pub fn defaults(self) -> CacheSettings {
        let (max_size, ttl, sweep_freq) = match self {
            CacheKind::Account => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::AccountNote => (1000, DEFAULT_TTL, MINUTE),
            CacheKind::Block => (1000, DEFAULT_TTL, MINUTE),
            CacheKind::BlockIds => (500, DEFAULT_TTL, MINUTE),
            CacheKind::Emoji => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::EmojiCategory => (100, DEFAULT_TTL, MINUTE),
            CacheKind::Follow => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::FollowIds => (500, DEFAULT_TTL, MINUTE),
            CacheKind::FollowRequest => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::FollowRequestIds => (500, DEFAULT_TTL, MINUTE),
            CacheKind::Instance => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::List => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::ListEntry => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::ListEntryIds => (500, DEFAULT_TTL, MINUTE),
            CacheKind::Marker => (2000, Duration::from_secs(6 * 60 * 60), MINUTE),
            CacheKind::Media => (1000, DEFAULT_TTL, MINUTE),
            CacheKind::Mention => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::Notification => (1000, DEFAULT_TTL, MINUTE),
            CacheKind::Report => (100, DEFAULT_TTL, MINUTE),
            CacheKind::Status => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::StatusFave => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::Tag => (2000, DEFAULT_TTL, MINUTE),
            CacheKind::Tombstone => (500, DEFAULT_TTL, MINUTE),
            CacheKind::User => (500, DEFAULT_TTL, MINUTE),
            CacheKind::Webfinger => (
                250,
                Duration::from_secs(24 * 60 * 60),
                Duration::from_secs(15 * 60),
            ),
        };

        CacheSettings {
            max_size,
            ttl,
            sweep_freq,
            negative: true,
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sizing and timing knobs for a single cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of live entries before LRU eviction kicks in.
    pub max_size: usize,
    /// Lifetime of an entry from the moment it is stored.
    pub ttl: Duration,
    /// Background sweep period; zero leaves expiry to lookups.
    pub sweep_freq: Duration,
    /// Whether confirmed-absent lookups are remembered.
    pub negative: bool,
}

impl CacheSettings {
    pub fn validate(&self, cache: &'static str) -> Result<(), CacheError> {
        if self.max_size == 0 {
            return Err(CacheError::invalid_config(
                cache,
                "max_size must be greater than zero",
            ));
        }
        if self.ttl.is_zero() {
            return Err(CacheError::invalid_config(
                cache,
                "ttl must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Settings for every cache in the registry.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    overrides: HashMap<CacheKind, CacheSettings>,
}

impl CacheConfig {
    /// Settings for `kind`, falling back to its built-in defaults.
    pub fn get(&self, kind: CacheKind) -> CacheSettings {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.defaults())
    }

    pub fn set(&mut self, kind: CacheKind, settings: CacheSettings) {
        self.overrides.insert(kind, settings);
    }

    #[must_use]
    pub fn with(mut self, kind: CacheKind, settings: CacheSettings) -> Self {
        self.set(kind, settings);
        self
    }
}
