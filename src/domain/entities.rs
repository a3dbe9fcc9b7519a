//! Domain entities mirrored from persistent storage.
//!
//! Only the fields the caches index or the HTTP surface renders are carried.
//! IDs are lexically sortable strings, so newer rows compare greater.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::types::{NotificationType, Visibility};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub created_at: OffsetDateTime,
    pub username: String,
    /// Empty for local accounts.
    pub domain: String,
    pub display_name: String,
    pub uri: String,
    pub url: String,
    pub public_key_uri: String,
    pub inbox_uri: String,
    pub outbox_uri: String,
    pub followers_uri: String,
    pub following_uri: String,
}

impl Account {
    pub fn is_local(&self) -> bool {
        self.domain.is_empty()
    }

    /// `username` for local accounts, `username@domain` otherwise.
    pub fn acct(&self) -> String {
        if self.is_local() {
            self.username.clone()
        } else {
            format!("{}@{}", self.username, self.domain)
        }
    }
}

/// A private note one account keeps about another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountNote {
    pub id: String,
    pub account_id: String,
    pub target_account_id: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: String,
    pub created_at: OffsetDateTime,
    pub uri: String,
    pub account_id: String,
    pub target_account_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emoji {
    pub id: String,
    pub shortcode: String,
    /// Empty for local emoji.
    pub domain: String,
    pub uri: String,
    pub image_static_url: String,
    pub category_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmojiCategory {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Follow {
    pub id: String,
    pub created_at: OffsetDateTime,
    pub uri: String,
    pub account_id: String,
    pub target_account_id: String,
    pub show_reblogs: bool,
    pub notify: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowRequest {
    pub id: String,
    pub created_at: OffsetDateTime,
    pub uri: String,
    pub account_id: String,
    pub target_account_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    pub id: String,
    pub domain: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct List {
    pub id: String,
    pub title: String,
    pub account_id: String,
}

/// Membership of a followed account in a list, through its follow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEntry {
    pub id: String,
    pub list_id: String,
    pub follow_id: String,
}

/// Last read position of an account in a timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub account_id: String,
    pub name: String,
    pub last_read_id: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaAttachment {
    pub id: String,
    pub account_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mention {
    pub id: String,
    pub status_id: String,
    pub origin_account_id: String,
    pub target_account_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: String,
    pub notification_type: NotificationType,
    pub target_account_id: String,
    pub origin_account_id: String,
    /// Empty when the notification is not about a status.
    pub status_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: String,
    pub account_id: String,
    pub target_account_id: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub id: String,
    pub uri: String,
    pub url: String,
    pub account_id: String,
    pub visibility: Visibility,
    pub content: String,
}

/// A like of a status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusFave {
    pub id: String,
    pub account_id: String,
    pub status_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Marker left behind for a deleted remote object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tombstone {
    pub id: String,
    pub uri: String,
}

/// Local login attached to an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub account_id: String,
    pub email: String,
    pub confirmation_token: String,
    pub external_id: String,
}
