//! Shared domain enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Follow,
    FollowRequest,
    Mention,
    Reblog,
    Favourite,
    Poll,
    Status,
}

impl NotificationType {
    pub const fn as_str(self) -> &'static str {
        match self {
            NotificationType::Follow => "follow",
            NotificationType::FollowRequest => "follow_request",
            NotificationType::Mention => "mention",
            NotificationType::Reblog => "reblog",
            NotificationType::Favourite => "favourite",
            NotificationType::Poll => "poll",
            NotificationType::Status => "status",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Unlocked,
    FollowersOnly,
    MutualsOnly,
    Direct,
}

/// Which side of a follow-like relation a collection of IDs describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowDirection {
    /// Relations where the owner is the origin account.
    Following,
    /// As `Following`, restricted to local target accounts.
    LocalFollowing,
    /// Relations where the owner is the target account.
    Followers,
    /// As `Followers`, restricted to local origin accounts.
    LocalFollowers,
}

impl FollowDirection {
    pub const ALL: [FollowDirection; 4] = [
        FollowDirection::Following,
        FollowDirection::LocalFollowing,
        FollowDirection::Followers,
        FollowDirection::LocalFollowers,
    ];

    /// Directions in which the origin account owns the collection.
    pub const fn is_outgoing(self) -> bool {
        matches!(
            self,
            FollowDirection::Following | FollowDirection::LocalFollowing
        )
    }

    pub const fn local_only(self) -> bool {
        matches!(
            self,
            FollowDirection::LocalFollowing | FollowDirection::LocalFollowers
        )
    }
}
