//! Keys of the ID-list caches.
//!
//! Follow and follow request lists are keyed by direction plus owner:
//! `>` following, `l>` local following, `<` followers, `l<` local followers.

pub use crate::domain::types::FollowDirection;

pub const fn prefix(direction: FollowDirection) -> &'static str {
    match direction {
        FollowDirection::Following => ">",
        FollowDirection::LocalFollowing => "l>",
        FollowDirection::Followers => "<",
        FollowDirection::LocalFollowers => "l<",
    }
}

pub fn follow_ids(direction: FollowDirection, account_id: &str) -> String {
    format!("{}{account_id}", prefix(direction))
}

/// Every follow ID list key owned by `account_id`.
pub fn all_follow_ids(account_id: &str) -> impl Iterator<Item = String> + '_ {
    FollowDirection::ALL
        .into_iter()
        .map(move |direction| follow_ids(direction, account_id))
}

/// Keys touched when a relation between `origin` and `target` changes.
///
/// Local-only lists are included unconditionally: whether an account is local
/// is a property of the account, not of the relation.
pub fn affected_follow_ids(origin: &str, target: &str) -> Vec<String> {
    FollowDirection::ALL
        .into_iter()
        .map(|direction| {
            let owner = if direction.is_outgoing() { origin } else { target };
            follow_ids(direction, owner)
        })
        .collect()
}

/// Accounts blocked by `account_id`.
pub fn block_ids(account_id: &str) -> String {
    format!(">{account_id}")
}

/// Entries of list `list_id`, in list order.
pub fn list_entry_ids(list_id: &str) -> String {
    list_id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_keys_use_direction_prefixes() {
        assert_eq!(follow_ids(FollowDirection::Following, "01A"), ">01A");
        assert_eq!(follow_ids(FollowDirection::LocalFollowing, "01A"), "l>01A");
        assert_eq!(follow_ids(FollowDirection::Followers, "01A"), "<01A");
        assert_eq!(follow_ids(FollowDirection::LocalFollowers, "01A"), "l<01A");
    }

    #[test]
    fn relation_change_touches_both_owners() {
        let keys = affected_follow_ids("alice", "bob");
        assert_eq!(keys, vec![">alice", "l>alice", "<bob", "l<bob"]);
    }

    #[test]
    fn all_keys_for_one_account() {
        let keys: Vec<String> = all_follow_ids("carol").collect();
        assert_eq!(keys, vec![">carol", "l>carol", "<carol", "l<carol"]);
    }
}
