use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::domain::entities::Account;

/// Account as rendered by the client API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub acct: String,
    pub display_name: String,
    pub url: String,
    pub uri: String,
    pub created_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let acct = account.acct();
        let created_at = account.created_at.format(&Rfc3339).unwrap_or_default();
        Self {
            id: account.id,
            username: account.username,
            acct,
            display_name: account.display_name,
            url: account.url,
            uri: account.uri,
            created_at,
        }
    }
}
