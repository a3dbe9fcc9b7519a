use std::sync::Arc;

use url::Url;

use crate::application::lists::ListsService;

/// Default and maximum `limit` of paginated collection endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: usize,
    pub max: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: 40,
            max: 80,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiState {
    pub lists: Arc<ListsService>,
    /// Externally visible origin; page links are absolute URLs under it.
    pub public_url: Url,
    pub page_limits: PageLimits,
}
