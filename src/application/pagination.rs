//! Keyset pagination over newest-first ID collections.
//!
//! A page is selected by exclusive ID bounds (`max_id` above, `since_id` or
//! `min_id` below) and a `limit`. Paged responses link to the next (older)
//! and previous (newer) pages through a `Link` header.

use thiserror::Error;
use url::Url;

pub const MAX_ID_KEY: &str = "max_id";
pub const SINCE_ID_KEY: &str = "since_id";
pub const MIN_ID_KEY: &str = "min_id";
pub const LIMIT_KEY: &str = "limit";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("invalid limit `{0}`: expected a non-negative integer")]
    InvalidLimit(String),
}

/// Requested window over a newest-first ID list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageParams {
    /// Zero means the whole collection, without links.
    pub limit: usize,
    pub max_id: Option<String>,
    pub since_id: Option<String>,
    pub min_id: Option<String>,
}

impl PageParams {
    /// Parse raw query values.
    ///
    /// A missing limit falls back to `default`, larger limits are clamped to
    /// `max`, and empty cursors count as absent.
    pub fn parse(
        limit: Option<&str>,
        default: usize,
        max: usize,
        max_id: Option<&str>,
        since_id: Option<&str>,
        min_id: Option<&str>,
    ) -> Result<Self, PaginationError> {
        let limit = match limit.map(str::trim) {
            None | Some("") => default,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| PaginationError::InvalidLimit(raw.to_string()))?
                .min(max),
        };

        Ok(Self {
            limit,
            max_id: cursor(max_id),
            since_id: cursor(since_id),
            min_id: cursor(min_id),
        })
    }

    pub fn is_paged(&self) -> bool {
        self.limit > 0
    }

    /// Select this page out of `ids`, which must be sorted newest first.
    ///
    /// With `min_id` the page is the `limit` IDs just above it, otherwise the
    /// newest `limit` IDs below `max_id`.
    pub fn window<'a, T: AsRef<str>>(&self, ids: &'a [T]) -> &'a [T] {
        if !self.is_paged() {
            return ids;
        }

        let start = match &self.max_id {
            Some(max_id) => ids.partition_point(|id| as_id(id) >= max_id.as_str()),
            None => 0,
        };
        let end = match self.lower_bound() {
            Some(lower) => ids.partition_point(|id| as_id(id) > lower),
            None => ids.len(),
        }
        .max(start);

        let range = &ids[start..end];
        if range.len() <= self.limit {
            return range;
        }
        if self.min_id.is_some() {
            &range[range.len() - self.limit..]
        } else {
            &range[..self.limit]
        }
    }

    /// Links to the pages around `page`, the output of [`PageParams::window`].
    ///
    /// `base` is the absolute URL of the collection including any non-cursor
    /// query parameters. Unpaged requests and empty pages get no links.
    pub fn links<T: AsRef<str>>(&self, base: &Url, page: &[T]) -> Option<PageLinks> {
        if !self.is_paged() {
            return None;
        }
        let newest = as_id(page.first()?);
        let oldest = as_id(page.last()?);

        Some(PageLinks {
            next: self.link(base, MAX_ID_KEY, oldest),
            prev: self.link(base, MIN_ID_KEY, newest),
        })
    }

    fn lower_bound(&self) -> Option<&str> {
        // Both bounds are exclusive, so the tighter one wins.
        match (self.since_id.as_deref(), self.min_id.as_deref()) {
            (Some(since), Some(min)) => Some(since.max(min)),
            (since, min) => since.or(min),
        }
    }

    fn link(&self, base: &Url, cursor_key: &str, cursor_value: &str) -> Url {
        let kept: Vec<(String, String)> = base
            .query_pairs()
            .filter(|(key, _)| {
                !matches!(
                    key.as_ref(),
                    LIMIT_KEY | MAX_ID_KEY | SINCE_ID_KEY | MIN_ID_KEY
                )
            })
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut query = url.query_pairs_mut();
            query.extend_pairs(kept);
            query.append_pair(LIMIT_KEY, &self.limit.to_string());
            query.append_pair(cursor_key, cursor_value);
        }
        url
    }
}

fn as_id<T: AsRef<str>>(id: &T) -> &str {
    id.as_ref()
}

fn cursor(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    /// Older items.
    pub next: Url,
    /// Newer items.
    pub prev: Url,
}

impl PageLinks {
    /// Value of the `Link` response header.
    pub fn header_value(&self) -> String {
        format!(
            "<{}>; rel=\"next\", <{}>; rel=\"prev\"",
            self.next, self.prev
        )
    }
}
