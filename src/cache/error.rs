use thiserror::Error;

/// Errors raised by cache construction and sweep lifecycle management.
///
/// Lookup failures never surface here: loader errors are returned to the
/// caller unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache `{cache}` sweep loop is already running")]
    AlreadyStarted { cache: &'static str },
    #[error("cache `{cache}` sweep loop is not running")]
    NotStarted { cache: &'static str },
    #[error("invalid configuration for cache `{cache}`: {reason}")]
    InvalidConfig { cache: &'static str, reason: String },
    #[error("cache registry lifecycle violated: {0}")]
    Lifecycle(String),
}

impl CacheError {
    pub fn invalid_config(cache: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            cache,
            reason: reason.into(),
        }
    }

    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle(message.into())
    }

    /// True for errors caused by starting or stopping caches out of order.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyStarted { .. } | Self::NotStarted { .. } | Self::Lifecycle(_)
        )
    }
}
