use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("invalid public url `{url}`: {reason}")]
    PublicUrl { url: String, reason: String },
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn public_url(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::PublicUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
