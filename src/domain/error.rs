use thiserror::Error;

/// Classification of a failed call to the upstream language model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    QuotaExceeded,
    RateLimited,
    InvalidCredential,
    Generic,
}

impl ProviderErrorKind {
    /// Message shown to the caller for this kind of provider failure
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::QuotaExceeded => {
                "The AI service quota has been exhausted. Please contact the administrator."
            }
            Self::RateLimited => "Too many requests to the AI service. Please try again shortly.",
            Self::InvalidCredential => {
                "The AI service is misconfigured. Please contact the administrator."
            }
            Self::Generic => "The AI service failed to generate an email. Please try again.",
        }
    }
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    #[error("Provider error ({kind:?}): {message}")]
    Provider {
        kind: ProviderErrorKind,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_secs,
        }
    }

    pub fn provider(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self::Provider {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Errors that carry a message meant for the client as-is
    pub fn is_client_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Validation { .. }
                | Self::Unauthorized { .. }
                | Self::Forbidden { .. }
                | Self::Conflict { .. }
                | Self::RateLimited { .. }
                | Self::Provider { .. }
        )
    }
}
