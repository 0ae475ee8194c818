//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use checkin_orchestrator_provider::ProviderError;

/// Core layer error type
///
/// Soft cascade conditions (bypass fetch failure, challenge detection) are
/// not variants here: they are control flow inside the retry cascade and
/// surface as ordinary failed outcomes, never as errors.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Provider not found
    #[error("Provider \"{0}\" not found")]
    ProviderNotFound(String),

    /// Template provider with no account-level domain override
    #[error("Provider \"{0}\" has no domain and the account does not supply one")]
    DomainUnresolved(String),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Validation error (bad cron expression, malformed cookie input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Notification dispatch error
    #[error("Notification error: {0}")]
    NotificationError(String),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist,
    /// etc.), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error`
    /// when returning `false`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ProviderNotFound(_)
            | Self::DomainUnresolved(_)
            | Self::AccountNotFound(_)
            | Self::ValidationError(_) => true,
            Self::Provider(e) => e.is_expected(),
            _ => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
