//! Unified error type hierarchy for Function Rollback
//!
//! Provides structured error handling with ProviderError, FetchError, ConfigError,
//! CheckpointError, RollbackError, and AppError.

use std::io;
use thiserror::Error;

use crate::orchestrator::state::{ExecutorPhase, PublisherPhase};

/// Failure kinds reported by the remote function-management API.
///
/// Transports map their native errors onto these kinds so the pipelines can
/// decide on fallbacks without knowing which provider is behind the trait.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Function, version or alias does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists or is being modified concurrently
    #[error("Resource conflict: {0}")]
    Conflict(String),

    /// Caller lacks permission for the operation
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Code archive oversized or malformed
    #[error("Payload rejected: {0}")]
    Payload(String),

    /// Provider unreachable or request timed out
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Any other provider-side rejection
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, ProviderError::AccessDenied(_))
    }
}

/// Code-location content fetch errors.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Code download failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Code download from {location} returned HTTP {status}")]
    Status { status: u16, location: String },
}

/// Settings file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid TOML in config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Function '{0}' is not declared in the service configuration")]
    UnknownFunction(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Checkpoint publishing errors. Every variant names the phase that failed.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Failed to read the live code of {function}: {source}")]
    LiveCode {
        function: String,
        source: ProviderError,
    },

    #[error("Failed to publish a new version of {function}: {source}")]
    Publish {
        function: String,
        source: ProviderError,
    },

    #[error("Permission denied while updating alias {alias}: {source}")]
    AliasUpdateDenied { alias: String, source: ProviderError },

    #[error("Failed to update alias {alias}: {source}")]
    AliasUpdate { alias: String, source: ProviderError },

    #[error("Failed to create alias {alias}: {source}")]
    AliasCreate { alias: String, source: ProviderError },

    #[error("Failed to update alias {alias} ({update}) and the fallback create also failed ({create})")]
    AliasUpsert {
        alias: String,
        update: ProviderError,
        create: ProviderError,
    },
}

impl CheckpointError {
    /// Terminal phase the publisher stopped in.
    pub fn phase(&self) -> PublisherPhase {
        match self {
            CheckpointError::LiveCode { .. } | CheckpointError::Publish { .. } => {
                PublisherPhase::PublishFailed
            }
            CheckpointError::AliasUpdateDenied { .. } | CheckpointError::AliasUpdate { .. } => {
                PublisherPhase::AliasFailed
            }
            CheckpointError::AliasCreate { .. } | CheckpointError::AliasUpsert { .. } => {
                PublisherPhase::CreateFailed
            }
        }
    }
}

/// Rollback execution errors. Every variant names the phase that failed.
#[derive(Error, Debug)]
pub enum RollbackError {
    #[error("No rollback checkpoint exists for {function} (alias {alias} not found)")]
    CheckpointMissing { function: String, alias: String },

    #[error("Failed to resolve checkpoint {alias} of {function}: {source}")]
    Resolve {
        function: String,
        alias: String,
        source: ProviderError,
    },

    #[error("Checkpoint {alias} of {function} has no code location")]
    MissingCodeLocation { function: String, alias: String },

    #[error("Failed to download checkpoint code of {function}: {source}")]
    Fetch {
        function: String,
        source: FetchError,
    },

    #[error("Failed to upload checkpoint code to {function}: {source}")]
    Upload {
        function: String,
        source: ProviderError,
    },
}

impl RollbackError {
    /// Terminal phase the executor stopped in.
    pub fn phase(&self) -> ExecutorPhase {
        match self {
            RollbackError::CheckpointMissing { .. } => ExecutorPhase::NotFound,
            RollbackError::Resolve { .. } | RollbackError::MissingCodeLocation { .. } => {
                ExecutorPhase::ResolveFailed
            }
            RollbackError::Fetch { .. } => ExecutorPhase::FetchFailed,
            RollbackError::Upload { .. } => ExecutorPhase::UploadFailed,
        }
    }
}

/// Global error type for all Function Rollback operations.
///
/// Provides unified error categorization and user-facing messages.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Rollback(#[from] RollbackError),

    /// Unknown lifecycle event name
    #[error("Unsupported lifecycle event: {0}")]
    UnknownEvent(String),
}

impl AppError {
    /// Get a user-facing error message suitable for CLI output
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => format!("Configuration error: {}", e),
            AppError::Checkpoint(e) => {
                format!("Checkpoint failed during {}: {}", e.phase().as_str(), e)
            }
            AppError::Rollback(e) => {
                format!("Rollback failed during {}: {}", e.phase().as_str(), e)
            }
            AppError::UnknownEvent(event) => format!("Unsupported lifecycle event '{}'", event),
        }
    }
}

/// Top-level result type for operations that may fail.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::NotFound("Alias not found: hello-rollback".to_string());
        assert_eq!(
            err.to_string(),
            "Resource not found: Alias not found: hello-rollback"
        );
        assert!(err.is_not_found());
        assert!(!err.is_access_denied());
    }

    #[test]
    fn test_checkpoint_error_phase() {
        let err = CheckpointError::AliasUpdateDenied {
            alias: "hello-rollback".to_string(),
            source: ProviderError::AccessDenied("lambda:UpdateAlias".to_string()),
        };
        assert_eq!(err.phase(), PublisherPhase::AliasFailed);

        let err = CheckpointError::AliasUpsert {
            alias: "hello-rollback".to_string(),
            update: ProviderError::AccessDenied("denied".to_string()),
            create: ProviderError::Conflict("exists".to_string()),
        };
        assert_eq!(err.phase(), PublisherPhase::CreateFailed);
        let message = err.to_string();
        assert!(message.contains("denied"));
        assert!(message.contains("exists"));
    }

    #[test]
    fn test_rollback_error_phase() {
        let err = RollbackError::CheckpointMissing {
            function: "hello".to_string(),
            alias: "hello-rollback".to_string(),
        };
        assert_eq!(err.phase(), ExecutorPhase::NotFound);
    }

    #[test]
    fn test_user_message_names_phase() {
        let err: AppError = RollbackError::Upload {
            function: "hello".to_string(),
            source: ProviderError::Payload("too large".to_string()),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "Rollback failed during upload_failed: Failed to upload checkpoint code to hello: Payload rejected: too large"
        );
    }

    #[test]
    fn test_unknown_event_message() {
        let err = AppError::UnknownEvent("after:deploy".to_string());
        assert_eq!(
            err.user_message(),
            "Unsupported lifecycle event 'after:deploy'"
        );
    }
}
