//! Error types for the synchronization agents
//!
//! A closed taxonomy with transient/permanent classification driving
//! the retry logic. "Not found" from a *lookup* is modeled as a normal
//! `Option::None` return and never appears here; the `NotFound` variant
//! exists for the person/company getters, whose contract is to fail
//! when the subject does not exist.

use thiserror::Error;

use regsync_core::{EntityKind, KeyError};

/// Error that can occur while talking to a collaborator or while
/// resolving an entity chain.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The subject of a getter does not exist in the remote registry.
    #[error("{kind} not found for key {key}")]
    NotFound { kind: EntityKind, key: String },

    /// A search matched more than one candidate; the caller must fail
    /// closed, report and skip rather than guess.
    #[error("ambiguous match for {query:?}: {candidates} candidates")]
    Ambiguous { query: String, candidates: usize },

    /// A required upstream entity in the dependency chain could not be
    /// resolved or created; only the dependent subtree is aborted.
    #[error("unresolved dependency: {kind} required by {dependent}")]
    DependencyUnresolved {
        kind: EntityKind,
        dependent: EntityKind,
    },

    /// A call exceeded its bounded timeout.
    #[error("call timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The remote service answered but is temporarily unable to serve
    /// (rate limiting, 5xx).
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Network-level failure during communication.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed input row; never retried, reported and skipped.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// A destructive write was refused because the write-enable flag
    /// is not set.
    #[error("destructive write refused for table '{table}' (write gating active)")]
    WriteDisabled { table: String },

    /// Database error.
    #[error("database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SyncError {
    /// Check if this error is transient and the operation should be
    /// retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Timeout { .. }
                | SyncError::ServiceUnavailable { .. }
                | SyncError::Network { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::NotFound { .. } => "NOT_FOUND",
            SyncError::Ambiguous { .. } => "AMBIGUOUS",
            SyncError::DependencyUnresolved { .. } => "DEPENDENCY_UNRESOLVED",
            SyncError::Timeout { .. } => "TIMEOUT",
            SyncError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            SyncError::Network { .. } => "NETWORK_ERROR",
            SyncError::Validation { .. } => "VALIDATION_FAILED",
            SyncError::WriteDisabled { .. } => "WRITE_DISABLED",
            SyncError::Database { .. } => "DATABASE_ERROR",
            SyncError::Serialization(_) => "SERIALIZATION_ERROR",
            SyncError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create a not-found error for a getter.
    pub fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        SyncError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Create an ambiguous-match error.
    pub fn ambiguous(query: impl Into<String>, candidates: usize) -> Self {
        SyncError::Ambiguous {
            query: query.into(),
            candidates,
        }
    }

    /// Create a service-unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        SyncError::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        SyncError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SyncError::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        SyncError::Validation {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        SyncError::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Create a database error with source.
    pub fn database_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        SyncError::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        SyncError::Internal {
            message: message.into(),
        }
    }
}

impl From<KeyError> for SyncError {
    fn from(e: KeyError) -> Self {
        SyncError::Validation {
            message: e.to_string(),
        }
    }
}

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
