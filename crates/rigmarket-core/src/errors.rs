//! Unified error type for rigmarket core operations
//!
//! One flat enum shared by the effect interfaces and the services built on
//! them. Frontend-facing categorization lives in `rigmarket-app::errors`.

use serde::{Deserialize, Serialize};

use crate::effects::{StorageError, TimeError};

/// Unified error type for all core operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum MarketError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Permission denied by the backend
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Error message describing the permission issue
        message: String,
    },

    /// Network or backend transport error
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// Authentication provider rejected the request
    #[error("Auth error: {message}")]
    Auth {
        /// Description returned by the auth provider
        message: String,
    },

    /// Remote call did not complete in time
    #[error("Timeout: {message}")]
    Timeout {
        /// Error message describing the timed out operation
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Storage operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl MarketError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The bare message without the variant prefix.
    ///
    /// Queries surface this string in their `Failed` state.
    pub fn message(&self) -> &str {
        match self {
            Self::Invalid { message }
            | Self::NotFound { message }
            | Self::PermissionDenied { message }
            | Self::Network { message }
            | Self::Auth { message }
            | Self::Timeout { message }
            | Self::Serialization { message }
            | Self::Storage { message }
            | Self::Internal { message } => message,
        }
    }
}

/// Standard Result type for core operations
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(err.to_string()),
            _ => Self::storage(err.to_string()),
        }
    }
}

impl From<StorageError> for MarketError {
    fn from(err: StorageError) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<TimeError> for MarketError {
    fn from(err: TimeError) -> Self {
        Self::internal(format!("time error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MarketError::invalid("test message");
        assert!(matches!(err, MarketError::Invalid { .. }));
        assert_eq!(err.to_string(), "Invalid: test message");
        assert_eq!(err.message(), "test message");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = MarketError::from(io_err);
        assert!(matches!(err, MarketError::NotFound { .. }));

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        assert!(matches!(MarketError::from(io_err), MarketError::Storage { .. }));
    }

    #[test]
    fn test_storage_error_conversion() {
        let err = MarketError::from(StorageError::WriteFailed("read-only".to_string()));
        assert!(matches!(err, MarketError::Storage { .. }));
        assert!(err.message().contains("read-only"));
    }
}
