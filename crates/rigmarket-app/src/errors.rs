//! Categorized application errors
//!
//! Provides structured error types that enable:
//! - Categorized error handling (input vs auth vs network vs storage)
//! - Alert routing in frontends
//! - Recovery hints for user-actionable errors

use std::fmt;

use rigmarket_core::MarketError;

use crate::entitlements::EntitlementError;

/// How a frontend should present an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Form input the user can fix
    Input,
    /// Host configuration
    Config,
    /// Sign-in required or access refused
    Capability,
    /// Listing, order or chat no longer exists
    NotFound,
    /// Backend unreachable or slow; retrying may help
    Network,
    /// Device storage
    Storage,
    /// Anything else
    Operation,
}

impl ErrorCategory {
    /// The user can fix this without outside help.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Input | Self::Config | Self::Capability)
    }

    /// Retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Alert title
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Check your details",
            Self::Config => "Setup problem",
            Self::Capability => "Sign-in required",
            Self::NotFound => "No longer available",
            Self::Network => "Connection problem",
            Self::Storage => "Device storage",
            Self::Operation => "Something went wrong",
        }
    }

    /// Alert body suggesting what to do next
    #[must_use]
    pub fn resolution_hint(&self) -> &'static str {
        match self {
            Self::Input => "Fix the highlighted field and submit again",
            Self::Config => "Fix the host configuration file and restart",
            Self::Capability => "Sign in again; the listing may belong to someone else",
            Self::NotFound => "The item may have sold or been removed; refresh the list",
            Self::Network => "Pull to refresh once you are back online",
            Self::Storage => "Free up space on the device; changes are kept until restart",
            Self::Operation => "Try again later",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorized application errors
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// Client-side validation rejected the request
    #[error("Invalid input: {message}")]
    Input { message: String },
    /// Configuration could not be loaded or is out of range
    #[error("Configuration error: {message}")]
    Config { message: String },
    /// The auth provider or backend refused the request
    #[error("Authentication failed: {message}")]
    Auth { message: String },
    /// A record the caller asked for does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },
    /// Transport failure or timeout talking to the backend
    #[error("Network error: {message}")]
    Network { message: String },
    /// Local persistence failed
    #[error("Storage error: {message}")]
    Storage { message: String },
    /// Unexpected condition
    #[error("{context}: {message}")]
    Internal { context: String, message: String },
}

impl AppError {
    /// Create an input validation error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an auth error carrying the provider's description
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
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
    pub fn internal(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Category used by frontends to pick the alert style
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Input { .. } => ErrorCategory::Input,
            Self::Config { .. } => ErrorCategory::Config,
            Self::Auth { .. } => ErrorCategory::Capability,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Network { .. } => ErrorCategory::Network,
            Self::Storage { .. } => ErrorCategory::Storage,
            Self::Internal { .. } => ErrorCategory::Operation,
        }
    }

    /// Get a short error code string
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Input { .. } => "INPUT",
            Self::Config { .. } => "CONFIG",
            Self::Auth { .. } => "AUTH",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Network { .. } => "NETWORK",
            Self::Storage { .. } => "STORAGE",
            Self::Internal { .. } => "INTERNAL",
        }
    }
}

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Invalid { message } => Self::Input { message },
            MarketError::NotFound { message } => Self::NotFound { message },
            MarketError::PermissionDenied { message } | MarketError::Auth { message } => {
                Self::Auth { message }
            }
            MarketError::Network { message } | MarketError::Timeout { message } => {
                Self::Network { message }
            }
            MarketError::Storage { message } => Self::Storage { message },
            MarketError::Serialization { message } => Self::internal("serialization", message),
            MarketError::Internal { message } => Self::internal("backend", message),
        }
    }
}

impl From<EntitlementError> for AppError {
    fn from(err: EntitlementError) -> Self {
        match err {
            EntitlementError::Clock(_) => Self::internal("clock", err.to_string()),
            other => Self::storage(other.to_string()),
        }
    }
}

/// Result type for application operations
pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_display() {
        let err = AppError::input("password must be at least 6 characters");
        assert_eq!(
            err.to_string(),
            "Invalid input: password must be at least 6 characters"
        );
        assert_eq!(err.code(), "INPUT");
        assert!(err.category().is_user_correctable());
    }

    #[test]
    fn backend_errors_map_to_categories() {
        assert_eq!(
            AppError::from(MarketError::auth("Invalid login credentials")),
            AppError::auth("Invalid login credentials")
        );
        assert_eq!(
            AppError::from(MarketError::timeout("list_products")).category(),
            ErrorCategory::Network
        );
        assert_eq!(
            AppError::from(MarketError::permission_denied("rls")).category(),
            ErrorCategory::Capability
        );
        assert_eq!(
            AppError::from(MarketError::serialization("bad json")).category(),
            ErrorCategory::Operation
        );
    }

    #[test]
    fn internal_error_keeps_context() {
        let err = AppError::internal("feed", "listener stopped");
        assert_eq!(err.to_string(), "feed: listener stopped");
        assert_eq!(err.code(), "INTERNAL");
        assert!(!err.category().is_transient());
    }

    #[test]
    fn only_network_errors_invite_retry() {
        let transient: Vec<_> = [
            AppError::input("x"),
            AppError::config("x"),
            AppError::auth("x"),
            AppError::not_found("x"),
            AppError::network("x"),
            AppError::storage("x"),
            AppError::internal("x", "y"),
        ]
        .iter()
        .filter(|err| err.category().is_transient())
        .map(AppError::code)
        .collect();
        assert_eq!(transient, vec!["NETWORK"]);
    }

    #[test]
    fn sold_listing_is_not_user_correctable() {
        let err = AppError::from(MarketError::not_found("product 42"));
        assert!(!err.category().is_user_correctable());
        assert_eq!(err.category().to_string(), "No longer available");
        assert!(AppError::auth("expired").category().is_user_correctable());
    }
}
