//! # Error Handling
//!
//! Error types for Gather Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Cache Errors                                                      │
//! │  │   └── CacheTypeMismatch     - Key subscribed with another item type │
//! │  │                                                                      │
//! │  ├── Remote Errors                                                     │
//! │  │   ├── NotConnected          - Service unreachable                   │
//! │  │   ├── Network               - Transport failure                     │
//! │  │   ├── Server                - Service returned an error status      │
//! │  │   └── Timeout               - Service client gave up                │
//! │  │                                                                      │
//! │  ├── Community Errors                                                  │
//! │  │   ├── CommunityNotFound     - No community with that id             │
//! │  │   ├── DiscussionNotFound    - No discussion with that id            │
//! │  │   ├── ThreadNotFound        - No thread with that id                │
//! │  │   └── InvalidDiscussion     - Rejected discussion input             │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── Internal              - Should not happen                     │
//! │      └── SerializationError    - View/record encoding failed           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Handling Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ERROR HANDLING FLOW                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Remote call             Cache entry               View                │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<Page<T>, Error> ──► QueryError (cloneable) ──► Alert banner    │
//! │                              code + message                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

/// Result type alias for Gather Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Gather Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Cache Errors (100-199)
    // ========================================================================

    /// The same key was subscribed with a different item type
    #[error("Cache entry for {0} holds a different item type.")]
    CacheTypeMismatch(String),

    // ========================================================================
    // Remote Errors (500-599)
    // ========================================================================

    /// The remote service cannot be reached
    #[error("Not connected to the service.")]
    NotConnected,

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with an error status
    #[error("{message}")]
    Server {
        /// Status code reported by the service
        status: i32,
        /// Human-readable message from the service
        message: String,
    },

    /// The service client timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ========================================================================
    // Community Errors (600-699)
    // ========================================================================

    /// Community does not exist
    #[error("Community not found.")]
    CommunityNotFound,

    /// Discussion does not exist
    #[error("Discussion not found.")]
    DiscussionNotFound,

    /// Thread does not exist
    #[error("Thread not found.")]
    ThreadNotFound,

    /// Discussion input rejected
    #[error("Invalid discussion: {0}")]
    InvalidDiscussion(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Cache
    /// - 500-599: Remote
    /// - 600-699: Community
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Cache (100-199)
            Error::CacheTypeMismatch(_) => 100,

            // Remote (500-599)
            Error::NotConnected => 500,
            Error::Network(_) => 501,
            Error::Server { .. } => 502,
            Error::Timeout(_) => 503,

            // Community (600-699)
            Error::CommunityNotFound => 600,
            Error::DiscussionNotFound => 601,
            Error::ThreadNotFound => 602,
            Error::InvalidDiscussion(_) => 603,

            // Internal (900-999)
            Error::Internal(_) => 900,
            Error::SerializationError(_) => 901,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors can potentially be resolved by retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::Network(_) | Error::NotConnected
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// CACHED ERROR REPRESENTATION
// ============================================================================

/// Cloneable error stored in cache entries
///
/// Several subscribers observe the same failure, so the entry keeps the
/// rendered form rather than the original error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryError {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the error is recoverable
    pub recoverable: bool,
}

impl From<&Error> for QueryError {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        }
    }
}

impl From<Error> for QueryError {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::CacheTypeMismatch("k".into()).code(), 100);
        assert_eq!(Error::NotConnected.code(), 500);
        assert_eq!(Error::CommunityNotFound.code(), 600);
        assert_eq!(Error::Internal("test".into()).code(), 900);
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::Timeout("test".into()).is_recoverable());
        assert!(Error::Network("reset".into()).is_recoverable());
        assert!(!Error::DiscussionNotFound.is_recoverable());
    }

    #[test]
    fn test_server_error_message_is_passed_through() {
        let err = Error::Server {
            status: 5,
            message: "Couldn't find that discussion.".into(),
        };
        assert_eq!(err.to_string(), "Couldn't find that discussion.");
    }

    #[test]
    fn test_query_error_conversion() {
        let err = Error::Network("connection reset".into());
        let cached: QueryError = err.into();

        assert_eq!(cached.code, 501);
        assert!(cached.message.contains("connection reset"));
        assert!(cached.recoverable);
        assert_eq!(cached.to_string(), cached.message);
    }
}
