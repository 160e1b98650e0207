//! Cache error types.
//!
//! This module defines all error types that can occur during cache facade
//! and bloom filter operations.

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The key is absent, or its entry has expired.
    #[error("Key not found: {key}")]
    NotFound {
        /// The key that was not found.
        key: String,
    },

    /// The operation requires the remote backend's native feature set and
    /// cannot be served while running against the in-process fallback store.
    #[error("Operation not supported in degraded mode: {operation}")]
    UnsupportedInFallback {
        /// The operation that was attempted.
        operation: String,
    },

    /// A value could not be serialized for storage.
    #[error("Serialization failed: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// A stored payload could not be deserialized into the caller's type.
    #[error("Deserialization failed: {message}")]
    Deserialization {
        /// Description of the deserialization failure.
        message: String,
    },

    /// The remote backend rejected a command or the connection failed.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },

    /// The fallback store could not be persisted to disk.
    #[error("Persistence error: {message}")]
    Persistence {
        /// Description of the persistence failure.
        message: String,
    },
}

impl CacheError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a new `UnsupportedInFallback` error.
    #[must_use]
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedInFallback {
            operation: operation.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `Deserialization` error.
    #[must_use]
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a new `Persistence` error.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Returns `true` if this error represents an absent or expired key.
    ///
    /// Callers commonly branch on this to compute-and-cache on miss.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the operation failed because the facade is running
    /// in fallback mode.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedInFallback { .. })
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::not_found("user:profile:42");
        assert_eq!(err.to_string(), "Key not found: user:profile:42");

        let err = CacheError::unsupported("INCR");
        assert_eq!(
            err.to_string(),
            "Operation not supported in degraded mode: INCR"
        );

        let err = CacheError::backend("connection refused");
        assert_eq!(err.to_string(), "Backend error: connection refused");
    }

    #[test]
    fn test_error_predicates() {
        assert!(CacheError::not_found("k").is_not_found());
        assert!(!CacheError::not_found("k").is_unsupported());

        assert!(CacheError::unsupported("HSET").is_unsupported());
        assert!(!CacheError::backend("boom").is_not_found());
    }
}
