//! Token authority error types.
//!
//! Every variant is an authentication *rejection*: the validation pipeline
//! surfaces these to the request-authentication boundary, which answers
//! unauthorized. Failures here are never allowed to crash the process.

use rampart_cache::CacheError;

/// Errors that can occur during token issuance, validation, and revocation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token is malformed, carries an invalid signature, or cannot be
    /// parsed.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The token's validity window has passed.
    #[error("Token expired")]
    TokenExpired,

    /// The token has been explicitly revoked.
    #[error("Token revoked")]
    TokenRevoked,

    /// The token is cryptographically valid but has been superseded by a
    /// newer login for the same user.
    #[error("Session superseded by a newer login")]
    SessionSuperseded,

    /// The request lacks valid authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The session/revocation store failed underneath the authority.
    #[error("Session store error: {0}")]
    Store(#[from] CacheError),
}

impl AuthError {
    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a per-token rejection (as opposed to a
    /// store failure underneath the authority).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::ImmatureSignature => Self::invalid_token("token not yet valid"),
            _ => Self::invalid_token(err.to_string()),
        }
    }
}
