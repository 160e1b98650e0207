//! Session token signing and validation.
//!
//! Tokens are HMAC-SHA256 signed JWTs carrying the user identity plus the
//! standard time-bound claims. Signature checking is symmetric-key: every
//! backend instance shares the same secret, so no key distribution or JWKS
//! machinery is involved.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::AuthResult;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Numeric user id.
    pub user_id: u64,

    /// Login name at issuance time.
    pub username: String,

    /// Email at issuance time.
    pub email: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Not before (Unix timestamp).
    pub nbf: i64,
}

impl SessionClaims {
    /// Remaining validity relative to `now`, clamped at zero.
    #[must_use]
    pub fn remaining_validity(&self, now: OffsetDateTime) -> Duration {
        let remaining = self.exp - now.unix_timestamp();
        if remaining > 0 {
            Duration::from_secs(remaining as u64)
        } else {
            Duration::ZERO
        }
    }
}

/// Issues and validates signed session tokens.
///
/// Thread-safe (`Send + Sync`); share one signer across tasks.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    refresh_window: Duration,
}

impl TokenSigner {
    /// Creates a signer from configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            token_ttl: config.token_ttl,
            refresh_window: config.refresh_window,
        }
    }

    /// Validity window of tokens produced by [`issue`](Self::issue).
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Issues a signed, time-bounded token for the given identity.
    pub fn issue(&self, user_id: u64, username: &str, email: &str) -> AuthResult<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = SessionClaims {
            user_id,
            username: username.to_string(),
            email: email.to_string(),
            exp: now + self.token_ttl.as_secs() as i64,
            iat: now,
            nbf: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::from)
    }

    /// Decodes and fully validates a token: signature, expiry, and
    /// not-before.
    pub fn decode(&self, token: &str) -> AuthResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AuthError::from)
    }

    /// Decodes a token checking the signature only.
    ///
    /// Revocation needs the expiry claim of tokens that may already be
    /// expired; an expired token must parse here so its remaining validity
    /// can be computed (and found to be zero).
    pub fn decode_allow_expired(&self, token: &str) -> AuthResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AuthError::from)
    }

    /// Reissues a token nearing expiry.
    ///
    /// Returns a fresh token for the same identity when the input has less
    /// than the refresh window left; otherwise returns the input unchanged.
    pub fn refresh(&self, token: &str) -> AuthResult<String> {
        let claims = self.decode(token)?;
        let remaining = claims.remaining_validity(OffsetDateTime::now_utc());
        if remaining < self.refresh_window {
            self.issue(claims.user_id, &claims.username, &claims.email)
        } else {
            Ok(token.to_string())
        }
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("token_ttl", &self.token_ttl)
            .field("refresh_window", &self.refresh_window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signer() -> TokenSigner {
        TokenSigner::new(&AuthConfig {
            secret: "unit-test-secret".to_string(),
            ..AuthConfig::default()
        })
    }

    #[test]
    fn test_issue_decode_round_trip() {
        let signer = test_signer();
        let token = signer.issue(42, "ada", "ada@example.com").unwrap();

        let claims = signer.decode(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = TokenSigner::new(&AuthConfig {
            secret: "unit-test-secret".to_string(),
            token_ttl: Duration::ZERO,
            ..AuthConfig::default()
        });
        let token = signer.issue(1, "u", "u@example.com").unwrap();

        std::thread::sleep(Duration::from_millis(1100));
        let err = signer.decode(&token).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let signer = test_signer();
        let other = TokenSigner::new(&AuthConfig {
            secret: "a-different-secret".to_string(),
            ..AuthConfig::default()
        });

        let token = other.issue(1, "mallory", "m@example.com").unwrap();
        let err = signer.decode(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[test]
    fn test_decode_allow_expired_recovers_claims() {
        let signer = TokenSigner::new(&AuthConfig {
            secret: "unit-test-secret".to_string(),
            token_ttl: Duration::ZERO,
            ..AuthConfig::default()
        });
        let token = signer.issue(7, "ghost", "g@example.com").unwrap();

        std::thread::sleep(Duration::from_millis(1100));
        assert!(signer.decode(&token).is_err());

        let claims = signer.decode_allow_expired(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(
            claims.remaining_validity(OffsetDateTime::now_utc()),
            Duration::ZERO
        );
    }

    #[test]
    fn test_refresh_far_from_expiry_is_identity() {
        let signer = test_signer();
        let token = signer.issue(1, "u", "u@example.com").unwrap();
        assert_eq!(signer.refresh(&token).unwrap(), token);
    }

    #[test]
    fn test_refresh_near_expiry_reissues() {
        // 10 min left < 30 min refresh window, so a new token is issued.
        let signer = TokenSigner::new(&AuthConfig {
            secret: "unit-test-secret".to_string(),
            token_ttl: Duration::from_secs(600),
            ..AuthConfig::default()
        });
        let token = signer.issue(5, "u", "u@example.com").unwrap();

        // Token contents embed issuance timestamps, so reissuing within the
        // same second can yield an identical string; claims are what matter.
        let refreshed = signer.refresh(&token).unwrap();
        let claims = signer.decode(&refreshed).unwrap();
        assert_eq!(claims.user_id, 5);
    }
}
