//! Session authority.
//!
//! Enforces single-active-session semantics on top of the cache facade:
//! one session record per user (`user:token:{id}`) holding the currently
//! valid token, and one revocation entry per invalidated token
//! (`blacklist:token:{token}`) whose TTL equals the token's remaining
//! validity: the blacklist entry never expires before the token itself
//! would, and never persists meaningfully past its natural expiry.

use std::sync::Arc;

use time::OffsetDateTime;

use rampart_cache::CacheFacade;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::{SessionClaims, TokenSigner};
use crate::AuthResult;

fn session_key(user_id: u64) -> String {
    format!("user:token:{user_id}")
}

fn revocation_key(token: &str) -> String {
    format!("blacklist:token:{token}")
}

/// Issues, registers, revokes, and validates session tokens.
pub struct SessionAuthority {
    cache: Arc<CacheFacade>,
    signer: TokenSigner,
}

impl SessionAuthority {
    /// Creates an authority over the given session store.
    #[must_use]
    pub fn new(cache: Arc<CacheFacade>, config: &AuthConfig) -> Self {
        Self {
            cache,
            signer: TokenSigner::new(config),
        }
    }

    /// Returns the token signer for issuance and refresh flows.
    #[must_use]
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Issues a signed token for the given identity.
    ///
    /// Issuance alone does not register a session; call
    /// [`set_user_token`](Self::set_user_token) to make the token the user's
    /// active session.
    pub fn issue_token(&self, user_id: u64, username: &str, email: &str) -> AuthResult<String> {
        self.signer.issue(user_id, username, email)
    }

    /// Registers `new_token` as the user's single active session.
    ///
    /// Any previously registered token that differs from `new_token` is
    /// revoked first, so at most one token is ever valid per user
    /// system-wide. Two concurrent logins for one user race read-then-write
    /// here; the last write wins and the loser's token is rejected on its
    /// next validation.
    pub async fn set_user_token(&self, user_id: u64, new_token: &str) -> AuthResult<()> {
        match self.cache.get::<String>(&session_key(user_id)).await {
            Ok(old_token) if !old_token.is_empty() && old_token != new_token => {
                if let Err(e) = self.revoke(&old_token).await {
                    // The superseded token is still rejected by the
                    // current-session check; log and move on.
                    tracing::warn!(user_id, error = %e, "failed to revoke superseded token");
                }
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(AuthError::from(e)),
        }

        self.cache
            .set(
                &session_key(user_id),
                &new_token,
                Some(self.signer.token_ttl()),
            )
            .await?;
        tracing::debug!(user_id, "session token registered");
        Ok(())
    }

    /// Revokes a token for its remaining validity.
    ///
    /// An already-expired token is inert; no revocation entry is written.
    /// Idempotent: revoking an already-revoked token rewrites its entry.
    pub async fn revoke(&self, token: &str) -> AuthResult<()> {
        let claims = self.signer.decode_allow_expired(token)?;
        let remaining = claims.remaining_validity(OffsetDateTime::now_utc());
        if remaining.is_zero() {
            return Ok(());
        }

        self.cache
            .set(&revocation_key(token), &true, Some(remaining))
            .await?;
        tracing::debug!(user_id = claims.user_id, "token revoked");
        Ok(())
    }

    /// Returns whether `token` has been revoked.
    pub async fn is_revoked(&self, token: &str) -> AuthResult<bool> {
        match self.cache.get::<bool>(&revocation_key(token)).await {
            Ok(revoked) => Ok(revoked),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(AuthError::from(e)),
        }
    }

    /// Returns the user's currently registered token, if any.
    pub async fn current_token(&self, user_id: u64) -> AuthResult<Option<String>> {
        match self.cache.get::<String>(&session_key(user_id)).await {
            Ok(token) => Ok(Some(token)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(AuthError::from(e)),
        }
    }

    /// Returns whether `token` is the user's current session.
    pub async fn is_current_session(&self, user_id: u64, token: &str) -> AuthResult<bool> {
        Ok(self
            .current_token(user_id)
            .await?
            .is_some_and(|current| current == token))
    }

    /// Validates an incoming token end to end.
    ///
    /// Pipeline: signature/expiry check, then revocation check, then
    /// current-session check. All three must pass; failure at any stage is
    /// an authentication rejection.
    pub async fn validate(&self, token: &str) -> AuthResult<SessionClaims> {
        let claims = self.signer.decode(token)?;

        if self.is_revoked(token).await? {
            tracing::debug!(user_id = claims.user_id, "rejected revoked token");
            return Err(AuthError::TokenRevoked);
        }

        if !self.is_current_session(claims.user_id, token).await? {
            tracing::debug!(user_id = claims.user_id, "rejected superseded session");
            return Err(AuthError::SessionSuperseded);
        }

        Ok(claims)
    }

    /// Logs a user out: revokes the token and clears the session record.
    pub async fn clear_session(&self, user_id: u64, token: &str) -> AuthResult<()> {
        self.revoke(token).await?;
        self.cache.del(&[&session_key(user_id)]).await?;
        tracing::debug!(user_id, "session cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SessionAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthority")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
