//! # rampart-auth
//!
//! Token authority for the Rampart admin backend.
//!
//! This crate provides:
//! - HMAC-signed session token issuance, validation, and refresh
//! - Single-active-session enforcement per user
//! - Token revocation bounded to a token's remaining validity
//! - The three-stage validation pipeline used at the request-authentication
//!   boundary: signature/expiry, revocation, current-session
//!
//! ## Overview
//!
//! The authority keeps no state of its own. Session records and revocation
//! entries live in the cache facade from `rampart-cache`, so they share its
//! failover behavior: with the remote backend down, sessions are enforced
//! from the in-process store and survive restarts via its persistence file.
//!
//! ## Modules
//!
//! - [`config`] - Authority configuration
//! - [`error`] - Authentication error taxonomy
//! - [`session`] - Session registration, revocation, validation
//! - [`token`] - Claims and the HMAC token signer

pub mod config;
pub mod error;
pub mod session;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use session::SessionAuthority;
pub use token::{SessionClaims, TokenSigner};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;
