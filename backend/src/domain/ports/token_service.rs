//! Port for issuing and verifying bearer tokens.
use chrono::Duration;

use crate::domain::{AccessToken, Role, TokenClaims, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token services.
    pub enum TokenError {
        /// The token is malformed, forged, expired, or lacks a subject.
        Invalid { reason: String } => "invalid token: {reason}"; unauthorized,
        /// Signing failed.
        Signing { message: String } => "token signing failed: {message}"; internal,
    }
}

/// Signed, self-contained, time-limited tokens.
///
/// There is no refresh or revocation: a token stays valid until it expires.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Mint a token for `subject` valid for `ttl` from now.
    fn issue(
        &self,
        subject: &UserId,
        role: Option<Role>,
        ttl: Duration,
    ) -> Result<AccessToken, TokenError>;

    /// Check signature and expiry, returning the embedded claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}
