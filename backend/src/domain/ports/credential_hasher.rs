//! Port for one-way password hashing.
use crate::domain::PasswordDigest;

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential hashers.
    pub enum CredentialHashError {
        /// The hashing primitive rejected its input or parameters.
        Hashing { message: String } => "password hashing failed: {message}"; internal,
    }
}

/// Salted one-way hashing. Hashing the same input twice yields different
/// digests; both verify.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password with a fresh salt.
    fn hash(&self, plaintext: &str) -> Result<PasswordDigest, CredentialHashError>;

    /// Whether `plaintext` matches `digest`. Malformed digests never match.
    fn verify(&self, plaintext: &str, digest: &PasswordDigest) -> bool;
}
