//! Token secret fingerprinting for operational visibility.
//!
//! Provides a truncated SHA-256 fingerprint of the signing secret so
//! operators can tell which secret is active without exposing it.
//! Fingerprints are logged on startup.

use sha2::{Digest, Sha256};

/// Length of the fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Generate a truncated SHA-256 fingerprint of the secret.
///
/// Returns the first 8 bytes of the SHA-256 hash as a 16-character hex string.
///
/// # Examples
///
/// ```rust
/// use ideaboard::inbound::http::token_config::fingerprint::secret_fingerprint;
///
/// let fp = secret_fingerprint(b"correct horse battery staple");
///
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn secret_fingerprint(secret: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    let result = hasher.finalize();
    hex::encode(&result[..FINGERPRINT_BYTES])
}
