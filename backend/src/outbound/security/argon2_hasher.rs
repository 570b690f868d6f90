//! `CredentialHasher` backed by Argon2id with per-call random salts.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::debug;

use crate::domain::PasswordDigest;
use crate::domain::ports::{CredentialHashError, CredentialHasher};

/// Argon2id hasher using the crate's default cost parameters.
///
/// Digests are PHC strings, so the parameters and salt travel with the
/// hash and older digests keep verifying if the defaults change.
#[derive(Default, Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<PasswordDigest, CredentialHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| PasswordDigest::new(hash.to_string()))
            .map_err(|err| CredentialHashError::hashing(err.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &PasswordDigest) -> bool {
        match PasswordHash::new(digest.as_str()) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(err) => {
                debug!(error = %err, "stored password digest is not a PHC string");
                false
            }
        }
    }
}
