//! Bearer-token configuration parsing and validation.
//!
//! Centralises the environment-driven token settings so they are validated
//! consistently and can be tested in isolation. Debug builds fall back to
//! defaults with a warning; release builds reject anything unsafe.

pub mod fingerprint;
mod parsing;

use std::path::PathBuf;

use chrono::Duration;
use mockable::Env;
use rand::RngCore;
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use parsing::{BoolEnvConfig, debug_warn_or_error, parse_bool_env};

const TOKEN_SECRET_DEFAULT_PATH: &str = "/var/run/secrets/token_secret";
const TOKEN_SECRET_MIN_LEN: usize = 32;
const EPHEMERAL_SECRET_LEN: usize = 64;
const SECRET_FILE_ENV: &str = "TOKEN_SECRET_FILE";
const TTL_ENV: &str = "TOKEN_TTL_MINUTES";
const ALLOW_EPHEMERAL_ENV: &str = "TOKEN_ALLOW_EPHEMERAL";
const TTL_EXPECTED: &str = "a positive number of minutes";
const DEFAULT_TTL_MINUTES: i64 = crate::domain::DEFAULT_TOKEN_TTL_MINUTES;

/// Build mode for token configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings.
    Debug,
    /// Release builds require a real secret and valid toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ideaboard::inbound::http::token_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Token settings derived from the environment.
pub struct TokenSettings {
    /// HS256 signing secret.
    pub secret: Zeroizing<Vec<u8>>,
    /// Lifetime of issued tokens.
    pub ttl: Duration,
    /// Whether the secret was generated for this process only.
    pub ephemeral: bool,
}

impl TokenSettings {
    /// Fingerprint of the active secret for startup logs.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint::secret_fingerprint(&self.secret)
    }
}

/// Errors raised while validating token configuration.
#[derive(thiserror::Error, Debug)]
pub enum TokenConfigError {
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the secret file failed.
    #[error("failed to read token secret at {path}: {source}")]
    SecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The secret file exists but is too short for release builds.
    #[error("token secret at {path} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not allow ephemeral secrets.
    #[error("TOKEN_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build token settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use ideaboard::inbound::http::token_config::{token_settings_from_env, BuildMode};
/// use mockable::MockEnv;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let secret_path = std::env::temp_dir().join("token_secret_example");
/// std::fs::write(&secret_path, vec![b'a'; 48])?;
///
/// let secret_path = secret_path.to_str().expect("valid path").to_string();
/// let mut env = MockEnv::new();
/// env.expect_string()
///     .returning(move |name| match name {
///         "TOKEN_SECRET_FILE" => Some(secret_path.clone()),
///         "TOKEN_TTL_MINUTES" => Some("30".to_string()),
///         _ => None,
///     });
///
/// let settings = token_settings_from_env(&env, BuildMode::Release)?;
/// assert_eq!(settings.ttl.num_minutes(), 30);
/// assert!(!settings.ephemeral);
/// # Ok(())
/// # }
/// ```
pub fn token_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<TokenSettings, TokenConfigError> {
    let ttl = ttl_from_env(env, mode)?;
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let (secret, ephemeral) = secret_from_env(env, mode, allow_ephemeral)?;

    Ok(TokenSettings {
        secret,
        ttl,
        ephemeral,
    })
}

fn ttl_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Duration, TokenConfigError> {
    let default_ttl = Duration::minutes(DEFAULT_TTL_MINUTES);
    let Some(value) = env.string(TTL_ENV) else {
        return Ok(default_ttl);
    };
    match value.trim().parse::<i64>() {
        Ok(minutes) if minutes > 0 => Ok(Duration::minutes(minutes)),
        _ => debug_warn_or_error(
            mode,
            default_ttl,
            TokenConfigError::InvalidEnv {
                name: TTL_ENV,
                value: value.clone(),
                expected: TTL_EXPECTED,
            },
            || warn!(value = %value, "invalid {TTL_ENV}; using {DEFAULT_TTL_MINUTES} minutes"),
        ),
    }
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, TokenConfigError> {
    parse_bool_env(
        env,
        mode,
        BoolEnvConfig::new(ALLOW_EPHEMERAL_ENV, false),
        |flag, mode| {
            if flag && !mode.is_debug() {
                Err(TokenConfigError::EphemeralNotAllowed)
            } else {
                Ok(flag)
            }
        },
    )
}

fn ephemeral_secret() -> Zeroizing<Vec<u8>> {
    let mut secret = Zeroizing::new(vec![0_u8; EPHEMERAL_SECRET_LEN]);
    rand::thread_rng().fill_bytes(secret.as_mut_slice());
    secret
}

fn secret_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<(Zeroizing<Vec<u8>>, bool), TokenConfigError> {
    let secret_path = env
        .string(SECRET_FILE_ENV)
        .unwrap_or_else(|| TOKEN_SECRET_DEFAULT_PATH.to_string());
    let path = PathBuf::from(secret_path);

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length == 0 || (mode == BuildMode::Release && length < TOKEN_SECRET_MIN_LEN) {
                bytes.zeroize();
                if mode.is_debug() {
                    warn!(
                        path = %path.display(),
                        "token secret file is empty; using temporary secret (dev only)"
                    );
                    return Ok((ephemeral_secret(), true));
                }
                return Err(TokenConfigError::SecretTooShort {
                    path,
                    length,
                    min_len: TOKEN_SECRET_MIN_LEN,
                });
            }
            Ok((Zeroizing::new(bytes), false))
        }
        Err(error) => {
            if mode.is_debug() || allow_ephemeral {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "using temporary token secret (dev only)"
                );
                Ok((ephemeral_secret(), true))
            } else {
                Err(TokenConfigError::SecretRead {
                    path,
                    source: error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests;
