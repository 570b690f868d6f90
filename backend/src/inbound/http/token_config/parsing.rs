//! Environment parsing helpers for token configuration.

use mockable::Env;
use tracing::warn;

use super::{BuildMode, TokenConfigError};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// Configuration for parsing a boolean environment variable.
pub(super) struct BoolEnvConfig {
    name: &'static str,
    default_value: bool,
}

impl BoolEnvConfig {
    pub(super) const fn new(name: &'static str, default_value: bool) -> Self {
        Self {
            name,
            default_value,
        }
    }
}

/// Parse a boolean toggle. Absent toggles take the default in every build
/// mode; unparsable ones only fall back in debug builds.
pub(super) fn parse_bool_env<E: Env, F>(
    env: &E,
    mode: BuildMode,
    config: BoolEnvConfig,
    value_validator: F,
) -> Result<bool, TokenConfigError>
where
    F: FnOnce(bool, BuildMode) -> Result<bool, TokenConfigError>,
{
    let default_label = if config.default_value {
        "enabled"
    } else {
        "disabled"
    };
    let Some(value) = env.string(config.name) else {
        return Ok(config.default_value);
    };
    match parse_bool(&value) {
        Some(flag) => value_validator(flag, mode),
        None => debug_warn_or_error(
            mode,
            config.default_value,
            TokenConfigError::InvalidEnv {
                name: config.name,
                value: value.clone(),
                expected: BOOL_EXPECTED,
            },
            || {
                warn!(
                    value = %value,
                    "invalid {}; defaulting to {}",
                    config.name,
                    default_label
                );
            },
        ),
    }
}

pub(super) fn debug_warn_or_error<T, F>(
    mode: BuildMode,
    fallback: T,
    error: TokenConfigError,
    warn_fn: F,
) -> Result<T, TokenConfigError>
where
    F: FnOnce(),
{
    if mode.is_debug() {
        warn_fn();
        Ok(fallback)
    } else {
        Err(error)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
