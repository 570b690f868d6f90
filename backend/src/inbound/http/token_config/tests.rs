//! Unit tests for token configuration parsing.

use super::*;
use env_lock::lock_env;
use mockable::{DefaultEnv, MockEnv};
use rstest::rstest;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Debug)]
struct TempSecretFile(NamedTempFile);

impl TempSecretFile {
    fn new(len: usize) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&vec![b'a'; len])?;
        file.flush()?;
        Ok(Self(file))
    }

    fn path_str(&self) -> String {
        self.0.path().to_string_lossy().to_string()
    }
}

fn mock_env(vars: HashMap<String, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn with_secret(path: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert(SECRET_FILE_ENV.to_string(), path.to_string());
    vars
}

fn missing_path() -> String {
    std::env::temp_dir()
        .join("ideaboard-token-secret-that-does-not-exist")
        .to_string_lossy()
        .to_string()
}

fn expect_error(
    result: Result<TokenSettings, TokenConfigError>,
    label: &str,
) -> TokenConfigError {
    match result {
        Ok(_) => panic!("{label}"),
        Err(error) => error,
    }
}

#[rstest]
fn release_reads_the_secret_file() {
    let file = TempSecretFile::new(TOKEN_SECRET_MIN_LEN).expect("secret file");
    let env = mock_env(with_secret(&file.path_str()));

    let settings = token_settings_from_env(&env, BuildMode::Release).expect("valid settings");
    assert_eq!(settings.secret.as_slice(), vec![b'a'; TOKEN_SECRET_MIN_LEN].as_slice());
    assert_eq!(settings.ttl, Duration::minutes(DEFAULT_TTL_MINUTES));
    assert!(!settings.ephemeral);
    assert_eq!(settings.fingerprint().len(), 16);
}

#[rstest]
fn release_rejects_short_secrets() {
    let file = TempSecretFile::new(TOKEN_SECRET_MIN_LEN - 1).expect("secret file");
    let env = mock_env(with_secret(&file.path_str()));

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected short secret to fail",
    );
    assert!(matches!(
        err,
        TokenConfigError::SecretTooShort { length, min_len, .. }
            if length == TOKEN_SECRET_MIN_LEN - 1 && min_len == TOKEN_SECRET_MIN_LEN
    ));
}

#[rstest]
fn release_requires_a_readable_secret() {
    let env = mock_env(with_secret(&missing_path()));
    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected missing secret to fail",
    );
    assert!(matches!(err, TokenConfigError::SecretRead { .. }));
}

#[rstest]
fn release_rejects_ephemeral_mode() {
    let mut vars = with_secret(&missing_path());
    vars.insert(ALLOW_EPHEMERAL_ENV.to_string(), "1".to_string());
    let env = mock_env(vars);

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected ephemeral mode to fail",
    );
    assert!(matches!(err, TokenConfigError::EphemeralNotAllowed));
}

#[rstest]
fn debug_falls_back_to_an_ephemeral_secret() {
    let env = mock_env(with_secret(&missing_path()));
    let settings = token_settings_from_env(&env, BuildMode::Debug).expect("debug fallback");
    assert!(settings.ephemeral);
    assert_eq!(settings.secret.len(), EPHEMERAL_SECRET_LEN);
}

#[rstest]
fn process_environment_is_read_through_default_env() {
    let _guard = lock_env([
        (SECRET_FILE_ENV, Some(missing_path())),
        (TTL_ENV, Some("15".to_owned())),
        (ALLOW_EPHEMERAL_ENV, None::<String>),
    ]);
    let settings = token_settings_from_env(&DefaultEnv::new(), BuildMode::Debug)
        .expect("debug settings from the process environment");
    assert!(settings.ephemeral);
    assert_eq!(settings.ttl, chrono::Duration::minutes(15));
}

#[rstest]
fn debug_accepts_short_but_non_empty_secrets() {
    let file = TempSecretFile::new(8).expect("secret file");
    let env = mock_env(with_secret(&file.path_str()));
    let settings = token_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    assert!(!settings.ephemeral);
    assert_eq!(settings.secret.len(), 8);
}

#[rstest]
#[case("15", 15)]
#[case(" 90 ", 90)]
fn ttl_is_read_in_minutes(#[case] raw: &str, #[case] minutes: i64) {
    let file = TempSecretFile::new(TOKEN_SECRET_MIN_LEN).expect("secret file");
    let mut vars = with_secret(&file.path_str());
    vars.insert(TTL_ENV.to_string(), raw.to_string());
    let env = mock_env(vars);

    let settings = token_settings_from_env(&env, BuildMode::Release).expect("valid settings");
    assert_eq!(settings.ttl, Duration::minutes(minutes));
}

#[rstest]
#[case("0")]
#[case("-5")]
#[case("soon")]
fn release_rejects_invalid_ttl(#[case] raw: &str) {
    let file = TempSecretFile::new(TOKEN_SECRET_MIN_LEN).expect("secret file");
    let mut vars = with_secret(&file.path_str());
    vars.insert(TTL_ENV.to_string(), raw.to_string());
    let env = mock_env(vars);

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected invalid ttl to fail",
    );
    assert!(matches!(err, TokenConfigError::InvalidEnv { name: TTL_ENV, .. }));
}

#[rstest]
fn debug_defaults_invalid_ttl() {
    let file = TempSecretFile::new(TOKEN_SECRET_MIN_LEN).expect("secret file");
    let mut vars = with_secret(&file.path_str());
    vars.insert(TTL_ENV.to_string(), "soon".to_string());
    let env = mock_env(vars);

    let settings = token_settings_from_env(&env, BuildMode::Debug).expect("debug settings");
    assert_eq!(settings.ttl, Duration::minutes(DEFAULT_TTL_MINUTES));
}

#[rstest]
fn release_rejects_unparsable_ephemeral_toggle() {
    let file = TempSecretFile::new(TOKEN_SECRET_MIN_LEN).expect("secret file");
    let mut vars = with_secret(&file.path_str());
    vars.insert(ALLOW_EPHEMERAL_ENV.to_string(), "maybe".to_string());
    let env = mock_env(vars);

    let err = expect_error(
        token_settings_from_env(&env, BuildMode::Release),
        "expected invalid toggle to fail",
    );
    assert!(matches!(
        err,
        TokenConfigError::InvalidEnv {
            name: ALLOW_EPHEMERAL_ENV,
            ..
        }
    ));
}
