//! Authentication primitives: credentials, registration input, and tokens.
//!
//! Constructors validate raw strings so handlers hand the services only
//! well-formed values. Plaintext passwords are held in [`Zeroizing`] buffers
//! and wiped when dropped.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::{EmailAddress, Role, UserId, UserProfile, UserValidationError, Username};

/// Minimum plaintext password length in characters.
pub const PASSWORD_MIN: usize = 6;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed, lowercased, and non-empty. It is not required to be
///   a well-formed address: unknown emails simply fail to authenticate.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use ideaboard::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Ada@Example.com ", "hunter22").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// assert_eq!(creds.password(), "hunter22");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from the raw form fields.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_lowercase(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for the user lookup.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// A plaintext password that satisfies the length policy.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(Zeroizing<String>);

/// Raised when a password is shorter than [`PASSWORD_MIN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("password must be at least {min} characters")]
pub struct PasswordTooShort {
    pub min: usize,
}

impl PlainPassword {
    /// Validate a candidate password.
    pub fn new(raw: &str) -> Result<Self, PasswordTooShort> {
        if raw.chars().count() < PASSWORD_MIN {
            return Err(PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Borrow the plaintext for hashing.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(<redacted>)")
    }
}

/// Errors raised while validating a registration or profile update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Username(UserValidationError),
    #[error("{0}")]
    Email(UserValidationError),
    #[error(transparent)]
    Password(#[from] PasswordTooShort),
}

impl RegistrationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Username(_) => "username",
            Self::Email(_) => "email",
            Self::Password(_) => "password",
        }
    }
}

/// Validated input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: Username,
    pub email: EmailAddress,
    pub password: PlainPassword,
    pub profile: UserProfile,
}

impl Registration {
    /// Validate the required fields; profile fields are free-form.
    pub fn try_from_parts(
        username: &str,
        email: &str,
        password: &str,
        profile: UserProfile,
    ) -> Result<Self, RegistrationError> {
        Ok(Self {
            username: Username::new(username).map_err(RegistrationError::Username)?,
            email: EmailAddress::new(email).map_err(RegistrationError::Email)?,
            password: PlainPassword::new(password)?,
            profile,
        })
    }
}

/// Partial update of the caller's own account.
///
/// Profile text fields are replaced when present; there is no way to clear
/// one back to absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<Username>,
    pub email: Option<EmailAddress>,
    pub password: Option<PlainPassword>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl UserPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.skills.is_none()
    }
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: UserId,
    pub role: Option<Role>,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
