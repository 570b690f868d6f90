//! User data model.
//!
//! Users are identified by a [`UserId`] and carry a unique [`Username`] and
//! [`EmailAddress`]. The follow graph is not stored on the user; it lives in
//! separate edge records and is exposed through [`UserDetails`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{IdeaId, UserId};

/// Minimum username length in characters.
pub const USERNAME_MIN: usize = 3;
/// Maximum username length in characters.
pub const USERNAME_MAX: usize = 30;

/// Validation errors for user fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserValidationError {
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
    #[error("email must look like name@domain")]
    InvalidEmail,
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Unique public handle of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a username, trimming surrounding whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        let length = trimmed.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the username.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Login identity of a user, normalised to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Authorisation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Stable lowercase name used in tokens and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Stored password hash in PHC string form. Never serialised.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap an encoded hash produced by a credential hasher.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Borrow the encoded hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// Optional free-form profile attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
}

/// Registered user.
///
/// Every field is a validated type, so a `User` is well formed by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: PasswordDigest,
    pub role: Role,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the user holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A user together with the usernames on both sides of their follow edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub user: User,
    pub followers: Vec<Username>,
    pub following: Vec<Username>,
}

/// Id and title of one idea, as listed on a user's info card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaHeadline {
    pub id: IdeaId,
    pub title: String,
}

/// Public summary of a user looked up by username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub username: Username,
    pub email: EmailAddress,
    pub title: Option<String>,
    pub ideas: Vec<IdeaHeadline>,
    pub followers: Vec<Username>,
    pub following: Vec<Username>,
}
