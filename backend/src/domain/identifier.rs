//! UUID-backed identifiers for users, ideas, and evaluations.
//!
//! Identifiers arrive as strings from paths, queries, and bodies. They are
//! parsed once at the boundary; everything past it works with typed ids.

use thiserror::Error;

/// Raised when a string is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must be a valid UUID")]
pub struct InvalidIdentifier {
    kind: &'static str,
    value: String,
}

impl InvalidIdentifier {
    /// Which identifier family rejected the value (e.g. `user id`).
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The rejected input.
    pub fn value(&self) -> &str {
        &self.value
    }
}

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Parse an identifier from its canonical string form.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidIdentifier> {
                let raw = raw.as_ref();
                uuid::Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| InvalidIdentifier {
                        kind: $kind,
                        value: raw.to_owned(),
                    })
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID, typically read back from storage.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidIdentifier;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

uuid_identifier!(
    /// Stable user identifier.
    UserId,
    "user id"
);
uuid_identifier!(
    /// Stable idea identifier.
    IdeaId,
    "idea id"
);
uuid_identifier!(
    /// Stable evaluation identifier.
    EvaluationId,
    "evaluation id"
);
