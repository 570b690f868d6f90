//! Ideas: user-submitted proposals.
//!
//! An idea is owned by the user who created it. Only the owner may edit it;
//! the owner or an admin may delete it.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{IdeaId, UserId};

/// Validation errors for idea fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdeaValidationError {
    #[error("{field} must not be empty")]
    Blank { field: &'static str },
}

impl IdeaValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Blank { field } => field,
        }
    }
}

/// A required, non-blank text field. Surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaText(String);

impl IdeaText {
    /// Validate a text value for the named field.
    pub fn new(field: &'static str, raw: impl AsRef<str>) -> Result<Self, IdeaValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdeaValidationError::Blank { field });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<IdeaText> for String {
    fn from(value: IdeaText) -> Self {
        value.0
    }
}

/// Fields a user supplies when posting an idea.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaDraft {
    pub title: IdeaText,
    pub description: IdeaText,
    pub market: IdeaText,
    pub target_audience: IdeaText,
}

impl IdeaDraft {
    /// Validate all four fields, reporting the first blank one.
    pub fn try_from_parts(
        title: &str,
        description: &str,
        market: &str,
        target_audience: &str,
    ) -> Result<Self, IdeaValidationError> {
        Ok(Self {
            title: IdeaText::new("title", title)?,
            description: IdeaText::new("description", description)?,
            market: IdeaText::new("market", market)?,
            target_audience: IdeaText::new("target_audience", target_audience)?,
        })
    }
}

/// Partial update of an idea's text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdeaPatch {
    pub title: Option<IdeaText>,
    pub description: Option<IdeaText>,
    pub market: Option<IdeaText>,
    pub target_audience: Option<IdeaText>,
}

impl IdeaPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.market.is_none()
            && self.target_audience.is_none()
    }
}

/// Stored idea.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idea {
    pub id: IdeaId,
    pub title: String,
    pub description: String,
    pub market: String,
    pub target_audience: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Idea {
    /// Build a new idea from a validated draft.
    pub fn from_draft(
        id: IdeaId,
        draft: IdeaDraft,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title.into(),
            description: draft.description.into(),
            market: draft.market.into(),
            target_audience: draft.target_audience.into(),
            created_by,
            created_at,
        }
    }

    /// Apply a patch. `id`, `created_by` and `created_at` never change.
    pub fn apply(&mut self, patch: IdeaPatch) {
        if let Some(title) = patch.title {
            self.title = title.into();
        }
        if let Some(description) = patch.description {
            self.description = description.into();
        }
        if let Some(market) = patch.market {
            self.market = market.into();
        }
        if let Some(target_audience) = patch.target_audience {
            self.target_audience = target_audience.into();
        }
    }

    /// Whether `user` created this idea.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.created_by == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft() -> IdeaDraft {
        IdeaDraft::try_from_parts("Solar kiosk", "Charge phones", "Retail", "Commuters")
            .expect("valid draft")
    }

    #[rstest]
    #[case(" ", "d", "m", "t", "title")]
    #[case("t", "", "m", "t", "description")]
    #[case("t", "d", "\t", "t", "market")]
    #[case("t", "d", "m", "  ", "target_audience")]
    fn blank_fields_are_rejected(
        #[case] title: &str,
        #[case] description: &str,
        #[case] market: &str,
        #[case] audience: &str,
        #[case] field: &str,
    ) {
        let err = IdeaDraft::try_from_parts(title, description, market, audience)
            .expect_err("blank field");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn patch_leaves_identity_untouched() {
        let owner = UserId::random();
        let created_at = Utc::now();
        let mut idea = Idea::from_draft(IdeaId::random(), draft(), owner, created_at);
        let before = idea.clone();

        idea.apply(IdeaPatch {
            market: Some(IdeaText::new("market", " Wholesale ").expect("text")),
            ..IdeaPatch::default()
        });

        assert_eq!(idea.market, "Wholesale");
        assert_eq!(idea.title, before.title);
        assert_eq!(idea.id, before.id);
        assert_eq!(idea.created_at, created_at);
        assert!(idea.is_owned_by(&owner));
    }

    #[rstest]
    fn empty_patch_is_detected() {
        assert!(IdeaPatch::default().is_empty());
    }
}
