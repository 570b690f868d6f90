//! Evaluations: one rating/comment/like record per (idea, user) pair.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{EvaluationId, IdeaId, UserId, Username};

/// Lowest accepted score.
pub const SCORE_MIN: u8 = 1;
/// Highest accepted score.
pub const SCORE_MAX: u8 = 5;

/// Shown in place of a username whose account no longer exists.
pub const UNKNOWN_USER: &str = "unknown user";
/// Shown in place of an idea title whose idea no longer exists.
pub const UNKNOWN_IDEA: &str = "unknown idea";

/// Raised when a score falls outside `SCORE_MIN..=SCORE_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("score must be between {SCORE_MIN} and {SCORE_MAX}, got {0}")]
pub struct ScoreOutOfRange(pub i64);

/// Star rating from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    /// Validate a raw score.
    pub fn new(raw: i64) -> Result<Self, ScoreOutOfRange> {
        match u8::try_from(raw) {
            Ok(value) if (SCORE_MIN..=SCORE_MAX).contains(&value) => Ok(Self(value)),
            _ => Err(ScoreOutOfRange(raw)),
        }
    }

    /// The score as an integer.
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Logical identity of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvaluationKey {
    pub idea_id: IdeaId,
    pub user_id: UserId,
}

/// Fields supplied to `rate`. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationPatch {
    pub score: Option<Score>,
    pub comment: Option<String>,
    pub liked: Option<bool>,
}

/// Stored evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub idea_id: IdeaId,
    pub user_id: UserId,
    pub score: Option<Score>,
    pub comment: Option<String>,
    pub liked: bool,
    pub updated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Create the record written the first time a pair is rated.
    pub fn first(
        id: EvaluationId,
        key: EvaluationKey,
        patch: &EvaluationPatch,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            idea_id: key.idea_id,
            user_id: key.user_id,
            score: patch.score,
            comment: patch.comment.clone(),
            liked: patch.liked.unwrap_or(false),
            updated_at: at,
        }
    }

    /// Create the record written when a like is the first interaction.
    pub fn first_like(id: EvaluationId, key: EvaluationKey, at: DateTime<Utc>) -> Self {
        Self {
            id,
            idea_id: key.idea_id,
            user_id: key.user_id,
            score: None,
            comment: Some(String::new()),
            liked: true,
            updated_at: at,
        }
    }

    /// Merge the supplied fields into this record.
    pub fn apply(&mut self, patch: &EvaluationPatch, at: DateTime<Utc>) {
        if let Some(score) = patch.score {
            self.score = Some(score);
        }
        if let Some(comment) = &patch.comment {
            self.comment = Some(comment.clone());
        }
        if let Some(liked) = patch.liked {
            self.liked = liked;
        }
        self.updated_at = at;
    }

    /// The pair this evaluation belongs to.
    pub fn key(&self) -> EvaluationKey {
        EvaluationKey {
            idea_id: self.idea_id,
            user_id: self.user_id,
        }
    }
}

/// One row of an idea's evaluation summary, with references resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationLine {
    /// Evaluator's username, or [`UNKNOWN_USER`].
    pub username: String,
    /// Idea title, or [`UNKNOWN_IDEA`].
    pub idea_title: String,
    pub score: Option<Score>,
    pub comment: String,
    /// Mean score across the whole idea, repeated on every line.
    pub avg_score: f64,
}

/// Likes on one idea together with who gave them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeSummary {
    pub idea_id: IdeaId,
    pub usernames: Vec<Username>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn key() -> EvaluationKey {
        EvaluationKey {
            idea_id: IdeaId::random(),
            user_id: UserId::random(),
        }
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(5, true)]
    #[case(6, false)]
    #[case(-3, false)]
    #[case(300, false)]
    fn score_range(#[case] raw: i64, #[case] valid: bool) {
        assert_eq!(Score::new(raw).is_ok(), valid);
    }

    #[rstest]
    fn apply_only_touches_supplied_fields() {
        let at = Utc::now();
        let mut evaluation = Evaluation::first(
            EvaluationId::random(),
            key(),
            &EvaluationPatch {
                score: Some(Score::new(2).expect("score")),
                comment: Some("meh".to_owned()),
                liked: Some(true),
            },
            at,
        );

        evaluation.apply(
            &EvaluationPatch {
                score: Some(Score::new(4).expect("score")),
                ..EvaluationPatch::default()
            },
            at,
        );

        assert_eq!(evaluation.score.map(Score::get), Some(4));
        assert_eq!(evaluation.comment.as_deref(), Some("meh"));
        assert!(evaluation.liked);
    }

    #[rstest]
    fn first_like_has_empty_comment_and_no_score() {
        let evaluation = Evaluation::first_like(EvaluationId::random(), key(), Utc::now());
        assert!(evaluation.liked);
        assert!(evaluation.score.is_none());
        assert_eq!(evaluation.comment.as_deref(), Some(""));
    }
}
