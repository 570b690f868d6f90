//! Evaluation use-cases: rating, liking, and per-idea summaries.
//!
//! Summaries resolve usernames and idea titles on a best-effort basis: a
//! reference that is missing or fails to load is shown as
//! [`UNKNOWN_USER`] or [`UNKNOWN_IDEA`] instead of failing the request.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{EvaluationRepository, IdeaRepository, UserRepository};
use crate::domain::{
    Error, Evaluation, EvaluationKey, EvaluationLine, EvaluationPatch, IdeaId, LikeSummary,
    UNKNOWN_IDEA, UNKNOWN_USER, like_count, mean_score,
};

/// Driven ports the evaluation service depends on.
#[derive(Clone)]
pub struct EvaluationPorts {
    pub evaluations: Arc<dyn EvaluationRepository>,
    pub ideas: Arc<dyn IdeaRepository>,
    pub users: Arc<dyn UserRepository>,
}

/// Evaluation service.
#[derive(Clone)]
pub struct EvaluationService {
    evaluations: Arc<dyn EvaluationRepository>,
    ideas: Arc<dyn IdeaRepository>,
    users: Arc<dyn UserRepository>,
}

impl EvaluationService {
    pub fn new(ports: EvaluationPorts) -> Self {
        let EvaluationPorts {
            evaluations,
            ideas,
            users,
        } = ports;
        Self {
            evaluations,
            ideas,
            users,
        }
    }

    /// Insert or update the evaluation for `key`, touching only supplied
    /// fields.
    pub async fn rate(
        &self,
        key: EvaluationKey,
        patch: &EvaluationPatch,
    ) -> Result<Evaluation, Error> {
        self.ensure_rateable(key).await?;
        let evaluation = self.evaluations.upsert(key, patch).await?;
        debug!(idea_id = %key.idea_id, user_id = %key.user_id, "evaluation stored");
        Ok(evaluation)
    }

    /// Flip the like flag for `key`, returning the new value.
    ///
    /// The first like on a pair creates its evaluation.
    pub async fn toggle_like(&self, key: EvaluationKey) -> Result<bool, Error> {
        self.ensure_rateable(key).await?;
        let liked = self.evaluations.toggle_like(key).await?;
        debug!(idea_id = %key.idea_id, user_id = %key.user_id, liked, "like toggled");
        Ok(liked)
    }

    /// Every stored evaluation. Fails with `not_found` when there are none.
    pub async fn list_all(&self) -> Result<Vec<Evaluation>, Error> {
        let scan = self.evaluations.list().await?;
        if scan.skipped > 0 {
            warn!(skipped = scan.skipped, "skipped malformed evaluation records");
        }
        if scan.evaluations.is_empty() {
            return Err(Error::not_found("no evaluations recorded yet"));
        }
        Ok(scan.evaluations)
    }

    /// All evaluations of one idea with the idea's mean score.
    pub async fn summary(&self, idea_id: &IdeaId) -> Result<Vec<EvaluationLine>, Error> {
        let evaluations = self.evaluations.list_for_ideas(&[*idea_id]).await?;
        if evaluations.is_empty() {
            return Err(Error::not_found("no evaluations found for this idea"));
        }

        let avg_score = mean_score(&evaluations);
        let idea_title = match self.ideas.find_by_id(idea_id).await {
            Ok(Some(idea)) => idea.title,
            Ok(None) => UNKNOWN_IDEA.to_owned(),
            Err(err) => {
                warn!(idea_id = %idea_id, error = %err, "idea lookup failed; using placeholder");
                UNKNOWN_IDEA.to_owned()
            }
        };

        let mut lines = Vec::with_capacity(evaluations.len());
        for evaluation in evaluations {
            let username = match self.users.find_by_id(&evaluation.user_id).await {
                Ok(Some(user)) => user.username.to_string(),
                Ok(None) => UNKNOWN_USER.to_owned(),
                Err(err) => {
                    warn!(
                        user_id = %evaluation.user_id,
                        error = %err,
                        "user lookup failed; using placeholder"
                    );
                    UNKNOWN_USER.to_owned()
                }
            };
            lines.push(EvaluationLine {
                username,
                idea_title: idea_title.clone(),
                score: evaluation.score,
                comment: evaluation.comment.unwrap_or_default(),
                avg_score,
            });
        }
        Ok(lines)
    }

    /// Number of likes on `idea_id`; zero for unknown ideas.
    pub async fn like_count(&self, idea_id: &IdeaId) -> Result<u64, Error> {
        let evaluations = self.evaluations.list_for_ideas(&[*idea_id]).await?;
        Ok(like_count(&evaluations))
    }

    /// Usernames that liked `idea_id`. Deleted accounts are left out.
    pub async fn liked_usernames(&self, idea_id: &IdeaId) -> Result<LikeSummary, Error> {
        let evaluations = self.evaluations.list_for_ideas(&[*idea_id]).await?;
        let mut usernames = Vec::new();
        for evaluation in evaluations.iter().filter(|evaluation| evaluation.liked) {
            if let Some(user) = self.users.find_by_id(&evaluation.user_id).await? {
                usernames.push(user.username);
            }
        }
        Ok(LikeSummary {
            idea_id: *idea_id,
            usernames,
        })
    }

    async fn ensure_rateable(&self, key: EvaluationKey) -> Result<(), Error> {
        if self.users.find_by_id(&key.user_id).await?.is_none() {
            return Err(Error::not_found("user not found"));
        }
        let idea = self
            .ideas
            .find_by_id(&key.idea_id)
            .await?
            .ok_or_else(|| Error::not_found("idea not found"))?;
        if idea.is_owned_by(&key.user_id) {
            return Err(Error::invalid_request("you cannot rate your own idea"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        EvaluationScan, MockEvaluationRepository, MockIdeaRepository, MockUserRepository,
        UserPersistenceError,
    };
    use crate::domain::{
        EmailAddress, ErrorCode, EvaluationId, Idea, IdeaDraft, PasswordDigest, Role, Score, User,
        UserId, UserProfile, Username,
    };
    use chrono::Utc;

    fn make_service(
        evaluations: MockEvaluationRepository,
        ideas: MockIdeaRepository,
        users: MockUserRepository,
    ) -> EvaluationService {
        EvaluationService::new(EvaluationPorts {
            evaluations: Arc::new(evaluations),
            ideas: Arc::new(ideas),
            users: Arc::new(users),
        })
    }

    fn user(name: &str) -> User {
        User {
            id: UserId::random(),
            username: Username::new(name).expect("username"),
            email: EmailAddress::new(format!("{name}@example.com")).expect("email"),
            password_hash: PasswordDigest::new("digest"),
            role: Role::User,
            profile: UserProfile::default(),
            created_at: Utc::now(),
        }
    }

    fn idea_by(author: UserId) -> Idea {
        let draft = IdeaDraft::try_from_parts("Solar kiosk", "d", "m", "a").expect("draft");
        Idea::from_draft(IdeaId::random(), draft, author, Utc::now())
    }

    fn evaluation(idea_id: IdeaId, user_id: UserId, score: i64, liked: bool) -> Evaluation {
        Evaluation {
            id: EvaluationId::random(),
            idea_id,
            user_id,
            score: Some(Score::new(score).expect("score")),
            comment: Some(format!("scored {score}")),
            liked,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn rating_own_idea_is_rejected() {
        let author = user("ada");
        let idea = idea_by(author.id);
        let key = EvaluationKey {
            idea_id: idea.id,
            user_id: author.id,
        };
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(author)));
        let mut ideas = MockIdeaRepository::new();
        ideas
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(idea)));
        let mut evaluations = MockEvaluationRepository::new();
        evaluations.expect_upsert().times(0);

        let err = make_service(evaluations, ideas, users)
            .rate(key, &EvaluationPatch::default())
            .await
            .expect_err("own idea");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "you cannot rate your own idea");
    }

    #[tokio::test]
    async fn liking_own_idea_is_rejected() {
        let author = user("ada");
        let idea = idea_by(author.id);
        let key = EvaluationKey {
            idea_id: idea.id,
            user_id: author.id,
        };
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(author)));
        let mut ideas = MockIdeaRepository::new();
        ideas.expect_find_by_id().return_once(move |_| Ok(Some(idea)));
        let mut evaluations = MockEvaluationRepository::new();
        evaluations.expect_toggle_like().times(0);

        let err = make_service(evaluations, ideas, users)
            .toggle_like(key)
            .await
            .expect_err("own idea");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn rating_unknown_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().times(1).return_once(|_| Ok(None));
        let mut ideas = MockIdeaRepository::new();
        ideas.expect_find_by_id().times(0);

        let key = EvaluationKey {
            idea_id: IdeaId::random(),
            user_id: UserId::random(),
        };
        let err = make_service(MockEvaluationRepository::new(), ideas, users)
            .rate(key, &EvaluationPatch::default())
            .await
            .expect_err("unknown user");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn rating_passes_patch_to_upsert() {
        let rater = user("bob");
        let idea = idea_by(UserId::random());
        let key = EvaluationKey {
            idea_id: idea.id,
            user_id: rater.id,
        };
        let stored = evaluation(idea.id, rater.id, 4, false);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(rater)));
        let mut ideas = MockIdeaRepository::new();
        ideas.expect_find_by_id().return_once(move |_| Ok(Some(idea)));
        let mut evaluations = MockEvaluationRepository::new();
        evaluations
            .expect_upsert()
            .withf(move |k, patch| *k == key && patch.score.map(Score::get) == Some(4))
            .times(1)
            .return_once(move |_, _| Ok(stored));

        let patch = EvaluationPatch {
            score: Some(Score::new(4).expect("score")),
            ..EvaluationPatch::default()
        };
        let saved = make_service(evaluations, ideas, users)
            .rate(key, &patch)
            .await
            .expect("rated");
        assert_eq!(saved.score.map(Score::get), Some(4));
    }

    #[tokio::test]
    async fn summary_substitutes_placeholders() {
        let idea_id = IdeaId::random();
        let known = user("carol");
        let known_id = known.id;
        let deleted = UserId::random();
        let broken = UserId::random();
        let rows = vec![
            evaluation(idea_id, known_id, 4, true),
            evaluation(idea_id, deleted, 5, true),
            evaluation(idea_id, broken, 3, false),
        ];

        let mut evaluations = MockEvaluationRepository::new();
        evaluations
            .expect_list_for_ideas()
            .times(1)
            .return_once(move |_| Ok(rows));
        let mut ideas = MockIdeaRepository::new();
        ideas.expect_find_by_id().times(1).return_once(|_| Ok(None));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().times(3).returning(move |id| {
            if *id == known_id {
                Ok(Some(known.clone()))
            } else if *id == broken {
                Err(UserPersistenceError::query("decode failed"))
            } else {
                Ok(None)
            }
        });

        let lines = make_service(evaluations, ideas, users)
            .summary(&idea_id)
            .await
            .expect("summary");

        let names: Vec<&str> = lines.iter().map(|l| l.username.as_str()).collect();
        assert_eq!(names, vec!["carol", UNKNOWN_USER, UNKNOWN_USER]);
        assert!(lines.iter().all(|l| l.idea_title == UNKNOWN_IDEA));
        assert!(lines.iter().all(|l| l.avg_score == 4.0));
    }

    #[tokio::test]
    async fn summary_without_evaluations_is_not_found() {
        let mut evaluations = MockEvaluationRepository::new();
        evaluations
            .expect_list_for_ideas()
            .return_once(|_| Ok(Vec::new()));
        let err = make_service(
            evaluations,
            MockIdeaRepository::new(),
            MockUserRepository::new(),
        )
        .summary(&IdeaId::random())
        .await
        .expect_err("empty");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn list_all_returns_valid_rows_when_some_are_skipped() {
        let row = evaluation(IdeaId::random(), UserId::random(), 2, false);
        let mut evaluations = MockEvaluationRepository::new();
        evaluations.expect_list().times(1).return_once(move || {
            Ok(EvaluationScan {
                evaluations: vec![row],
                skipped: 2,
            })
        });
        let listed = make_service(
            evaluations,
            MockIdeaRepository::new(),
            MockUserRepository::new(),
        )
        .list_all()
        .await
        .expect("listed");
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn liked_usernames_skip_deleted_accounts() {
        let idea_id = IdeaId::random();
        let fan = user("dave");
        let fan_id = fan.id;
        let rows = vec![
            evaluation(idea_id, fan_id, 5, true),
            evaluation(idea_id, UserId::random(), 5, true),
            evaluation(idea_id, UserId::random(), 1, false),
        ];
        let mut evaluations = MockEvaluationRepository::new();
        evaluations
            .expect_list_for_ideas()
            .return_once(move |_| Ok(rows));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().times(2).returning(move |id| {
            Ok((*id == fan_id).then(|| fan.clone()))
        });

        let summary = make_service(evaluations, MockIdeaRepository::new(), users)
            .liked_usernames(&idea_id)
            .await
            .expect("summary");
        assert_eq!(summary.usernames.len(), 1);
        assert_eq!(summary.usernames[0].as_str(), "dave");
    }
}
