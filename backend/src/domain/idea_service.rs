//! Idea use-cases: CRUD, ownership checks, and ranking.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    EvaluationRepository, FollowRepository, IdeaRepository, UserRepository,
};
use crate::domain::{
    Error, Idea, IdeaDraft, IdeaFilter, IdeaId, IdeaPatch, RankedIdea, User, UserId, Username,
    rank_ideas,
};

/// An idea listed under its author, with the author's follower count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorIdea {
    pub id: IdeaId,
    pub title: String,
    pub creator: Username,
    pub followers_count: u64,
}

/// Driven ports the idea service depends on.
#[derive(Clone)]
pub struct IdeaPorts {
    pub ideas: Arc<dyn IdeaRepository>,
    pub users: Arc<dyn UserRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub evaluations: Arc<dyn EvaluationRepository>,
}

/// Idea service.
#[derive(Clone)]
pub struct IdeaService {
    ideas: Arc<dyn IdeaRepository>,
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
    evaluations: Arc<dyn EvaluationRepository>,
    clock: Arc<dyn Clock>,
}

impl IdeaService {
    pub fn new(ports: IdeaPorts, clock: Arc<dyn Clock>) -> Self {
        let IdeaPorts {
            ideas,
            users,
            follows,
            evaluations,
        } = ports;
        Self {
            ideas,
            users,
            follows,
            evaluations,
            clock,
        }
    }

    /// Store a new idea owned by `author`.
    pub async fn create(&self, author: &User, draft: IdeaDraft) -> Result<Idea, Error> {
        let idea = Idea::from_draft(IdeaId::random(), draft, author.id, self.clock.utc());
        self.ideas.insert(&idea).await?;
        info!(idea_id = %idea.id, author = %author.id, "created idea");
        Ok(idea)
    }

    pub async fn get(&self, id: &IdeaId) -> Result<Idea, Error> {
        self.ideas
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("idea not found"))
    }

    /// Every idea, oldest first. Fails with `not_found` when there are none.
    pub async fn list(&self) -> Result<Vec<Idea>, Error> {
        let ideas = self.ideas.list().await?;
        if ideas.is_empty() {
            return Err(Error::not_found("no ideas found"));
        }
        Ok(ideas)
    }

    /// Ideas created by `author`. Fails with `not_found` when there are none.
    pub async fn list_by_author(&self, author: &UserId) -> Result<Vec<Idea>, Error> {
        let ideas = self.ideas.list_by_author(author).await?;
        if ideas.is_empty() {
            return Err(Error::not_found("user has no ideas"));
        }
        Ok(ideas)
    }

    /// Apply `patch` to an idea owned by `caller`.
    pub async fn update(&self, caller: &User, id: &IdeaId, patch: IdeaPatch) -> Result<Idea, Error> {
        if patch.is_empty() {
            return Err(Error::invalid_request("nothing to update"));
        }
        let mut idea = self.get(id).await?;
        if !idea.is_owned_by(&caller.id) {
            return Err(Error::forbidden("only the author may edit this idea"));
        }
        idea.apply(patch);
        if !self.ideas.update(&idea).await? {
            return Err(Error::not_found("idea not found"));
        }
        Ok(idea)
    }

    /// Delete an idea. Allowed for its author and for admins.
    pub async fn delete(&self, caller: &User, id: &IdeaId) -> Result<(), Error> {
        let idea = self.get(id).await?;
        if !idea.is_owned_by(&caller.id) && !caller.is_admin() {
            return Err(Error::forbidden("only the author may delete this idea"));
        }
        if !self.ideas.delete(id).await? {
            return Err(Error::not_found("idea not found"));
        }
        info!(idea_id = %id, acting = %caller.id, "deleted idea");
        Ok(())
    }

    /// Ideas passing `filter`, best first.
    pub async fn filter(&self, filter: &IdeaFilter) -> Result<Vec<RankedIdea>, Error> {
        let candidates = self
            .ideas
            .list_created_between(filter.min_created_at, filter.max_created_at)
            .await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let idea_ids: Vec<IdeaId> = candidates.iter().map(|idea| idea.id).collect();
        let mut authors: Vec<UserId> = candidates.iter().map(|idea| idea.created_by).collect();
        authors.sort();
        authors.dedup();

        let evaluations = self.evaluations.list_for_ideas(&idea_ids).await?;
        let follower_counts = self.follows.follower_counts(&authors).await?;
        Ok(rank_ideas(candidates, &evaluations, &follower_counts, filter))
    }

    /// Every idea grouped by author, most-followed authors first.
    ///
    /// Authors with equal follower counts keep their listing order.
    pub async fn by_popular_creators(&self) -> Result<Vec<CreatorIdea>, Error> {
        let users = self.users.list().await?;
        let ids: Vec<UserId> = users.iter().map(|user| user.id).collect();
        let counts = self.follows.follower_counts(&ids).await?;

        let mut ideas_by_author: HashMap<UserId, Vec<Idea>> = HashMap::new();
        for idea in self.ideas.list().await? {
            ideas_by_author.entry(idea.created_by).or_default().push(idea);
        }

        let mut ranked: Vec<(User, u64)> = users
            .into_iter()
            .map(|user| {
                let count = counts.get(&user.id).copied().unwrap_or_default();
                (user, count)
            })
            .collect();
        ranked.sort_by(|(_, a), (_, b)| b.cmp(a));

        Ok(ranked
            .into_iter()
            .flat_map(|(user, followers_count)| {
                ideas_by_author
                    .remove(&user.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |idea| CreatorIdea {
                        id: idea.id,
                        title: idea.title,
                        creator: user.username.clone(),
                        followers_count,
                    })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        IdeaPersistenceError, MockEvaluationRepository, MockFollowRepository,
        MockIdeaRepository, MockUserRepository,
    };
    use crate::domain::{
        EmailAddress, ErrorCode, Evaluation, EvaluationId, IdeaText, PasswordDigest, Role, Score,
        UserProfile,
    };
    use crate::test_support::clock::MutableClock;
    use chrono::{Duration, Utc};

    struct Mocks {
        ideas: MockIdeaRepository,
        users: MockUserRepository,
        follows: MockFollowRepository,
        evaluations: MockEvaluationRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                ideas: MockIdeaRepository::new(),
                users: MockUserRepository::new(),
                follows: MockFollowRepository::new(),
                evaluations: MockEvaluationRepository::new(),
            }
        }

        fn into_service(self) -> IdeaService {
            IdeaService::new(
                IdeaPorts {
                    ideas: Arc::new(self.ideas),
                    users: Arc::new(self.users),
                    follows: Arc::new(self.follows),
                    evaluations: Arc::new(self.evaluations),
                },
                Arc::new(MutableClock::fixed()),
            )
        }
    }

    fn user(name: &str, role: Role) -> User {
        User {
            id: UserId::random(),
            username: Username::new(name).expect("username"),
            email: EmailAddress::new(format!("{name}@example.com")).expect("email"),
            password_hash: PasswordDigest::new("digest"),
            role,
            profile: UserProfile::default(),
            created_at: Utc::now(),
        }
    }

    fn idea_by(author: &User) -> Idea {
        let draft = IdeaDraft::try_from_parts("Title", "Description", "Market", "Audience")
            .expect("draft");
        Idea::from_draft(IdeaId::random(), draft, author.id, Utc::now())
    }

    #[tokio::test]
    async fn create_stamps_author_and_time() {
        let author = user("ada", Role::User);
        let mut mocks = Mocks::new();
        mocks.ideas.expect_insert().times(1).return_once(|_| Ok(()));

        let service = mocks.into_service();
        let draft = IdeaDraft::try_from_parts("Title", "Description", "Market", "Audience")
            .expect("draft");
        let idea = service.create(&author, draft).await.expect("created");

        assert_eq!(idea.created_by, author.id);
        assert_eq!(idea.created_at, MutableClock::fixed().utc());
    }

    #[tokio::test]
    async fn list_of_nothing_is_not_found() {
        let mut mocks = Mocks::new();
        mocks.ideas.expect_list().times(1).return_once(|| Ok(Vec::new()));
        let err = mocks.into_service().list().await.expect_err("empty");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn only_the_owner_may_update() {
        let owner = user("ada", Role::User);
        let stranger = user("bob", Role::Admin);
        let idea = idea_by(&owner);
        let id = idea.id;
        let mut mocks = Mocks::new();
        mocks
            .ideas
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(idea)));
        mocks.ideas.expect_update().times(0);

        let patch = IdeaPatch {
            title: Some(IdeaText::new("title", "New").expect("text")),
            ..IdeaPatch::default()
        };
        let err = mocks
            .into_service()
            .update(&stranger, &id, patch)
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn empty_update_is_rejected_before_lookup() {
        let mut mocks = Mocks::new();
        mocks.ideas.expect_find_by_id().times(0);
        let err = mocks
            .into_service()
            .update(&user("ada", Role::User), &IdeaId::random(), IdeaPatch::default())
            .await
            .expect_err("empty patch");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn admins_may_delete_any_idea() {
        let owner = user("ada", Role::User);
        let admin = user("root", Role::Admin);
        let idea = idea_by(&owner);
        let id = idea.id;
        let mut mocks = Mocks::new();
        mocks
            .ideas
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(idea)));
        mocks.ideas.expect_delete().times(1).return_once(|_| Ok(true));

        mocks
            .into_service()
            .delete(&admin, &id)
            .await
            .expect("admin delete");
    }

    #[tokio::test]
    async fn store_outage_is_unavailable() {
        let mut mocks = Mocks::new();
        mocks
            .ideas
            .expect_find_by_id()
            .times(1)
            .return_once(|_| Err(IdeaPersistenceError::connection("refused")));
        let err = mocks
            .into_service()
            .get(&IdeaId::random())
            .await
            .expect_err("outage");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn filter_ranks_loaded_candidates() {
        let author = user("ada", Role::User);
        let older = idea_by(&author);
        let mut newer = idea_by(&author);
        newer.created_at = older.created_at + Duration::hours(1);
        let liked = Evaluation {
            id: EvaluationId::random(),
            idea_id: older.id,
            user_id: UserId::random(),
            score: Some(Score::new(3).expect("score")),
            comment: None,
            liked: true,
            updated_at: Utc::now(),
        };
        let (older_id, newer_id, author_id) = (older.id, newer.id, author.id);

        let mut mocks = Mocks::new();
        mocks
            .ideas
            .expect_list_created_between()
            .times(1)
            .return_once(move |_, _| Ok(vec![older, newer]));
        mocks
            .evaluations
            .expect_list_for_ideas()
            .withf(|ids| ids.len() == 2)
            .times(1)
            .return_once(move |_| Ok(vec![liked]));
        mocks
            .follows
            .expect_follower_counts()
            .withf(move |ids| ids == [author_id])
            .times(1)
            .return_once(move |_| Ok(HashMap::from([(author_id, 2)])));

        let ranked = mocks
            .into_service()
            .filter(&IdeaFilter::default())
            .await
            .expect("ranked");

        let order: Vec<IdeaId> = ranked.iter().map(|r| r.idea.id).collect();
        assert_eq!(order, vec![older_id, newer_id]);
        assert_eq!(ranked[0].followers, 2);
    }

    #[tokio::test]
    async fn popular_creators_come_first() {
        let quiet = user("quiet", Role::User);
        let famous = user("famous", Role::User);
        let quiet_idea = idea_by(&quiet);
        let famous_idea = idea_by(&famous);
        let (quiet_id, famous_id) = (quiet.id, famous.id);
        let (quiet_idea_id, famous_idea_id) = (quiet_idea.id, famous_idea.id);

        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_list()
            .times(1)
            .return_once(move || Ok(vec![quiet, famous]));
        mocks
            .follows
            .expect_follower_counts()
            .times(1)
            .return_once(move |_| Ok(HashMap::from([(famous_id, 3), (quiet_id, 1)])));
        mocks
            .ideas
            .expect_list()
            .times(1)
            .return_once(move || Ok(vec![quiet_idea, famous_idea]));

        let listed = mocks
            .into_service()
            .by_popular_creators()
            .await
            .expect("listed");

        let order: Vec<(IdeaId, u64)> = listed.iter().map(|c| (c.id, c.followers_count)).collect();
        assert_eq!(order, vec![(famous_idea_id, 3), (quiet_idea_id, 1)]);
        assert_eq!(listed[0].creator.as_str(), "famous");
    }
}
