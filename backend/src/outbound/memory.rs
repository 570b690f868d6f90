//! In-process store implementing every repository port.
//!
//! Used when no database URL is configured and by the integration tests.
//! All tables sit behind one mutex so multi-table writes (deleting a user
//! together with their follow edges) are atomic. Contents are lost when the
//! process exits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::ports::{
    EvaluationPersistenceError, EvaluationRepository, EvaluationScan, FollowPersistenceError,
    FollowRepository, IdeaPersistenceError, IdeaRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{
    EmailAddress, Evaluation, EvaluationId, EvaluationKey, EvaluationPatch, Idea, IdeaId, Role,
    User, UserId, Username,
};

const POISONED: &str = "memory store lock poisoned";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    follows: Vec<(UserId, UserId)>,
    ideas: Vec<Idea>,
    evaluations: Vec<Evaluation>,
}

impl Tables {
    fn usernames_of(&self, ids: impl Iterator<Item = UserId>) -> Vec<Username> {
        let mut names: Vec<Username> = ids
            .filter_map(|id| self.users.iter().find(|user| user.id == id))
            .map(|user| user.username.clone())
            .collect();
        names.sort();
        names
    }

    fn clash(&self, candidate: &User) -> Option<&'static str> {
        let others = self.users.iter().filter(|user| user.id != candidate.id);
        for user in others {
            if user.email == candidate.email {
                return Some("email");
            }
            if user.username == candidate.username {
                return Some("username");
            }
        }
        None
    }

    fn remove_users(&mut self, doomed: impl Fn(&User) -> bool) -> u64 {
        let removed: Vec<UserId> = self
            .users
            .iter()
            .filter(|&user| doomed(user))
            .map(|user| user.id)
            .collect();
        self.users.retain(|user| !removed.contains(&user.id));
        self.follows
            .retain(|(from, to)| !removed.contains(from) && !removed.contains(to));
        removed.len() as u64
    }
}

/// Shared in-memory tables. Clones share state.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create an empty store stamping evaluation updates with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, String> {
        self.tables.lock().map_err(|_| POISONED.to_owned())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut tables = self.lock().map_err(UserPersistenceError::query)?;
        if let Some(field) = tables.clash(user) {
            return Err(UserPersistenceError::duplicate(field));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut tables = self.lock().map_err(UserPersistenceError::query)?;
        if let Some(field) = tables.clash(user) {
            return Err(UserPersistenceError::duplicate(field));
        }
        match tables.users.iter_mut().find(|stored| stored.id == user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<bool, UserPersistenceError> {
        let mut tables = self.lock().map_err(UserPersistenceError::query)?;
        match tables.users.iter_mut().find(|user| &user.id == id) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.lock().map_err(UserPersistenceError::query)?;
        Ok(tables.users.iter().find(|user| &user.id == id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.lock().map_err(UserPersistenceError::query)?;
        Ok(tables.users.iter().find(|user| &user.email == email).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.lock().map_err(UserPersistenceError::query)?;
        Ok(tables
            .users
            .iter()
            .find(|user| &user.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let tables = self.lock().map_err(UserPersistenceError::query)?;
        Ok(tables.users.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut tables = self.lock().map_err(UserPersistenceError::query)?;
        Ok(tables.remove_users(|user| &user.id == id) > 0)
    }

    async fn delete_by_username_fragment(
        &self,
        fragment: &str,
    ) -> Result<u64, UserPersistenceError> {
        let needle = fragment.to_lowercase();
        let mut tables = self.lock().map_err(UserPersistenceError::query)?;
        Ok(tables.remove_users(|user| user.username.as_str().to_lowercase().contains(&needle)))
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn insert_edge(
        &self,
        follower: &UserId,
        followee: &UserId,
    ) -> Result<bool, FollowPersistenceError> {
        let mut tables = self.lock().map_err(FollowPersistenceError::query)?;
        let edge = (*follower, *followee);
        if tables.follows.contains(&edge) {
            return Ok(false);
        }
        tables.follows.push(edge);
        Ok(true)
    }

    async fn delete_edge(
        &self,
        follower: &UserId,
        followee: &UserId,
    ) -> Result<bool, FollowPersistenceError> {
        let mut tables = self.lock().map_err(FollowPersistenceError::query)?;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|edge| edge != &(*follower, *followee));
        Ok(tables.follows.len() < before)
    }

    async fn followers_of(&self, user: &UserId) -> Result<Vec<Username>, FollowPersistenceError> {
        let tables = self.lock().map_err(FollowPersistenceError::query)?;
        let ids = tables
            .follows
            .iter()
            .filter(|(_, to)| to == user)
            .map(|(from, _)| *from);
        Ok(tables.usernames_of(ids))
    }

    async fn following_of(&self, user: &UserId) -> Result<Vec<Username>, FollowPersistenceError> {
        let tables = self.lock().map_err(FollowPersistenceError::query)?;
        let ids = tables
            .follows
            .iter()
            .filter(|(from, _)| from == user)
            .map(|(_, to)| *to);
        Ok(tables.usernames_of(ids))
    }

    async fn follower_counts(
        &self,
        users: &[UserId],
    ) -> Result<HashMap<UserId, u64>, FollowPersistenceError> {
        let tables = self.lock().map_err(FollowPersistenceError::query)?;
        let mut counts = HashMap::new();
        for (_, to) in tables.follows.iter().filter(|(_, to)| users.contains(to)) {
            *counts.entry(*to).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl IdeaRepository for MemoryStore {
    async fn insert(&self, idea: &Idea) -> Result<(), IdeaPersistenceError> {
        let mut tables = self.lock().map_err(IdeaPersistenceError::query)?;
        tables.ideas.push(idea.clone());
        Ok(())
    }

    async fn update(&self, idea: &Idea) -> Result<bool, IdeaPersistenceError> {
        let mut tables = self.lock().map_err(IdeaPersistenceError::query)?;
        match tables.ideas.iter_mut().find(|stored| stored.id == idea.id) {
            Some(stored) => {
                *stored = idea.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &IdeaId) -> Result<bool, IdeaPersistenceError> {
        let mut tables = self.lock().map_err(IdeaPersistenceError::query)?;
        let before = tables.ideas.len();
        tables.ideas.retain(|idea| &idea.id != id);
        Ok(tables.ideas.len() < before)
    }

    async fn find_by_id(&self, id: &IdeaId) -> Result<Option<Idea>, IdeaPersistenceError> {
        let tables = self.lock().map_err(IdeaPersistenceError::query)?;
        Ok(tables.ideas.iter().find(|idea| &idea.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Idea>, IdeaPersistenceError> {
        let tables = self.lock().map_err(IdeaPersistenceError::query)?;
        Ok(sorted_by_age(tables.ideas.iter()))
    }

    async fn list_by_author(&self, author: &UserId) -> Result<Vec<Idea>, IdeaPersistenceError> {
        let tables = self.lock().map_err(IdeaPersistenceError::query)?;
        Ok(sorted_by_age(
            tables.ideas.iter().filter(|idea| &idea.created_by == author),
        ))
    }

    async fn list_created_between(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Idea>, IdeaPersistenceError> {
        let tables = self.lock().map_err(IdeaPersistenceError::query)?;
        Ok(sorted_by_age(tables.ideas.iter().filter(|idea| {
            from.is_none_or(|min| idea.created_at >= min)
                && to.is_none_or(|max| idea.created_at <= max)
        })))
    }
}

fn sorted_by_age<'a>(ideas: impl Iterator<Item = &'a Idea>) -> Vec<Idea> {
    let mut ideas: Vec<Idea> = ideas.cloned().collect();
    ideas.sort_by_key(|idea| idea.created_at);
    ideas
}

#[async_trait]
impl EvaluationRepository for MemoryStore {
    async fn upsert(
        &self,
        key: EvaluationKey,
        patch: &EvaluationPatch,
    ) -> Result<Evaluation, EvaluationPersistenceError> {
        let now = self.clock.utc();
        let mut tables = self.lock().map_err(EvaluationPersistenceError::query)?;
        if let Some(existing) = tables.evaluations.iter_mut().find(|e| e.key() == key) {
            existing.apply(patch, now);
            return Ok(existing.clone());
        }
        let created = Evaluation::first(EvaluationId::random(), key, patch, now);
        tables.evaluations.push(created.clone());
        Ok(created)
    }

    async fn toggle_like(&self, key: EvaluationKey) -> Result<bool, EvaluationPersistenceError> {
        let now = self.clock.utc();
        let mut tables = self.lock().map_err(EvaluationPersistenceError::query)?;
        if let Some(existing) = tables.evaluations.iter_mut().find(|e| e.key() == key) {
            existing.liked = !existing.liked;
            existing.updated_at = now;
            return Ok(existing.liked);
        }
        tables
            .evaluations
            .push(Evaluation::first_like(EvaluationId::random(), key, now));
        Ok(true)
    }

    async fn find(
        &self,
        key: EvaluationKey,
    ) -> Result<Option<Evaluation>, EvaluationPersistenceError> {
        let tables = self.lock().map_err(EvaluationPersistenceError::query)?;
        Ok(tables.evaluations.iter().find(|e| e.key() == key).cloned())
    }

    async fn list(&self) -> Result<EvaluationScan, EvaluationPersistenceError> {
        let tables = self.lock().map_err(EvaluationPersistenceError::query)?;
        Ok(EvaluationScan {
            evaluations: tables.evaluations.clone(),
            skipped: 0,
        })
    }

    async fn list_for_ideas(
        &self,
        ideas: &[IdeaId],
    ) -> Result<Vec<Evaluation>, EvaluationPersistenceError> {
        let tables = self.lock().map_err(EvaluationPersistenceError::query)?;
        Ok(tables
            .evaluations
            .iter()
            .filter(|e| ideas.contains(&e.idea_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IdeaDraft, PasswordDigest, Score, UserProfile};
    use crate::test_support::clock::MutableClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::fixed())
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

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_rejected(clock: Arc<MutableClock>) {
        let store = MemoryStore::new(clock);
        let first = user("ada");
        let mut second = user("bob");
        second.email = first.email.clone();

        UserRepository::insert(&store, &first).await.expect("insert");
        let err = UserRepository::insert(&store, &second)
            .await
            .expect_err("duplicate");
        assert_eq!(err, UserPersistenceError::duplicate("email"));
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_a_user_drops_their_edges(clock: Arc<MutableClock>) {
        let store = MemoryStore::new(clock);
        let (ada, bob) = (user("ada"), user("bob"));
        UserRepository::insert(&store, &ada).await.expect("insert");
        UserRepository::insert(&store, &bob).await.expect("insert");
        store.insert_edge(&ada.id, &bob.id).await.expect("edge");
        store.insert_edge(&bob.id, &ada.id).await.expect("edge");

        assert!(UserRepository::delete(&store, &ada.id).await.expect("delete"));

        assert!(store.followers_of(&bob.id).await.expect("followers").is_empty());
        assert!(store.following_of(&bob.id).await.expect("following").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn edges_are_unique(clock: Arc<MutableClock>) {
        let store = MemoryStore::new(clock);
        let (a, b) = (UserId::random(), UserId::random());
        assert!(store.insert_edge(&a, &b).await.expect("edge"));
        assert!(!store.insert_edge(&a, &b).await.expect("edge"));
        let counts = store.follower_counts(&[a, b]).await.expect("counts");
        assert_eq!(counts.get(&b), Some(&1));
        assert_eq!(counts.get(&a), None);
    }

    #[rstest]
    #[tokio::test]
    async fn fragment_delete_ignores_case(clock: Arc<MutableClock>) {
        let store = MemoryStore::new(clock);
        for name in ["TestOne", "testtwo", "other"] {
            UserRepository::insert(&store, &user(name)).await.expect("insert");
        }
        let deleted = store
            .delete_by_username_fragment("TEST")
            .await
            .expect("delete");
        assert_eq!(deleted, 2);
        assert_eq!(UserRepository::list(&store).await.expect("list").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn upsert_keeps_one_record_per_pair(clock: Arc<MutableClock>) {
        let store = MemoryStore::new(clock.clone());
        let key = EvaluationKey {
            idea_id: IdeaId::random(),
            user_id: UserId::random(),
        };
        let patch = EvaluationPatch {
            score: Some(Score::new(3).expect("score")),
            comment: Some("fine".to_owned()),
            liked: None,
        };
        store.upsert(key, &patch).await.expect("first");
        clock.advance_seconds(5);
        let updated = store
            .upsert(
                key,
                &EvaluationPatch {
                    liked: Some(true),
                    ..EvaluationPatch::default()
                },
            )
            .await
            .expect("second");

        assert_eq!(updated.score.map(Score::get), Some(3));
        assert_eq!(updated.comment.as_deref(), Some("fine"));
        assert!(updated.liked);
        assert_eq!(updated.updated_at, clock.utc());
        assert_eq!(
            EvaluationRepository::list(&store)
                .await
                .expect("list")
                .evaluations
                .len(),
            1
        );
    }

    #[rstest]
    #[tokio::test]
    async fn toggle_like_creates_then_flips(clock: Arc<MutableClock>) {
        let store = MemoryStore::new(clock);
        let key = EvaluationKey {
            idea_id: IdeaId::random(),
            user_id: UserId::random(),
        };
        assert!(store.toggle_like(key).await.expect("first"));
        let created = store.find(key).await.expect("find").expect("present");
        assert_eq!(created.comment.as_deref(), Some(""));
        assert!(created.score.is_none());
        assert!(!store.toggle_like(key).await.expect("second"));

        let stored = EvaluationRepository::list(&store)
            .await
            .expect("list")
            .evaluations;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, created.id);
        assert!(!stored[0].liked);
    }

    #[rstest]
    #[tokio::test]
    async fn creation_window_is_inclusive(clock: Arc<MutableClock>) {
        let store = MemoryStore::new(clock.clone());
        let author = UserId::random();
        let draft = IdeaDraft::try_from_parts("t", "d", "m", "a").expect("draft");
        let at = clock.utc();
        let idea = Idea::from_draft(IdeaId::random(), draft, author, at);
        IdeaRepository::insert(&store, &idea).await.expect("insert");

        let hits = store
            .list_created_between(Some(at), Some(at))
            .await
            .expect("list");
        assert_eq!(hits.len(), 1);
    }
}
