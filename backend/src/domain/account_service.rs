//! Account use-cases: registration, login, bearer authentication, profile
//! management, roles, and the follow graph.

use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    CredentialHasher, FollowRepository, IdeaRepository, TokenService, UserRepository,
};
use crate::domain::{
    AccessToken, EmailAddress, Error, ErrorCode, IdeaHeadline, LoginCredentials, Registration,
    Role, User, UserDetails, UserId, UserInfo, UserPatch, Username,
};

/// Default lifetime of issued bearer tokens.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Shortest fragment accepted by bulk delete-by-username.
pub const USERNAME_FRAGMENT_MIN: usize = 3;

/// Driven ports the account service depends on.
#[derive(Clone)]
pub struct AccountPorts {
    pub users: Arc<dyn UserRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub ideas: Arc<dyn IdeaRepository>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<dyn TokenService>,
}

/// Account service.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
    ideas: Arc<dyn IdeaRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl AccountService {
    /// Create a service issuing tokens with the default lifetime.
    pub fn new(ports: AccountPorts, clock: Arc<dyn Clock>) -> Self {
        let AccountPorts {
            users,
            follows,
            ideas,
            hasher,
            tokens,
        } = ports;
        Self {
            users,
            follows,
            ideas,
            hasher,
            tokens,
            clock,
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }

    /// Override the lifetime of issued tokens.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Create an account with the `user` role.
    ///
    /// Fails with `invalid_request` when the email or username is taken.
    pub async fn register(&self, registration: Registration) -> Result<User, Error> {
        self.insert_account(registration, ErrorCode::InvalidRequest)
            .await
    }

    /// Create an account through the user collection.
    ///
    /// Same rules as [`Self::register`], but a taken email or username is a
    /// `conflict`.
    pub async fn create_user(&self, registration: Registration) -> Result<User, Error> {
        self.insert_account(registration, ErrorCode::Conflict).await
    }

    async fn insert_account(
        &self,
        registration: Registration,
        clash: ErrorCode,
    ) -> Result<User, Error> {
        let Registration {
            username,
            email,
            password,
            profile,
        } = registration;

        self.ensure_email_free(&email, None, clash).await?;
        self.ensure_username_free(&username, None, clash).await?;

        let password_hash = self.hasher.hash(password.expose())?;
        let user = User {
            id: UserId::random(),
            username,
            email,
            password_hash,
            role: Role::User,
            profile,
            created_at: self.clock.utc(),
        };
        self.users.insert(&user).await?;
        info!(user_id = %user.id, username = %user.username, "registered user");
        Ok(user)
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AccessToken, Error> {
        let Ok(email) = EmailAddress::new(credentials.email()) else {
            return Err(Self::bad_credentials());
        };
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(Self::bad_credentials());
        };
        if !self
            .hasher
            .verify(credentials.password(), &user.password_hash)
        {
            return Err(Self::bad_credentials());
        }
        let token = self
            .tokens
            .issue(&user.id, Some(user.role), self.token_ttl)?;
        debug!(user_id = %user.id, expires_at = %token.expires_at, "issued access token");
        Ok(token)
    }

    /// Resolve a bearer token to the user it was issued for.
    ///
    /// Fails with `unauthorized` when the token is invalid or expired, or
    /// when the account has since been deleted.
    pub async fn authenticate(&self, token: &str) -> Result<User, Error> {
        let claims = self.tokens.verify(token).map_err(|err| {
            debug!(error = %err, "rejected bearer token");
            Error::unauthorized("invalid or expired token")
        })?;
        self.users
            .find_by_id(&claims.subject)
            .await?
            .ok_or_else(|| Error::unauthorized("account no longer exists"))
    }

    /// Pass `user` through when they are an admin.
    pub fn require_admin(user: User) -> Result<User, Error> {
        if user.is_admin() {
            Ok(user)
        } else {
            Err(Error::forbidden("admin role required"))
        }
    }

    /// Grant the admin role to `target`. Only admins may do this.
    pub async fn promote_to_admin(&self, acting: &User, target: &UserId) -> Result<(), Error> {
        if !acting.is_admin() {
            return Err(Error::forbidden("admin role required"));
        }
        if !self.users.set_role(target, Role::Admin).await? {
            return Err(Error::not_found("user not found"));
        }
        info!(admin = %acting.id, user_id = %target, "promoted user to admin");
        Ok(())
    }

    /// Attach follower and following usernames to `user`.
    pub async fn details(&self, user: User) -> Result<UserDetails, Error> {
        let followers = self.follows.followers_of(&user.id).await?;
        let following = self.follows.following_of(&user.id).await?;
        Ok(UserDetails {
            user,
            followers,
            following,
        })
    }

    /// Look up a user by id.
    pub async fn get_user(&self, id: &UserId) -> Result<UserDetails, Error> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("user not found"))?;
        self.details(user).await
    }

    /// List every user. Fails with `not_found` when there are none.
    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        let users = self.users.list().await?;
        if users.is_empty() {
            return Err(Error::not_found("no users found"));
        }
        Ok(users)
    }

    /// Apply a partial update to the caller's own account.
    pub async fn update_profile(&self, user: &User, patch: UserPatch) -> Result<UserDetails, Error> {
        if patch.is_empty() {
            return Err(Error::invalid_request("nothing to update"));
        }
        let UserPatch {
            username,
            email,
            password,
            title,
            description,
            location,
            skills,
        } = patch;

        let mut updated = user.clone();
        if let Some(username) = username {
            self.ensure_username_free(&username, Some(&user.id), ErrorCode::Conflict)
                .await?;
            updated.username = username;
        }
        if let Some(email) = email {
            self.ensure_email_free(&email, Some(&user.id), ErrorCode::Conflict)
                .await?;
            updated.email = email;
        }
        if let Some(password) = password {
            updated.password_hash = self.hasher.hash(password.expose())?;
        }
        if let Some(title) = title {
            updated.profile.title = Some(title);
        }
        if let Some(description) = description {
            updated.profile.description = Some(description);
        }
        if let Some(location) = location {
            updated.profile.location = Some(location);
        }
        if let Some(skills) = skills {
            updated.profile.skills = skills;
        }

        if !self.users.update(&updated).await? {
            return Err(Error::not_found("user not found"));
        }
        self.details(updated).await
    }

    /// Delete an account. Users may delete themselves; admins anyone.
    pub async fn delete_user(&self, acting: &User, target: &UserId) -> Result<(), Error> {
        if &acting.id != target && !acting.is_admin() {
            return Err(Error::forbidden("you may only delete your own account"));
        }
        if !self.users.delete(target).await? {
            return Err(Error::not_found("user not found"));
        }
        info!(acting = %acting.id, user_id = %target, "deleted user");
        Ok(())
    }

    /// Delete every user whose username contains `fragment`, ignoring case.
    ///
    /// Admin only. Fails with `not_found` when nothing matched.
    pub async fn delete_by_username(&self, acting: &User, fragment: &str) -> Result<u64, Error> {
        if !acting.is_admin() {
            return Err(Error::forbidden("admin role required"));
        }
        let fragment = fragment.trim();
        if fragment.chars().count() < USERNAME_FRAGMENT_MIN {
            return Err(
                Error::invalid_request(format!(
                    "username fragment must be at least {USERNAME_FRAGMENT_MIN} characters"
                ))
                .with_details(json!({ "field": "username", "code": "fragment_too_short" })),
            );
        }
        let deleted = self.users.delete_by_username_fragment(fragment).await?;
        if deleted == 0 {
            return Err(Error::not_found("no users matched"));
        }
        info!(acting = %acting.id, fragment, deleted, "bulk deleted users");
        Ok(deleted)
    }

    /// Make `follower` follow the user called `target`.
    pub async fn follow(&self, follower: &User, target: &Username) -> Result<(), Error> {
        if &follower.username == target {
            return Err(Error::invalid_request("you cannot follow yourself"));
        }
        let followee = self.find_by_username(target).await?;
        if !self.follows.insert_edge(&follower.id, &followee.id).await? {
            return Err(Error::invalid_request(format!("already following {target}"))
                .with_details(json!({ "field": "username", "code": "already_following" })));
        }
        debug!(follower = %follower.id, followee = %followee.id, "follow edge added");
        Ok(())
    }

    /// Make `follower` stop following the user called `target`.
    pub async fn unfollow(&self, follower: &User, target: &Username) -> Result<(), Error> {
        if &follower.username == target {
            return Err(Error::invalid_request("you cannot unfollow yourself"));
        }
        let followee = self.find_by_username(target).await?;
        if !self.follows.delete_edge(&follower.id, &followee.id).await? {
            return Err(Error::invalid_request(format!("you are not following {target}"))
                .with_details(json!({ "code": "not_following" })));
        }
        debug!(follower = %follower.id, followee = %followee.id, "follow edge removed");
        Ok(())
    }

    /// Usernames following `username`.
    pub async fn followers(&self, username: &Username) -> Result<Vec<Username>, Error> {
        let user = self.find_by_username(username).await?;
        Ok(self.follows.followers_of(&user.id).await?)
    }

    /// Usernames `username` follows.
    pub async fn following(&self, username: &Username) -> Result<Vec<Username>, Error> {
        let user = self.find_by_username(username).await?;
        Ok(self.follows.following_of(&user.id).await?)
    }

    /// Public info card for `username`, including their ideas.
    pub async fn user_info(&self, username: &Username) -> Result<UserInfo, Error> {
        let user = self.find_by_username(username).await?;
        let ideas = self
            .ideas
            .list_by_author(&user.id)
            .await?
            .into_iter()
            .map(|idea| IdeaHeadline {
                id: idea.id,
                title: idea.title,
            })
            .collect();
        let details = self.details(user).await?;
        Ok(UserInfo {
            username: details.user.username,
            email: details.user.email,
            title: details.user.profile.title,
            ideas,
            followers: details.followers,
            following: details.following,
        })
    }

    async fn find_by_username(&self, username: &Username) -> Result<User, Error> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {username} not found")))
    }

    async fn ensure_email_free(
        &self,
        email: &EmailAddress,
        owner: Option<&UserId>,
        clash: ErrorCode,
    ) -> Result<(), Error> {
        match self.users.find_by_email(email).await? {
            Some(existing) if Some(&existing.id) != owner => Err(Error::new(
                clash,
                "email is already registered",
            )
            .with_details(json!({ "field": "email", "code": "email_taken" }))),
            _ => Ok(()),
        }
    }

    async fn ensure_username_free(
        &self,
        username: &Username,
        owner: Option<&UserId>,
        clash: ErrorCode,
    ) -> Result<(), Error> {
        match self.users.find_by_username(username).await? {
            Some(existing) if Some(&existing.id) != owner => Err(Error::new(
                clash,
                "username is already taken",
            )
            .with_details(json!({ "field": "username", "code": "username_taken" }))),
            _ => Ok(()),
        }
    }

    fn bad_credentials() -> Error {
        Error::unauthorized("incorrect email or password")
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
