//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed entities used by the API and persistence
//! layers, and the services implementing the idea-board use-cases. Services
//! depend only on the traits in [`ports`]; adapters are injected at start-up.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User, Idea, Evaluation: stored aggregates.
//! - AccountService, IdeaService, EvaluationService: use-cases.

pub mod account_service;
pub mod auth;
pub mod error;
pub mod evaluation;
pub mod evaluation_service;
pub mod idea;
pub mod idea_service;
pub mod identifier;
pub mod ports;
pub mod ranking;
pub mod trace_id;
pub mod user;

pub use self::account_service::{
    AccountPorts, AccountService, DEFAULT_TOKEN_TTL_MINUTES, USERNAME_FRAGMENT_MIN,
};
pub use self::auth::{
    AccessToken, LoginCredentials, LoginValidationError, PASSWORD_MIN, PasswordTooShort,
    PlainPassword, Registration, RegistrationError, TokenClaims, UserPatch,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::evaluation::{
    Evaluation, EvaluationKey, EvaluationLine, EvaluationPatch, LikeSummary, SCORE_MAX, SCORE_MIN,
    Score, ScoreOutOfRange, UNKNOWN_IDEA, UNKNOWN_USER,
};
pub use self::evaluation_service::{EvaluationPorts, EvaluationService};
pub use self::idea::{Idea, IdeaDraft, IdeaPatch, IdeaText, IdeaValidationError};
pub use self::idea_service::{CreatorIdea, IdeaPorts, IdeaService};
pub use self::identifier::{EvaluationId, IdeaId, InvalidIdentifier, UserId};
pub use self::ranking::{
    IdeaFilter, RankedIdea, like_count, mean_score, rank_ideas, round_to_hundredths,
};
pub use self::trace_id::TraceId;
pub use self::user::{
    EmailAddress, IdeaHeadline, PasswordDigest, Role, USERNAME_MAX, USERNAME_MIN, User,
    UserDetails, UserInfo, UserProfile, UserValidationError, Username,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use ideaboard::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
