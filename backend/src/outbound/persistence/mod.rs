//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository ports backed by PostgreSQL
//! via `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: Diesel and pool failures map to each port's
//!   persistence error.
//!
//! # Example
//!
//! ```ignore
//! use ideaboard::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/ideaboard")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_evaluation_repository;
mod diesel_follow_repository;
mod diesel_idea_repository;
mod diesel_user_repository;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_evaluation_repository::DieselEvaluationRepository;
pub use diesel_follow_repository::DieselFollowRepository;
pub use diesel_idea_repository::DieselIdeaRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
