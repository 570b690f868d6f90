//! Port for evaluation persistence.
//!
//! Evaluations are keyed by `(idea_id, user_id)`; adapters must guarantee at
//! most one record per pair.
use async_trait::async_trait;

use crate::domain::{Evaluation, EvaluationKey, EvaluationPatch, IdeaId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by evaluation repository adapters.
    pub enum EvaluationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "evaluation repository connection failed: {message}"; service_unavailable,
        /// Query or mutation failed during execution.
        Query { message: String } => "evaluation repository query failed: {message}"; internal,
    }
}

/// Result of listing every stored evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationScan {
    /// Records that parsed cleanly.
    pub evaluations: Vec<Evaluation>,
    /// Number of stored records that were skipped as malformed.
    pub skipped: usize,
}

/// Storage of evaluations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    /// Insert or update the record for `key`, touching only supplied fields.
    async fn upsert(
        &self,
        key: EvaluationKey,
        patch: &EvaluationPatch,
    ) -> Result<Evaluation, EvaluationPersistenceError>;

    /// Flip `liked` on the record for `key`, creating it liked when absent.
    ///
    /// Returns the new value of `liked`.
    async fn toggle_like(&self, key: EvaluationKey) -> Result<bool, EvaluationPersistenceError>;

    /// Fetch the record for `key`.
    async fn find(
        &self,
        key: EvaluationKey,
    ) -> Result<Option<Evaluation>, EvaluationPersistenceError>;

    /// List every evaluation, skipping malformed records.
    async fn list(&self) -> Result<EvaluationScan, EvaluationPersistenceError>;

    /// List evaluations of the given ideas.
    async fn list_for_ideas(
        &self,
        ideas: &[IdeaId],
    ) -> Result<Vec<Evaluation>, EvaluationPersistenceError>;
}
