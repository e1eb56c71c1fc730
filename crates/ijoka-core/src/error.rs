use ijoka_types::ValidationError;
use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy for the core (spec.md §7). Adapters map these to HTTP
/// status codes / CLI exit codes; hooks never surface them to the agent's
/// tool stream (a failed hook returns `{}` and logs internally).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    /// An active, non-self claim exists on the target Feature and override
    /// was not requested.
    #[error("claim conflict on feature {feature_id}: held by session {holding_session}, agent {holding_agent}")]
    ClaimConflict {
        feature_id: Uuid,
        holding_session: Uuid,
        holding_agent: String,
    },

    #[error("cycle: {0}")]
    CycleError(String),

    #[error("store transient error: {0}")]
    StoreTransient(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ijoka_graph::GraphError> for CoreError {
    fn from(err: ijoka_graph::GraphError) -> Self {
        match err {
            ijoka_graph::GraphError::NotFound(m) => CoreError::NotFound(m),
            ijoka_graph::GraphError::CycleError(m) => CoreError::CycleError(m),
            ijoka_graph::GraphError::StoreTransient(m) => CoreError::StoreTransient(m),
            ijoka_graph::GraphError::StoreUnavailable(m) => CoreError::StoreUnavailable(m),
            ijoka_graph::GraphError::Internal(m) => CoreError::Internal(m),
        }
    }
}

/// Helper used by `start_feature`/similar to build a `ClaimConflict` from
/// the feature's current claim triple. Panics if the triple is unset --
/// callers must check `claiming_session_id.is_some()` first.
pub fn claim_conflict(feature_id: Uuid, holding_session: Uuid, holding_agent: &str) -> CoreError {
    CoreError::ClaimConflict {
        feature_id,
        holding_session,
        holding_agent: holding_agent.to_string(),
    }
}
