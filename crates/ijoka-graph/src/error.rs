use thiserror::Error;

/// Store-layer error taxonomy (spec.md §7: StoreTransient, StoreUnavailable,
/// NotFound, CycleError, Internal). `ValidationError` and `ClaimConflict`
/// live closer to the core layer that knows about business semantics;
/// this crate only needs the store-facing subset.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("cycle: {0}")]
    CycleError(String),

    /// Retriable store error; the Gateway itself retries up to 3 times
    /// before this surfaces (spec.md §4.1).
    #[error("store transient error: {0}")]
    StoreTransient(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal graph store error: {0}")]
    Internal(String),
}

impl GraphError {
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, GraphError::StoreTransient(_))
    }
}

impl From<rusqlite::Error> for GraphError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                GraphError::StoreTransient(err.to_string())
            }
            rusqlite::Error::QueryReturnedNoRows => GraphError::NotFound(err.to_string()),
            _ => GraphError::Internal(err.to_string()),
        }
    }
}

impl From<tokio_rusqlite::Error> for GraphError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => GraphError::from(e),
            other => GraphError::Internal(other.to_string()),
        }
    }
}
