//! Error types for the coordinator.

use thiserror::Error;

use confide_core::AccessError;
use confide_store::StoreError;
use confide_vault::EngineError;

/// Errors that can occur during coordinator operations.
///
/// Precondition violations surface as [`CoordinatorError::Access`]
/// regardless of which layer raised them, so callers can match on the
/// taxonomy directly.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A precondition violation from the access-control taxonomy.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Storage backend failure.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Secret engine failure.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        // Lift taxonomy errors out of the store wrapper.
        match err {
            StoreError::Access(access) => CoordinatorError::Access(access),
            other => CoordinatorError::Store(other),
        }
    }
}

/// Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, CoordinatorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use confide_core::LineId;

    #[test]
    fn test_store_access_errors_are_lifted() {
        let store_err = StoreError::Access(AccessError::LineNotFound(LineId::new(3)));
        let err = CoordinatorError::from(store_err);
        assert!(matches!(
            err,
            CoordinatorError::Access(AccessError::LineNotFound(_))
        ));
    }
}
