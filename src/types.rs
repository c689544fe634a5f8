use sea_orm::DbErr;
use thiserror::Error;

pub type Result<T, E = DeskError> = std::result::Result<T, E>;

/// Everything a user action can fail with.
///
/// None of these are fatal: the caller reports the message and the screen stays usable. In-memory views are never
/// modified when an operation returns an error.
#[derive(Debug, Error)]
pub enum DeskError {
    /// Missing or malformed user input.
    #[error("{0}")]
    Validation(String),

    /// The operation target is not present (anymore).
    #[error("{entity} #{id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// A referential rule blocks the operation.
    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Persistence(#[from] DbErr),

    #[error("No user with such username and password")]
    InvalidCredentials,
}

impl DeskError {
    pub fn validation<S: ToString>(msg: S) -> Self {
        Self::Validation(msg.to_string())
    }

    pub fn conflict<S: ToString>(msg: S) -> Self {
        Self::Conflict(msg.to_string())
    }

    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    /// Errors of this kind come from user input rather than from the store.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Conflict(_) | Self::NotFound { .. } | Self::InvalidCredentials
        )
    }
}
