use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Transport or connectivity failure, including unexpected HTTP statuses.
    #[error("network error: {0}")]
    Network(String),
    /// A response did not have the shape the remote contract promises.
    #[error("schema violation: {0}")]
    Schema(String),
    /// Uniqueness or concurrent-modification violation.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    /// The backend answered with a `{ success: false }` envelope.
    #[error("rejected by backend: {0}")]
    Rejected(String),
    #[error("invalid field: {0}")]
    InvalidField(String),
    #[error("edit session is closed")]
    SessionClosed,
    #[error("nothing to save: working copy matches the original")]
    NotDirty,
    #[error("configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Whether the failure came from the remote store rather than local misuse.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Schema(_) | Self::Conflict(_) | Self::NotFound(_) | Self::Rejected(_)
        )
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Schema(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Schema(err.to_string())
    }
}
