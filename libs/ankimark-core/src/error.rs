//! Error types for ankimark-core.

use thiserror::Error;

/// Result type alias using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur during a synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("no active document")]
    NoActiveDocument,

    #[error("note store unreachable: {0}")]
    RemoteUnreachable(String),

    #[error("note store protocol error: {0}")]
    RemoteProtocol(String),

    #[error("card at line {line} has no front/back split")]
    MalformedCardBody { line: usize },

    #[error("failed to write document: {0}")]
    DocumentWrite(String),
}

impl SyncError {
    /// Whether the error belongs to a single card rather than the whole pass.
    pub fn is_per_card(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnreachable(_) | Self::RemoteProtocol(_) | Self::MalformedCardBody { .. }
        )
    }
}
