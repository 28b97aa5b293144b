use shared::Square;
use thiserror::Error;

/// Failures of the game-state core. None of them end the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("invalid position encoding {encoding:?}: {reason}")]
    InvalidEncoding { encoding: String, reason: String },

    #[error("illegal move {from}{to}")]
    IllegalMove { from: Square, to: Square },

    #[error("promotion {from}{to} is awaiting a piece choice")]
    PromotionInProgress { from: Square, to: Square },

    #[error("no promotion is pending")]
    NoPendingPromotion,

    #[error("not connected to the server, move not played")]
    Offline,
}

impl SyncError {
    pub(crate) fn invalid_encoding(encoding: &str, reason: impl ToString) -> Self {
        SyncError::InvalidEncoding {
            encoding: encoding.to_string(),
            reason: reason.to_string(),
        }
    }
}
