//! Error types for the client engine.
//!
//! Nothing here is fatal: every variant leaves the session in a state that
//! can keep processing messages.

/// Failure reported by a [`Transport`](crate::state::Transport) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("failed to open connection to {endpoint}: {reason}")]
    Open { endpoint: String, reason: String },

    #[error("failed to send frame: {0}")]
    Send(String),

    #[error("connection closed")]
    Closed,
}

/// Main error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("could not decode server message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("no game selected")]
    NoGameSelected,

    #[error("Select a tile from your rack first")]
    NoTileSelected,

    #[error("{0} tiles are selected at once")]
    SelectionFault(usize),

    #[error("board location {0} is out of range")]
    InvalidLocation(usize),

    #[error(transparent)]
    InvalidSelection(#[from] crate::state::InvalidTransition),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether this error should be shown to the user in the event log.
    ///
    /// Selection faults are internal inconsistencies and only go to tracing.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::SelectionFault(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tile_message() {
        assert_eq!(
            ClientError::NoTileSelected.to_string(),
            "Select a tile from your rack first"
        );
    }

    #[test]
    fn test_user_facing() {
        assert!(ClientError::NoTileSelected.is_user_facing());
        assert!(ClientError::from(TransportError::Closed).is_user_facing());
        assert!(!ClientError::SelectionFault(2).is_user_facing());
    }
}
