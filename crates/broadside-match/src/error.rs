//! Error types for the match layer.

use broadside_protocol::{PlayerId, SessionId};

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The session does not exist.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The session already has both members.
    #[error("session {0} is full")]
    SessionFull(SessionId),

    /// The player is already a member of a session.
    #[error("player {0} is already in session {1}")]
    AlreadyInSession(PlayerId, SessionId),

    /// The player is not a member of any session.
    #[error("player {0} is not in a session")]
    NotInSession(PlayerId),

    /// The session's command channel is gone (actor stopped).
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),
}
