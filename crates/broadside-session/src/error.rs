//! Error types for the identity layer.

use broadside_protocol::PlayerId;

/// Errors that can occur while binding identities.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The presented token does not resolve to any player, or the
    /// identity it named has expired. The client must treat this as
    /// "start fresh" and identify without a token.
    #[error("identity token does not resolve")]
    UnknownIdentity,

    /// No record exists for the given player. Indicates a bookkeeping
    /// bug in the caller, not a client mistake.
    #[error("no identity record for player {0}")]
    NotFound(PlayerId),
}
