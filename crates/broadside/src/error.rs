//! Unified error type for the Broadside server.

use broadside_match::MatchError;
use broadside_protocol::ProtocolError;
use broadside_session::IdentityError;
use broadside_transport::TransportError;

/// Top-level error wrapping each layer's error type, so server code
/// (and the `?` operator) deals with a single enum.
#[derive(Debug, thiserror::Error)]
pub enum BroadsideError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An identity-level error (unknown token, missing record).
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A match-level error (session full, not found, unavailable).
    #[error(transparent)]
    Match(#[from] MatchError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside_protocol::SessionId;

    #[test]
    fn test_from_transport_error() {
        let err: BroadsideError = TransportError::NotConnected.into();
        assert!(matches!(err, BroadsideError::Transport(_)));
        assert!(err.to_string().contains("not open"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: BroadsideError =
            ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, BroadsideError::Protocol(_)));
    }

    #[test]
    fn test_from_identity_error() {
        let err: BroadsideError = IdentityError::UnknownIdentity.into();
        assert!(matches!(err, BroadsideError::Identity(_)));
    }

    #[test]
    fn test_from_match_error() {
        let err: BroadsideError =
            MatchError::NotFound(SessionId(1)).into();
        assert!(matches!(err, BroadsideError::Match(_)));
    }
}
