//! Error types for the transport layer.

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The socket is not open. The caller must wait for a reconnect and
    /// re-send; nothing is queued or retried at this layer.
    #[error("connection is not open")]
    NotConnected,

    /// Establishing an outbound connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Sending data failed mid-stream.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed mid-stream.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
