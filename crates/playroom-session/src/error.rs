//! Error types for the session layer.

use playroom_transport::TransportError;

/// Errors that can occur while opening an authenticated connection.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The transport could not be opened.
    #[error("connect failed: {0}")]
    Connect(#[from] TransportError),

    /// The connection opened but the credential frame could not be sent.
    /// The connection has been closed.
    #[error("handshake on {path} failed: {source}")]
    Handshake {
        path: String,
        #[source]
        source: TransportError,
    },
}
