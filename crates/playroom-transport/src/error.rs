use std::io;

/// Failures while opening or driving a client connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The base URL has no usable scheme or is malformed.
    #[error("unusable endpoint url `{0}`")]
    InvalidUrl(String),

    /// The transport could not reach the endpoint or the upgrade failed.
    #[error("could not open connection")]
    Connect(#[source] io::Error),

    /// The peer or the local side already closed the channel.
    #[error("channel closed ({0})")]
    Closed(String),

    /// Writing a frame failed; the channel is unusable afterwards.
    #[error("could not send frame")]
    Send(#[source] io::Error),

    /// The channel broke while waiting for a frame, or a binary frame was
    /// not UTF-8.
    #[error("could not read frame")]
    Receive(#[source] io::Error),
}
