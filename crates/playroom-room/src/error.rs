//! Error types for the room layer.

use playroom_protocol::RoomId;
use playroom_session::SessionError;
use playroom_transport::TransportError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The server answered the join with an error frame.
    #[error("server rejected the request: {0}")]
    Rejected(String),

    /// The room connection closed before a snapshot for the room arrived.
    #[error("connection to room {0} closed before its first snapshot")]
    ClosedBeforeSnapshot(RoomId),

    /// The room has no live connection to send a command on.
    #[error("room {0} is not connected")]
    NotConnected(RoomId),

    /// The move lies outside the board.
    #[error("invalid move ({row}, {col})")]
    InvalidMove { row: usize, col: usize },

    /// No roster subscription is open.
    #[error("room directory is not subscribed")]
    NotSubscribed,

    /// Opening an authenticated connection failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The connection failed after it was opened.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Requesting a fresh room id failed.
    #[error("room allocation failed: {0}")]
    Allocation(#[from] reqwest::Error),
}
