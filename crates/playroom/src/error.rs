//! Unified error type for the Playroom client.

use playroom_protocol::ProtocolError;
use playroom_room::RoomError;
use playroom_session::SessionError;
use playroom_transport::TransportError;

/// Any failure surfaced by the [`Playroom`](crate::Playroom) client.
///
/// Display and `source()` pass straight through to the layer that failed.
#[derive(Debug, thiserror::Error)]
pub enum PlayroomError {
    /// Connection-level failure (connect, send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Opening an authenticated connection failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room operation failed (rejected, not connected, allocation).
    #[error(transparent)]
    Room(#[from] RoomError),
}
