//! Codec trait and implementations for text frames.
//!
//! A codec converts between Rust types and the UTF-8 text that travels over
//! a connection. Callers that receive server frames use
//! [`Codec::decode_frame`], which never fails outright: it returns a tagged
//! [`Inbound`] so malformed input can be logged and skipped.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Frame, ProtocolError};

/// Result of parsing one server frame.
#[derive(Debug)]
pub enum Inbound<T> {
    /// A successful frame and its payload.
    Data(T),
    /// The server reported an error (`error: true`) with this message.
    Error(String),
    /// The text was not a valid frame for `T`.
    Malformed(ProtocolError),
}

impl<T> Inbound<T> {
    /// The payload of a data frame; `None` for error and malformed frames.
    pub fn into_data(self) -> Option<T> {
        match self {
            Inbound::Data(data) => Some(data),
            _ => None,
        }
    }
}

/// Encodes values to text and decodes text back.
///
/// `Send + Sync + 'static` so a codec can live inside the long-running
/// tasks that pump connections.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or does not
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;

    /// Parses a [`Frame`] carrying `T` and classifies it.
    ///
    /// A frame with `error: true` is an [`Inbound::Error`] regardless of any
    /// other field; a success frame without `data` is malformed.
    fn decode_frame<T: DeserializeOwned>(&self, text: &str) -> Inbound<T> {
        match self.decode::<Frame<T>>(text) {
            Ok(Frame { error: true, message, .. }) => {
                Inbound::Error(message.unwrap_or_default())
            }
            Ok(Frame { data: Some(data), .. }) => Inbound::Data(data),
            Ok(Frame { data: None, .. }) => Inbound::Malformed(
                ProtocolError::InvalidMessage("frame carries no data".into()),
            ),
            Err(err) => Inbound::Malformed(err),
        }
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use playroom_protocol::{Codec, Frame, Inbound, JsonCodec, Player, RoomSnapshot};
///
/// let codec = JsonCodec;
/// let text = codec
///     .encode(&Frame::data(RoomSnapshot::new("r1", Player::guest())))
///     .unwrap();
///
/// match codec.decode_frame::<RoomSnapshot>(&text) {
///     Inbound::Data(snapshot) => assert_eq!(snapshot.id.as_str(), "r1"),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
