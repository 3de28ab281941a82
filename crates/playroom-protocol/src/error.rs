//! Error types for the protocol layer.

/// Failures turning frames into text and back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("could not encode frame: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or a
    /// value of the wrong type.
    #[cfg(feature = "json")]
    #[error("could not decode frame: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but breaks a protocol rule, e.g. a board that is
    /// not 15×15 or a seat outside `0..=1`.
    #[error("frame breaks protocol: {0}")]
    InvalidMessage(String),
}
