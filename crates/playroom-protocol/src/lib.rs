//! Wire protocol for Playroom.
//!
//! This crate defines what travels over a room or roster connection:
//!
//! - **Types** ([`RoomSnapshot`], [`Board`], [`Player`], [`Frame`],
//!   [`Command`], etc.): the shapes the server sends and the text
//!   commands the client sends back.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames are turned
//!   into text and parsed into a tagged [`Inbound`] result before any
//!   field is touched.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (text frames) → Protocol (Inbound<RoomSnapshot>) → Room cache
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, Inbound};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Asset, BOARD_SIZE, Board, Cell, ChangeMask, Command, Frame, Player,
    RoomId, RoomSnapshot, Seat, User, UserId,
};
