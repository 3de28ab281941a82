//! # Playroom
//!
//! Client for two-player game rooms whose state lives on a server.
//!
//! A [`Playroom`] keeps one [`Room`] per room id and keeps it current from
//! two streams: the room's own connection (opened by [`Playroom::join`] or
//! [`Playroom::create`]) and the global roster (opened lazily by the first
//! [`Playroom::register`]). Rendering code registers observers and reads
//! rooms; it never parses a frame itself.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use playroom::prelude::*;
//!
//! # async fn run() -> Result<(), PlayroomError> {
//! let client = Playroom::builder()
//!     .base_url("http://127.0.0.1:8080")
//!     .build()?;
//!
//! client.register(Arc::new(|rooms: &[Arc<Room>]| {
//!     println!("{} rooms open", rooms.len());
//! }));
//!
//! let room = client.create().await?;
//! room.start()?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod telemetry;

pub use client::{Playroom, PlayroomBuilder};
pub use error::PlayroomError;
pub use telemetry::{init_tracing, init_tracing_with};

pub use playroom_protocol::{
    Asset, BOARD_SIZE, Board, Cell, ChangeMask, Player, RoomId, RoomSnapshot,
    Seat, User, UserId,
};
pub use playroom_room::{
    Alerts, EntityCache, Endpoints, HttpAllocator, LinkState, Room,
    RoomAllocator, RoomError, RosterObserver,
};
pub use playroom_session::Authorization;
pub use playroom_sync::Observer;

pub mod prelude {
    pub use crate::{
        Authorization, Endpoints, LinkState, Observer, Player, Playroom,
        PlayroomError, Room, RoomId, RoomSnapshot, RosterObserver, Seat, User,
    };
}
