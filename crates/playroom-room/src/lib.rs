//! Room synchronization for Playroom.
//!
//! Rooms reach the client on two independent streams: each joined room's
//! own connection, and the global roster. Both feed the same
//! [`EntityCache`], which keeps exactly one [`Room`] per id and applies
//! every snapshot through [`Room::merge`].
//!
//! # Key types
//!
//! - [`Room`]: the shared entity: fields, observers, attached connection
//! - [`EntityCache`]: one `Room` per id, forever
//! - [`RoomManager`]: `join` / `create` / `rejoin` and [`LinkState`]
//! - [`RoomDirectory`]: the roster subscription and its observers
//! - [`RoomAllocator`]: where fresh room ids come from ([`HttpAllocator`])
//! - [`Endpoints`]: server origin and paths

mod allocator;
mod cache;
mod config;
mod directory;
mod error;
mod link;
mod manager;
mod room;

pub use allocator::{HttpAllocator, RoomAllocator};
pub use cache::EntityCache;
pub use config::{Endpoints, LinkState};
pub use directory::{RoomDirectory, RosterObserver};
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::Room;

/// Observers of server error messages, shown to the user by whoever
/// registers them.
pub type Alerts = playroom_sync::Observers<str>;
