//! Credentials and authenticated connections for Playroom.
//!
//! 1. **Authorization**: who the local user is and which token proves it
//!    ([`Authorization`]), plus the gate that opens once the initial
//!    credential restore has settled.
//! 2. **Connection opening**: [`ConnectionManager`] opens a transport
//!    connection and sends the credential frame before anyone else can
//!    use it.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← opens room and roster connections through the manager
//!     ↕
//! Session Layer (this crate)  ← credentials + handshake
//!     ↕
//! Transport Layer (below)  ← raw text connections
//! ```

mod auth;
mod connect;
mod error;

pub use auth::{AUTH_HEADER, Authorization};
pub use connect::ConnectionManager;
pub use error::SessionError;
