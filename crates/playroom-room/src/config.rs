//! Server endpoints and the join state machine.

use std::fmt;

use playroom_protocol::RoomId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Where the game server lives and which paths it serves.
///
/// Every field has a default, so a partial config (just `base_url`, say)
/// deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// HTTP origin of the server. Connections use the matching `ws`/`wss`
    /// origin.
    pub base_url: String,

    /// Roster stream path.
    pub rooms_path: String,

    /// Per-room stream paths are `<room_path_prefix>/<id>`.
    pub room_path_prefix: String,

    /// HTTP path that allocates a fresh room id.
    pub create_path: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            rooms_path: "/api/tic-tac-toe/rooms".into(),
            room_path_prefix: "/api/tic-tac-toe/room".into(),
            create_path: "/api/tic-tac-toe/create".into(),
        }
    }
}

impl Endpoints {
    /// Default paths on a different server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Connection path for one room.
    pub fn room_path(&self, id: &RoomId) -> String {
        format!("{}/{}", self.room_path_prefix.trim_end_matches('/'), id)
    }

    /// Absolute URL of the create endpoint.
    pub fn create_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.create_path)
    }
}

// ---------------------------------------------------------------------------
// LinkState
// ---------------------------------------------------------------------------

/// Where a room id stands in the join flow.
///
/// ```text
/// Unbound → CachedDisconnected → Connecting → CachedConnected
///                 ↑                                  │
///                 └────────── connection ends ───────┘
/// ```
///
/// A first `join` goes straight from `Unbound` to `Connecting`; the room
/// enters the cache when its first snapshot arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Never observed on any stream.
    Unbound,
    /// Cached, with no live connection of its own.
    CachedDisconnected,
    /// A join is waiting for the connection or the first snapshot.
    Connecting,
    /// Cached, with a live connection attached.
    CachedConnected,
}

impl LinkState {
    pub fn is_connected(self) -> bool {
        self == Self::CachedConnected
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => write!(f, "Unbound"),
            Self::CachedDisconnected => write!(f, "CachedDisconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::CachedConnected => write!(f, "CachedConnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_default() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.base_url, "http://127.0.0.1:8080");
        assert_eq!(endpoints.rooms_path, "/api/tic-tac-toe/rooms");
    }

    #[test]
    fn test_room_path_joins_prefix_and_id() {
        let endpoints = Endpoints {
            room_path_prefix: "/api/game/room/".into(),
            ..Endpoints::default()
        };
        assert_eq!(endpoints.room_path(&RoomId::new("abc")), "/api/game/room/abc");
    }

    #[test]
    fn test_create_url_uses_base() {
        let endpoints = Endpoints::with_base_url("https://play.example.org/");
        assert_eq!(
            endpoints.create_url(),
            "https://play.example.org/api/tic-tac-toe/create"
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let endpoints: Endpoints =
            serde_json::from_str(r#"{ "base_url": "http://10.0.0.2:9000" }"#).unwrap();
        assert_eq!(endpoints.base_url, "http://10.0.0.2:9000");
        assert_eq!(endpoints.create_path, "/api/tic-tac-toe/create");
    }

    #[test]
    fn test_link_state_display() {
        assert_eq!(LinkState::CachedConnected.to_string(), "CachedConnected");
        assert!(LinkState::CachedConnected.is_connected());
        assert!(!LinkState::Connecting.is_connected());
    }
}
