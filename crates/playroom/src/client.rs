//! `Playroom` client and its builder.
//!
//! The client ties the layers together:
//! transport → session (handshake) → room (cache, joins, roster).

use std::sync::Arc;

use playroom_protocol::RoomId;
use playroom_room::{
    Alerts, EntityCache, Endpoints, HttpAllocator, LinkState, Room, RoomAllocator,
    RoomDirectory, RoomManager, RosterObserver,
};
use playroom_session::{Authorization, ConnectionManager};
use playroom_sync::Observer;
use playroom_transport::{Connector, WebSocketConnector};

use crate::PlayroomError;

/// Builder for configuring a [`Playroom`] client.
///
/// # Example
///
/// ```rust
/// use playroom::prelude::*;
///
/// let client = Playroom::builder()
///     .base_url("https://play.example.org")
///     .build()
///     .unwrap();
/// assert_eq!(
///     client.endpoints().create_url(),
///     "https://play.example.org/api/tic-tac-toe/create"
/// );
/// ```
#[derive(Debug, Default)]
pub struct PlayroomBuilder {
    endpoints: Endpoints,
    auth: Option<Arc<Authorization>>,
}

impl PlayroomBuilder {
    /// Creates a builder with the default endpoints and no credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server's HTTP origin, keeping the default paths.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.endpoints.base_url = base_url.into();
        self
    }

    /// Replaces every endpoint setting.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Shares an existing credential holder.
    ///
    /// Without one the client is anonymous. Pass a pending
    /// [`Authorization::new`] to hold every connection until stored
    /// credentials have been restored.
    pub fn authorization(mut self, auth: Arc<Authorization>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Builds a client that talks WebSocket to the configured server and
    /// allocates rooms over HTTP.
    pub fn build(self) -> Result<Playroom, PlayroomError> {
        let connector = WebSocketConnector::new(&self.endpoints.base_url)?;
        let auth = self.resolve_auth();
        let allocator = HttpAllocator::new(self.endpoints.create_url(), Arc::clone(&auth));
        Ok(Playroom::assemble(self.endpoints, auth, connector, allocator))
    }

    /// Builds a client on a custom transport and allocator.
    pub fn build_with<K, A>(self, connector: K, allocator: A) -> Playroom<K, A>
    where
        K: Connector,
        A: RoomAllocator,
    {
        let auth = self.resolve_auth();
        Playroom::assemble(self.endpoints, auth, connector, allocator)
    }

    fn resolve_auth(&self) -> Arc<Authorization> {
        self.auth
            .clone()
            .unwrap_or_else(|| Arc::new(Authorization::anonymous()))
    }
}

/// A connected game-room client.
///
/// Everything that displays rooms shares one `Playroom`: it owns the
/// identity cache, so any two lookups of the same id yield the same
/// [`Room`].
pub struct Playroom<K: Connector = WebSocketConnector, A = HttpAllocator> {
    auth: Arc<Authorization>,
    cache: Arc<EntityCache>,
    alerts: Arc<Alerts>,
    endpoints: Endpoints,
    rooms: RoomManager<K, A>,
    directory: RoomDirectory<K>,
}

impl Playroom {
    /// Creates a new builder.
    pub fn builder() -> PlayroomBuilder {
        PlayroomBuilder::new()
    }
}

impl<K: Connector, A: RoomAllocator> Playroom<K, A> {
    fn assemble(
        endpoints: Endpoints,
        auth: Arc<Authorization>,
        connector: K,
        allocator: A,
    ) -> Self {
        let connections = Arc::new(ConnectionManager::new(connector, Arc::clone(&auth)));
        let cache = Arc::new(EntityCache::new());
        let alerts = Arc::new(Alerts::new());
        let directory = RoomDirectory::new(
            Arc::clone(&connections),
            Arc::clone(&cache),
            Arc::clone(&alerts),
            endpoints.rooms_path.clone(),
        );
        let rooms = RoomManager::new(
            connections,
            Arc::clone(&cache),
            allocator,
            Arc::clone(&alerts),
            endpoints.clone(),
        );
        tracing::info!(base_url = %endpoints.base_url, "playroom client ready");
        Self {
            auth,
            cache,
            alerts,
            endpoints,
            rooms,
            directory,
        }
    }

    // -- Rooms --------------------------------------------------------------

    /// Allocates a new room on the server and joins it.
    pub async fn create(&self) -> Result<Arc<Room>, PlayroomError> {
        Ok(self.rooms.create().await?)
    }

    /// Joins an existing room.
    pub async fn join(&self, id: impl Into<RoomId>) -> Result<Arc<Room>, PlayroomError> {
        let id = id.into();
        Ok(self.rooms.join(&id).await?)
    }

    /// Joins `room` again after its connection ended.
    pub async fn rejoin(&self, room: &Arc<Room>) -> Result<Arc<Room>, PlayroomError> {
        Ok(self.rooms.rejoin(room).await?)
    }

    /// The cached room for `id`, if it has been seen on any stream.
    pub fn room(&self, id: &RoomId) -> Option<Arc<Room>> {
        self.cache.get(id)
    }

    pub fn link_state(&self, id: &RoomId) -> LinkState {
        self.rooms.link_state(id)
    }

    // -- Roster -------------------------------------------------------------

    /// Registers a roster observer, subscribing on first use.
    pub fn register(&self, observer: RosterObserver) -> bool {
        self.directory.register(observer)
    }

    pub fn unregister(&self, observer: &RosterObserver) -> bool {
        self.directory.unregister(observer)
    }

    /// The last roster received, if any.
    pub fn rooms(&self) -> Option<Vec<Arc<Room>>> {
        self.directory.rooms()
    }

    /// Opens (or reopens) the roster subscription explicitly.
    pub async fn subscribe(&self) -> Result<(), PlayroomError> {
        Ok(self.directory.subscribe().await?)
    }

    /// Asks the server to resend the roster.
    pub fn refresh(&self) -> Result<(), PlayroomError> {
        Ok(self.directory.refresh()?)
    }

    // -- Alerts and credentials ---------------------------------------------

    /// Registers a callback for error messages sent by the server.
    pub fn on_alert(&self, observer: Observer<str>) -> bool {
        self.alerts.add(observer)
    }

    pub fn remove_alert(&self, observer: &Observer<str>) -> bool {
        self.alerts.remove(observer)
    }

    pub fn authorization(&self) -> &Arc<Authorization> {
        &self.auth
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

impl<K: Connector, A> std::fmt::Debug for Playroom<K, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playroom")
            .field("endpoints", &self.endpoints)
            .field("auth", &self.auth)
            .field("cached", &self.cache.len())
            .field("directory", &self.directory)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_unknown_scheme() {
        let result = Playroom::builder().base_url("ftp://example.org").build();
        assert!(matches!(result, Err(PlayroomError::Transport(_))));
    }

    #[test]
    fn test_builder_defaults_to_anonymous() {
        let client = Playroom::builder().build().unwrap();
        assert!(client.authorization().is_settled());
        assert!(!client.authorization().is_logged_in());
        assert_eq!(client.endpoints(), &Endpoints::default());
    }

    #[test]
    fn test_builder_shares_authorization() {
        let auth = Arc::new(Authorization::new());
        let client = Playroom::builder()
            .authorization(Arc::clone(&auth))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(client.authorization(), &auth));
        assert!(!client.authorization().is_settled());
    }
}
