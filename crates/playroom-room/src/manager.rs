//! Room manager: joins, creates, and tracks room connections.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use playroom_protocol::{Codec, Inbound, JsonCodec, RoomId, RoomSnapshot};
use playroom_session::ConnectionManager;
use playroom_transport::{Connection, Connector};

use crate::link::Link;
use crate::room::RoomInbox;
use crate::{Alerts, EntityCache, Endpoints, LinkState, Room, RoomAllocator, RoomError};

/// Entry point for joining and creating rooms.
///
/// Every room it hands out lives in the shared [`EntityCache`], so the
/// same id always yields the same [`Room`], whether it was first seen on
/// the roster or through a join.
pub struct RoomManager<K: Connector, A> {
    connections: Arc<ConnectionManager<K>>,
    cache: Arc<EntityCache>,
    allocator: A,
    alerts: Arc<Alerts>,
    endpoints: Endpoints,
    /// Joins in flight, per id.
    connecting: Mutex<HashMap<RoomId, usize>>,
}

impl<K: Connector, A: RoomAllocator> RoomManager<K, A> {
    pub fn new(
        connections: Arc<ConnectionManager<K>>,
        cache: Arc<EntityCache>,
        allocator: A,
        alerts: Arc<Alerts>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            connections,
            cache,
            allocator,
            alerts,
            endpoints,
            connecting: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Asks the server for a new room, then joins it.
    pub async fn create(&self) -> Result<Arc<Room>, RoomError> {
        let id = self.allocator.allocate().await?;
        tracing::info!(room_id = %id, "room created");
        self.join(&id).await
    }

    /// Joins the room `id`.
    ///
    /// If the cached room already has a live connection it is returned as
    /// is. Otherwise a room connection is opened (one attempt, no retry)
    /// and the join resolves on the first snapshot for `id`:
    ///
    /// - snapshots for other ids are logged and skipped;
    /// - an error frame fails the join with [`RoomError::Rejected`] and
    ///   leaves any cached room untouched;
    /// - a close before the snapshot fails with
    ///   [`RoomError::ClosedBeforeSnapshot`].
    pub async fn join(&self, id: &RoomId) -> Result<Arc<Room>, RoomError> {
        if let Some(room) = self.cache.get(id).filter(|room| room.is_connected()) {
            tracing::debug!(room_id = %id, "already joined");
            return Ok(room);
        }

        let _connecting = Connecting::enter(&self.connecting, id);
        let connection = self.connections.open(&self.endpoints.room_path(id)).await?;

        let snapshot = match self.first_snapshot(&connection, id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                if let Err(close_err) = connection.close().await {
                    tracing::debug!(room_id = %id, error = %close_err, "close after failed join");
                }
                return Err(err);
            }
        };

        let room = self.cache.merge(&snapshot).await;
        let inbox = RoomInbox::new(&room, Arc::clone(&self.alerts));
        room.attach(Link::spawn(connection, inbox));
        tracing::info!(room_id = %id, "room joined");
        Ok(room)
    }

    /// Joins `room` again, typically after its connection ended.
    pub async fn rejoin(&self, room: &Arc<Room>) -> Result<Arc<Room>, RoomError> {
        let joined = self.join(room.id()).await?;
        if !Arc::ptr_eq(&joined, room) {
            tracing::error!(room_id = %room.id(), "rejoin returned a different room instance");
        }
        Ok(joined)
    }

    /// Where `id` stands in the join flow.
    pub fn link_state(&self, id: &RoomId) -> LinkState {
        if self.connecting.lock().contains_key(id) {
            return LinkState::Connecting;
        }
        match self.cache.get(id) {
            None => LinkState::Unbound,
            Some(room) if room.is_connected() => LinkState::CachedConnected,
            Some(_) => LinkState::CachedDisconnected,
        }
    }

    async fn first_snapshot(
        &self,
        connection: &K::Connection,
        id: &RoomId,
    ) -> Result<RoomSnapshot, RoomError> {
        loop {
            let Some(text) = connection.recv().await? else {
                tracing::warn!(room_id = %id, "room connection closed before first snapshot");
                return Err(RoomError::ClosedBeforeSnapshot(id.clone()));
            };
            match JsonCodec.decode_frame::<RoomSnapshot>(&text) {
                Inbound::Data(snapshot) if snapshot.id == *id => return Ok(snapshot),
                Inbound::Data(snapshot) => {
                    tracing::warn!(
                        room_id = %id,
                        snapshot_id = %snapshot.id,
                        "ignoring snapshot for another room"
                    );
                }
                Inbound::Error(message) => {
                    tracing::warn!(room_id = %id, %message, "join rejected");
                    self.alerts.notify(&message);
                    return Err(RoomError::Rejected(message));
                }
                Inbound::Malformed(err) => {
                    tracing::warn!(room_id = %id, error = %err, "malformed frame");
                }
            }
        }
    }
}

impl<K: Connector, A> std::fmt::Debug for RoomManager<K, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomManager")
            .field("endpoints", &self.endpoints)
            .field("cached", &self.cache.len())
            .field("connecting", &self.connecting.lock().len())
            .finish()
    }
}

/// Counts a join in flight for as long as it lives.
struct Connecting<'a> {
    joins: &'a Mutex<HashMap<RoomId, usize>>,
    id: RoomId,
}

impl<'a> Connecting<'a> {
    fn enter(joins: &'a Mutex<HashMap<RoomId, usize>>, id: &RoomId) -> Self {
        *joins.lock().entry(id.clone()).or_default() += 1;
        Self {
            joins,
            id: id.clone(),
        }
    }
}

impl Drop for Connecting<'_> {
    fn drop(&mut self) {
        let mut joins = self.joins.lock();
        if let Some(count) = joins.get_mut(&self.id) {
            *count -= 1;
            if *count == 0 {
                joins.remove(&self.id);
            }
        }
    }
}
