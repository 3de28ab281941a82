//! Identity cache: one [`Room`] per id for the life of the process.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use playroom_protocol::{RoomId, RoomSnapshot};
use playroom_sync::Observer;

use crate::Room;

/// Keyed store of every room seen so far.
///
/// Rooms are never evicted; the map grows with the number of distinct ids
/// the process observes.
#[derive(Debug, Default)]
pub struct EntityCache {
    rooms: Mutex<HashMap<RoomId, Arc<Room>>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached room for `id`, if it has been observed.
    pub fn get(&self, id: &RoomId) -> Option<Arc<Room>> {
        self.rooms.lock().get(id).cloned()
    }

    /// The cached room for `snapshot.id`, constructing it from `snapshot`
    /// only on first observation. Later calls for the same id return the
    /// same instance and ignore the snapshot.
    pub fn get_or_create(&self, snapshot: &RoomSnapshot) -> Arc<Room> {
        let mut rooms = self.rooms.lock();
        if let Some(room) = rooms.get(&snapshot.id) {
            return Arc::clone(room);
        }
        let room = Arc::new(Room::from_snapshot(snapshot));
        rooms.insert(snapshot.id.clone(), Arc::clone(&room));
        tracing::info!(room_id = %snapshot.id, cached = rooms.len(), "room cached");
        room
    }

    /// Merges `snapshot` into its room, creating the room first if needed.
    pub async fn merge(&self, snapshot: &RoomSnapshot) -> Arc<Room> {
        let room = self.get_or_create(snapshot);
        room.merge(snapshot).await;
        room
    }

    /// Registers an observer on the room for `id`. Returns `false` if the
    /// room is not cached or the observer was already registered.
    pub fn add_observer(&self, id: &RoomId, observer: Observer<Room>) -> bool {
        self.get(id).is_some_and(|room| room.add_observer(observer))
    }

    /// Removes an observer from the room for `id`. Unknown rooms and
    /// unregistered observers are a no-op.
    pub fn remove_observer(&self, id: &RoomId, observer: &Observer<Room>) -> bool {
        self.get(id).is_some_and(|room| room.remove_observer(observer))
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.lock().is_empty()
    }

    /// Ids of every cached room, sorted.
    pub fn ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<_> = self.rooms.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use playroom_protocol::{Player, Seat};

    fn snapshot(id: &str) -> RoomSnapshot {
        RoomSnapshot::new(id, Player::guest())
    }

    #[test]
    fn test_same_id_returns_same_instance() {
        let cache = EntityCache::new();

        let first = cache.get_or_create(&snapshot("r1"));
        let second = cache.get_or_create(&RoomSnapshot {
            started: true,
            ..snapshot("r1")
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!second.started(), "second call must not re-seed the room");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_merge_creates_then_updates() {
        let cache = EntityCache::new();

        let created = cache.merge(&snapshot("r1")).await;
        let updated = cache
            .merge(&RoomSnapshot {
                turn: Seat::Other,
                started: true,
                ..snapshot("r1")
            })
            .await;

        assert!(Arc::ptr_eq(&created, &updated));
        assert_eq!(updated.turn(), Some(Seat::Other));
    }

    #[tokio::test]
    async fn test_observers_are_a_set() {
        let cache = EntityCache::new();
        let id = RoomId::new("r1");
        let calls = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&calls);
        let observer: Observer<Room> = Arc::new(move |_: &Room| *sink.lock() += 1);

        assert!(!cache.add_observer(&id, Arc::clone(&observer)));
        cache.get_or_create(&snapshot("r1"));
        assert!(cache.add_observer(&id, Arc::clone(&observer)));
        assert!(!cache.add_observer(&id, Arc::clone(&observer)));

        cache.merge(&snapshot("r1")).await;
        assert_eq!(*calls.lock(), 1);

        assert!(cache.remove_observer(&id, &observer));
        assert!(!cache.remove_observer(&id, &observer));
        cache.merge(&snapshot("r1")).await;
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn test_ids_are_sorted() {
        let cache = EntityCache::new();
        for id in ["b", "c", "a"] {
            cache.get_or_create(&snapshot(id));
        }
        assert_eq!(cache.ids(), vec![RoomId::new("a"), RoomId::new("b"), RoomId::new("c")]);
        assert!(cache.contains(&RoomId::new("c")));
        assert!(cache.get(&RoomId::new("z")).is_none());
    }
}
