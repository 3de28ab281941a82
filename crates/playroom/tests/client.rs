//! End-to-end tests of the `Playroom` client over the in-memory transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use playroom::prelude::*;
use playroom::{RoomAllocator, RoomError, UserId};
use playroom_protocol::Frame;
use playroom_transport::{MemoryConnector, MemoryListener, MemoryPeer, memory_transport};
use tokio::sync::mpsc;

/// Allocates `room-1`, `room-2`, ...
#[derive(Default)]
struct Sequential(AtomicU32);

impl RoomAllocator for Sequential {
    async fn allocate(&self) -> Result<RoomId, RoomError> {
        let n = self.0.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(RoomId::new(format!("room-{n}")))
    }
}

fn client(auth: Arc<Authorization>) -> (Playroom<MemoryConnector, Sequential>, MemoryListener) {
    let (connector, listener) = memory_transport();
    let client = Playroom::builder()
        .authorization(auth)
        .build_with(connector, Sequential::default());
    (client, listener)
}

fn data<T: serde::Serialize>(payload: T) -> String {
    serde_json::to_string(&Frame::data(payload)).unwrap()
}

async fn accept(listener: &mut MemoryListener, token: &str) -> MemoryPeer {
    let mut peer = listener.accept().await.unwrap();
    assert_eq!(peer.recv().await.as_deref(), Some(token));
    peer
}

#[tokio::test]
async fn test_create_play_and_roster_share_one_room() {
    let (client, mut listener) = client(Arc::new(Authorization::anonymous()));

    let (created, mut room_peer) = tokio::join!(client.create(), async {
        let peer = accept(&mut listener, "").await;
        peer.send(data(RoomSnapshot::new("room-1", Player::guest())));
        peer
    });
    let room = created.unwrap();
    assert_eq!(room_peer.path(), "/api/tic-tac-toe/room/room-1");
    assert_eq!(client.link_state(room.id()), LinkState::CachedConnected);

    room.make_move(0, 14).unwrap();
    assert_eq!(room_peer.recv().await.as_deref(), Some("MOVE 0 14"));

    let (tx, mut lists) = mpsc::unbounded_channel();
    client.register(Arc::new(move |rooms: &[Arc<Room>]| {
        let _ = tx.send(rooms.to_vec());
    }));
    let roster_peer = accept(&mut listener, "").await;
    roster_peer.send(data(vec![RoomSnapshot {
        started: true,
        ..RoomSnapshot::new("room-1", Player::guest())
    }]));

    let rooms = lists.recv().await.unwrap();
    assert!(Arc::ptr_eq(&rooms[0], &room));
    assert!(room.started());
    assert!(Arc::ptr_eq(&client.room(room.id()).unwrap(), &room));
}

#[tokio::test]
async fn test_pending_login_holds_connections_until_restored() {
    let auth = Arc::new(Authorization::new());
    let (client, mut listener) = client(Arc::clone(&auth));

    let join = client.join("r7");
    let server = async {
        let peer = accept(&mut listener, "tok-1").await;
        peer.send(data(RoomSnapshot::new("r7", Player::guest())));
        peer
    };
    let restore = async {
        tokio::task::yield_now().await;
        auth.restore(
            Some(User {
                id: UserId(1),
                name: "Ada".into(),
                avatar: None,
            }),
            Some("tok-1".into()),
        );
    };

    let (joined, _peer, ()) = tokio::join!(join, server, restore);

    let room = joined.unwrap();
    assert_eq!(room.host().display_name(), "Guest");
    assert_eq!(client.authorization().user().unwrap().name, "Ada");
}

#[tokio::test]
async fn test_server_errors_reach_alert_observers() {
    let (client, mut listener) = client(Arc::new(Authorization::anonymous()));
    let (tx, mut alerts) = mpsc::unbounded_channel();
    client.on_alert(Arc::new(move |message: &str| {
        let _ = tx.send(message.to_string());
    }));

    let (joined, _peer) = tokio::join!(client.join("r1"), async {
        let peer = accept(&mut listener, "").await;
        peer.send(serde_json::to_string(&Frame::<()>::error("Room is full")).unwrap());
        peer
    });

    assert!(matches!(
        joined,
        Err(PlayroomError::Room(RoomError::Rejected(ref m))) if m == "Room is full"
    ));
    assert_eq!(alerts.recv().await.as_deref(), Some("Room is full"));
    assert_eq!(client.link_state(&RoomId::new("r1")), LinkState::Unbound);
}

#[tokio::test]
async fn test_refresh_without_subscription_fails() {
    let (client, _listener) = client(Arc::new(Authorization::anonymous()));
    assert!(matches!(
        client.refresh(),
        Err(PlayroomError::Room(RoomError::NotSubscribed))
    ));
    assert!(client.rooms().is_none());
}
