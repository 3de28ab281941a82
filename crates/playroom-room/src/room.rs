//! Room: the cached, shared entity for one game session.
//!
//! A `Room` is created the first time a snapshot for its id shows up (on
//! either the roster stream or its own connection) and is then updated in
//! place by every later snapshot for that id. Updates go through
//! [`Room::merge`], which runs inside the room's [`MutexLock`] so merges
//! triggered by different streams never interleave.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use playroom_protocol::{
    BOARD_SIZE, Board, ChangeMask, Codec, Command, Inbound, JsonCodec, Player,
    RoomId, RoomSnapshot, Seat,
};
use playroom_sync::{MutexLock, Observer, Observers};
use playroom_transport::ConnectionId;

use crate::link::{Inbox, Link};
use crate::{Alerts, RoomError};

/// The mutable part of a room. Only ever written by `merge`.
#[derive(Debug, Clone)]
struct Fields {
    logs: Vec<String>,
    host: Player,
    other: Option<Player>,
    board: Board,
    changed: ChangeMask,
    turn: Seat,
    started: bool,
    ended: bool,
    winner: Option<Seat>,
}

impl Fields {
    fn from_snapshot(snapshot: &RoomSnapshot) -> Self {
        Self {
            logs: snapshot.logs.clone(),
            host: snapshot.host.clone(),
            other: snapshot.other.clone(),
            board: snapshot.board,
            changed: ChangeMask::default(),
            turn: snapshot.turn,
            started: snapshot.started,
            ended: snapshot.ended,
            winner: snapshot.winner,
        }
    }

    /// Applies `snapshot` on top of the current fields.
    ///
    /// Logs are append-only: the snapshot's logs must extend the stored
    /// ones, and only the entries past the stored length are taken.
    fn apply(&mut self, snapshot: &RoomSnapshot) {
        if let Some(suffix) = snapshot.logs.get(self.logs.len()..) {
            self.logs.extend_from_slice(suffix);
        }
        self.host = snapshot.host.clone();
        self.other = snapshot.other.clone();
        self.changed = self.board.diff(&snapshot.board);
        self.board = snapshot.board;
        self.turn = snapshot.turn;
        self.started = snapshot.started;
        self.ended = snapshot.ended;
        self.winner = snapshot.winner;
    }
}

/// One game room, shared by everyone who displays it.
///
/// Obtain rooms from an [`EntityCache`](crate::EntityCache); there is at
/// most one `Room` per id.
pub struct Room {
    id: RoomId,
    fields: RwLock<Fields>,
    update_lock: MutexLock,
    observers: Observers<Room>,
    link: Mutex<Option<Link>>,
}

impl Room {
    pub(crate) fn from_snapshot(snapshot: &RoomSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            fields: RwLock::new(Fields::from_snapshot(snapshot)),
            update_lock: MutexLock::new(),
            observers: Observers::new(),
            link: Mutex::new(None),
        }
    }

    // -- Merge --------------------------------------------------------------

    /// Applies a snapshot and notifies every observer.
    ///
    /// Returns `false` (and leaves the room untouched) when the snapshot
    /// belongs to a different room. Observers run even when nothing
    /// changed; the change mask is then all-false.
    pub async fn merge(&self, snapshot: &RoomSnapshot) -> bool {
        if snapshot.id != self.id {
            tracing::warn!(
                room_id = %self.id,
                snapshot_id = %snapshot.id,
                "ignoring snapshot for another room"
            );
            return false;
        }

        self.update_lock
            .run(|| async {
                let changed = {
                    let mut fields = self.fields.write();
                    fields.apply(snapshot);
                    fields.changed.count()
                };
                tracing::debug!(room_id = %self.id, changed, "room merged");
                self.observers.notify(self);
            })
            .await;
        true
    }

    /// Registers a callback fired after every merge.
    pub fn add_observer(&self, observer: Observer<Room>) -> bool {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Observer<Room>) -> bool {
        self.observers.remove(observer)
    }

    // -- Reads --------------------------------------------------------------

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn logs(&self) -> Vec<String> {
        self.fields.read().logs.clone()
    }

    pub fn log_len(&self) -> usize {
        self.fields.read().logs.len()
    }

    pub fn host(&self) -> Player {
        self.fields.read().host.clone()
    }

    pub fn other(&self) -> Option<Player> {
        self.fields.read().other.clone()
    }

    pub fn board(&self) -> Board {
        self.fields.read().board
    }

    /// Cells that changed on the last merge.
    pub fn changed(&self) -> ChangeMask {
        self.fields.read().changed
    }

    pub fn started(&self) -> bool {
        self.fields.read().started
    }

    pub fn ended(&self) -> bool {
        self.fields.read().ended
    }

    /// Whose move it is; `None` until the game has started.
    pub fn turn(&self) -> Option<Seat> {
        let fields = self.fields.read();
        fields.started.then_some(fields.turn)
    }

    /// The winner; `None` until the game has ended, or after a draw.
    pub fn winner(&self) -> Option<Seat> {
        let fields = self.fields.read();
        if fields.ended { fields.winner } else { None }
    }

    /// All fields, read under one lock.
    pub fn snapshot(&self) -> RoomSnapshot {
        let fields = self.fields.read();
        RoomSnapshot {
            id: self.id.clone(),
            logs: fields.logs.clone(),
            host: fields.host.clone(),
            other: fields.other.clone(),
            board: fields.board,
            turn: fields.turn,
            started: fields.started,
            ended: fields.ended,
            winner: fields.winner,
        }
    }

    // -- Connection ---------------------------------------------------------

    /// Attaches `link`, closing any link attached before.
    pub(crate) fn attach(&self, link: Link) {
        let connection = link.connection();
        let previous = self.link.lock().replace(link);
        if let Some(previous) = previous {
            tracing::debug!(
                room_id = %self.id,
                replaced = %previous.connection(),
                "closing previous room connection"
            );
        }
        tracing::debug!(room_id = %self.id, %connection, "room connection attached");
    }

    /// Drops the attached connection, if any. Returns `true` if one was
    /// attached.
    pub fn detach(&self) -> bool {
        let previous = self.link.lock().take();
        previous.is_some()
    }

    /// Returns `true` while the room's own connection is live.
    pub fn is_connected(&self) -> bool {
        self.link.lock().as_ref().is_some_and(Link::is_live)
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.link.lock().as_ref().map(Link::connection)
    }

    // -- Commands -----------------------------------------------------------

    /// Asks the server to start the game.
    pub fn start(&self) -> Result<(), RoomError> {
        self.send(Command::Start)
    }

    pub fn chat(&self, text: impl Into<String>) -> Result<(), RoomError> {
        self.send(Command::Chat(text.into()))
    }

    /// Places a mark at (`row`, `col`). Positions off the board are
    /// rejected without contacting the server.
    pub fn make_move(&self, row: usize, col: usize) -> Result<(), RoomError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(RoomError::InvalidMove { row, col });
        }
        self.send(Command::Move { row, col })
    }

    fn send(&self, command: Command) -> Result<(), RoomError> {
        let link = self.link.lock();
        match link.as_ref() {
            Some(link) if link.send(command) => Ok(()),
            _ => {
                tracing::warn!(room_id = %self.id, "no live connection for command");
                Err(RoomError::NotConnected(self.id.clone()))
            }
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("logs", &self.log_len())
            .field("observers", &self.observers.len())
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Routes frames from a room's own connection into the room.
pub(crate) struct RoomInbox {
    room: Weak<Room>,
    alerts: Arc<Alerts>,
}

impl RoomInbox {
    pub(crate) fn new(room: &Arc<Room>, alerts: Arc<Alerts>) -> Self {
        Self {
            room: Arc::downgrade(room),
            alerts,
        }
    }
}

impl Inbox for RoomInbox {
    async fn deliver(&self, text: String) -> bool {
        let Some(room) = self.room.upgrade() else {
            return false;
        };
        match JsonCodec.decode_frame::<RoomSnapshot>(&text) {
            Inbound::Data(snapshot) => {
                room.merge(&snapshot).await;
            }
            Inbound::Error(message) => {
                tracing::warn!(room_id = %room.id(), %message, "server error");
                self.alerts.notify(&message);
            }
            Inbound::Malformed(err) => {
                tracing::warn!(room_id = %room.id(), error = %err, "malformed frame");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::FutureExt;
    use playroom_protocol::Cell;

    fn base() -> RoomSnapshot {
        RoomSnapshot {
            logs: vec!["created".into()],
            ..RoomSnapshot::new("r1", Player::guest())
        }
    }

    fn counter(room: &Room) -> Arc<Mutex<usize>> {
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        room.add_observer(Arc::new(move |_: &Room| *sink.lock() += 1));
        count
    }

    #[tokio::test]
    async fn test_merge_updates_fields_and_notifies_once() {
        let room = Room::from_snapshot(&base());
        let notified = counter(&room);

        let next = RoomSnapshot {
            turn: Seat::Other,
            started: true,
            ..base()
        };
        assert!(room.merge(&next).await);

        assert_eq!(*notified.lock(), 1);
        assert_eq!(room.turn(), Some(Seat::Other));
        assert!(room.started());
    }

    #[tokio::test]
    async fn test_repeated_merge_is_idempotent() {
        let room = Room::from_snapshot(&base());
        let notified = counter(&room);
        let next = RoomSnapshot {
            board: Board::new().with(3, 4, Cell::Taken(Seat::Host)),
            logs: vec!["created".into(), "moved".into()],
            ..base()
        };

        room.merge(&next).await;
        assert_eq!(room.changed().positions().collect::<Vec<_>>(), vec![(3, 4)]);
        let after_first = room.snapshot();

        room.merge(&next).await;

        assert!(!room.changed().any());
        assert_eq!(room.snapshot(), after_first);
        assert_eq!(*notified.lock(), 2);
    }

    #[tokio::test]
    async fn test_logs_only_grow() {
        let room = Room::from_snapshot(&base());

        let longer = RoomSnapshot {
            logs: vec!["created".into(), "joined".into(), "started".into()],
            ..base()
        };
        room.merge(&longer).await;
        // A stale snapshot with fewer entries never shortens the log.
        room.merge(&base()).await;

        assert_eq!(room.logs(), vec!["created", "joined", "started"]);
    }

    #[tokio::test]
    async fn test_mismatched_id_leaves_room_untouched() {
        let room = Room::from_snapshot(&base());
        let notified = counter(&room);
        let foreign = RoomSnapshot {
            started: true,
            ..RoomSnapshot::new("r9", Player::guest())
        };

        assert!(!room.merge(&foreign).await);

        assert_eq!(*notified.lock(), 0);
        assert!(!room.started());
    }

    #[tokio::test]
    async fn test_turn_and_winner_hidden_until_meaningful() {
        let room = Room::from_snapshot(&RoomSnapshot {
            turn: Seat::Other,
            winner: Some(Seat::Host),
            ..base()
        });
        assert_eq!(room.turn(), None);
        assert_eq!(room.winner(), None);

        room.merge(&RoomSnapshot {
            started: true,
            ended: true,
            winner: Some(Seat::Host),
            ..base()
        })
        .await;

        assert_eq!(room.winner(), Some(Seat::Host));
    }

    #[test]
    fn test_observer_sees_merged_state() {
        let room = Room::from_snapshot(&base());
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        room.add_observer(Arc::new(move |room: &Room| {
            *sink.lock() = Some(room.started());
        }));

        let merged = room
            .merge(&RoomSnapshot { started: true, ..base() })
            .now_or_never();

        assert_eq!(merged, Some(true));
        assert_eq!(*seen.lock(), Some(true));
    }

    #[test]
    fn test_commands_without_connection_fail() {
        let room = Room::from_snapshot(&base());
        assert!(matches!(room.start(), Err(RoomError::NotConnected(_))));
        assert!(matches!(room.chat("hi"), Err(RoomError::NotConnected(_))));
        assert!(matches!(
            room.make_move(BOARD_SIZE, 0),
            Err(RoomError::InvalidMove { row: 15, col: 0 })
        ));
        assert!(!room.is_connected());
        assert!(!room.detach());
    }
}
