//! Room directory: the global roster stream.
//!
//! The roster connection pushes the full list of rooms. Each entry is
//! merged into the shared [`EntityCache`], so a room that is also open on
//! its own connection is kept current from both sides, and the resulting
//! list of cached rooms is republished to directory observers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use playroom_protocol::{Codec, Command, Inbound, JsonCodec, RoomSnapshot};
use playroom_session::ConnectionManager;
use playroom_sync::{Observer, Observers};
use playroom_transport::Connector;
use tokio::runtime::Handle;

use crate::link::{Inbox, Link};
use crate::{Alerts, EntityCache, Room, RoomError};

/// Callback receiving the current room list.
pub type RosterObserver = Observer<[Arc<Room>]>;

/// Subscribes to the roster stream and republishes it.
///
/// Cheap to clone; clones share the subscription and observers.
pub struct RoomDirectory<K: Connector> {
    shared: Arc<Shared<K>>,
}

struct Shared<K: Connector> {
    connections: Arc<ConnectionManager<K>>,
    cache: Arc<EntityCache>,
    alerts: Arc<Alerts>,
    path: String,
    rooms: RwLock<Option<Vec<Arc<Room>>>>,
    observers: Observers<[Arc<Room>]>,
    subscription: Mutex<Option<Link>>,
    subscribing: AtomicBool,
    /// Runtime current at construction, used when `register` is called
    /// from a thread outside any runtime.
    runtime: Option<Handle>,
}

impl<K: Connector> Clone for RoomDirectory<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K: Connector> RoomDirectory<K> {
    pub fn new(
        connections: Arc<ConnectionManager<K>>,
        cache: Arc<EntityCache>,
        alerts: Arc<Alerts>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                connections,
                cache,
                alerts,
                path: path.into(),
                rooms: RwLock::new(None),
                observers: Observers::new(),
                subscription: Mutex::new(None),
                subscribing: AtomicBool::new(false),
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    /// Registers a roster observer.
    ///
    /// If a list has already arrived, `observer` is called with it right
    /// away. Otherwise the first registration opens the subscription in the
    /// background, on the calling thread's runtime or else the one the
    /// directory was created on. With neither available the subscription is
    /// left for a later `register` or an explicit [`subscribe`](Self::subscribe).
    /// Returns `false` if the observer was already registered.
    pub fn register(&self, observer: RosterObserver) -> bool {
        if !self.shared.observers.add(Arc::clone(&observer)) {
            return false;
        }

        let current = self.shared.rooms.read().clone();
        match current {
            Some(rooms) => observer(rooms.as_slice()),
            None => self.subscribe_in_background(),
        }
        true
    }

    pub fn unregister(&self, observer: &RosterObserver) -> bool {
        self.shared.observers.remove(observer)
    }

    /// The last published list, if any has arrived yet.
    pub fn rooms(&self) -> Option<Vec<Arc<Room>>> {
        self.shared.rooms.read().clone()
    }

    /// Returns `true` while a live roster connection exists.
    pub fn is_subscribed(&self) -> bool {
        self.shared
            .subscription
            .lock()
            .as_ref()
            .is_some_and(Link::is_live)
    }

    /// Opens a roster connection, replacing (and closing) any previous one.
    pub async fn subscribe(&self) -> Result<(), RoomError> {
        self.shared.subscribing.store(true, Ordering::SeqCst);
        let connection = match self.shared.connections.open(&self.shared.path).await {
            Ok(connection) => connection,
            Err(err) => {
                self.shared.subscribing.store(false, Ordering::SeqCst);
                return Err(err.into());
            }
        };

        let link = Link::spawn(
            connection,
            RosterInbox {
                shared: Arc::downgrade(&self.shared),
            },
        );
        let connection = link.connection();
        if let Some(previous) = self.shared.subscription.lock().replace(link) {
            tracing::debug!(replaced = %previous.connection(), "closing previous roster connection");
        }
        self.shared.subscribing.store(false, Ordering::SeqCst);
        tracing::info!(%connection, path = %self.shared.path, "roster subscription opened");
        Ok(())
    }

    /// Closes the roster connection. Returns `false` if none was open.
    pub fn unsubscribe(&self) -> bool {
        self.shared.subscription.lock().take().is_some()
    }

    /// Asks the server to push the current list again.
    pub fn refresh(&self) -> Result<(), RoomError> {
        let subscription = self.shared.subscription.lock();
        match subscription.as_ref() {
            Some(link) if link.send(Command::Request) => Ok(()),
            _ => Err(RoomError::NotSubscribed),
        }
    }

    fn subscribe_in_background(&self) {
        if self.is_subscribed() || self.shared.subscribing.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(runtime) = Handle::try_current().ok().or_else(|| self.shared.runtime.clone())
        else {
            self.shared.subscribing.store(false, Ordering::SeqCst);
            tracing::warn!(path = %self.shared.path, "no tokio runtime, roster subscription deferred");
            return;
        };
        let directory = self.clone();
        runtime.spawn(async move {
            if let Err(err) = directory.subscribe().await {
                tracing::warn!(error = %err, "roster subscription failed");
            }
        });
    }
}

impl<K: Connector> std::fmt::Debug for RoomDirectory<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomDirectory")
            .field("path", &self.shared.path)
            .field("rooms", &self.shared.rooms.read().as_ref().map(Vec::len))
            .field("observers", &self.shared.observers.len())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

struct RosterInbox<K: Connector> {
    shared: Weak<Shared<K>>,
}

impl<K: Connector> Inbox for RosterInbox<K> {
    async fn deliver(&self, text: String) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        match JsonCodec.decode_frame::<Vec<RoomSnapshot>>(&text) {
            Inbound::Data(snapshots) => {
                let mut rooms = Vec::with_capacity(snapshots.len());
                for snapshot in &snapshots {
                    rooms.push(shared.cache.merge(snapshot).await);
                }
                tracing::debug!(rooms = rooms.len(), "roster updated");
                *shared.rooms.write() = Some(rooms.clone());
                shared.observers.notify(rooms.as_slice());
            }
            Inbound::Error(message) => {
                tracing::warn!(%message, "roster server error");
                shared.alerts.notify(&message);
            }
            Inbound::Malformed(err) => {
                tracing::warn!(error = %err, "malformed roster frame");
            }
        }
        true
    }
}
