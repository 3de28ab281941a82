//! In-process transport built on unbounded channels.
//!
//! [`memory_transport`] returns a connector and the listener that receives
//! the server side ([`MemoryPeer`]) of every connection the connector opens.
//! Dropping the listener makes further connects fail.

use tokio::sync::{Mutex, mpsc};

use crate::{Connection, ConnectionId, Connector, TransportError};

/// Creates a connected connector/listener pair.
pub fn memory_transport() -> (MemoryConnector, MemoryListener) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        MemoryConnector { accepted: tx },
        MemoryListener { accepted: rx },
    )
}

/// Client half: opens [`MemoryConnection`]s.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    accepted: mpsc::UnboundedSender<MemoryPeer>,
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(
        &self,
        path: &str,
    ) -> Result<MemoryConnection, TransportError> {
        let (to_client, incoming) = mpsc::unbounded_channel();
        let (outgoing, from_client) = mpsc::unbounded_channel();
        let id = ConnectionId::next();

        let peer = MemoryPeer {
            id,
            path: path.to_string(),
            to_client: Some(to_client),
            from_client,
        };
        self.accepted.send(peer).map_err(|_| {
            TransportError::Connect(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "memory listener dropped",
            ))
        })?;

        tracing::debug!(%id, path, "opened memory connection");
        Ok(MemoryConnection {
            id,
            outgoing: Mutex::new(Some(outgoing)),
            incoming: Mutex::new(incoming),
        })
    }
}

/// Server half: yields one [`MemoryPeer`] per opened connection.
#[derive(Debug)]
pub struct MemoryListener {
    accepted: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryListener {
    /// Waits for the next connection. `None` once every connector is gone.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.accepted.recv().await
    }
}

/// The server's end of one memory connection.
#[derive(Debug)]
pub struct MemoryPeer {
    id: ConnectionId,
    path: String,
    to_client: Option<mpsc::UnboundedSender<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// The connection's identifier (shared with the client half).
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The path the client connected to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sends a frame to the client. Returns `false` if the client is gone
    /// or this side was closed.
    pub fn send(&self, text: impl Into<String>) -> bool {
        match &self.to_client {
            Some(tx) => tx.send(text.into()).is_ok(),
            None => false,
        }
    }

    /// Receives the next frame from the client. `None` once the client
    /// closed or dropped its half.
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Closes the server side; the client observes a clean close.
    pub fn close(&mut self) {
        self.to_client = None;
    }
}

/// The client's end of one memory connection.
#[derive(Debug)]
pub struct MemoryConnection {
    id: ConnectionId,
    outgoing: Mutex<Option<mpsc::UnboundedSender<String>>>,
    incoming: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl Connection for MemoryConnection {
    async fn send(&self, text: &str) -> Result<(), TransportError> {
        match self.outgoing.lock().await.as_ref() {
            Some(tx) => tx.send(text.to_owned()).map_err(|_| {
                TransportError::Closed("peer dropped".into())
            }),
            None => Err(TransportError::Closed(
                "closed locally".into(),
            )),
        }
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        Ok(self.incoming.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.outgoing.lock().await.take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (connector, mut listener) = memory_transport();
        let conn = connector.connect("/api/rooms").await.unwrap();
        let mut peer = listener.accept().await.unwrap();

        assert_eq!(peer.path(), "/api/rooms");
        assert_eq!(peer.id(), conn.id());

        conn.send("hello").await.unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("hello"));

        assert!(peer.send("world"));
        assert_eq!(conn.recv().await.unwrap().as_deref(), Some("world"));
    }

    #[tokio::test]
    async fn test_peer_close_is_clean_close() {
        let (connector, mut listener) = memory_transport();
        let conn = connector.connect("/x").await.unwrap();
        let mut peer = listener.accept().await.unwrap();

        peer.close();

        assert!(conn.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_client_close_ends_peer_stream() {
        let (connector, mut listener) = memory_transport();
        let conn = connector.connect("/x").await.unwrap();
        let mut peer = listener.accept().await.unwrap();

        conn.close().await.unwrap();

        assert!(peer.recv().await.is_none());
        assert!(conn.send("late").await.is_err());
    }

    #[tokio::test]
    async fn test_connect_fails_without_listener() {
        let (connector, listener) = memory_transport();
        drop(listener);

        let result = connector.connect("/x").await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
    }
}
