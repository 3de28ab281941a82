//! Opening authenticated connections.

use std::sync::Arc;

use playroom_transport::{Connection, Connector};

use crate::{Authorization, SessionError};

/// Opens connections and performs the credential handshake.
///
/// ```text
/// open(path)
///   → wait for the initial login to settle
///   → connector.connect(path)
///   → send token (or "")        ← exactly one frame
///   → hand the connection out
/// ```
///
/// Callers never see a connection whose credential frame is still unsent.
/// A failure at any step yields an error and no connection.
pub struct ConnectionManager<K> {
    connector: K,
    auth: Arc<Authorization>,
}

impl<K: Connector> ConnectionManager<K> {
    pub fn new(connector: K, auth: Arc<Authorization>) -> Self {
        Self { connector, auth }
    }

    pub fn authorization(&self) -> &Arc<Authorization> {
        &self.auth
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Opens an authenticated connection to `path`.
    ///
    /// # Errors
    /// - [`SessionError::Connect`] if the transport could not be opened.
    /// - [`SessionError::Handshake`] if the credential frame could not be
    ///   sent; the half-open connection is closed first.
    pub async fn open(&self, path: &str) -> Result<K::Connection, SessionError> {
        self.auth.wait_for_initial_login().await;

        let connection = self.connector.connect(path).await.inspect_err(|err| {
            tracing::warn!(path, error = %err, "connect failed");
        })?;

        let token = self.auth.token().unwrap_or_default();
        if let Err(source) = connection.send(&token).await {
            tracing::warn!(
                connection = %connection.id(),
                path,
                error = %source,
                "handshake failed"
            );
            if let Err(err) = connection.close().await {
                tracing::debug!(connection = %connection.id(), error = %err, "close after failed handshake");
            }
            return Err(SessionError::Handshake {
                path: path.to_string(),
                source,
            });
        }

        tracing::debug!(
            connection = %connection.id(),
            path,
            authenticated = !token.is_empty(),
            "connection ready"
        );
        Ok(connection)
    }
}

impl<K> std::fmt::Debug for ConnectionManager<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::FutureExt;
    use playroom_protocol::{User, UserId};
    use playroom_transport::{TransportError, memory_transport};

    #[tokio::test]
    async fn test_anonymous_handshake_sends_empty_frame() {
        let (connector, mut listener) = memory_transport();
        let manager =
            ConnectionManager::new(connector, Arc::new(Authorization::anonymous()));

        let connection = manager.open("/api/tic-tac-toe/rooms").await.unwrap();
        let mut peer = listener.accept().await.unwrap();

        assert_eq!(peer.path(), "/api/tic-tac-toe/rooms");
        assert_eq!(peer.recv().await.as_deref(), Some(""));
        assert_eq!(peer.id(), connection.id());
    }

    #[tokio::test]
    async fn test_handshake_precedes_application_frames() {
        let (connector, mut listener) = memory_transport();
        let auth = Arc::new(Authorization::new());
        auth.login(
            User {
                id: UserId(9),
                name: "Bob".into(),
                avatar: None,
            },
            "tok-9",
        );
        let manager = ConnectionManager::new(connector, auth);

        let connection = manager.open("/room/r1").await.unwrap();
        connection.send("START").await.unwrap();
        let mut peer = listener.accept().await.unwrap();

        assert_eq!(peer.recv().await.as_deref(), Some("tok-9"));
        assert_eq!(peer.recv().await.as_deref(), Some("START"));
    }

    #[tokio::test]
    async fn test_open_waits_for_initial_login() {
        let (connector, mut listener) = memory_transport();
        let auth = Arc::new(Authorization::new());
        let manager = ConnectionManager::new(connector, Arc::clone(&auth));

        let mut pending = Box::pin(manager.open("/x"));
        assert!(pending.as_mut().now_or_never().is_none());

        auth.restore(None, Some("restored".into()));
        let _connection = pending.await.unwrap();
        let mut peer = listener.accept().await.unwrap();

        assert_eq!(peer.recv().await.as_deref(), Some("restored"));
    }

    #[tokio::test]
    async fn test_connect_failure_hands_out_nothing() {
        let (connector, listener) = memory_transport();
        drop(listener);
        let manager =
            ConnectionManager::new(connector, Arc::new(Authorization::anonymous()));

        let result = manager.open("/x").await;

        assert!(matches!(
            result,
            Err(SessionError::Connect(TransportError::Connect(_)))
        ));
    }
}
