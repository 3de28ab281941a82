//! Link: a spawned task that owns one connection.
//!
//! The task pumps inbound frames into an [`Inbox`] and outbound
//! [`Command`]s onto the wire. Its owner keeps only a [`Link`] handle;
//! dropping the handle stops the task and closes the connection. The task
//! holds nothing but a weak reference back to whatever the inbox feeds.

use std::future::Future;

use playroom_protocol::Command;
use playroom_transport::{Connection, ConnectionId};
use tokio::sync::mpsc;

/// Receives the text frames of one connection.
pub(crate) trait Inbox: Send + Sync + 'static {
    /// Handles one frame. Returning `false` stops the link.
    fn deliver(&self, text: String) -> impl Future<Output = bool> + Send;
}

/// Handle to a running link task.
#[derive(Debug)]
pub struct Link {
    connection: ConnectionId,
    outbound: mpsc::UnboundedSender<Command>,
}

impl Link {
    /// Spawns the pump for `connection`.
    pub(crate) fn spawn<C, I>(connection: C, inbox: I) -> Self
    where
        C: Connection,
        I: Inbox,
    {
        let (outbound, commands) = mpsc::unbounded_channel();
        let id = connection.id();
        tokio::spawn(pump(connection, commands, inbox));
        Self {
            connection: id,
            outbound,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Returns `true` while the task is still running.
    pub fn is_live(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Queues a command. Returns `false` if the link has ended.
    pub fn send(&self, command: Command) -> bool {
        self.outbound.send(command).is_ok()
    }
}

async fn pump<C, I>(
    connection: C,
    mut commands: mpsc::UnboundedReceiver<Command>,
    inbox: I,
) where
    C: Connection,
    I: Inbox,
{
    let id = connection.id();
    tracing::debug!(connection = %id, "link started");

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    tracing::debug!(connection = %id, "link released by owner");
                    break;
                };
                let text = command.to_string();
                if let Err(err) = connection.send(&text).await {
                    tracing::warn!(connection = %id, error = %err, "send failed");
                    break;
                }
                tracing::debug!(connection = %id, command = %text, "command sent");
            }
            frame = connection.recv() => match frame {
                Ok(Some(text)) => {
                    if !inbox.deliver(text).await {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::info!(connection = %id, "connection closed by server");
                    break;
                }
                Err(err) => {
                    tracing::warn!(connection = %id, error = %err, "connection failed");
                    break;
                }
            },
        }
    }

    commands.close();
    if let Err(err) = connection.close().await {
        tracing::debug!(connection = %id, error = %err, "close failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;
    use playroom_transport::{Connector, memory_transport};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Inbox for Recorder {
        async fn deliver(&self, text: String) -> bool {
            let stop = text == "stop";
            self.0.lock().push(text);
            !stop
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_commands_go_out_and_frames_come_in() {
        let (connector, mut listener) = memory_transport();
        let connection = connector.connect("/x").await.unwrap();
        let mut peer = listener.accept().await.unwrap();
        let inbox = Recorder::default();

        let link = Link::spawn(connection, inbox.clone());
        assert!(link.send(Command::Chat("hi".into())));
        assert_eq!(peer.recv().await.as_deref(), Some("CHAT hi"));

        peer.send("frame");
        settle().await;
        assert_eq!(*inbox.0.lock(), vec!["frame".to_string()]);
        assert!(link.is_live());
    }

    #[tokio::test]
    async fn test_dropping_link_closes_connection() {
        let (connector, mut listener) = memory_transport();
        let connection = connector.connect("/x").await.unwrap();
        let mut peer = listener.accept().await.unwrap();

        let link = Link::spawn(connection, Recorder::default());
        drop(link);

        assert_eq!(peer.recv().await, None);
    }

    #[tokio::test]
    async fn test_server_close_ends_link() {
        let (connector, mut listener) = memory_transport();
        let connection = connector.connect("/x").await.unwrap();
        let mut peer = listener.accept().await.unwrap();

        let link = Link::spawn(connection, Recorder::default());
        peer.close();
        settle().await;

        assert!(!link.is_live());
        assert!(!link.send(Command::Start));
    }

    #[tokio::test]
    async fn test_inbox_can_stop_link() {
        let (connector, mut listener) = memory_transport();
        let connection = connector.connect("/x").await.unwrap();
        let peer = listener.accept().await.unwrap();

        let link = Link::spawn(connection, Recorder::default());
        peer.send("stop");
        settle().await;

        assert!(!link.is_live());
    }
}
