//! Fresh room ids, requested from the server before a `create`.

use std::future::Future;
use std::sync::Arc;

use playroom_protocol::RoomId;
use playroom_session::Authorization;
use serde::Deserialize;

use crate::RoomError;

/// Hands out the id of a newly created room.
///
/// # Example
///
/// ```rust
/// use playroom_protocol::RoomId;
/// use playroom_room::{RoomAllocator, RoomError};
///
/// /// Always "creates" the same room. Handy in tests.
/// struct Fixed(RoomId);
///
/// impl RoomAllocator for Fixed {
///     async fn allocate(&self) -> Result<RoomId, RoomError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait RoomAllocator: Send + Sync + 'static {
    fn allocate(&self) -> impl Future<Output = Result<RoomId, RoomError>> + Send;
}

#[derive(Deserialize)]
struct Created {
    id: RoomId,
}

/// Allocates rooms through `GET <create_url>`, which answers `{"id": ...}`.
///
/// The request carries the `X-Auth-Token` header when the user is logged in.
#[derive(Debug, Clone)]
pub struct HttpAllocator {
    client: reqwest::Client,
    url: String,
    auth: Arc<Authorization>,
}

impl HttpAllocator {
    pub fn new(url: impl Into<String>, auth: Arc<Authorization>) -> Self {
        Self::with_client(reqwest::Client::new(), url, auth)
    }

    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        auth: Arc<Authorization>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            auth,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RoomAllocator for HttpAllocator {
    async fn allocate(&self) -> Result<RoomId, RoomError> {
        let mut request = self.client.get(&self.url);
        if let Some((name, token)) = self.auth.header() {
            request = request.header(name, token);
        }

        let created: Created = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::info!(room_id = %created.id, "room allocated");
        Ok(created.id)
    }
}
