//! The local user's credentials.
//!
//! Playroom doesn't implement a login protocol itself; whoever owns the
//! login flow (a modal, a stored cookie, an OAuth redirect) hands the result
//! to [`Authorization`]. Everything that talks to the server reads the
//! token from here.
//!
//! # Initial login
//!
//! At startup the stored credentials may still be loading. Until that
//! finishes, the token is unknown, and a connection opened now would
//! authenticate with the wrong identity. [`Authorization::new`] therefore
//! starts *pending*; [`restore`](Authorization::restore),
//! [`login`](Authorization::login), or [`logout`](Authorization::logout)
//! settle it, and [`wait_for_initial_login`](Authorization::wait_for_initial_login)
//! suspends until then.

use std::fmt;

use parking_lot::RwLock;
use playroom_protocol::User;
use playroom_sync::{Observer, Observers, Signal};

/// HTTP header that carries the token on plain requests.
pub const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Default)]
struct Credentials {
    user: Option<User>,
    token: Option<String>,
}

/// Holds the current user and token, and announces changes.
///
/// Shared as `Arc<Authorization>` by every component that opens
/// connections or makes HTTP requests.
pub struct Authorization {
    credentials: RwLock<Credentials>,
    initial_login: Signal,
    observers: Observers<Option<User>>,
}

impl Authorization {
    /// Creates a pending authorization: no credentials yet, and the initial
    /// login has not finished.
    pub fn new() -> Self {
        Self {
            credentials: RwLock::new(Credentials::default()),
            initial_login: Signal::new(),
            observers: Observers::new(),
        }
    }

    /// Creates a settled, anonymous authorization.
    pub fn anonymous() -> Self {
        let auth = Self::new();
        auth.initial_login.open();
        auth
    }

    /// Finishes the initial login with whatever was stored (possibly
    /// nothing) and releases everyone waiting on it.
    pub fn restore(&self, user: Option<User>, token: Option<String>) {
        self.replace(Credentials { user, token });
    }

    /// Stores a fresh login.
    pub fn login(&self, user: User, token: impl Into<String>) {
        self.replace(Credentials {
            user: Some(user),
            token: Some(token.into()),
        });
    }

    /// Forgets the current credentials.
    pub fn logout(&self) {
        self.replace(Credentials::default());
    }

    fn replace(&self, credentials: Credentials) {
        let user = credentials.user.clone();
        *self.credentials.write() = credentials;

        tracing::info!(
            user = user.as_ref().map(|u| u.name.as_str()),
            "authorization updated"
        );
        self.initial_login.open();
        self.observers.notify(&user);
    }

    pub fn user(&self) -> Option<User> {
        self.credentials.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.credentials.read().token.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials.read().token.is_some()
    }

    /// The `X-Auth-Token` header pair, when a token is present.
    pub fn header(&self) -> Option<(&'static str, String)> {
        self.token().map(|token| (AUTH_HEADER, token))
    }

    /// Registers a callback fired with the new user after every change.
    pub fn on_update(&self, observer: Observer<Option<User>>) -> bool {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, observer: &Observer<Option<User>>) -> bool {
        self.observers.remove(observer)
    }

    /// Returns `true` once the initial login has settled.
    pub fn is_settled(&self) -> bool {
        self.initial_login.is_open()
    }

    /// Suspends until the initial login has settled.
    pub async fn wait_for_initial_login(&self) {
        self.initial_login.wait().await;
    }
}

impl Default for Authorization {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let credentials = self.credentials.read();
        f.debug_struct("Authorization")
            .field("user", &credentials.user)
            .field("token", &credentials.token.as_ref().map(|_| "<redacted>"))
            .field("settled", &self.initial_login.is_open())
            .finish()
    }
}
