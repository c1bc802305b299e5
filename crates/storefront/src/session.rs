//! Session binding.
//!
//! The [`SessionBinder`] owns the session credential. The cart store only
//! reads it, through a [`SessionWatch`] handed out by the binder.
//! [`spawn_cart_sync`] ties the two together: every time a session starts the
//! cart is loaded from the gateway, and when a session ends (or is replaced)
//! the local cart is cleared first.

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cart::CartStore;

/// Opaque session token that gates every gateway call.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    #[must_use]
    pub const fn new(token: SecretString) -> Self {
        Self(token)
    }

    /// Borrow the secret token for use in an outgoing request.
    #[must_use]
    pub const fn expose(&self) -> &SecretString {
        &self.0
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl Eq for Credential {}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

impl From<SecretString> for Credential {
    fn from(token: SecretString) -> Self {
        Self(token)
    }
}

/// The binder's current session.
///
/// The generation changes on every sign-in and sign-out, so watchers can tell
/// a new session apart from the old one even when both carry the same token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    generation: u64,
    credential: Option<Credential>,
}

impl Session {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}

/// Read side of the session.
pub type SessionWatch = watch::Receiver<Session>;

/// Owner of the session credential.
pub struct SessionBinder {
    tx: watch::Sender<Session>,
}

impl SessionBinder {
    /// Create a binder with no active session.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx }
    }

    /// Start (or replace) the session.
    ///
    /// Re-signing in with the credential already bound does not notify
    /// watchers.
    pub fn sign_in(&self, credential: Credential) {
        self.tx.send_if_modified(|session| {
            if session.credential.as_ref() == Some(&credential) {
                return false;
            }
            session.generation += 1;
            session.credential = Some(credential);
            true
        });
    }

    /// End the session.
    pub fn sign_out(&self) {
        self.tx.send_if_modified(|session| {
            if session.credential.take().is_none() {
                return false;
            }
            session.generation += 1;
            true
        });
    }

    /// Current credential, if a session is active.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.tx.borrow().credential.clone()
    }

    /// Watch the session.
    #[must_use]
    pub fn subscribe(&self) -> SessionWatch {
        self.tx.subscribe()
    }
}

impl Default for SessionBinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the background task that keeps the cart bound to the session.
pub struct CartSync {
    task: JoinHandle<()>,
    loads: watch::Receiver<u64>,
}

impl CartSync {
    /// Wait until the next initial load has finished (successfully or not).
    ///
    /// Returns immediately with `false` if the sync task has stopped.
    pub async fn loaded(&mut self) -> bool {
        self.loads.changed().await.is_ok()
    }

    /// Number of initial loads completed so far.
    #[must_use]
    pub fn completed_loads(&self) -> u64 {
        *self.loads.borrow()
    }

    /// Stop following the session.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for CartSync {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the task that loads the cart for each new credential and clears it
/// when the session ends.
#[must_use]
pub fn spawn_cart_sync(store: CartStore, sessions: SessionWatch) -> CartSync {
    let (loads_tx, loads) = watch::channel(0);
    let task = tokio::spawn(follow_session(store, sessions, loads_tx));
    CartSync { task, loads }
}

async fn follow_session(store: CartStore, mut sessions: SessionWatch, loads: watch::Sender<u64>) {
    // Generation of the session the cart is currently loaded for.
    let mut bound: Option<u64> = None;

    loop {
        let session = sessions.borrow_and_update().clone();

        if bound.is_some_and(|generation| generation != session.generation()) {
            info!("Session ended, clearing cart");
            store.clear_cart();
            bound = None;
        }

        match session.credential() {
            Some(credential) if bound.is_none() => {
                info!(generation = session.generation(), "Session started, loading cart");
                bound = Some(session.generation());
                store.load_with(credential).await;
                loads.send_modify(|count| *count += 1);
            }
            Some(_) => debug!("Session unchanged, skipping reload"),
            None => {}
        }

        if sessions.changed().await.is_err() {
            debug!("Session binder dropped, stopping cart sync");
            break;
        }
    }
}
