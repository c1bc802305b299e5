//! Integration test fixtures for cartsync.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartsync-integration-tests
//! ```
//!
//! # Fixtures
//!
//! - [`ScriptedGateway`] - A cart gateway whose calls are held open until the
//!   test resolves them, one by one, in any order
//! - [`RecordingReporter`] - Collects every failure the store reports
//! - helpers for credentials, line-items and id lists

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cartsync_core::{CartLineItem, CartLineRef, ListedLine, ProductId, Quantity};
use cartsync_storefront::error::CartError;
use cartsync_storefront::feedback::{CartOperation, ErrorReporter};
use cartsync_storefront::gateway::{CartGateway, GatewayError};
use cartsync_storefront::session::Credential;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{mpsc, oneshot};

/// How long a test waits for the store to reach the gateway.
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// A request that reached the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayCall {
    List,
    Add(CartLineItem),
    Remove(CartLineRef),
}

impl GatewayCall {
    /// Product the call is about, if any.
    #[must_use]
    pub const fn product_id(&self) -> Option<ProductId> {
        match self {
            Self::List => None,
            Self::Add(item) => Some(item.product_id),
            Self::Remove(line) => Some(line.product_id),
        }
    }
}

type Reply = Result<Vec<ListedLine>, GatewayError>;

/// A gateway call waiting for the test to answer it.
#[derive(Debug)]
pub struct HeldCall {
    pub request: GatewayCall,
    /// Token the call was made with.
    pub token: String,
    reply: oneshot::Sender<Reply>,
}

impl HeldCall {
    /// Resolve successfully (an empty listing for list calls).
    pub fn succeed(self) {
        let _ = self.reply.send(Ok(Vec::new()));
    }

    /// Resolve a list call with the given lines.
    pub fn reply_lines(self, lines: Vec<CartLineItem>) {
        let listed = lines.into_iter().map(ListedLine::from).collect();
        let _ = self.reply.send(Ok(listed));
    }

    /// Resolve with a failure.
    pub fn fail(self, error: GatewayError) {
        let _ = self.reply.send(Err(error));
    }
}

/// Gateway whose every call blocks until the test resolves it.
pub struct ScriptedGateway {
    calls_tx: mpsc::UnboundedSender<HeldCall>,
    calls_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<HeldCall>>,
}

impl ScriptedGateway {
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            calls_tx,
            calls_rx: tokio::sync::Mutex::new(calls_rx),
        })
    }

    /// Wait for the next call to reach the gateway.
    ///
    /// # Panics
    ///
    /// Panics if no call arrives within five seconds.
    pub async fn next_call(&self) -> HeldCall {
        let mut rx = self.calls_rx.lock().await;
        tokio::time::timeout(CALL_TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for a gateway call")
            .expect("gateway channel closed")
    }

    /// Take a call if one is already waiting.
    pub fn try_next_call(&self) -> Option<HeldCall> {
        self.calls_rx.try_lock().ok()?.try_recv().ok()
    }

    async fn hold(&self, request: GatewayCall, credential: &Credential) -> Reply {
        let (reply, answer) = oneshot::channel();
        let call = HeldCall {
            request,
            token: credential.expose().expose_secret().to_string(),
            reply,
        };
        if self.calls_tx.send(call).is_err() {
            return Err(GatewayError::Rejected("scripted gateway closed".to_string()));
        }
        answer
            .await
            .unwrap_or_else(|_| Err(GatewayError::Rejected("call dropped unanswered".to_string())))
    }
}

#[async_trait]
impl CartGateway for ScriptedGateway {
    async fn list_items(&self, credential: &Credential) -> Result<Vec<ListedLine>, GatewayError> {
        self.hold(GatewayCall::List, credential).await
    }

    async fn add_item(
        &self,
        item: &CartLineItem,
        credential: &Credential,
    ) -> Result<(), GatewayError> {
        self.hold(GatewayCall::Add(*item), credential).await.map(drop)
    }

    async fn remove_item(
        &self,
        line: &CartLineRef,
        credential: &Credential,
    ) -> Result<(), GatewayError> {
        self.hold(GatewayCall::Remove(*line), credential)
            .await
            .map(drop)
    }
}

/// Reporter that remembers every failure.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(CartOperation, String)>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reported failures as `(operation, error message)`.
    #[must_use]
    pub fn reports(&self) -> Vec<(CartOperation, String)> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, operation: CartOperation, error: &CartError) {
        self.reports
            .lock()
            .unwrap()
            .push((operation, error.to_string()));
    }
}

#[must_use]
pub fn credential(token: &str) -> Credential {
    Credential::new(SecretString::from(token.to_string()))
}

#[must_use]
pub fn line(id: i64, quantity: u32) -> CartLineItem {
    CartLineItem::new(ProductId::new(id), Quantity::new(quantity).unwrap())
}

#[must_use]
pub fn ids(raw: &[i64]) -> Vec<ProductId> {
    raw.iter().copied().map(ProductId::new).collect()
}

/// Give spawned tasks a chance to run up to their next suspension point.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
