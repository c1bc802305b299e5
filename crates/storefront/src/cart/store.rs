//! The cart store.
//!
//! Owns the cart contents and the busy flag, and wraps every gateway call:
//! mark busy, call the gateway, apply the transition only after the gateway
//! confirms, report failures, clear busy. Operations always resolve; errors
//! stop at this boundary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use cartsync_core::{CartLineItem, CartLineRef, ListedLine, ProductId, Quantity};
use tokio::sync::{OwnedMutexGuard, watch};
use tracing::{debug, info, instrument};

use super::loader::LoaderState;
use super::reducer::{CartAction, CartState};
use crate::config::{EmptyLoadPolicy, MutationOrdering, StoreOptions};
use crate::error::{self, CartError};
use crate::feedback::{
    CartOperation, ErrorReporter, FeedbackReporter, Notice, NoticeSink, TracingNotices,
};
use crate::gateway::CartGateway;
use crate::session::{Credential, SessionWatch};

/// Notice emitted once the gateway confirms an add.
pub const ADDED_TO_CART: &str = "Product added to cart!";

/// What an operation did to the local cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The gateway confirmed and the transition was applied.
    Applied,
    /// The gateway confirmed but there was nothing to apply.
    Unchanged,
    /// The call failed and was reported; the cart was not touched.
    Failed,
}

/// Point-in-time view of the cart for consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    cart: CartState,
    loader: LoaderState,
}

impl CartSnapshot {
    #[must_use]
    pub fn items(&self) -> &[ProductId] {
        self.cart.items()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.cart.contains(id)
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

}

/// Client-side cart kept in step with the remote cart service.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    gateway: Arc<dyn CartGateway>,
    sessions: SessionWatch,
    state: watch::Sender<CartSnapshot>,
    options: StoreOptions,
    product_locks: ProductLocks,
    notices: Arc<dyn NoticeSink>,
    reporter: Arc<dyn ErrorReporter>,
}

impl CartStore {
    /// Create a store with default options, logging notices and the default
    /// error reporter.
    #[must_use]
    pub fn new(gateway: Arc<dyn CartGateway>, sessions: SessionWatch) -> Self {
        Self::builder(gateway, sessions).build()
    }

    #[must_use]
    pub fn builder(
        gateway: Arc<dyn CartGateway>,
        sessions: SessionWatch,
    ) -> CartStoreBuilder {
        CartStoreBuilder {
            gateway,
            sessions,
            options: StoreOptions::default(),
            notices: None,
            reporter: None,
        }
    }

    // =========================================================================
    // Read side
    // =========================================================================

    /// Current cart and busy flag.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Product ids in the cart, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<ProductId> {
        self.inner.state.borrow().items().to_vec()
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.inner.state.borrow().contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.borrow().cart.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().cart.is_empty()
    }

    /// Whether any cart call issued by this store is still outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    /// Watch the cart; the receiver is notified on every change to the
    /// contents or the busy flag.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.state.subscribe()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Load the cart for the current session credential.
    pub async fn load(&self) -> SyncOutcome {
        match self.credential() {
            Ok(credential) => self.load_with(&credential).await,
            Err(e) => self.fail(CartOperation::Load, e),
        }
    }

    /// Load the cart from the gateway with an explicit credential.
    ///
    /// A non-empty listing replaces the local cart. An empty listing follows
    /// [`EmptyLoadPolicy`].
    #[instrument(skip_all)]
    pub async fn load_with(&self, credential: &Credential) -> SyncOutcome {
        let _busy = self.show_loader();

        let lines = match self.inner.gateway.list_items(credential).await {
            Ok(lines) => lines,
            Err(e) => return self.fail(CartOperation::Load, e.into()),
        };

        if lines.is_empty() {
            return match self.inner.options.empty_load {
                EmptyLoadPolicy::KeepLocal => {
                    debug!("Remote cart is empty, keeping local cart");
                    SyncOutcome::Unchanged
                }
                EmptyLoadPolicy::Clear => {
                    self.dispatch(CartAction::SetCart(Vec::new()));
                    SyncOutcome::Applied
                }
            };
        }

        let ids = unique_product_ids(&lines);
        info!(count = ids.len(), "Loaded cart");
        self.dispatch(CartAction::SetCart(ids));
        SyncOutcome::Applied
    }

    /// Add a product once the gateway confirms it.
    ///
    /// Does not check whether the product is already in the cart; gate on
    /// [`contains`](Self::contains) first.
    #[instrument(skip(self), fields(product_id = %id, quantity = %quantity))]
    pub async fn add_product(&self, id: ProductId, quantity: Quantity) -> SyncOutcome {
        let credential = match self.credential() {
            Ok(credential) => credential,
            Err(e) => return self.fail(CartOperation::Add, e),
        };
        let _busy = self.show_loader();
        let _turn = self.product_turn(id).await;

        let item = CartLineItem::new(id, quantity);
        match self.inner.gateway.add_item(&item, &credential).await {
            Ok(()) => {
                self.dispatch(CartAction::AddProduct { id });
                self.inner.notices.notify(Notice::success(ADDED_TO_CART));
                SyncOutcome::Applied
            }
            Err(e) => self.fail(CartOperation::Add, e.into()),
        }
    }

    /// Remove a product once the gateway confirms it.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_product(&self, id: ProductId) -> SyncOutcome {
        let credential = match self.credential() {
            Ok(credential) => credential,
            Err(e) => return self.fail(CartOperation::Remove, e),
        };
        let _busy = self.show_loader();
        let _turn = self.product_turn(id).await;

        match self
            .inner
            .gateway
            .remove_item(&CartLineRef::from(id), &credential)
            .await
        {
            Ok(()) if self.contains(id) => {
                self.dispatch(CartAction::RemoveProduct { id });
                SyncOutcome::Applied
            }
            Ok(()) => {
                debug!("Removed product was not in the local cart");
                SyncOutcome::Unchanged
            }
            Err(e) => self.fail(CartOperation::Remove, e.into()),
        }
    }

    /// Empty the local cart without touching the gateway.
    pub fn clear_cart(&self) {
        self.dispatch(CartAction::ClearCart);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn credential(&self) -> error::Result<Credential> {
        self.inner
            .sessions
            .borrow()
            .credential()
            .cloned()
            .ok_or(CartError::MissingCredential)
    }

    fn dispatch(&self, action: CartAction) {
        debug!(?action, "Applying cart action");
        self.inner.state.send_modify(|snapshot| snapshot.cart.apply(action));
    }

    fn show_loader(&self) -> LoaderGuard<'_> {
        self.inner.state.send_modify(|snapshot| snapshot.loader.show());
        LoaderGuard {
            state: &self.inner.state,
        }
    }

    /// Wait for this product's turn when mutations are serialized per product.
    async fn product_turn(&self, id: ProductId) -> Option<OwnedMutexGuard<()>> {
        match self.inner.options.ordering {
            MutationOrdering::PerProduct => Some(self.inner.product_locks.acquire(id).await),
            MutationOrdering::Unordered => None,
        }
    }

    fn fail(&self, operation: CartOperation, error: CartError) -> SyncOutcome {
        self.inner.reporter.report(operation, &error);
        SyncOutcome::Failed
    }
}

/// Builder for [`CartStore`].
pub struct CartStoreBuilder {
    gateway: Arc<dyn CartGateway>,
    sessions: SessionWatch,
    options: StoreOptions,
    notices: Option<Arc<dyn NoticeSink>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl CartStoreBuilder {
    #[must_use]
    pub const fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Where success notices go. Also used by the default error reporter.
    #[must_use]
    pub fn notices(mut self, notices: Arc<dyn NoticeSink>) -> Self {
        self.notices = Some(notices);
        self
    }

    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    #[must_use]
    pub fn build(self) -> CartStore {
        let notices = self
            .notices
            .unwrap_or_else(|| Arc::new(TracingNotices) as Arc<dyn NoticeSink>);
        let reporter = self.reporter.unwrap_or_else(|| {
            Arc::new(FeedbackReporter::new(Arc::clone(&notices))) as Arc<dyn ErrorReporter>
        });
        let (state, _rx) = watch::channel(CartSnapshot::default());

        CartStore {
            inner: Arc::new(CartStoreInner {
                gateway: self.gateway,
                sessions: self.sessions,
                state,
                options: self.options,
                product_locks: ProductLocks::default(),
                notices,
                reporter,
            }),
        }
    }
}

/// Clears one unit of the busy flag when dropped, on every exit path.
struct LoaderGuard<'a> {
    state: &'a watch::Sender<CartSnapshot>,
}

impl Drop for LoaderGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|snapshot| snapshot.loader.hide());
    }
}

/// One async mutex per product id with a mutation in flight.
#[derive(Default)]
struct ProductLocks {
    locks: Mutex<HashMap<ProductId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ProductLocks {
    async fn acquire(&self, id: ProductId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only referenced by the map have no holder or waiter.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }
}

/// Product ids from a listing, first occurrence wins.
fn unique_product_ids(lines: &[ListedLine]) -> Vec<ProductId> {
    let mut ids = Vec::with_capacity(lines.len());
    for line in lines {
        if !ids.contains(&line.product_id) {
            ids.push(line.product_id);
        }
    }
    if ids.len() < lines.len() {
        debug!(
            dropped = lines.len() - ids.len(),
            "Listing repeated product ids"
        );
    }
    ids
}
