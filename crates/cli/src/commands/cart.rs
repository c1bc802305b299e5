//! Cart commands.
//!
//! Each command opens a session, waits for the initial cart load, runs one
//! operation and prints the resulting cart as JSON on stdout.

use std::sync::Arc;

use cartsync_core::{ProductId, Quantity};
use cartsync_storefront::cart::{CartStore, SyncOutcome};
use cartsync_storefront::config::CartsyncConfig;
use cartsync_storefront::feedback::{BroadcastNotices, Notice};
use cartsync_storefront::gateway::HttpCartGateway;
use cartsync_storefront::session::{CartSync, Credential, SessionBinder, spawn_cart_sync};
use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::CliError;

/// Result of a command, printed as JSON.
#[derive(Debug, Serialize)]
pub struct CartReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    pub items: Vec<ProductId>,
    pub notices: Vec<Notice>,
}

/// A signed-in cart bound to the remote service for one command.
pub struct CartSession {
    binder: SessionBinder,
    store: CartStore,
    _sync: CartSync,
    feed: broadcast::Receiver<Notice>,
}

impl CartSession {
    /// Sign in and wait for the initial cart load.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is available or the gateway client
    /// cannot be built. A failed initial load is reported as a notice, not
    /// an error.
    pub async fn open(config: &CartsyncConfig, token: Option<String>) -> Result<Self, CliError> {
        let token = token
            .map(SecretString::from)
            .or_else(|| config.auth_token.clone())
            .ok_or(CliError::MissingToken)?;

        let gateway = Arc::new(HttpCartGateway::new(&config.gateway)?);
        let notices = BroadcastNotices::default();
        let feed = notices.subscribe();

        let binder = SessionBinder::new();
        let store = CartStore::builder(gateway, binder.subscribe())
            .options(config.store)
            .notices(Arc::new(notices))
            .build();

        let mut sync = spawn_cart_sync(store.clone(), binder.subscribe());
        binder.sign_in(Credential::new(token));
        if !sync.loaded().await {
            warn!("Cart sync stopped before the initial load finished");
        }

        Ok(Self {
            binder,
            store,
            _sync: sync,
            feed,
        })
    }

    /// Report the cart as loaded.
    pub fn show(&mut self) -> CartReport {
        self.report(None)
    }

    /// Add a product unless it is already in the cart.
    pub async fn add(&mut self, product_id: ProductId, quantity: Quantity) -> CartReport {
        if self.store.contains(product_id) {
            info!(%product_id, "Product already in cart, not adding again");
            return self.report(Some(SyncOutcome::Unchanged));
        }

        let outcome = self.store.add_product(product_id, quantity).await;
        self.report(Some(outcome))
    }

    /// Remove a product.
    pub async fn remove(&mut self, product_id: ProductId) -> CartReport {
        let outcome = self.store.remove_product(product_id).await;
        self.report(Some(outcome))
    }

    /// End the session and drop the local cart.
    pub fn close(self) {
        self.binder.sign_out();
        self.store.clear_cart();
    }

    fn report(&mut self, outcome: Option<SyncOutcome>) -> CartReport {
        let mut notices = Vec::new();
        while let Ok(notice) = self.feed.try_recv() {
            notices.push(notice);
        }

        CartReport {
            outcome: outcome.map(outcome_label),
            items: self.store.items(),
            notices,
        }
    }
}

const fn outcome_label(outcome: SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Applied => "applied",
        SyncOutcome::Unchanged => "unchanged",
        SyncOutcome::Failed => "failed",
    }
}

/// Print a report as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the report cannot be encoded.
pub fn print_report(report: &CartReport) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_shape() {
        let report = CartReport {
            outcome: Some(outcome_label(SyncOutcome::Applied)),
            items: vec![ProductId::new(7), ProductId::new(9)],
            notices: vec![Notice::success("Product added to cart!")],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "outcome": "applied",
                "items": [7, 9],
                "notices": [{ "level": "success", "message": "Product added to cart!" }]
            })
        );
    }

    #[test]
    fn test_show_report_omits_outcome() {
        let report = CartReport {
            outcome: None,
            items: Vec::new(),
            notices: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({ "items": [], "notices": [] }));
    }
}
