//! Cartsync Storefront library.
//!
//! Keeps a client-side cart in step with a remote cart service.
//!
//! # Architecture
//!
//! - [`session::SessionBinder`] owns the session credential
//! - [`cart::CartStore`] owns the cart contents and busy flag, and wraps every
//!   [`gateway::CartGateway`] call (confirm first, then mutate)
//! - [`session::spawn_cart_sync`] loads the cart whenever a new credential
//!   appears and clears it when the session ends
//! - [`feedback`] carries success notices and reported failures to consumers
//!
//! # Example
//!
//! ```rust,ignore
//! let binder = SessionBinder::new();
//! let gateway = Arc::new(HttpCartGateway::new(&config.gateway)?);
//! let store = CartStore::builder(gateway, binder.subscribe())
//!     .options(config.store)
//!     .build();
//!
//! let mut sync = spawn_cart_sync(store.clone(), binder.subscribe());
//! binder.sign_in(credential);
//! sync.loaded().await;
//!
//! if !store.contains(product_id) {
//!     store.add_product(product_id, Quantity::ONE).await;
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod feedback;
pub mod gateway;
pub mod session;
