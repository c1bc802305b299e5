//! Cart store and its state machine.
//!
//! - [`reducer`] - Pure cart transitions
//! - [`loader`] - Busy flag for outstanding cart calls
//! - [`store`] - The store that wraps transitions with gateway calls

pub mod loader;
pub mod reducer;
pub mod store;

pub use loader::LoaderState;
pub use reducer::{CartAction, CartState};
pub use store::{ADDED_TO_CART, CartSnapshot, CartStore, CartStoreBuilder, SyncOutcome};
