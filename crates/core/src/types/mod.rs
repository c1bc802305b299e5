//! Core types for cartsync.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod id;
pub mod line_item;
pub mod quantity;

pub use id::ProductId;
pub use line_item::{CartLineItem, CartLineRef, ListedLine};
pub use quantity::{Quantity, QuantityError};
