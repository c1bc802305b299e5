//! Cartsync Core - Shared cart types.
//!
//! This crate provides the types exchanged between the cart store, the
//! remote cart gateway and cart consumers:
//! - `storefront` - Cart store, session binding and gateway clients
//! - `cli` - Command-line cart consumer
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product ids, validated quantities and gateway line-items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
