//! CLI commands.

mod cart;

pub use cart::{CartSession, print_report};

use thiserror::Error;

use cartsync_storefront::gateway::GatewayError;

/// Errors that stop a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No session token: pass --token or set CART_AUTH_TOKEN")]
    MissingToken,

    #[error("Failed to build cart gateway: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}
