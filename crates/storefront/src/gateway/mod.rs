//! Remote cart gateway.
//!
//! # Architecture
//!
//! - The remote cart service is the source of truth for durability; the cart
//!   store never persists anything itself
//! - [`CartGateway`] is the seam the store talks to, so tests can swap in a
//!   scripted gateway and production uses [`HttpCartGateway`]
//! - Every call is gated and parameterized by the session [`Credential`]
//!
//! # Example
//!
//! ```rust,ignore
//! use cartsync_storefront::gateway::{CartGateway, HttpCartGateway};
//!
//! let gateway = HttpCartGateway::new(&config.gateway)?;
//! let lines = gateway.list_items(&credential).await?;
//! gateway
//!     .add_item(&CartLineItem::new(ProductId::new(3), Quantity::ONE), &credential)
//!     .await?;
//! ```

mod http;

pub use http::HttpCartGateway;

use async_trait::async_trait;
use cartsync_core::{CartLineItem, CartLineRef, ListedLine};
use thiserror::Error;

use crate::session::Credential;

/// Errors that can occur when talking to the remote cart service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The service rejected the request for business reasons
    /// (e.g. unknown product).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GatewayError {
    /// Whether the failure originates on the transport or server side rather
    /// than in the request itself.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Rejected(_) | Self::RateLimited(_) => false,
        }
    }
}

/// The remote cart service, as seen by the cart store.
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// List every line currently in the remote cart.
    async fn list_items(&self, credential: &Credential) -> Result<Vec<ListedLine>, GatewayError>;

    /// Add a line to the remote cart.
    async fn add_item(
        &self,
        item: &CartLineItem,
        credential: &Credential,
    ) -> Result<(), GatewayError>;

    /// Remove a product's line from the remote cart.
    async fn remove_item(
        &self,
        line: &CartLineRef,
        credential: &Credential,
    ) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::Api {
            status: 422,
            message: "unknown product".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 422 - unknown product");

        let err = GatewayError::RateLimited(5);
        assert_eq!(err.to_string(), "Rate limited, retry after 5 seconds");
    }

    #[test]
    fn test_server_side_classification() {
        assert!(
            GatewayError::Api {
                status: 503,
                message: String::new(),
            }
            .is_server_side()
        );
        assert!(
            !GatewayError::Api {
                status: 404,
                message: String::new(),
            }
            .is_server_side()
        );
        assert!(!GatewayError::Rejected("out of stock".to_string()).is_server_side());
        assert!(!GatewayError::RateLimited(1).is_server_side());
    }
}
