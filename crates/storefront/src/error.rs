//! Cart error taxonomy.
//!
//! Every failure the cart store can hit is a [`CartError`]. They never leave
//! the store's operations; they are handed to the
//! [`ErrorReporter`](crate::feedback::ErrorReporter) instead.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Error raised while synchronizing the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The remote cart service failed or rejected the call.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A cart call was attempted before a session was available.
    #[error("No active session credential")]
    MissingCredential,
}

impl CartError {
    /// Whether this failure should be tracked as a service problem.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::Gateway(err) => err.is_server_side(),
            Self::MissingCredential => false,
        }
    }

    /// Message safe to show the shopper.
    ///
    /// Transport and server details are never exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(GatewayError::Rejected(message)) if !message.trim().is_empty() => {
                message.clone()
            }
            Self::Gateway(GatewayError::Rejected(_)) => {
                "That product could not be updated in your cart".to_string()
            }
            Self::Gateway(GatewayError::RateLimited(_)) => {
                "Too many requests, please wait a moment".to_string()
            }
            Self::Gateway(GatewayError::Api { status: 401 | 403, .. }) => {
                "Your session has expired, please sign in again".to_string()
            }
            Self::Gateway(_) => "Cart service unavailable, please try again".to_string(),
            Self::MissingCredential => "Please sign in to update your cart".to_string(),
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        assert_eq!(
            CartError::MissingCredential.to_string(),
            "No active session credential"
        );

        let err = CartError::from(GatewayError::Rejected("unknown product".to_string()));
        assert_eq!(err.to_string(), "Gateway error: Rejected: unknown product");
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = CartError::from(GatewayError::Api {
            status: 500,
            message: "stack trace at db.rs:42".to_string(),
        });
        assert_eq!(
            err.user_message(),
            "Cart service unavailable, please try again"
        );
        assert!(err.is_server_side());

        let err = CartError::from(GatewayError::Api {
            status: 401,
            message: "token expired".to_string(),
        });
        assert_eq!(
            err.user_message(),
            "Your session has expired, please sign in again"
        );
        assert!(!err.is_server_side());
    }

    #[test]
    fn test_user_message_passes_business_rejection() {
        let err = CartError::from(GatewayError::Rejected("Product is out of stock".to_string()));
        assert_eq!(err.user_message(), "Product is out of stock");

        let err = CartError::from(GatewayError::Rejected("  ".to_string()));
        assert_eq!(
            err.user_message(),
            "That product could not be updated in your cart"
        );
    }

    #[test]
    fn test_missing_credential_is_not_server_side() {
        assert!(!CartError::MissingCredential.is_server_side());
        assert_eq!(
            CartError::MissingCredential.user_message(),
            "Please sign in to update your cart"
        );
    }
}
