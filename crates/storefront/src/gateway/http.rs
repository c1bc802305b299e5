//! HTTP implementation of the cart gateway.
//!
//! Uses `reqwest` with a bearer credential per request. The service speaks
//! plain JSON:
//!
//! - `GET  {base}/cart` lists lines, either as `{"data": [...]}` or a bare array
//! - `POST {base}/cart` adds `{"product_id", "quantity"}`
//! - `POST {base}/cart/remove` removes `{"product_id"}`

use std::sync::Arc;

use cartsync_core::{CartLineItem, CartLineRef, ListedLine};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{CartGateway, GatewayError};
use crate::config::GatewayConfig;
use crate::session::Credential;

/// Longest slice of an error body kept in [`GatewayError`] messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the remote cart service.
#[derive(Clone)]
pub struct HttpCartGateway {
    inner: Arc<HttpCartGatewayInner>,
}

struct HttpCartGatewayInner {
    client: reqwest::Client,
    cart_endpoint: String,
    remove_endpoint: String,
}

impl HttpCartGateway {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let base = config.base_url.as_str().trim_end_matches('/');

        Ok(Self {
            inner: Arc::new(HttpCartGatewayInner {
                client,
                cart_endpoint: format!("{base}/cart"),
                remove_endpoint: format!("{base}/cart/remove"),
            }),
        })
    }

    /// Send an authorized request and return the response body on success.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        credential: &Credential,
    ) -> Result<String, GatewayError> {
        let response = request
            .bearer_auth(credential.expose().expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GatewayError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %truncate(&body, 500),
                "Cart service returned non-success status"
            );
            return Err(classify_failure(status, &body));
        }

        Ok(body)
    }
}

#[async_trait::async_trait]
impl CartGateway for HttpCartGateway {
    #[instrument(skip_all)]
    async fn list_items(&self, credential: &Credential) -> Result<Vec<ListedLine>, GatewayError> {
        let request = self.inner.client.get(&self.inner.cart_endpoint);
        let body = self.send(request, credential).await?;

        let listing: ListResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, 500),
                "Failed to parse cart listing"
            );
            GatewayError::Parse(e)
        })?;

        let items = listing.into_items();
        debug!(count = items.len(), "Listed cart lines");
        Ok(items)
    }

    #[instrument(skip_all, fields(product_id = %item.product_id, quantity = %item.quantity))]
    async fn add_item(
        &self,
        item: &CartLineItem,
        credential: &Credential,
    ) -> Result<(), GatewayError> {
        let request = self.inner.client.post(&self.inner.cart_endpoint).json(item);
        self.send(request, credential).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(product_id = %line.product_id))]
    async fn remove_item(
        &self,
        line: &CartLineRef,
        credential: &Credential,
    ) -> Result<(), GatewayError> {
        let request = self
            .inner
            .client
            .post(&self.inner.remove_endpoint)
            .json(line);
        self.send(request, credential).await?;
        Ok(())
    }
}

/// Cart listing body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Wrapped { data: Option<Vec<ListedLine>> },
    Bare(Vec<ListedLine>),
}

impl ListResponse {
    fn into_items(self) -> Vec<ListedLine> {
        match self {
            Self::Wrapped { data } => data.unwrap_or_default(),
            Self::Bare(items) => items,
        }
    }
}

/// Error body the service sends with business failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "error", alias = "detail")]
    message: String,
}

/// Map a non-success response onto a gateway error.
///
/// Client errors that describe the request itself (bad input, unknown
/// product, conflicting state) are business rejections; everything else is
/// reported with its status.
fn classify_failure(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| truncate(body, ERROR_BODY_LIMIT), |e| e.message);

    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::NOT_FOUND
        | StatusCode::CONFLICT
        | StatusCode::UNPROCESSABLE_ENTITY => GatewayError::Rejected(message),
        _ => GatewayError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn truncate(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}
