//! User-facing feedback from the cart.
//!
//! The cart store emits [`Notice`]s (e.g. "Product added to cart!") through a
//! [`NoticeSink`], and hands every failure to an [`ErrorReporter`]. The
//! default reporter logs, tracks service failures in Sentry and turns the
//! error into an error notice.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::CartError;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A message meant for the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Destination for notices.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(message = %notice.message, "Cart notice"),
            NoticeLevel::Error => tracing::warn!(message = %notice.message, "Cart notice"),
        }
    }
}

/// Sink that fans notices out to any number of subscribers.
///
/// Notices sent while nobody is subscribed are dropped. Slow subscribers lose
/// the oldest notices once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct BroadcastNotices {
    tx: broadcast::Sender<Notice>,
}

impl BroadcastNotices {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotices {
    fn default() -> Self {
        Self::new(32)
    }
}

impl NoticeSink for BroadcastNotices {
    fn notify(&self, notice: Notice) {
        // Err only means no one is listening.
        let _ = self.tx.send(notice);
    }
}

/// Cart operation a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Load,
    Add,
    Remove,
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Add => "add",
            Self::Remove => "remove",
        })
    }
}

/// Receives every failure caught at the cart store boundary.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, operation: CartOperation, error: &CartError);
}

/// Default reporter: log, capture service failures, notify the shopper.
#[derive(Clone)]
pub struct FeedbackReporter {
    notices: Arc<dyn NoticeSink>,
}

impl FeedbackReporter {
    #[must_use]
    pub fn new(notices: Arc<dyn NoticeSink>) -> Self {
        Self { notices }
    }
}

impl ErrorReporter for FeedbackReporter {
    fn report(&self, operation: CartOperation, error: &CartError) {
        if error.is_server_side() {
            let event_id = sentry::capture_error(error);
            tracing::error!(
                %operation,
                error = %error,
                sentry_event_id = %event_id,
                "Cart sync failed"
            );
        } else {
            tracing::warn!(%operation, error = %error, "Cart sync rejected");
        }

        self.notices.notify(Notice::error(error.user_message()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let notices = BroadcastNotices::default();
        notices.notify(Notice::success("Product added to cart!"));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let notices = BroadcastNotices::new(4);
        let mut rx = notices.subscribe();

        notices.notify(Notice::success("Product added to cart!"));

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.to_string(), "Product added to cart!");
    }

    #[tokio::test]
    async fn test_reporter_emits_user_message() {
        let notices = BroadcastNotices::new(4);
        let mut rx = notices.subscribe();
        let reporter = FeedbackReporter::new(Arc::new(notices));

        reporter.report(
            CartOperation::Remove,
            &CartError::from(GatewayError::Api {
                status: 503,
                message: "upstream down".to_string(),
            }),
        );

        let notice = rx.recv().await.unwrap();
        assert_eq!(
            notice,
            Notice::error("Cart service unavailable, please try again")
        );
    }

    #[test]
    fn test_notice_serializes_lowercase_level() {
        let json = serde_json::to_value(Notice::error("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "level": "error", "message": "nope" }));
    }
}
