//! Web Push delivery.
//!
//! [`PushTransport`] is the seam to the push service; [`WebPushTransport`]
//! is the production implementation. [`PushDispatcher`] runs deliveries on
//! a bounded worker pool, off the request path. Outcomes are reported as
//! [`DeliveryReport`]s on a channel that only feeds logging.

use async_trait::async_trait;
use xsuportal_core::types::DbId;
use xsuportal_db::models::push_subscription::PushSubscription;

use crate::vapid::VapidCredentials;

pub mod dispatcher;
pub mod webpush;

pub use dispatcher::{DeliveryLog, DispatcherHandle, PushDelivery, PushDispatcher, PushJob};
pub use webpush::WebPushTransport;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error raised by a transport before a status code is available.
#[derive(Debug, thiserror::Error)]
pub enum PushSendError {
    /// Payload encryption, VAPID signing, or message assembly failed.
    #[error("Failed to build web push message: {0}")]
    Message(#[from] web_push::WebPushError),

    /// The HTTP request to the push service failed.
    #[error("Web push HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Classified failure of a single delivery. Never leaves the dispatch path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The push service answered 410 Gone.
    #[error("Push subscription expired")]
    Expired,

    /// The push service answered 404 Not Found.
    #[error("Push subscription invalid")]
    Invalid,

    /// Any other failure: transport error or unexpected status.
    #[error("Web push send failed: {0}")]
    Failed(String),

    /// The contestant's subscriptions could not be loaded.
    #[error("Failed to load push subscriptions: {0}")]
    Subscriptions(String),
}

/// Map a push service status code to a delivery outcome.
pub fn classify_status(status: u16) -> Result<(), DeliveryError> {
    match status {
        200..=299 => Ok(()),
        410 => Err(DeliveryError::Expired),
        404 => Err(DeliveryError::Invalid),
        _ => Err(DeliveryError::Failed(format!("HTTP {status}"))),
    }
}

// ---------------------------------------------------------------------------
// DeliveryReport
// ---------------------------------------------------------------------------

/// Outcome of one delivery attempt, for logging.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub contestant_id: String,
    pub notification_id: Option<DbId>,
    /// `None` when the failure happened before any endpoint was tried.
    pub endpoint: Option<String>,
    pub outcome: Result<(), DeliveryError>,
}

// ---------------------------------------------------------------------------
// PushTransport
// ---------------------------------------------------------------------------

/// Sends one encrypted, signed push message and returns the HTTP status.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(
        &self,
        credentials: &VapidCredentials,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<u16, PushSendError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
