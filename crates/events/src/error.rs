//! Errors visible to callers of the [`Notifier`](crate::Notifier).
//!
//! Delivery failures never show up here; they stay inside the dispatch
//! workers (see [`DeliveryError`](crate::delivery::DeliveryError)).

/// Failure on the persistence path of a notification call.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// An audience lookup, insert, or read-back failed.
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// The message could not be encoded for storage.
    #[error("Failed to encode notification: {0}")]
    Marshal(#[from] serde_json::Error),
}
