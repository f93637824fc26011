//! Notification protocol message.
//!
//! A [`NotificationMessage`] is what contestants' browsers receive over Web
//! Push and what the portal stores in `notifications.encoded_message`. The
//! `id` and `created_at` fields are only filled in once the message has been
//! persisted; see [`NotificationMessage::stamped`].

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Upper bound (exclusive) for the random probe carried by test messages.
const TEST_PROBE_RANGE: i64 = 10_000;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failure to turn an encoded payload back into a message.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid message body: {0}")]
    Body(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// NotificationContent
// ---------------------------------------------------------------------------

/// The payload kind carried by a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationContent {
    /// A clarification was answered (or its answer updated).
    Clarification {
        clarification_id: DbId,
        /// Whether the recipient's team filed the clarification.
        owned: bool,
        updated: bool,
    },

    /// A benchmark job belonging to the recipient's team finished.
    BenchmarkJob { benchmark_job_id: DbId },

    /// Operator-triggered probe used to check a contestant's push setup.
    Test { something: i64 },
}

// ---------------------------------------------------------------------------
// NotificationMessage
// ---------------------------------------------------------------------------

/// A notification as it travels to a push endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DbId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    pub content: NotificationContent,
}

impl NotificationMessage {
    /// Create an unstamped message for the given content.
    pub fn new(content: NotificationContent) -> Self {
        Self {
            id: None,
            created_at: None,
            content,
        }
    }

    pub fn clarification(clarification_id: DbId, owned: bool, updated: bool) -> Self {
        Self::new(NotificationContent::Clarification {
            clarification_id,
            owned,
            updated,
        })
    }

    pub fn benchmark_job(benchmark_job_id: DbId) -> Self {
        Self::new(NotificationContent::BenchmarkJob { benchmark_job_id })
    }

    /// A test message with a random probe in `0..10000`.
    pub fn test() -> Self {
        Self::new(NotificationContent::Test {
            something: rand::random_range(0..TEST_PROBE_RANGE),
        })
    }

    /// Attach the identifier and creation time assigned by the store.
    pub fn stamped(mut self, id: DbId, created_at: Timestamp) -> Self {
        self.id = Some(id);
        self.created_at = Some(created_at);
        self
    }

    /// Whether the message carries its persisted identity.
    pub fn is_stamped(&self) -> bool {
        self.id.is_some() && self.created_at.is_some()
    }

    /// Binary form of the message.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Binary form, base64 encoded with the standard alphabet.
    ///
    /// This is both the push message body and the value stored in
    /// `notifications.encoded_message`.
    pub fn to_base64(&self) -> Result<String, serde_json::Error> {
        Ok(BASE64.encode(self.to_bytes()?))
    }

    /// Inverse of [`to_base64`](Self::to_base64).
    pub fn from_base64(encoded: &str) -> Result<Self, DecodeError> {
        let bytes = BASE64.decode(encoded)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
