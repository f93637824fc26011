//! Notification fan-out for contest events.
//!
//! Given a domain event (a clarification answered, a benchmark job
//! finished) this crate works out who should hear about it, stores one
//! notification row per recipient, and delivers the message over Web Push
//! to every browser the recipient registered:
//!
//! - [`Notifier`]: the entry point used by request handlers.
//! - [`AudienceResolver`] / [`AudienceCache`]: audience lookups, memoized
//!   until an explicit reset.
//! - [`NotificationPersistence`]: insert plus read-back of each row.
//! - [`delivery`]: the push transport and its bounded worker pool.
//! - [`vapid`]: signing credentials loaded from the VAPID key file.
//!
//! ```text
//! event ─▶ AudienceResolver ─▶ NotificationPersistence ─▶ PushDispatcher ─▶ push
//!            (cached)               (awaited)               (detached)
//! ```

pub mod audience;
pub mod cache;
pub mod config;
pub mod delivery;
pub mod error;
pub mod notifier;
pub mod persistence;
pub mod store;
pub mod vapid;

pub use audience::{AudienceResolver, AudienceScope};
pub use cache::AudienceCache;
pub use config::PushConfig;
pub use delivery::{
    DeliveryError, DeliveryReport, DispatcherHandle, PushDelivery, PushDispatcher, PushJob,
    PushTransport, WebPushTransport,
};
pub use error::NotifyError;
pub use notifier::Notifier;
pub use persistence::NotificationPersistence;
pub use store::{NotifierStore, PgNotifierStore};
pub use vapid::{load_vapid_key, KeyError, VapidCredentials, VapidKeySource};
