//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod contestant_repo;
pub mod notification_repo;
pub mod push_subscription_repo;

pub use contestant_repo::ContestantRepo;
pub use notification_repo::NotificationRepo;
pub use push_subscription_repo::PushSubscriptionRepo;
