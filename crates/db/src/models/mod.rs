//! Row structs for the tables the notifier touches.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row.

pub mod contest;
pub mod contestant;
pub mod notification;
pub mod push_subscription;
