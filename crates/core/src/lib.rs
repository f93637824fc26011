//! Shared domain primitives for the xsuportal notification engine.

pub mod message;
pub mod types;
