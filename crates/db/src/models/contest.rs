//! Contest events that trigger notifications.

use serde::Serialize;
use sqlx::FromRow;
use xsuportal_core::types::DbId;

/// A row from the `clarifications` table (only the columns the notifier needs).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Clarification {
    pub id: DbId,
    pub team_id: DbId,
    /// `NULL` until staff decide whether the answer is public.
    pub disclosed: Option<bool>,
}

impl Clarification {
    /// Whether the answer is visible to every team.
    pub fn is_disclosed(&self) -> bool {
        self.disclosed == Some(true)
    }
}

/// A row from the `benchmark_jobs` table (only the columns the notifier needs).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BenchmarkJob {
    pub id: DbId,
    pub team_id: DbId,
}
