//! Audience resolution for notification events.
//!
//! Two visibility rules apply:
//!
//! - a disclosed clarification goes to every contestant that has a team;
//! - anything else (undisclosed clarifications, benchmark jobs) goes to the
//!   members of the event's own team.

use std::collections::HashSet;
use std::sync::Arc;

use xsuportal_core::types::DbId;
use xsuportal_db::models::contest::{BenchmarkJob, Clarification};
use xsuportal_db::models::contestant::Recipient;

use crate::cache::AudienceCache;
use crate::store::NotifierStore;

/// Cache key for an audience query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudienceScope {
    /// All contestants that belong to any team.
    AllDisclosed,
    /// Members of one team.
    Team(DbId),
}

impl AudienceScope {
    pub fn for_clarification(clarification: &Clarification) -> Self {
        if clarification.is_disclosed() {
            Self::AllDisclosed
        } else {
            Self::Team(clarification.team_id)
        }
    }

    pub fn for_benchmark_job(job: &BenchmarkJob) -> Self {
        Self::Team(job.team_id)
    }
}

/// Resolves an [`AudienceScope`] to recipients, through the cache.
pub struct AudienceResolver {
    store: Arc<dyn NotifierStore>,
    cache: Arc<AudienceCache>,
}

impl AudienceResolver {
    pub fn new(store: Arc<dyn NotifierStore>, cache: Arc<AudienceCache>) -> Self {
        Self { store, cache }
    }

    /// Recipients for `scope`. A store failure returns the error and caches
    /// nothing.
    pub async fn resolve(&self, scope: AudienceScope) -> Result<Arc<[Recipient]>, sqlx::Error> {
        if let Some(hit) = self.cache.get_audience(scope).await {
            return Ok(hit);
        }

        let rows = match scope {
            AudienceScope::AllDisclosed => self.store.contestants_with_team().await?,
            AudienceScope::Team(team_id) => self.store.contestants_in_team(team_id).await?,
        };

        let mut seen = HashSet::new();
        let recipients: Arc<[Recipient]> = rows
            .into_iter()
            .filter(|r| seen.insert(r.id.clone()))
            .collect();

        tracing::debug!(?scope, count = recipients.len(), "Audience resolved");
        self.cache.put_audience(scope, Arc::clone(&recipients)).await;
        Ok(recipients)
    }
}
