//! Repository for the `contestants` table.

use sqlx::PgPool;
use xsuportal_core::types::DbId;

use crate::models::contestant::Recipient;

/// Audience lookups over contestants.
pub struct ContestantRepo;

impl ContestantRepo {
    /// Every contestant that belongs to some team.
    pub async fn list_with_team(pool: &PgPool) -> Result<Vec<Recipient>, sqlx::Error> {
        sqlx::query_as::<_, Recipient>(
            "SELECT id, team_id FROM contestants WHERE team_id IS NOT NULL",
        )
        .fetch_all(pool)
        .await
    }

    /// Every contestant on the given team.
    pub async fn list_for_team(
        pool: &PgPool,
        team_id: DbId,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        sqlx::query_as::<_, Recipient>("SELECT id, team_id FROM contestants WHERE team_id = $1")
            .bind(team_id)
            .fetch_all(pool)
            .await
    }
}
