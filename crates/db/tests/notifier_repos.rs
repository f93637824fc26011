//! Integration tests for the repositories used by the notifier.
//!
//! Exercises the repository layer against a real database:
//! - Audience queries with and without team scoping
//! - Notification insert and read-back
//! - Push subscription listing per contestant

use sqlx::PgPool;
use xsuportal_db::repositories::{ContestantRepo, NotificationRepo, PushSubscriptionRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_contestants(pool: &PgPool) {
    sqlx::query(
        "INSERT INTO contestants (id, team_id) VALUES \
         ('a1', 5), ('a2', 5), ('b1', 7), ('loner', NULL)",
    )
    .execute(pool)
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// ContestantRepo
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_with_team_skips_teamless_contestants(pool: PgPool) {
    seed_contestants(&pool).await;

    let mut ids: Vec<String> = ContestantRepo::list_with_team(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    ids.sort();

    assert_eq!(ids, vec!["a1", "a2", "b1"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_for_team_is_scoped(pool: PgPool) {
    seed_contestants(&pool).await;

    let team = ContestantRepo::list_for_team(&pool, 5).await.unwrap();

    assert_eq!(team.len(), 2);
    assert!(team.iter().all(|r| r.team_id == 5));
}

// ---------------------------------------------------------------------------
// NotificationRepo
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_then_find_returns_assigned_fields(pool: PgPool) {
    let id = NotificationRepo::create(&pool, "a1", "eyJjb250ZW50Ijp7fX0=")
        .await
        .unwrap();
    assert!(id > 0);

    let row = NotificationRepo::find_by_id(&pool, id)
        .await
        .unwrap()
        .expect("row should exist after insert");

    assert_eq!(row.id, id);
    assert_eq!(row.contestant_id, "a1");
    assert_eq!(row.encoded_message, "eyJjb250ZW50Ijp7fX0=");
    assert!(!row.read);
    assert!(row.created_at.timestamp() > 0);
    assert!(row.updated_at >= row.created_at);

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE contestant_id = $1")
            .bind("a1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rows, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_unknown_id_returns_none(pool: PgPool) {
    assert!(NotificationRepo::find_by_id(&pool, 999_999).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// PushSubscriptionRepo
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn subscriptions_are_listed_per_contestant(pool: PgPool) {
    sqlx::query(
        "INSERT INTO push_subscriptions (contestant_id, endpoint, p256dh, auth) VALUES \
         ('a1', 'https://push.example.com/1', 'k1', 's1'), \
         ('a1', 'https://push.example.com/2', 'k2', 's2'), \
         ('b1', 'https://push.example.com/3', 'k3', 's3')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let subs = PushSubscriptionRepo::list_for_contestant(&pool, "a1").await.unwrap();
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].endpoint, "https://push.example.com/1");

    let none = PushSubscriptionRepo::list_for_contestant(&pool, "nobody").await.unwrap();
    assert!(none.is_empty());
}
