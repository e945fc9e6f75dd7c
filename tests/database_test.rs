//! Postgres adapter tests. They need a database, so they are ignored by
//! default; run with `TEST_DATABASE_URL=... cargo test -- --ignored`.

mod helpers;

use chrono::{NaiveDate, Utc};
use helpers::*;
use sports_central::error::StoreError;
use sports_central::models::*;
use sports_central::repositories::*;
use uuid::Uuid;

fn record(name: &str, sport: Sport, date: NaiveDate) -> NewEvent {
    NewEvent {
        name: name.to_string(),
        sport,
        date,
        time: Some("14:00".to_string()),
        venue: None,
        team1: "Home".to_string(),
        team2: "Away".to_string(),
        status: EventStatus::Scheduled,
        created_at: Utc::now(),
        created_by: "admin-uid".to_string(),
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

#[tokio::test]
#[ignore]
async fn test_create_and_find_event() {
    let db = TestDatabase::new().await;
    db.cleanup().await;

    let id = db
        .event_store
        .create(&record("Semi final", Sport::Cricket, day(12)))
        .await
        .expect("Failed to create event");

    let event = db
        .event_store
        .find_by_id(id)
        .await
        .expect("Failed to find event")
        .expect("Event not found");

    assert_eq!(event.name, "Semi final");
    assert_eq!(event.sport, Sport::Cricket);
    assert_eq!(event.date, day(12));
    assert_eq!(event.status, EventStatus::Scheduled);
    assert_eq!((event.score1, event.wickets2, event.overs1), (0.0, 0, 0.0));
}

#[tokio::test]
#[ignore]
async fn test_list_orders_by_date_desc() {
    let db = TestDatabase::new().await;
    db.cleanup().await;

    for (name, d) in [("first", 1), ("third", 30), ("second", 15)] {
        db.event_store
            .create(&record(name, Sport::Football, day(d)))
            .await
            .expect("Failed to create event");
    }

    let names: Vec<_> = db
        .event_store
        .list()
        .await
        .expect("Failed to list events")
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["third", "second", "first"]);
}

#[tokio::test]
#[ignore]
async fn test_patch_writes_single_field() {
    let db = TestDatabase::new().await;
    db.cleanup().await;

    let id = db
        .event_store
        .create(&record("Test match", Sport::Cricket, day(3)))
        .await
        .unwrap();

    db.event_store
        .update(
            id,
            &EventPatch::Score {
                field: ScoreField::Wickets1,
                value: 7.0,
            },
        )
        .await
        .expect("Failed to update wickets");
    db.event_store
        .update(
            id,
            &EventPatch::Status {
                status: EventStatus::Delayed,
                delay_reason: Some("Bad light".to_string()),
            },
        )
        .await
        .expect("Failed to update status");

    let event = db.event_store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(event.wickets1, 7);
    assert_eq!(event.score1, 0.0);
    assert_eq!(event.status, EventStatus::Delayed);
    assert_eq!(event.delay_reason.as_deref(), Some("Bad light"));
}

#[tokio::test]
#[ignore]
async fn test_update_and_delete_missing_event() {
    let db = TestDatabase::new().await;

    let err = db
        .event_store
        .update(
            Uuid::new_v4(),
            &EventPatch::Score {
                field: ScoreField::Score1,
                value: 1.0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    assert!(db.event_store.delete(Uuid::new_v4()).await.is_ok());
}

#[tokio::test]
#[ignore]
async fn test_subscription_receives_changes() {
    let db = TestDatabase::new().await;
    db.cleanup().await;

    let mut subscription = db.event_store.subscribe();
    assert!(next_snapshot(&mut subscription).await.is_empty());

    let id = db
        .event_store
        .create(&record("Live one", Sport::Basketball, day(20)))
        .await
        .unwrap();

    let snapshot = next_snapshot(&mut subscription).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, id);

    db.event_store.delete(id).await.unwrap();
    assert!(next_snapshot(&mut subscription).await.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_subscription_survives_listener_restart() {
    let db = TestDatabase::new().await;
    db.cleanup().await;

    let mut subscription = db.event_store.subscribe();
    assert!(next_snapshot(&mut subscription).await.is_empty());

    // Kill the connection holding the LISTEN, then write before the feed
    // has had a chance to listen again
    let terminated: Vec<bool> = sqlx::query_scalar(
        r#"
        SELECT pg_terminate_backend(pid)
        FROM pg_stat_activity
        WHERE datname = current_database()
          AND pid <> pg_backend_pid()
          AND query ILIKE 'LISTEN%'
        "#,
    )
    .fetch_all(&db.pool)
    .await
    .expect("Failed to terminate listener");
    assert!(terminated.contains(&true));

    let id = db
        .event_store
        .create(&record("Rain check", Sport::Tennis, day(9)))
        .await
        .expect("Failed to create event");

    let mut snapshot = next_snapshot(&mut subscription).await;
    while snapshot.is_empty() {
        snapshot = next_snapshot(&mut subscription).await;
    }
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, id);

    // Notifications flow again on the new connection
    db.event_store
        .update(
            id,
            &EventPatch::Status {
                status: EventStatus::Live,
                delay_reason: None,
            },
        )
        .await
        .unwrap();
    let mut snapshot = next_snapshot(&mut subscription).await;
    while snapshot[0].status != EventStatus::Live {
        snapshot = next_snapshot(&mut subscription).await;
    }
    assert_eq!(snapshot[0].id, id);
}

#[tokio::test]
#[ignore]
async fn test_default_role_bootstrap() {
    let db = TestDatabase::new().await;
    db.cleanup().await;

    let identity = Identity {
        uid: "firebase-style-uid".to_string(),
        email: Some("fan@example.com".to_string()),
        display_name: Some("fan".to_string()),
    };

    assert_eq!(db.role_store.get_role(&identity.uid).await.unwrap(), None);
    assert_eq!(
        db.role_store.ensure_default_role(&identity).await.unwrap(),
        Role::User
    );

    sqlx::query("UPDATE users SET role = 'admin' WHERE uid = $1")
        .bind(&identity.uid)
        .execute(&db.pool)
        .await
        .unwrap();

    // A repeat sign-in must not reset the promoted role
    assert_eq!(
        db.role_store.ensure_default_role(&identity).await.unwrap(),
        Role::Admin
    );

    let record = db.role_store.find_by_uid(&identity.uid).await.unwrap().unwrap();
    assert!(record.is_admin());
    assert_eq!(record.email.as_deref(), Some("fan@example.com"));
}
