use super::{EventStore, Snapshot, StoreResult, Subscription};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::event::wickets_from_f64;
use crate::models::{Event, EventPatch, EventStatus, NewEvent, Sport};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgListener;
use sqlx::{FromRow, PgPool};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Table created by the migrations
pub const EVENTS_TABLE: &str = "events";

/// Channel the `events_changed` trigger notifies after every write
pub const CHANGE_CHANNEL: &str = "events_changed";

const EVENT_COLUMNS: &str = r#"
    id,
    name,
    sport,
    "date",
    "time",
    venue,
    team1,
    team2,
    score1,
    score2,
    wickets1,
    wickets2,
    overs1,
    overs2,
    status,
    delay_reason,
    created_at,
    created_by
"#;

/// Raw events row; sport and status are stored as TEXT
#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    sport: String,
    date: NaiveDate,
    time: Option<String>,
    venue: Option<String>,
    team1: String,
    team2: String,
    score1: f64,
    score2: f64,
    wickets1: i32,
    wickets2: i32,
    overs1: f64,
    overs2: f64,
    status: String,
    delay_reason: Option<String>,
    created_at: DateTime<Utc>,
    created_by: String,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let sport = row
            .sport
            .parse::<Sport>()
            .map_err(|e| StoreError::Corrupt(format!("event {}: {}", row.id, e)))?;
        let status = row
            .status
            .parse::<EventStatus>()
            .map_err(|e| StoreError::Corrupt(format!("event {}: {}", row.id, e)))?;

        Ok(Event {
            id: row.id,
            name: row.name,
            sport,
            date: row.date,
            time: row.time,
            venue: row.venue,
            team1: row.team1,
            team2: row.team2,
            score1: row.score1,
            score2: row.score2,
            wickets1: row.wickets1.clamp(0, 10) as u8,
            wickets2: row.wickets2.clamp(0, 10) as u8,
            overs1: row.overs1,
            overs2: row.overs2,
            status,
            delay_reason: row.delay_reason,
            created_at: row.created_at,
            created_by: row.created_by,
        })
    }
}

/// Postgres-backed events collection
///
/// Change notification relies on the statement trigger installed by the
/// migrations, which emits `NOTIFY events_changed` after every write.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
    config: StoreConfig,
}

impl PgEventStore {
    /// Create a new PgEventStore
    pub fn new(pool: PgPool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    /// Read the whole collection, newest fixtures first
    pub async fn list(&self) -> StoreResult<Snapshot> {
        fetch_snapshot(&self.pool).await
    }

    /// Find an event by UUID
    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", EVENT_COLUMNS, EVENTS_TABLE);
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Event::try_from).transpose()
    }
}

fn select_all_sql() -> String {
    format!(
        r#"SELECT {} FROM {} ORDER BY "date" DESC, created_at DESC"#,
        EVENT_COLUMNS, EVENTS_TABLE
    )
}

async fn fetch_snapshot(pool: &PgPool) -> StoreResult<Snapshot> {
    let rows = sqlx::query_as::<_, EventRow>(&select_all_sql())
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(Event::try_from).collect()
}

/// Push a snapshot now and after every notification. Returns `Ok` once the
/// subscriber has gone away.
async fn watch_collection(pool: &PgPool, tx: &mpsc::Sender<Snapshot>) -> StoreResult<()> {
    loop {
        // Listen before every full read so no change slips in between
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        loop {
            let snapshot = fetch_snapshot(pool).await?;
            debug!("delivering snapshot of {} events", snapshot.len());
            if tx.send(snapshot).await.is_err() {
                return Ok(());
            }

            // Notifications sent while the connection was down are gone, so
            // a lost connection means listening again and re-reading
            match listener.try_recv().await? {
                Some(notification) => {
                    debug!("{} notification: {}", CHANGE_CHANNEL, notification.payload())
                }
                None => {
                    warn!("{} listener lost its connection", CHANGE_CHANNEL);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, record: &NewEvent) -> StoreResult<Uuid> {
        let sql = format!(
            r#"
            INSERT INTO {} (name, sport, "date", "time", venue, team1, team2, status, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
            EVENTS_TABLE
        );
        let id = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(&record.name)
            .bind(record.sport.as_str())
            .bind(record.date)
            .bind(&record.time)
            .bind(&record.venue)
            .bind(&record.team1)
            .bind(&record.team2)
            .bind(record.status.as_str())
            .bind(record.created_at)
            .bind(&record.created_by)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(&self, id: Uuid, patch: &EventPatch) -> StoreResult<()> {
        let result = match patch {
            EventPatch::Score { field, value } => {
                // Column names come from the closed ScoreField set
                let sql = format!(
                    "UPDATE {} SET {} = $2 WHERE id = $1",
                    EVENTS_TABLE,
                    field.as_str()
                );
                let query = sqlx::query(&sql).bind(id);
                let query = if field.is_wickets() {
                    query.bind(i32::from(wickets_from_f64(*value)))
                } else {
                    query.bind(*value)
                };
                query.execute(&self.pool).await?
            }
            EventPatch::Status {
                status,
                delay_reason,
            } => {
                let sql = format!(
                    "UPDATE {} SET status = $2, delay_reason = $3 WHERE id = $1",
                    EVENTS_TABLE
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(status.as_str())
                    .bind(delay_reason)
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("event {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", EVENTS_TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            debug!("delete of event {} matched no rows", id);
        }
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        let pool = self.pool.clone();
        let retry = self.config.listener_retry();

        Subscription::spawn(self.config.subscription_buffer, move |tx| async move {
            info!("Subscribed to {}", CHANGE_CHANNEL);
            loop {
                match watch_collection(&pool, &tx).await {
                    Ok(()) => break,
                    Err(e) => {
                        warn!("Event feed interrupted: {}. Reconnecting in {:?}", e, retry);
                        tokio::time::sleep(retry).await;
                        if tx.is_closed() {
                            break;
                        }
                    }
                }
            }
            info!("Unsubscribed from {}", CHANGE_CHANNEL);
        })
    }
}
