use crate::config::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::{debug, info};

/// Schema for the events and users tables, embedded at build time
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors raised while connecting to or preparing the database
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to create database pool: {0}")]
    PoolCreation(sqlx::Error),

    #[error("Database query error: {0}")]
    QueryError(sqlx::Error),

    #[error("Database connection timeout")]
    ConnectionTimeout,

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DatabaseError::ConnectionTimeout,
            other => DatabaseError::QueryError(other),
        }
    }
}

/// Shared handle on the connection pool behind both stores
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round trip used as a liveness check
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        ping(&self.pool).await.map_err(DatabaseError::from)
    }

    /// Close every connection; waits for checked-out connections to return
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Create a PostgreSQL connection pool and check that it can reach the server
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .test_before_acquire(config.test_before_acquire)
        .connect(&config.url)
        .await
        .map_err(DatabaseError::PoolCreation)?;

    ping(&pool).await.map_err(DatabaseError::PoolCreation)?;
    debug!(
        "Connected with up to {} connections",
        config.max_connections
    );

    Ok(pool)
}

/// Apply pending migrations
///
/// Uses the embedded [`MIGRATOR`] unless `migrations_path` points at a
/// directory to load instead.
pub async fn run_migrations(
    pool: &PgPool,
    migrations_path: Option<&str>,
) -> Result<(), DatabaseError> {
    match migrations_path {
        Some(path) => {
            let migrator = Migrator::new(std::path::Path::new(path)).await?;
            migrator.run(pool).await?;
        }
        None => MIGRATOR.run(pool).await?,
    }

    debug!("Schema has {} known migrations", MIGRATOR.iter().count());
    Ok(())
}
