//! Sports Central Library
//!
//! Event lifecycle and score normalization engine behind the Sports Central
//! dashboard. Exposes the engine components for use by the service binary
//! and tests.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repositories;
pub mod scoring;
pub mod services;
pub mod views;

// Re-export commonly used types
pub use auth::{Credentials, IdentityProvider, Session, SessionManager, StaticIdentityProvider};
pub use config::{AppConfig, StoreConfig};
pub use error::{AppError, AppResult, TransitionError};
pub use lifecycle::StatusAction;
pub use models::{Event, EventDraft, EventStatus, Role, ScoreField, Sport};
pub use services::{EventService, LiveBoard};
pub use views::Tab;

use database::Database;
use repositories::*;
use std::sync::Arc;

/// Application state containing the stores and services
pub struct AppState {
    pub database: Database,
    pub event_store: Arc<PgEventStore>,
    pub role_store: Arc<PgRoleStore>,
    pub event_service: Arc<EventService>,
    pub live_board: Arc<LiveBoard>,
}

impl AppState {
    /// Create a new AppState backed by `pool`
    pub fn new(pool: sqlx::PgPool, store_config: StoreConfig) -> Self {
        let database = Database::new(pool.clone());
        let event_store = Arc::new(PgEventStore::new(pool.clone(), store_config));

        Self {
            database,
            event_service: Arc::new(EventService::new(event_store.clone())),
            event_store,
            role_store: Arc::new(PgRoleStore::new(pool)),
            live_board: Arc::new(LiveBoard::new()),
        }
    }

    /// Session manager that signs identities from `provider` in against the role table
    pub fn session_manager(&self, provider: Arc<dyn IdentityProvider>) -> SessionManager {
        SessionManager::new(provider, self.role_store.clone())
    }
}
