//! Store adapters.
//!
//! The service talks to persistence only through [`EventStore`] and
//! [`RoleStore`]. Postgres adapters back the running service; the in-memory
//! adapters back tests and local development.

pub mod event_repository;
pub mod memory;
pub mod subscription;
pub mod user_repository;

use crate::error::StoreError;
use crate::models::{EventPatch, Identity, NewEvent, Role};
use async_trait::async_trait;
use uuid::Uuid;

// Re-export all adapters for convenient access
pub use event_repository::{PgEventStore, CHANGE_CHANNEL, EVENTS_TABLE};
pub use memory::{MemoryEventStore, MemoryRoleStore};
pub use subscription::{Snapshot, Subscription};
pub use user_repository::PgRoleStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store holding the events collection
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a new event and return the id assigned by the store
    async fn create(&self, record: &NewEvent) -> StoreResult<Uuid>;

    /// Write only the fields named by `patch`
    async fn update(&self, id: Uuid, patch: &EventPatch) -> StoreResult<()>;

    /// Permanently remove an event
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Start a snapshot feed; nothing is read until this is called
    fn subscribe(&self) -> Subscription;
}

/// Role lookup for signed-in identities
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn get_role(&self, uid: &str) -> StoreResult<Option<Role>>;

    /// Write the default `user` record unless one already exists, then
    /// return the stored role. The first write wins.
    async fn ensure_default_role(&self, identity: &Identity) -> StoreResult<Role>;
}
