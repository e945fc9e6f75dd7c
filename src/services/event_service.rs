use crate::auth::Session;
use crate::error::{AppError, AppResult, StoreError};
use crate::lifecycle::{self, StatusAction, StatusChange};
use crate::models::{Event, EventDraft, EventPatch, EventStatus, ScoreField};
use crate::repositories::{EventStore, Subscription};
use crate::scoring;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Service for managing events
///
/// Every mutation is a single round trip to the store. Nothing is changed
/// locally: callers see the result once the next snapshot arrives.
pub struct EventService {
    store: Arc<dyn EventStore>,
}

/// Log a failed store round trip once and convert it for the caller
fn store_failure(operation: &'static str, id: Option<Uuid>, err: StoreError) -> AppError {
    match id {
        Some(id) => error!("Error trying to {} for event {}: {}", operation, id, err),
        None => error!("Error trying to {}: {}", operation, err),
    }
    AppError::StoreOperationFailed {
        operation,
        reason: err.to_string(),
    }
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Create a new event from a draft; requires an administrator
    pub async fn create_event(&self, session: &Session, draft: &EventDraft) -> AppResult<Event> {
        session.require_admin()?;

        let record = lifecycle::prepare_event(draft, session.uid(), Utc::now())?;
        info!(
            "Creating event: name={}, sport={}, date={}",
            record.name, record.sport, record.date
        );

        let id = self
            .store
            .create(&record)
            .await
            .map_err(|e| store_failure("add event", None, e))?;

        info!("Created event {} ({})", record.name, id);
        Ok(record.into_event(id))
    }

    /// Normalize and write one score field; returns the stored value
    ///
    /// `event` is the caller's latest snapshot of the event; only its sport
    /// is consulted, so concurrent edits resolve last-write-wins at the store.
    pub async fn update_score(
        &self,
        session: &Session,
        event: &Event,
        field: ScoreField,
        raw: &str,
    ) -> AppResult<f64> {
        session.require_admin()?;

        let value = scoring::apply_score_update(event, field, raw);
        self.store
            .update(event.id, &EventPatch::Score { field, value })
            .await
            .map_err(|e| store_failure("update score", Some(event.id), e))?;

        Ok(value)
    }

    /// Apply an event card action, enforcing the status table
    ///
    /// Returns the status the event will have once the write lands; Edit
    /// issues no write and returns the current status.
    pub async fn transition(
        &self,
        session: &Session,
        event: &Event,
        action: &StatusAction,
    ) -> AppResult<EventStatus> {
        session.require_admin()?;

        match lifecycle::plan_transition(event, action)? {
            Some(change) => self.write_status(event.id, change).await,
            None => Ok(event.status),
        }
    }

    /// Set any status directly; entering delayed still needs a reason
    pub async fn force_status(
        &self,
        session: &Session,
        id: Uuid,
        status: EventStatus,
        reason: Option<&str>,
    ) -> AppResult<EventStatus> {
        session.require_admin()?;

        let change = lifecycle::force_status(status, reason)?;
        self.write_status(id, change).await
    }

    async fn write_status(&self, id: Uuid, change: StatusChange) -> AppResult<EventStatus> {
        let status = change.status;

        self.store
            .update(id, &change.into())
            .await
            .map_err(|e| store_failure("update status", Some(id), e))?;

        info!("Event {} is now {}", id, status);
        Ok(status)
    }

    /// Permanently delete an event. Confirmation is the caller's job.
    pub async fn delete_event(&self, session: &Session, id: Uuid) -> AppResult<()> {
        session.require_admin()?;

        self.store
            .delete(id)
            .await
            .map_err(|e| store_failure("delete event", Some(id), e))?;

        info!("Deleted event {}", id);
        Ok(())
    }

    /// Live feed of event snapshots for any signed-in user
    pub fn subscribe(&self, _session: &Session) -> Subscription {
        self.store.subscribe()
    }
}
