use super::{EventStore, RoleStore, Snapshot, StoreResult, Subscription};
use crate::error::StoreError;
use crate::models::{Event, EventPatch, Identity, NewEvent, Role, UserRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, RwLock};
use tracing::debug;
use uuid::Uuid;

/// In-process event store with the same snapshot semantics as the Postgres one
pub struct MemoryEventStore {
    events: watch::Sender<Snapshot>,
    unavailable: AtomicBool,
    subscription_buffer: usize,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        let (events, _) = watch::channel(Vec::new());
        Self {
            events,
            unavailable: AtomicBool::new(false),
            subscription_buffer: 16,
        }
    }

    /// Current contents, ordered by date descending
    pub fn snapshot(&self) -> Snapshot {
        self.events.borrow().clone()
    }

    /// Find an event by id
    pub fn get(&self, id: Uuid) -> Option<Event> {
        self.events.borrow().iter().find(|e| e.id == id).cloned()
    }

    /// Make every write fail until switched back, to simulate an outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_by_date_desc(events: &mut Snapshot) {
    events.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn create(&self, record: &NewEvent) -> StoreResult<Uuid> {
        self.check_available()?;
        let id = Uuid::new_v4();
        let event = record.clone().into_event(id);
        self.events.send_modify(|events| {
            events.push(event);
            sort_by_date_desc(events);
        });
        debug!("memory store: created event {}", id);
        Ok(id)
    }

    async fn update(&self, id: Uuid, patch: &EventPatch) -> StoreResult<()> {
        self.check_available()?;
        let found = self.events.send_if_modified(|events| {
            match events.iter_mut().find(|e| e.id == id) {
                Some(event) => {
                    event.apply_patch(patch);
                    true
                }
                None => false,
            }
        });
        if !found {
            return Err(StoreError::NotFound(format!("event {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.check_available()?;
        self.events.send_if_modified(|events| {
            let before = events.len();
            events.retain(|e| e.id != id);
            events.len() != before
        });
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        let mut changes = self.events.subscribe();
        Subscription::spawn(self.subscription_buffer, move |tx| async move {
            loop {
                let snapshot = changes.borrow_and_update().clone();
                if tx.send(snapshot).await.is_err() {
                    break;
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

/// In-process role store
#[derive(Default)]
pub struct MemoryRoleStore {
    records: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Out-of-band role change, the equivalent of an operator editing the record
    pub async fn set_role(&self, uid: &str, role: Role) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", uid)))?;
        record.role = role.as_str().to_string();
        Ok(())
    }

    pub async fn find(&self, uid: &str) -> Option<UserRecord> {
        self.records.read().await.get(uid).cloned()
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn get_role(&self, uid: &str) -> StoreResult<Option<Role>> {
        Ok(self.records.read().await.get(uid).map(UserRecord::role_enum))
    }

    async fn ensure_default_role(&self, identity: &Identity) -> StoreResult<Role> {
        let mut records = self.records.write().await;
        let record = records
            .entry(identity.uid.clone())
            .or_insert_with(|| UserRecord::new(identity));
        Ok(record.role_enum())
    }
}
