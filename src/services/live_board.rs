use crate::error::{option_to_result, AppResult};
use crate::repositories::{Snapshot, Subscription};
use crate::views::{self, EventSummary, Tab, TabCounts};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Dashboard state kept current from an event subscription
///
/// Holds the latest snapshot and answers tab queries from it. Only the
/// store changes events; the board never edits what it holds.
pub struct LiveBoard {
    latest: watch::Sender<Snapshot>,
    /// Raised by `shutdown`, lowered again when a run starts
    stop: watch::Sender<bool>,
}

impl LiveBoard {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(Vec::new());
        let (stop, _) = watch::channel(false);
        Self { latest, stop }
    }

    /// Consume `subscription` until it ends or [`LiveBoard::shutdown`] is
    /// called. Returns the number of snapshots applied.
    pub async fn run(&self, mut subscription: Subscription) -> usize {
        self.stop.send_replace(false);
        let mut stop = self.stop.subscribe();
        info!("Live board started");
        let mut applied = 0;

        loop {
            tokio::select! {
                next = subscription.next_snapshot() => match next {
                    Some(snapshot) => {
                        applied += 1;
                        debug!("Live board received {} events", snapshot.len());
                        self.latest.send_replace(snapshot);
                    }
                    None => {
                        warn!("Event subscription closed");
                        break;
                    }
                },
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow_and_update() {
                        info!("Live board shutting down");
                        break;
                    }
                }
            }
        }

        subscription.unsubscribe();
        info!("Live board stopped after {} snapshots", applied);
        applied
    }

    /// Stop the current [`LiveBoard::run`]. Has no effect on a run started
    /// afterwards.
    pub fn shutdown(&self) {
        self.stop.send_replace(true);
    }

    /// Latest snapshot, ordered by date descending
    pub fn latest(&self) -> Snapshot {
        self.latest.borrow().clone()
    }

    /// Event cards under `tab`, in snapshot order
    pub fn view(&self, tab: Tab) -> Vec<EventSummary> {
        let latest = self.latest.borrow();
        views::filter_by_tab(&latest, tab)
            .into_iter()
            .map(views::summarize)
            .collect()
    }

    /// Card for a single event in the latest snapshot
    pub fn event(&self, id: Uuid) -> AppResult<EventSummary> {
        let latest = self.latest.borrow();
        let found = latest.iter().find(|e| e.id == id).map(views::summarize);
        option_to_result(found, &format!("event {}", id))
    }

    pub fn counts(&self) -> TabCounts {
        views::tab_counts(&self.latest.borrow())
    }

    /// Receiver notified whenever a new snapshot is applied
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.latest.subscribe()
    }
}

impl Default for LiveBoard {
    fn default() -> Self {
        Self::new()
    }
}
