use crate::models::Event;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Full copy of the events collection, ordered by date descending
pub type Snapshot = Vec<Event>;

/// Live feed of collection snapshots
///
/// A background producer pushes a fresh snapshot on every change. Dropping
/// the subscription (or calling [`Subscription::unsubscribe`]) stops the
/// producer; subscribing again starts a new one from the current state.
pub struct Subscription {
    rx: mpsc::Receiver<Snapshot>,
    producer: JoinHandle<()>,
}

impl Subscription {
    /// Spawn `producer` on the runtime, handing it the sending half of a
    /// channel holding at most `buffer` undelivered snapshots
    pub fn spawn<F, Fut>(buffer: usize, producer: F) -> Self
    where
        F: FnOnce(mpsc::Sender<Snapshot>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let producer = tokio::spawn(producer(tx));
        Self { rx, producer }
    }

    /// Wait for the next snapshot; `None` once the producer has stopped
    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Stop receiving snapshots
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Snapshot>> {
        self.rx.poll_recv(cx)
    }
}
