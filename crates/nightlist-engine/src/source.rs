//! Snapshot sources a coordinator can follow.

use async_trait::async_trait;
use nightlist_core::{Record, Snapshot};
use tokio::sync::{mpsc, watch};

/// Producer of storage snapshots
///
/// `Some(snapshot)` is one notification (itself `None` for a null
/// notification); `None` ends the stream.
#[async_trait]
pub trait SnapshotSource<R: Record>: Send {
    async fn next_snapshot(&mut self) -> Option<Snapshot<R>>;
}

#[async_trait]
impl<R: Record> SnapshotSource<R> for mpsc::Receiver<Snapshot<R>> {
    async fn next_snapshot(&mut self) -> Option<Snapshot<R>> {
        self.recv().await
    }
}

#[async_trait]
impl<R: Record> SnapshotSource<R> for mpsc::UnboundedReceiver<Snapshot<R>> {
    async fn next_snapshot(&mut self) -> Option<Snapshot<R>> {
        self.recv().await
    }
}

/// Source over a watch channel holding the latest snapshot
///
/// Emits the current value first, then every change. Changes made between two
/// reads collapse to the latest value. The stream ends when the sender is
/// dropped.
#[derive(Debug)]
pub struct WatchSource<R> {
    receiver: watch::Receiver<Snapshot<R>>,
    primed: bool,
}

impl<R: Record> WatchSource<R> {
    pub fn new(receiver: watch::Receiver<Snapshot<R>>) -> Self {
        Self {
            receiver,
            primed: false,
        }
    }
}

impl<R: Record> From<watch::Receiver<Snapshot<R>>> for WatchSource<R> {
    fn from(receiver: watch::Receiver<Snapshot<R>>) -> Self {
        Self::new(receiver)
    }
}

#[async_trait]
impl<R: Record> SnapshotSource<R> for WatchSource<R> {
    async fn next_snapshot(&mut self) -> Option<Snapshot<R>> {
        if self.primed {
            self.receiver.changed().await.ok()?;
        }
        self.primed = true;
        let snapshot = self.receiver.borrow_and_update().clone();
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightlist_core::SleepNight;

    #[tokio::test]
    async fn test_watch_source_emits_current_value_first() {
        let (tx, rx) = watch::channel::<Snapshot<SleepNight>>(None);
        let mut source = WatchSource::new(rx);

        assert_eq!(source.next_snapshot().await, Some(None));

        tx.send(Some(vec![SleepNight::started(1, 0)])).unwrap();
        let next = source.next_snapshot().await.unwrap().unwrap();
        assert_eq!(next.len(), 1);

        drop(tx);
        assert_eq!(source.next_snapshot().await, None);
    }

    #[tokio::test]
    async fn test_channel_source_ends_with_sender() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Snapshot<SleepNight>>();
        tx.send(Some(Vec::new())).unwrap();
        drop(tx);

        assert_eq!(rx.next_snapshot().await, Some(Some(Vec::new())));
        assert_eq!(rx.next_snapshot().await, None);
    }
}
