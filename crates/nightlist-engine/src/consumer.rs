//! Consumer side of the coordinator.
//!
//! A [`ConsumerPort`] is owned by the consumer's execution context. Results
//! reach the consumer only through the port, so the consumer is only ever
//! called on the context that owns it, one hand-off at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nightlist_core::{
    apply_list_update, DiffStats, DisplayItem, EditScript, ListUpdate, Record, Sequence,
};
use nightlist_core_types::{CycleId, SubmissionId};
use tokio::sync::{mpsc, oneshot};

/// Receiver of edit scripts produced by the coordinator
///
/// Called on the consumer's context, in submission order. `target` is the
/// sequence the script produces; an empty script is a no-op.
pub trait ListConsumer<R: Record> {
    fn apply_edit_script(&mut self, script: &EditScript<R>, target: &Sequence<R>);

    /// Number of rows the consumer holds after applying, if it tracks them
    fn current_item_count(&self) -> Option<usize> {
        None
    }
}

/// Binds one displayed row
///
/// Called by [`MirrorConsumer`] for every row that was inserted or whose
/// content changed.
pub trait RowBinder<R> {
    fn bind_header(&mut self, position: usize);
    fn bind_entry(&mut self, position: usize, record: &R);
}

/// Binder that ignores every row
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBinder;

impl<R> RowBinder<R> for NoopBinder {
    fn bind_header(&mut self, _position: usize) {}
    fn bind_entry(&mut self, _position: usize, _record: &R) {}
}

/// Consumer that mirrors the displayed list in memory
///
/// Scripts are replayed through their sequential list updates, the way a
/// list view is notified row by row. Inserted and changed rows are then bound
/// through the [`RowBinder`].
#[derive(Debug, Clone)]
pub struct MirrorConsumer<R, B = NoopBinder> {
    items: Vec<DisplayItem<R>>,
    binder: B,
    applied: u64,
}

impl<R: Record> MirrorConsumer<R> {
    pub fn new() -> Self {
        Self::with_binder(NoopBinder)
    }
}

impl<R: Record> Default for MirrorConsumer<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record, B: RowBinder<R>> MirrorConsumer<R, B> {
    pub fn with_binder(binder: B) -> Self {
        Self {
            items: Vec::new(),
            binder,
            applied: 0,
        }
    }

    /// Rows as currently displayed
    pub fn items(&self) -> &[DisplayItem<R>] {
        &self.items
    }

    pub fn binder(&self) -> &B {
        &self.binder
    }

    /// Number of scripts applied so far
    pub fn applied_count(&self) -> u64 {
        self.applied
    }

    /// Record id a click at `position` resolves to
    pub fn click(&self, position: usize) -> Option<i64> {
        self.items.get(position).and_then(DisplayItem::click_target)
    }

    fn bind(&mut self, position: usize) {
        match self.items.get(position) {
            Some(DisplayItem::Header) => self.binder.bind_header(position),
            Some(DisplayItem::Entry(record)) => self.binder.bind_entry(position, record),
            None => {}
        }
    }

    fn replace_all(&mut self, target: &Sequence<R>) {
        self.items = target.items().to_vec();
        for position in 0..self.items.len() {
            self.bind(position);
        }
    }
}

impl<R: Record, B: RowBinder<R>> ListConsumer<R> for MirrorConsumer<R, B> {
    fn apply_edit_script(&mut self, script: &EditScript<R>, target: &Sequence<R>) {
        self.applied += 1;
        if script.is_empty() {
            return;
        }

        let replayed = script.list_updates().and_then(|updates| {
            let mut items = self.items.clone();
            let mut rebind = Vec::new();
            for update in updates {
                apply_list_update(&mut items, update, target)?;
                match update {
                    ListUpdate::Inserted { position } | ListUpdate::Changed { position } => {
                        rebind.push(position)
                    }
                    ListUpdate::Removed { .. } | ListUpdate::Moved { .. } => {}
                }
            }
            Ok((items, rebind))
        });

        match replayed {
            Ok((items, rebind)) if items.as_slice() == target.items() => {
                self.items = items;
                for position in rebind {
                    self.bind(position);
                }
            }
            Ok(_) => {
                tracing::warn!(
                    component = module_path!(),
                    target_len = target.len(),
                    "replayed list diverged from target; rebinding all rows"
                );
                self.replace_all(target);
            }
            Err(err) => {
                tracing::warn!(
                    component = module_path!(),
                    err.code = err.code(),
                    err.message = err.message(),
                    "edit script did not replay; rebinding all rows"
                );
                self.replace_all(target);
            }
        }
    }

    fn current_item_count(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Cancellation token shared by a coordinator and its port
///
/// `apply_gate` is held for the whole of an apply, so a teardown that takes it
/// after cancelling knows no apply is running and none will start.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    cancelled: AtomicBool,
    apply_gate: Mutex<()>,
}

impl Lifecycle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn gate(&self) -> MutexGuard<'_, ()> {
        self.apply_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Acknowledgment of an applied hand-off
#[derive(Debug)]
pub(crate) struct Ack {
    pub item_count: Option<usize>,
}

/// One finished cycle waiting for the consumer
#[derive(Debug)]
pub(crate) struct HandOff<R> {
    pub submission: SubmissionId,
    pub cycle_id: CycleId,
    pub script: EditScript<R>,
    pub target: Sequence<R>,
    pub ack: oneshot::Sender<Ack>,
}

/// A hand-off the consumer applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCycle {
    pub submission: SubmissionId,
    pub cycle_id: CycleId,
    pub stats: DiffStats,
}

/// Consumer end of an [`UpdateCoordinator`](crate::UpdateCoordinator)
///
/// Closing or dropping the port tears the coordinator down.
#[derive(Debug)]
pub struct ConsumerPort<R> {
    handoffs: mpsc::Receiver<HandOff<R>>,
    lifecycle: Arc<Lifecycle>,
}

impl<R: Record> ConsumerPort<R> {
    pub(crate) fn new(handoffs: mpsc::Receiver<HandOff<R>>, lifecycle: Arc<Lifecycle>) -> Self {
        Self {
            handoffs,
            lifecycle,
        }
    }

    /// Wait for the next hand-off and apply it to `consumer`
    ///
    /// Returns `None` once the coordinator has stopped or was torn down.
    pub async fn apply_next<C>(&mut self, consumer: &mut C) -> Option<AppliedCycle>
    where
        C: ListConsumer<R> + ?Sized,
    {
        if self.lifecycle.is_cancelled() {
            return None;
        }
        let handoff = self.handoffs.recv().await?;
        self.deliver(handoff, consumer)
    }

    /// Blocking variant of [`ConsumerPort::apply_next`] for a consumer thread
    /// outside the runtime
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_apply_next<C>(&mut self, consumer: &mut C) -> Option<AppliedCycle>
    where
        C: ListConsumer<R> + ?Sized,
    {
        if self.lifecycle.is_cancelled() {
            return None;
        }
        let handoff = self.handoffs.blocking_recv()?;
        self.deliver(handoff, consumer)
    }

    /// Apply every hand-off that is ready, without waiting
    pub fn try_apply_pending<C>(&mut self, consumer: &mut C) -> Vec<AppliedCycle>
    where
        C: ListConsumer<R> + ?Sized,
    {
        let mut applied = Vec::new();
        while !self.lifecycle.is_cancelled() {
            let Ok(handoff) = self.handoffs.try_recv() else {
                break;
            };
            match self.deliver(handoff, consumer) {
                Some(cycle) => applied.push(cycle),
                None => break,
            }
        }
        applied
    }

    /// Check if the coordinator was torn down
    pub fn is_cancelled(&self) -> bool {
        self.lifecycle.is_cancelled()
    }

    /// Tear down the coordinator from the consumer's side
    ///
    /// After this returns no edit script reaches the consumer.
    pub fn close(self) {
        drop(self);
    }

    fn deliver<C>(&mut self, handoff: HandOff<R>, consumer: &mut C) -> Option<AppliedCycle>
    where
        C: ListConsumer<R> + ?Sized,
    {
        let _gate = self.lifecycle.gate();
        if self.lifecycle.is_cancelled() {
            self.handoffs.close();
            return None;
        }
        consumer.apply_edit_script(&handoff.script, &handoff.target);
        let item_count = consumer.current_item_count();

        // Ack before the gate is released
        handoff.ack.send(Ack { item_count }).ok();
        Some(AppliedCycle {
            submission: handoff.submission,
            cycle_id: handoff.cycle_id,
            stats: handoff.script.stats(),
        })
    }
}

impl<R> Drop for ConsumerPort<R> {
    fn drop(&mut self) {
        self.lifecycle.cancel();
        self.handoffs.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightlist_core::{compute_diff, HeaderPolicy, SleepNight};

    #[derive(Default)]
    struct RecordingBinder {
        bound: Vec<(usize, Option<i64>)>,
    }

    impl RowBinder<SleepNight> for RecordingBinder {
        fn bind_header(&mut self, position: usize) {
            self.bound.push((position, None));
        }

        fn bind_entry(&mut self, position: usize, record: &SleepNight) {
            self.bound.push((position, Some(record.night_id)));
        }
    }

    fn seq(ids: &[i64]) -> Sequence<SleepNight> {
        let nights = ids.iter().map(|&id| SleepNight::started(id, id)).collect();
        Sequence::from_snapshot(Some(nights), HeaderPolicy::Always).unwrap()
    }

    #[test]
    fn test_mirror_binds_inserted_rows_by_kind() {
        let mut mirror = MirrorConsumer::with_binder(RecordingBinder::default());
        let target = seq(&[5]);

        mirror.apply_edit_script(&compute_diff(&Sequence::empty(), &target), &target);

        assert_eq!(mirror.items(), target.items());
        assert_eq!(mirror.binder().bound, vec![(0, None), (1, Some(5))]);
        assert_eq!(mirror.click(0), None);
        assert_eq!(mirror.click(1), Some(5));
    }

    #[test]
    fn test_mirror_moves_do_not_rebind() {
        let mut mirror = MirrorConsumer::with_binder(RecordingBinder::default());
        let first = seq(&[1, 2, 3]);
        mirror.apply_edit_script(&compute_diff(&Sequence::empty(), &first), &first);
        let bound_before = mirror.binder().bound.len();

        let second = seq(&[3, 1, 2]);
        mirror.apply_edit_script(&compute_diff(&first, &second), &second);

        assert_eq!(mirror.items(), second.items());
        assert_eq!(mirror.binder().bound.len(), bound_before);
        assert_eq!(mirror.applied_count(), 2);
    }

    #[test]
    fn test_mirror_recovers_from_script_for_other_list() {
        let mut mirror: MirrorConsumer<SleepNight> = MirrorConsumer::new();
        let target = seq(&[1]);
        let stale = compute_diff(&seq(&[7, 8]), &target);

        mirror.apply_edit_script(&stale, &target);

        assert_eq!(mirror.items(), target.items());
        assert_eq!(mirror.current_item_count(), Some(2));
    }
}
