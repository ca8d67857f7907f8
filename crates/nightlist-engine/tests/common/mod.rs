use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use nightlist_core::{EditScript, HeaderPolicy, Record, Sequence, SleepNight, Snapshot};
use nightlist_engine::{CoordinatorEvent, ListConsumer, MirrorConsumer};
use tokio::sync::{broadcast, Notify};

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(20);

/// Snapshot of in-progress nights with the given ids
#[allow(dead_code)]
pub fn snapshot(ids: impl IntoIterator<Item = i64>) -> Snapshot<SleepNight> {
    Some(
        ids.into_iter()
            .map(|id| SleepNight::started(id, id * 1000))
            .collect(),
    )
}

/// Sequence the coordinator builds from `snapshot` with the default header policy
#[allow(dead_code)]
pub fn wrapped(snapshot: Snapshot<SleepNight>) -> Sequence<SleepNight> {
    Sequence::from_snapshot(snapshot, HeaderPolicy::Always).unwrap()
}

/// Wait for the first event matching `predicate`, skipping the others
#[allow(dead_code)]
pub async fn wait_for<F>(
    events: &mut broadcast::Receiver<CoordinatorEvent>,
    predicate: F,
) -> CoordinatorEvent
where
    F: Fn(&CoordinatorEvent) -> bool,
{
    tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    panic!("event stream closed before the expected event")
                }
            }
        }
    })
    .await
    .expect("timed out waiting for coordinator event")
}

/// Collect events until `Stopped`
#[allow(dead_code)]
pub async fn collect_until_stopped(
    events: &mut broadcast::Receiver<CoordinatorEvent>,
) -> Vec<CoordinatorEvent> {
    tokio::time::timeout(EVENT_TIMEOUT, async {
        let mut seen = Vec::new();
        loop {
            match events.recv().await {
                Ok(CoordinatorEvent::Stopped) | Err(broadcast::error::RecvError::Closed) => {
                    return seen
                }
                Ok(event) => seen.push(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            }
        }
    })
    .await
    .expect("timed out waiting for Stopped")
}

/// Mirror consumer that also flags any apply made after `torn_down` was set
#[allow(dead_code)]
pub struct GuardedConsumer<R> {
    pub mirror: MirrorConsumer<R>,
    pub torn_down: Arc<AtomicBool>,
    pub late_applies: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl<R: Record> GuardedConsumer<R> {
    pub fn new(torn_down: Arc<AtomicBool>, late_applies: Arc<AtomicUsize>) -> Self {
        Self {
            mirror: MirrorConsumer::new(),
            torn_down,
            late_applies,
        }
    }
}

impl<R: Record> ListConsumer<R> for GuardedConsumer<R> {
    fn apply_edit_script(&mut self, script: &EditScript<R>, target: &Sequence<R>) {
        if self.torn_down.load(Ordering::SeqCst) {
            self.late_applies.fetch_add(1, Ordering::SeqCst);
        }
        self.mirror.apply_edit_script(script, target);
    }

    fn current_item_count(&self) -> Option<usize> {
        self.mirror.current_item_count()
    }
}

/// Consumer that only counts applies
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingConsumer {
    pub applies: usize,
    pub reported_count: Option<usize>,
}

impl<R: Record> ListConsumer<R> for CountingConsumer {
    fn apply_edit_script(&mut self, _script: &EditScript<R>, _target: &Sequence<R>) {
        self.applies += 1;
    }

    fn current_item_count(&self) -> Option<usize> {
        self.reported_count
    }
}

/// Record whose content comparison panics when both sides are poisoned
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Fragile {
    pub id: i64,
    pub poisoned: bool,
}

impl PartialEq for Fragile {
    fn eq(&self, other: &Self) -> bool {
        if self.poisoned && other.poisoned {
            panic!("content comparison of poisoned record {}", self.id);
        }
        self.id == other.id && self.poisoned == other.poisoned
    }
}

impl Record for Fragile {
    fn record_id(&self) -> i64 {
        self.id
    }
}

/// Blocks content comparisons until released
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct Latch {
    released: Mutex<bool>,
    unblocked: Condvar,
    entered: Notify,
}

#[allow(dead_code)]
impl Latch {
    /// Block the calling thread until the latch is released
    pub fn hold(&self) {
        self.entered.notify_one();
        let mut released = self.released.lock().unwrap();
        while !*released {
            released = self.unblocked.wait(released).unwrap();
        }
    }

    /// Resolves once a comparison is blocked on the latch
    pub async fn entered(&self) {
        tokio::time::timeout(EVENT_TIMEOUT, self.entered.notified())
            .await
            .expect("no comparison reached the latch");
    }

    pub fn release(&self) {
        *self.released.lock().unwrap() = true;
        self.unblocked.notify_all();
    }
}

/// Record whose content comparison waits on a latch when it carries one
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Latched {
    pub id: i64,
    pub latch: Option<Arc<Latch>>,
}

#[allow(dead_code)]
impl Latched {
    pub fn plain(id: i64) -> Self {
        Self { id, latch: None }
    }

    pub fn held(id: i64, latch: &Arc<Latch>) -> Self {
        Self {
            id,
            latch: Some(Arc::clone(latch)),
        }
    }
}

impl PartialEq for Latched {
    fn eq(&self, other: &Self) -> bool {
        for latch in [&self.latch, &other.latch].into_iter().flatten() {
            latch.hold();
        }
        self.id == other.id && self.latch.is_some() == other.latch.is_some()
    }
}

impl Record for Latched {
    fn record_id(&self) -> i64 {
        self.id
    }
}
