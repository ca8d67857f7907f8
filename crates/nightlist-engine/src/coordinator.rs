//! Update coordinator
//!
//! Diffs every submitted snapshot against the last applied sequence on the
//! blocking pool and hands the result to the [`ConsumerPort`]. The baseline
//! only advances once the port acknowledges the apply.
//!
//! ## Example
//!
//! ```
//! use nightlist_core::logging_facility::{init, Profile};
//! use nightlist_core::SleepNight;
//! use nightlist_engine::{CoordinatorConfig, MirrorConsumer, UpdateCoordinator};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> nightlist_core::Result<()> {
//! init(Profile::Development)?;
//! let (coordinator, mut port) =
//!     UpdateCoordinator::<SleepNight>::spawn(CoordinatorConfig::default())?;
//! let mut list = MirrorConsumer::new();
//!
//! coordinator.submit(Some(vec![SleepNight::started(1, 0)]))?;
//! let applied = port.apply_next(&mut list).await;
//!
//! assert!(applied.is_some());
//! assert_eq!(list.items().len(), 2);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use nightlist_core::{
    compute_diff_with, log_op_end, log_op_error, log_op_start, EditScript, ExError, ExErrorKind,
    Record, Result, Sequence, Snapshot,
};
use nightlist_core_types::{CycleContext, SubmissionId};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::{CoordinatorConfig, SubmissionPolicy};
use crate::consumer::{Ack, ConsumerPort, HandOff, Lifecycle};
use crate::events::CoordinatorEvent;
use crate::source::SnapshotSource;

const OP_SPAWN: &str = "spawn_coordinator";
const OP_SUBMIT: &str = "submit";
const OP_UPDATE_CYCLE: &str = "update_cycle";

struct Submission<R> {
    id: SubmissionId,
    snapshot: Snapshot<R>,
}

enum Command<R> {
    Submit(Submission<R>),
    Shutdown,
}

struct SubmitShared<R> {
    commands: mpsc::UnboundedSender<Command<R>>,
    last_id: Mutex<u64>,
    lifecycle: Arc<Lifecycle>,
}

/// Cloneable handle that submits snapshots to one coordinator
///
/// The driver keeps running while any handle is alive. Once every handle is
/// dropped it finishes the waiting snapshots and stops.
pub struct Submitter<R> {
    shared: Arc<SubmitShared<R>>,
}

impl<R> Clone for Submitter<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: Record> Submitter<R> {
    /// Submit a snapshot without waiting
    ///
    /// Ids increase by one per accepted submission, in the order the driver
    /// receives them.
    ///
    /// # Errors
    ///
    /// `Cancelled` once the coordinator was torn down.
    pub fn submit(&self, snapshot: Snapshot<R>) -> Result<SubmissionId> {
        if self.shared.lifecycle.is_cancelled() {
            return Err(cancelled(OP_SUBMIT));
        }
        let mut last_id = self
            .shared
            .last_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = SubmissionId::new(*last_id + 1);
        self.shared
            .commands
            .send(Command::Submit(Submission { id, snapshot }))
            .map_err(|_| cancelled(OP_SUBMIT))?;
        *last_id += 1;
        Ok(id)
    }
}

/// Runs diffs off the consumer's context and publishes them to its port
pub struct UpdateCoordinator<R> {
    submitter: Submitter<R>,
    events: broadcast::Sender<CoordinatorEvent>,
    lifecycle: Arc<Lifecycle>,
    runtime: Handle,
    driver: JoinHandle<()>,
}

impl<R: Record> UpdateCoordinator<R> {
    /// Start a coordinator on the current Tokio runtime
    ///
    /// # Errors
    ///
    /// `Configuration` when called outside a Tokio runtime or when `config`
    /// fails validation.
    pub fn spawn(config: CoordinatorConfig) -> Result<(Self, ConsumerPort<R>)> {
        config.validate().map_err(|err| err.with_op(OP_SPAWN))?;
        let runtime = Handle::try_current().map_err(|e| {
            ExError::new(ExErrorKind::Configuration)
                .with_op(OP_SPAWN)
                .with_message(format!("no Tokio runtime: {}", e))
        })?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (handoffs_tx, handoffs_rx) = mpsc::channel(1);
        let (events, _) = broadcast::channel(config.event_capacity);
        let lifecycle = Arc::new(Lifecycle::default());

        let driver = Driver {
            config,
            commands: commands_rx,
            commands_closed: false,
            handoffs: handoffs_tx,
            events: events.clone(),
            lifecycle: Arc::clone(&lifecycle),
            last_applied: Sequence::empty(),
            pending: VecDeque::new(),
            superseded_in_row: 0,
        };
        let driver = runtime.spawn(driver.run());

        let submitter = Submitter {
            shared: Arc::new(SubmitShared {
                commands: commands_tx,
                last_id: Mutex::new(0),
                lifecycle: Arc::clone(&lifecycle),
            }),
        };
        let port = ConsumerPort::new(handoffs_rx, Arc::clone(&lifecycle));

        Ok((
            Self {
                submitter,
                events,
                lifecycle,
                runtime,
                driver,
            },
            port,
        ))
    }

    /// Submit a snapshot without waiting
    ///
    /// # Errors
    ///
    /// `Cancelled` once the coordinator was torn down.
    pub fn submit(&self, snapshot: Snapshot<R>) -> Result<SubmissionId> {
        self.submitter.submit(snapshot)
    }

    pub fn submitter(&self) -> Submitter<R> {
        self.submitter.clone()
    }

    /// Subscribe to submission outcomes
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    /// Submit every snapshot `source` emits until it ends or the coordinator
    /// is torn down
    pub fn follow<S>(&self, mut source: S) -> JoinHandle<()>
    where
        S: SnapshotSource<R> + 'static,
    {
        let submitter = self.submitter();
        self.runtime.spawn(async move {
            while let Some(snapshot) = source.next_snapshot().await {
                if submitter.submit(snapshot).is_err() {
                    break;
                }
            }
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.lifecycle.is_cancelled()
    }

    /// Check if the driver task has exited
    pub fn is_finished(&self) -> bool {
        self.driver.is_finished()
    }

    /// Cancel the coordinator
    ///
    /// When this returns, no edit script reaches the consumer any more; an
    /// apply already running on the consumer's context is waited for. Waiting
    /// results and snapshots are published as `Discarded`.
    ///
    /// This blocks the calling thread while that apply runs. From async code
    /// use [`UpdateCoordinator::shutdown`], which keeps the runtime worker free.
    ///
    /// Must not be called from inside [`ListConsumer::apply_edit_script`]
    /// (it would wait for itself).
    ///
    /// [`ListConsumer::apply_edit_script`]: crate::ListConsumer::apply_edit_script
    pub fn teardown(&self) {
        self.lifecycle.cancel();
        close_gate(&self.lifecycle, &self.submitter.shared.commands);
    }

    /// Async variant of [`UpdateCoordinator::teardown`]
    ///
    /// Cancels at once; the wait for a running apply happens on the blocking
    /// pool. Resolves with the same guarantee as `teardown`.
    pub async fn shutdown(&self) {
        self.lifecycle.cancel();
        let lifecycle = Arc::clone(&self.lifecycle);
        let commands = self.submitter.shared.commands.clone();
        let closed = self
            .runtime
            .spawn_blocking(move || close_gate(&lifecycle, &commands))
            .await;
        if closed.is_err() {
            close_gate(&self.lifecycle, &self.submitter.shared.commands);
        }
    }
}

/// Wait out a running apply, then stop the driver
fn close_gate<R>(lifecycle: &Lifecycle, commands: &mpsc::UnboundedSender<Command<R>>) {
    let _gate = lifecycle.gate();
    commands.send(Command::Shutdown).ok();
}

enum Flow {
    Continue,
    Stop,
}

/// Process-scoped coordinator state, owned by the driver task
struct Driver<R> {
    config: CoordinatorConfig,
    commands: mpsc::UnboundedReceiver<Command<R>>,
    commands_closed: bool,
    handoffs: mpsc::Sender<HandOff<R>>,
    events: broadcast::Sender<CoordinatorEvent>,
    lifecycle: Arc<Lifecycle>,
    last_applied: Sequence<R>,
    pending: VecDeque<Submission<R>>,
    superseded_in_row: u32,
}

impl<R: Record> Driver<R> {
    async fn run(mut self) {
        while !self.lifecycle.is_cancelled() {
            let Some(submission) = self.next_submission().await else {
                break;
            };
            if let Flow::Stop = self.run_cycle(submission).await {
                break;
            }
        }
        self.drain();
        self.publish(CoordinatorEvent::Stopped);
    }

    async fn next_submission(&mut self) -> Option<Submission<R>> {
        loop {
            if self.lifecycle.is_cancelled() {
                return None;
            }
            if let Some(submission) = self.pending.pop_front() {
                return Some(submission);
            }
            if self.commands_closed {
                return None;
            }
            let command = self.commands.recv().await;
            self.accept(command);
        }
    }

    fn accept(&mut self, command: Option<Command<R>>) {
        match command {
            Some(Command::Submit(submission)) => self.enqueue(submission),
            Some(Command::Shutdown) | None => self.commands_closed = true,
        }
    }

    fn enqueue(&mut self, submission: Submission<R>) {
        match self.config.submission {
            SubmissionPolicy::Queue => {}
            SubmissionPolicy::Latest | SubmissionPolicy::Supersede => {
                for older in std::mem::take(&mut self.pending) {
                    self.publish(CoordinatorEvent::Coalesced {
                        submission: older.id,
                        into: submission.id,
                    });
                }
            }
        }
        self.pending.push_back(submission);
    }

    async fn run_cycle(&mut self, submission: Submission<R>) -> Flow {
        let ctx = CycleContext::new(submission.id);
        let started = Instant::now();
        log_op_start!(
            OP_UPDATE_CYCLE,
            cycle_id = %ctx.cycle_id,
            submission = ctx.submission.value(),
            old_len = self.last_applied.len()
        );

        let baseline = self.last_applied.clone();
        let header = self.config.header;
        let diff_config = self.config.diff_config();
        let snapshot = submission.snapshot;
        let mut job = tokio::task::spawn_blocking(
            move || -> Result<(EditScript<R>, Sequence<R>)> {
                let target = Sequence::from_snapshot(snapshot, header)?;
                let script = compute_diff_with(&baseline, &target, &diff_config);
                Ok((script, target))
            },
        );

        let joined = loop {
            tokio::select! {
                joined = &mut job => break Some(joined),
                command = self.commands.recv(), if !self.commands_closed => {
                    self.accept(command);
                    if self.lifecycle.is_cancelled() {
                        break None;
                    }
                }
                _ = self.handoffs.closed() => break None,
            }
        };
        let Some(joined) = joined else {
            return self.discard(&ctx, started);
        };

        self.collect_ready();
        let (script, target) = match joined {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => return self.fail(&ctx, started, err),
            Err(join_err) => {
                let err = ExError::new(ExErrorKind::ComputationFault)
                    .with_op(OP_UPDATE_CYCLE)
                    .with_message(join_err.to_string());
                return self.fail(&ctx, started, err);
            }
        };

        if self.config.submission == SubmissionPolicy::Supersede
            && self.superseded_in_row < self.config.supersede_limit
        {
            if let Some(newer) = self.pending.back().map(|newer| newer.id) {
                self.superseded_in_row += 1;
                log_op_end!(
                    OP_UPDATE_CYCLE,
                    duration_ms = started.elapsed().as_millis() as u64,
                    cycle_id = %ctx.cycle_id,
                    submission = ctx.submission.value(),
                    outcome = "superseded"
                );
                self.publish(CoordinatorEvent::Superseded {
                    submission: ctx.submission,
                    by: newer,
                });
                return Flow::Continue;
            }
        }

        if self.lifecycle.is_cancelled() {
            return self.discard(&ctx, started);
        }

        let stats = script.stats();
        let (ack_tx, mut ack_rx) = oneshot::channel();
        let handoff = HandOff {
            submission: ctx.submission,
            cycle_id: ctx.cycle_id.clone(),
            script,
            target: target.clone(),
            ack: ack_tx,
        };
        // Every earlier hand-off was received before it was acknowledged, so
        // the slot is free
        if self.handoffs.send(handoff).await.is_err() {
            return self.discard(&ctx, started);
        }

        let ack: Option<Ack> = loop {
            tokio::select! {
                ack = &mut ack_rx => break ack.ok(),
                command = self.commands.recv(), if !self.commands_closed => {
                    self.accept(command);
                    if self.lifecycle.is_cancelled() {
                        break ack_rx.try_recv().ok();
                    }
                }
            }
        };
        let Some(ack) = ack else {
            return self.discard(&ctx, started);
        };

        if let Some(reported) = ack.item_count {
            if reported != target.len() {
                tracing::error!(
                    component = module_path!(),
                    op = OP_UPDATE_CYCLE,
                    cycle_id = %ctx.cycle_id,
                    expected = target.len(),
                    reported,
                    "consumer item count diverged from applied target"
                );
            }
        }

        let item_count = target.len();
        self.last_applied = target;
        self.superseded_in_row = 0;
        log_op_end!(
            OP_UPDATE_CYCLE,
            duration_ms = started.elapsed().as_millis() as u64,
            cycle_id = %ctx.cycle_id,
            submission = ctx.submission.value(),
            new_len = item_count,
            op_count = stats.total(),
            outcome = "applied"
        );
        self.publish(CoordinatorEvent::Applied {
            submission: ctx.submission,
            cycle_id: ctx.cycle_id.clone(),
            stats,
            item_count,
        });
        Flow::Continue
    }

    fn fail(&self, ctx: &CycleContext, started: Instant, err: ExError) -> Flow {
        let err = err.with_cycle_id(ctx.cycle_id.clone());
        log_op_error!(
            OP_UPDATE_CYCLE,
            err.clone(),
            duration_ms = started.elapsed().as_millis() as u64,
            cycle_id = %ctx.cycle_id,
            submission = ctx.submission.value()
        );
        self.publish(CoordinatorEvent::Failed {
            submission: ctx.submission,
            cycle_id: ctx.cycle_id.clone(),
            error: err,
        });
        Flow::Continue
    }

    fn discard(&self, ctx: &CycleContext, started: Instant) -> Flow {
        log_op_end!(
            OP_UPDATE_CYCLE,
            duration_ms = started.elapsed().as_millis() as u64,
            cycle_id = %ctx.cycle_id,
            submission = ctx.submission.value(),
            outcome = "discarded"
        );
        self.publish(CoordinatorEvent::Discarded {
            submission: ctx.submission,
        });
        Flow::Stop
    }

    /// Accept every command already sent, without waiting
    fn collect_ready(&mut self) {
        while !self.commands_closed {
            match self.commands.try_recv() {
                Ok(command) => self.accept(Some(command)),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => self.accept(None),
            }
        }
    }

    /// Discard everything still waiting, including unread commands
    fn drain(&mut self) {
        self.commands.close();
        while let Ok(command) = self.commands.try_recv() {
            if let Command::Submit(submission) = command {
                self.pending.push_back(submission);
            }
        }
        for submission in std::mem::take(&mut self.pending) {
            self.publish(CoordinatorEvent::Discarded {
                submission: submission.id,
            });
        }
    }

    fn publish(&self, event: CoordinatorEvent) {
        self.events.send(event).ok();
    }
}

fn cancelled(op: &str) -> ExError {
    ExError::new(ExErrorKind::Cancelled)
        .with_op(op)
        .with_message("coordinator was torn down")
}
