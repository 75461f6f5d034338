//! Background work and the owning-thread join queue.
//!
//! Commands hand slow work (record store calls, directory listings) to
//! [`TaskScheduler::schedule`]. The work runs on tokio's blocking pool and receives a
//! [`PendingTask`]; it finishes by calling exactly one of `succeed`, `fail` or `join`,
//! which consumes the task and pushes a [`Join`] onto an unbounded channel. The owning
//! thread calls [`JoinQueue::drain`] once per tick; each join is run there, in enqueue
//! order, after the issuer's identity token has been re-resolved. While a join for a
//! departed issuer runs, [`Host::reply`] logs instead of writing to the console.
//!
//! Notes:
//! * Work never sees a [`Host`] or a [`Viewer`]; it carries a [`UserId`] at most.
//! * A `PendingTask` dropped without being consumed (the work panicked or returned
//!   early) joins `on_failure` from its `Drop`, so every scheduled task yields one outcome.
//! * No retries and no cancellation. Work runs until it returns.
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, trace, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::command::Command;
use crate::host::{Host, UserId, Viewer};
use crate::metrics;

/// Owning-thread callback carrying a result computed in the background.
///
/// The viewer argument is the re-resolved issuer, `None` for the console or a
/// departed player.
pub type JoinHandler = Box<dyn FnOnce(&mut Host, Option<&Viewer>) + Send>;

/// What runs when a join is drained.
pub enum Continuation {
    Success(Arc<dyn Command>),
    Failure(Arc<dyn Command>),
    Handler(JoinHandler),
}

impl Continuation {
    fn kind(&self) -> &'static str {
        match self {
            Continuation::Success(_) => "success",
            Continuation::Failure(_) => "failure",
            Continuation::Handler(_) => "handler",
        }
    }
}

/// One queued completion.
pub struct Join {
    pub task_id: u64,
    pub label: &'static str,
    pub issuer: Option<UserId>,
    pub continuation: Continuation,
    /// Set when the task was dropped without an explicit outcome.
    pub abandoned: bool,
}

#[derive(Default)]
struct Shared {
    next_id: AtomicU64,
    outstanding: AtomicUsize,
}

/// Create a scheduler and the queue its joins arrive on.
///
/// `runtime` provides the blocking pool; the queue must be drained from a single thread.
pub fn channel(runtime: Handle) -> (TaskScheduler, JoinQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared::default());
    (
        TaskScheduler {
            tx,
            runtime,
            shared: shared.clone(),
        },
        JoinQueue { rx, shared },
    )
}

/// Submits background work. Lives in the [`Host`]; cheap to clone.
#[derive(Clone)]
pub struct TaskScheduler {
    tx: mpsc::UnboundedSender<Join>,
    runtime: Handle,
    shared: Arc<Shared>,
}

impl TaskScheduler {
    /// Run `work` on the blocking pool on behalf of `command`.
    ///
    /// `issuer` is the identity token to re-resolve at join time. Returns the task id.
    pub fn schedule<F>(
        &self,
        command: Arc<dyn Command>,
        issuer: Option<UserId>,
        label: &'static str,
        work: F,
    ) -> u64
    where
        F: FnOnce(PendingTask) + Send + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.shared.outstanding.fetch_add(1, Ordering::SeqCst);
        metrics::inc_tasks_scheduled();
        debug!(
            "task {} ({}) scheduled for {}",
            id,
            label,
            issuer.map(|t| t.to_string()).unwrap_or_else(|| "console".into())
        );
        let pending = PendingTask {
            id,
            label,
            issuer,
            command: Some(command),
            tx: self.tx.clone(),
            shared: self.shared.clone(),
        };
        // If the runtime is shutting down the closure is dropped unrun and the
        // task's Drop still joins the failure path.
        self.runtime.spawn_blocking(move || work(pending));
        id
    }

    /// Tasks scheduled whose join has not been drained yet.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }
}

/// One in-flight unit of work. Consumed by exactly one of its outcome methods.
pub struct PendingTask {
    id: u64,
    label: &'static str,
    issuer: Option<UserId>,
    command: Option<Arc<dyn Command>>,
    tx: mpsc::UnboundedSender<Join>,
    shared: Arc<Shared>,
}

impl PendingTask {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn issuer(&self) -> Option<UserId> {
        self.issuer
    }

    /// Join the command's `on_success`.
    pub fn succeed(mut self) {
        if let Some(command) = self.command.take() {
            self.send(Continuation::Success(command), false);
        }
    }

    /// Join the command's `on_failure`.
    pub fn fail(mut self) {
        if let Some(command) = self.command.take() {
            self.send(Continuation::Failure(command), false);
        }
    }

    /// Join an arbitrary handler instead of the command hooks, typically carrying
    /// the data the work produced.
    pub fn join<H>(mut self, handler: H)
    where
        H: FnOnce(&mut Host, Option<&Viewer>) + Send + 'static,
    {
        if self.command.take().is_some() {
            self.send(Continuation::Handler(Box::new(handler)), false);
        }
    }

    fn send(&self, continuation: Continuation, abandoned: bool) {
        trace!("task {} joining {}", self.id, continuation.kind());
        let join = Join {
            task_id: self.id,
            label: self.label,
            issuer: self.issuer,
            continuation,
            abandoned,
        };
        if self.tx.send(join).is_err() {
            self.shared.outstanding.fetch_sub(1, Ordering::SeqCst);
            warn!("join queue closed; task {} ({}) result lost", self.id, self.label);
        }
    }
}

impl Drop for PendingTask {
    fn drop(&mut self) {
        if let Some(command) = self.command.take() {
            metrics::inc_tasks_abandoned();
            warn!(
                "task {} ({}) ended without a result; joining failure",
                self.id, self.label
            );
            self.send(Continuation::Failure(command), true);
        }
    }
}

/// Owning-thread end of the join channel.
pub struct JoinQueue {
    rx: mpsc::UnboundedReceiver<Join>,
    shared: Arc<Shared>,
}

impl JoinQueue {
    /// Run every queued join in FIFO order. Returns how many ran.
    pub fn drain(&mut self, host: &mut Host) -> usize {
        let mut ran = 0;
        while let Ok(join) = self.rx.try_recv() {
            self.shared.outstanding.fetch_sub(1, Ordering::SeqCst);
            let viewer = join.issuer.and_then(|token| host.players.resolve(token));
            if let (Some(token), None) = (join.issuer, viewer.as_ref()) {
                metrics::inc_joins_orphaned();
                debug!(
                    "task {} ({}): issuer {} left before join",
                    join.task_id, join.label, token
                );
            }
            debug!(
                "task {} ({}) {}{}",
                join.task_id,
                join.label,
                join.continuation.kind(),
                if join.abandoned { " (abandoned)" } else { "" }
            );
            metrics::inc_joins_delivered();
            host.departed_issuer = join.issuer.filter(|_| viewer.is_none());
            match join.continuation {
                Continuation::Success(command) => command.on_success(host, viewer.as_ref()),
                Continuation::Failure(command) => command.on_failure(host, viewer.as_ref()),
                Continuation::Handler(handler) => handler(host, viewer.as_ref()),
            }
            host.departed_issuer = None;
            ran += 1;
        }
        ran
    }

    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }
}
