//! Process-wide counters for command dispatch and the background task join path.
use std::sync::atomic::{AtomicU64, Ordering};

static COMMANDS_DISPATCHED: AtomicU64 = AtomicU64::new(0);
static USAGE_ERRORS: AtomicU64 = AtomicU64::new(0);
static PRIVILEGE_DENIALS: AtomicU64 = AtomicU64::new(0);
static TASKS_SCHEDULED: AtomicU64 = AtomicU64::new(0);
static JOINS_DELIVERED: AtomicU64 = AtomicU64::new(0);
static TASKS_ABANDONED: AtomicU64 = AtomicU64::new(0);
static JOINS_ORPHANED: AtomicU64 = AtomicU64::new(0);

pub fn inc_commands_dispatched() {
    COMMANDS_DISPATCHED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_usage_errors() {
    USAGE_ERRORS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_privilege_denials() {
    PRIVILEGE_DENIALS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_tasks_scheduled() {
    TASKS_SCHEDULED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_joins_delivered() {
    JOINS_DELIVERED.fetch_add(1, Ordering::Relaxed);
}

/// A pending task was dropped by its worker without joining (panic or early return).
pub fn inc_tasks_abandoned() {
    TASKS_ABANDONED.fetch_add(1, Ordering::Relaxed);
}

/// A join was drained after its issuer disconnected.
pub fn inc_joins_orphaned() {
    JOINS_ORPHANED.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub commands_dispatched: u64,
    pub usage_errors: u64,
    pub privilege_denials: u64,
    pub tasks_scheduled: u64,
    pub joins_delivered: u64,
    pub tasks_abandoned: u64,
    pub joins_orphaned: u64,
}

impl Snapshot {
    /// Tasks scheduled but not yet drained on the owning thread.
    pub fn in_flight(&self) -> u64 {
        self.tasks_scheduled.saturating_sub(self.joins_delivered)
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        commands_dispatched: COMMANDS_DISPATCHED.load(Ordering::Relaxed),
        usage_errors: USAGE_ERRORS.load(Ordering::Relaxed),
        privilege_denials: PRIVILEGE_DENIALS.load(Ordering::Relaxed),
        tasks_scheduled: TASKS_SCHEDULED.load(Ordering::Relaxed),
        joins_delivered: JOINS_DELIVERED.load(Ordering::Relaxed),
        tasks_abandoned: TASKS_ABANDONED.load(Ordering::Relaxed),
        joins_orphaned: JOINS_ORPHANED.load(Ordering::Relaxed),
    }
}
