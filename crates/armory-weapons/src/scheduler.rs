//! Deferred action queue
//!
//! Weapons never sleep. Anything that resolves later (a melee windup) is queued
//! here with the token of the runtime that asked for it; when the task comes due
//! the simulation hands it back to the owner, which drops it if that runtime has
//! since been replaced.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use armory_core::EntityId;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identity of one equipped runtime instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuntimeToken(u64);

impl RuntimeToken {
    /// Allocate a fresh token
    pub fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, AtomicOrdering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Work a runtime deferred to a later time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Resolve the hit test of a melee swing
    MeleeStrike,
}

/// A queued continuation
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub due: f64,
    pub owner: EntityId,
    pub token: RuntimeToken,
    pub action: DeferredAction,
    seq: u64,
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is a max-heap)
        other
            .due
            .partial_cmp(&self.due)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-queue of deferred actions keyed by due time, then insertion order
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<ScheduledTask>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to resume at `due`
    pub fn schedule(&mut self, due: f64, owner: EntityId, token: RuntimeToken, action: DeferredAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledTask {
            due,
            owner,
            token,
            action,
            seq,
        });
    }

    /// Remove and return every task due at or before `now`, earliest first
    pub fn pop_due(&mut self, now: f64) -> Vec<ScheduledTask> {
        let mut due = Vec::new();
        while self.queue.peek().is_some_and(|task| task.due <= now) {
            if let Some(task) = self.queue.pop() {
                due.push(task);
            }
        }
        due
    }

    /// Drop every task belonging to `owner`, returning how many were removed
    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|task| task.owner != owner);
        before - self.queue.len()
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<f64> {
        self.queue.peek().map(|task| task.due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
