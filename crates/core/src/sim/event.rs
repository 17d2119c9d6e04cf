//! Discrete-event kernel for the virtual clock.
//!
//! This module provides the scheduling machinery the timed units run on:
//! 1. **`EventQueue`:** a priority queue of (time, insertion-order) keys. Pops
//!    are strictly ordered by fire time, then by scheduling order, so the
//!    model is deterministic by construction.
//! 2. **`PayloadEvent`:** a per-unit registry that owns the instruction
//!    payloads of scheduled events and supports cancellation by predicate.
//!
//! The split matters for flush recovery: the global queue only carries opaque
//! keys, while each unit's registry is the single owner of its pending
//! payloads. Cancelling removes the payload from the registry; when the key
//! later surfaces on the queue it no longer resolves and is discarded. No
//! event payload can leak past a flush.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::common::Tick;
use crate::core::inst::{Inst, InstPtr};

/// Which unit an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventTarget {
    /// Execution pipe, by pipe index.
    Pipe(usize),
    /// The load/store unit.
    Lsu,
}

/// What phase of a unit's lifecycle the event drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Execution latency elapsed: write the scoreboard, free the unit.
    Execute,
    /// Completion: send the downstream credit.
    Complete,
}

/// A key popped from the queue. The payload lives in the owning unit's
/// [`PayloadEvent`] registry, looked up by `seq`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiredEvent {
    /// Fire time.
    pub time: Tick,
    /// Global scheduling order, unique per event.
    pub seq: u64,
    /// Owning unit.
    pub target: EventTarget,
    /// Event phase.
    pub kind: EventKind,
}

impl Ord for FiredEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the earliest (time, seq) pops
        // first.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FiredEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The global event queue and virtual clock.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<FiredEvent>,
    now: Tick,
    next_seq: u64,
}

impl EventQueue {
    /// Creates an empty queue at cycle zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cycle.
    #[inline]
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Advances the clock. Events are only delivered through
    /// [`EventQueue::pop_due`], so advancing never drops anything.
    pub fn advance(&mut self, to: Tick) {
        debug_assert!(to >= self.now);
        self.now = to;
    }

    /// Schedules an event `delay` cycles from now and returns its sequence
    /// number, which the owning registry uses as the payload key.
    pub fn schedule(&mut self, delay: Tick, target: EventTarget, kind: EventKind) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(FiredEvent {
            time: self.now + delay,
            seq,
            target,
            kind,
        });
        seq
    }

    /// Pops the next event due at or before the current cycle, in
    /// (time, seq) order. Returns `None` once nothing else is due this cycle.
    pub fn pop_due(&mut self) -> Option<FiredEvent> {
        match self.heap.peek() {
            Some(ev) if ev.time <= self.now => self.heap.pop(),
            _ => None,
        }
    }

    /// Number of keys still queued (including keys whose payloads were
    /// cancelled and will be discarded on pop).
    pub fn pending_keys(&self) -> usize {
        self.heap.len()
    }
}

/// Pending-payload registry for one event of one unit.
///
/// The registry is the owner of the instruction references behind scheduled
/// events. `cancel_if` removes payloads without touching the global queue;
/// a popped key whose payload is gone resolves to `None` and is dropped.
#[derive(Debug, Default)]
pub struct PayloadEvent {
    pending: Vec<(u64, InstPtr)>,
}

impl PayloadEvent {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules an event carrying `inst` and records the payload.
    pub fn schedule(
        &mut self,
        events: &mut EventQueue,
        delay: Tick,
        target: EventTarget,
        kind: EventKind,
        inst: InstPtr,
    ) {
        let seq = events.schedule(delay, target, kind);
        self.pending.push((seq, inst));
    }

    /// Resolves a fired key to its payload, removing it from the registry.
    /// Returns `None` if the payload was cancelled in the meantime.
    pub fn take(&mut self, seq: u64) -> Option<InstPtr> {
        let pos = self.pending.iter().position(|(s, _)| *s == seq)?;
        Some(self.pending.swap_remove(pos).1)
    }

    /// Removes every pending payload whose instruction satisfies `pred` and
    /// returns the removed instructions.
    pub fn cancel_if<F>(&mut self, pred: F) -> Vec<InstPtr>
    where
        F: Fn(&Inst) -> bool,
    {
        let mut cancelled = Vec::new();
        self.pending.retain(|(_, inst)| {
            if pred(&inst.borrow()) {
                cancelled.push(inst.clone());
                false
            } else {
                true
            }
        });
        cancelled
    }

    /// Number of payloads still pending.
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
