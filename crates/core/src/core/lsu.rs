//! Minimal load/store unit.
//!
//! Memory operations bypass the issue queues and drain through this unit in
//! strict program order: the head of the queue issues into the single slot
//! once its source registers are ready, holds it for the load-to-use
//! latency, then (for loads) marks the destination ready and completes one
//! cycle later. Address translation, forwarding, and memory-level
//! parallelism are not modeled.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::common::SimError;
use crate::core::flush::FlushCriteria;
use crate::core::inst::{InstPtr, InstStatus, RegFile};
use crate::core::scoreboard::Scoreboard;
use crate::sim::event::{EventKind, EventQueue, EventTarget, PayloadEvent};

/// Single-slot, in-order load/store unit.
pub struct LoadStoreUnit {
    queue: VecDeque<InstPtr>,
    capacity: usize,
    busy: bool,
    load_to_use: u64,
    execute_event: PayloadEvent,
    complete_event: PayloadEvent,
    /// Memory operations issued into the slot.
    pub insts_issued: u64,
    /// Memory operations completed.
    pub total_insts_completed: u64,
}

impl LoadStoreUnit {
    /// Creates an empty unit.
    pub fn new(capacity: usize, load_to_use: u64) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            busy: false,
            load_to_use,
            execute_event: PayloadEvent::new(),
            complete_event: PayloadEvent::new(),
            insts_issued: 0,
            total_insts_completed: 0,
        }
    }

    /// Credits available to the dispatcher.
    pub fn credits(&self) -> usize {
        self.capacity - self.queue.len()
    }

    /// True while a memory operation occupies the slot.
    pub fn busy(&self) -> bool {
        self.busy
    }

    /// True while anything is queued or in the slot.
    pub fn in_flight(&self) -> bool {
        self.busy || !self.queue.is_empty()
    }

    /// All outstanding timed events on this unit.
    pub fn pending_events(&self) -> usize {
        self.execute_event.outstanding() + self.complete_event.outstanding()
    }

    /// Accepts a load or store from dispatch.
    pub fn dispatch(&mut self, inst: InstPtr) -> Result<(), SimError> {
        {
            let inst = inst.borrow();
            if !inst.is_load && !inst.is_store {
                return Err(SimError::config(format!(
                    "lsu received a non-memory instruction: {}",
                    inst
                )));
            }
        }
        if self.queue.len() >= self.capacity {
            return Err(SimError::invariant(
                "lsu over capacity: dispatcher ignored credits",
            ));
        }
        trace!("lsu accepted {}", inst.borrow());
        self.queue.push_back(inst);
        Ok(())
    }

    /// Issues the head of the queue into the slot if its sources are ready.
    /// Memory operations never reorder. Returns the number issued (0 or 1).
    pub fn issue_cycle(&mut self, scoreboard: &Scoreboard, events: &mut EventQueue) -> u64 {
        if self.busy {
            return 0;
        }
        let ready = match self.queue.front() {
            Some(inst) => {
                let inst = inst.borrow();
                scoreboard.all_ready(RegFile::Integer, inst.srcs(RegFile::Integer))
                    && scoreboard.all_ready(RegFile::Float, inst.srcs(RegFile::Float))
            }
            None => return 0,
        };
        if !ready {
            return 0;
        }

        let inst = self.queue.pop_front().expect("head exists");
        inst.borrow_mut().status = InstStatus::Executing;
        trace!("lsu issuing {}", inst.borrow());
        self.busy = true;
        self.insts_issued += 1;
        self.execute_event
            .schedule(events, self.load_to_use, EventTarget::Lsu, EventKind::Execute, inst);
        1
    }

    /// Fires the memory-access event: loads mark their destinations ready.
    pub fn execute_done(&mut self, seq: u64, events: &mut EventQueue, scoreboard: &mut Scoreboard) {
        let Some(inst) = self.execute_event.take(seq) else {
            return;
        };
        {
            let inst = inst.borrow();
            if inst.is_load {
                scoreboard.set_ready(RegFile::Integer, inst.dests(RegFile::Integer));
                scoreboard.set_ready(RegFile::Float, inst.dests(RegFile::Float));
            }
        }
        self.busy = false;
        self.complete_event
            .schedule(events, 1, EventTarget::Lsu, EventKind::Complete, inst);
    }

    /// Fires the completion event; returns the instruction for retire.
    pub fn complete(&mut self, seq: u64) -> Option<InstPtr> {
        let inst = self.complete_event.take(seq)?;
        inst.borrow_mut().status = InstStatus::Completed;
        self.total_insts_completed += 1;
        Some(inst)
    }

    /// Cancels in-flight events and drops queued residents inside the flush
    /// cone. Returns the discarded instructions.
    pub fn flush(&mut self, criteria: &FlushCriteria) -> Vec<InstPtr> {
        let mut dropped = self.complete_event.cancel_if(|i| criteria.includes(i));
        dropped.extend(self.execute_event.cancel_if(|i| criteria.includes(i)));
        self.queue.retain(|inst| {
            if criteria.includes(&inst.borrow()) {
                dropped.push(inst.clone());
                false
            } else {
                true
            }
        });
        for inst in &dropped {
            inst.borrow_mut().status = InstStatus::Flushed;
        }
        if self.execute_event.is_empty() && self.busy {
            self.busy = false;
        }
        if !dropped.is_empty() {
            debug!("lsu flushed {} for criteria: {}", dropped.len(), criteria);
        }
        dropped
    }
}
