//! Credit-based in-order dispatcher.
//!
//! The dispatcher feeds the back-end: it holds the architectural operation
//! stream, renames the head when the target (an issue queue serving the
//! operation's kind, or the load/store unit for memory operations) has a
//! credit, and stops for the cycle at its bandwidth or at the first
//! operation whose target is out of credits. Nothing is renamed before it
//! can actually be placed, so the free lists only carry in-flight work.

use std::collections::VecDeque;

use log::trace;

use crate::common::SimError;
use crate::core::execute::Execute;
use crate::core::lsu::LoadStoreUnit;
use crate::core::rename::{ArchOp, Renamer};
use crate::core::scoreboard::Scoreboard;

/// In-order operation feeder.
pub struct Dispatch {
    pending: VecDeque<ArchOp>,
    bandwidth: usize,
    /// Instructions renamed and handed to a queue or the load/store unit.
    pub total_insts_dispatched: u64,
}

impl Dispatch {
    /// Creates an empty dispatcher sending up to `bandwidth` instructions
    /// per cycle.
    pub fn new(bandwidth: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            bandwidth,
            total_insts_dispatched: 0,
        }
    }

    /// Appends an operation to the program stream.
    pub fn push(&mut self, op: ArchOp) {
        self.pending.push_back(op);
    }

    /// Operations not yet renamed.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// One dispatch pass: rename and place program-order head operations
    /// while credits and bandwidth allow. Returns the number dispatched.
    pub fn cycle(
        &mut self,
        renamer: &mut Renamer,
        scoreboard: &mut Scoreboard,
        execute: &mut Execute,
        lsu: &mut LoadStoreUnit,
        next_uid: &mut u64,
    ) -> Result<u64, SimError> {
        let mut sent = 0;
        while (sent as usize) < self.bandwidth {
            let Some(op) = self.pending.front() else {
                break;
            };

            // Check the target's credits before renaming; an op that cannot
            // be placed blocks everything behind it.
            let to_lsu = op.is_load || op.is_store;
            if to_lsu {
                if lsu.credits() == 0 {
                    break;
                }
            } else if !execute.can_accept(op.kind)? {
                break;
            }

            let op = self.pending.pop_front().expect("head exists");
            let uid = *next_uid;
            *next_uid += 1;
            let inst = renamer.rename(&op, uid, scoreboard)?;
            trace!("dispatching {}", inst.borrow());
            if to_lsu {
                lsu.dispatch(inst)?;
            } else {
                execute.dispatch(inst)?;
            }
            self.total_insts_dispatched += 1;
            sent += 1;
        }
        Ok(sent)
    }

    /// Flush: the whole undispatched stream is younger than any in-flight
    /// origin, so a flush discards it entirely (the front-end refetches).
    pub fn flush(&mut self) {
        self.pending.clear();
    }
}
