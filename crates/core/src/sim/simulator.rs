//! Simulator top: build, cycle loop, flush propagation, retire.
//!
//! The simulator owns the clock and every component, and fixes the intra-
//! cycle ordering the model's determinism rests on:
//! 1. **Issue phase:** every issue queue, then the load/store unit, selects
//!    against the scoreboard exactly as the previous cycle left it.
//! 2. **Event phase:** timed events due this cycle fire in (time, order)
//!    sequence; execute events write the scoreboard, so their effects become
//!    visible to wakeup only on the next cycle.
//! 3. **Flush phase:** criteria emitted during the event phase are applied
//!    atomically to pipes, queues, the load/store unit, the dispatcher, and
//!    the renamer (youngest-first rollback) before the cycle ends.
//! 4. **Dispatch phase:** rename and place new work per credits; it becomes
//!    issue-eligible next cycle.
//!
//! Consequence: an instruction issued at cycle `t` with latency 1 is
//! scoreboard-ready at `t + 1` and retires with its completion credit at
//! `t + 2`.

use log::debug;

use crate::common::{SimError, Tick};
use crate::config::Config;
use crate::core::dispatch::Dispatch;
use crate::core::execute::Execute;
use crate::core::flush::FlushCriteria;
use crate::core::inst::InstPtr;
use crate::core::lsu::LoadStoreUnit;
use crate::core::rename::{ArchOp, Renamer};
use crate::core::scoreboard::Scoreboard;
use crate::stats::SimStats;
use crate::sim::event::{EventKind, EventQueue, EventTarget};

/// Downstream observer of completion credits, in retire order.
pub trait CompletionListener {
    /// One instruction completed; a 1-credit notification went downstream.
    fn on_complete(&mut self, uid: u64);
}

/// The whole model behind one clock.
pub struct Simulator {
    config: Config,
    events: EventQueue,
    /// Shared readiness scoreboard.
    pub scoreboard: Scoreboard,
    /// Frozen pipe/queue topology.
    pub execute: Execute,
    /// Credit-based feeder.
    pub dispatch: Dispatch,
    /// Architectural to physical mapping.
    pub renamer: Renamer,
    /// Memory-operation path.
    pub lsu: LoadStoreUnit,
    listener: Option<Box<dyn CompletionListener>>,
    cycle: Tick,
    next_uid: u64,
    insts_retired: u64,
    insts_flushed: u64,
    flushes: u64,
}

impl Simulator {
    /// Builds every component from configuration. Any topology problem
    /// surfaces here, before the first cycle.
    pub fn new(config: Config) -> Result<Self, SimError> {
        let mut scoreboard = Scoreboard::new();
        let renamer = Renamer::new(config.execute.prf_size, &mut scoreboard)?;
        let execute = Execute::build(&config)?;
        let lsu = LoadStoreUnit::new(
            config.execute.lsu_queue_size,
            config.execute.load_to_use_latency,
        );
        let dispatch = Dispatch::new(config.execute.dispatch_bandwidth);
        Ok(Self {
            config,
            events: EventQueue::new(),
            scoreboard,
            execute,
            dispatch,
            renamer,
            lsu,
            listener: None,
            cycle: 0,
            next_uid: 1,
            insts_retired: 0,
            insts_flushed: 0,
            flushes: 0,
        })
    }

    /// Registers the downstream completion observer.
    pub fn set_completion_listener(&mut self, listener: Box<dyn CompletionListener>) {
        self.listener = Some(listener);
    }

    /// Current cycle.
    pub fn cycle(&self) -> Tick {
        self.cycle
    }

    /// Appends an operation to the program stream.
    pub fn push_op(&mut self, op: ArchOp) {
        self.dispatch.push(op);
    }

    /// Appends a whole program.
    pub fn push_program(&mut self, ops: impl IntoIterator<Item = ArchOp>) {
        for op in ops {
            self.dispatch.push(op);
        }
    }

    /// Advances the model one cycle.
    pub fn step(&mut self) -> Result<(), SimError> {
        self.cycle += 1;
        self.events.advance(self.cycle);

        // Issue phase: wakeup reads the scoreboard as of the cycle start.
        self.execute.issue_cycle(&self.scoreboard, &mut self.events)?;
        self.lsu.issue_cycle(&self.scoreboard, &mut self.events);

        // Event phase.
        let mut completed: Vec<InstPtr> = Vec::new();
        let mut flushes: Vec<FlushCriteria> = Vec::new();
        while let Some(ev) = self.events.pop_due() {
            match ev.target {
                EventTarget::Pipe(p) => {
                    let outcome =
                        self.execute
                            .handle_event(ev, p, &mut self.events, &mut self.scoreboard)?;
                    if let Some(inst) = outcome.completed {
                        completed.push(inst);
                    }
                    if let Some(criteria) = outcome.flush {
                        flushes.push(criteria);
                    }
                }
                EventTarget::Lsu => match ev.kind {
                    EventKind::Execute => {
                        self.lsu
                            .execute_done(ev.seq, &mut self.events, &mut self.scoreboard);
                    }
                    EventKind::Complete => {
                        if let Some(inst) = self.lsu.complete(ev.seq) {
                            completed.push(inst);
                        }
                    }
                },
            }
        }

        // Completions that fired this tick stand even if a flush follows;
        // an already-fired event is never un-fired.
        for inst in completed {
            self.retire(inst);
        }

        // Flush phase: atomic per delivery, before anything else observes
        // this cycle's state.
        for criteria in flushes {
            self.apply_flush(&criteria);
        }

        // Dispatch phase: new work becomes issue-eligible next cycle.
        self.dispatch.cycle(
            &mut self.renamer,
            &mut self.scoreboard,
            &mut self.execute,
            &mut self.lsu,
            &mut self.next_uid,
        )?;
        Ok(())
    }

    /// Runs a fixed number of cycles.
    pub fn run(&mut self, cycles: u64) -> Result<(), SimError> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }

    /// Runs until the instruction stream exhausts and nothing is in flight,
    /// or until the configured cycle budget expires. Returns the final
    /// cycle count.
    pub fn run_until_idle(&mut self) -> Result<Tick, SimError> {
        while self.cycle < self.config.general.max_cycles && !self.idle() {
            self.step()?;
        }
        Ok(self.cycle)
    }

    /// True when no work remains anywhere.
    pub fn idle(&self) -> bool {
        self.dispatch.pending() == 0
            && !self.execute.in_flight()
            && !self.lsu.in_flight()
            && self.execute.pending_events() == 0
            && self.lsu.pending_events() == 0
    }

    /// Delivers an external flush, e.g. from the downstream reorder unit's
    /// exception path. Applied immediately and atomically.
    pub fn flush(&mut self, criteria: FlushCriteria) {
        self.apply_flush(&criteria);
    }

    /// Assembles the statistics snapshot.
    pub fn stats(&self) -> SimStats {
        SimStats {
            cycles: self.cycle,
            insts_dispatched: self.dispatch.total_insts_dispatched,
            insts_issued: self.execute.total_insts_issued(),
            insts_executed: self.execute.total_insts_executed(),
            insts_retired: self.insts_retired,
            insts_flushed: self.insts_flushed,
            lsu_insts_issued: self.lsu.insts_issued,
            flushes: self.flushes,
            mispredicts_injected: self
                .execute
                .pipes()
                .iter()
                .map(|p| p.mispredicts_injected)
                .sum(),
        }
    }

    fn retire(&mut self, inst: InstPtr) {
        self.renamer.retire(&inst);
        self.insts_retired += 1;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_complete(inst.borrow().uid);
        }
    }

    /// One flush delivery: cancel and discard across every component, then
    /// unwind the rename state youngest-first.
    fn apply_flush(&mut self, criteria: &FlushCriteria) {
        debug!("cycle {}: flush for criteria: {}", self.cycle, criteria);
        let mut dropped = self.execute.flush(criteria);
        dropped.extend(self.lsu.flush(criteria));
        self.dispatch.flush();

        dropped.sort_by(|a, b| b.borrow().uid.cmp(&a.borrow().uid));
        for inst in &dropped {
            self.renamer.rollback(inst, &mut self.scoreboard);
        }
        self.insts_flushed += dropped.len() as u64;
        self.flushes += 1;
    }
}
