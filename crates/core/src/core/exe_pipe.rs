//! Single-slot timed execution pipe.
//!
//! A pipe accepts one instruction at a time, holds it for its execute
//! latency, then marks the destination registers ready on the scoreboard and
//! schedules a completion one cycle later. It provides:
//! 1. **Insertion:** accept an instruction from an issue queue (pipe must be
//!    idle) and schedule its execute event.
//! 2. **Execute:** the scoreboard write, with the cross-file rule for
//!    transfer instructions, plus optional random misprediction injection on
//!    branch units.
//! 3. **Completion:** the downstream 1-credit notification.
//! 4. **Flush:** predicate cancellation of pending events; the busy flag
//!    clears only when no execute event remains outstanding.

use log::{debug, trace};

use crate::common::{Lfsr, SimError};
use crate::core::flush::FlushCriteria;
use crate::core::inst::{InstPtr, InstStatus, PipeKind, RegFile};
use crate::core::scoreboard::Scoreboard;
use crate::sim::event::{EventKind, EventQueue, EventTarget, PayloadEvent};

/// Build-time parameters of one pipe.
#[derive(Clone, Debug)]
pub struct ExecutePipeParams {
    /// Default execute latency in cycles.
    pub execute_time: u64,
    /// If true, every instruction takes `execute_time`; otherwise the
    /// instruction's declared latency is used.
    pub ignore_inst_execute_time: bool,
    /// Inject a misprediction with probability 1/20 on executed branches.
    /// Only legal on a pipe that serves the branch kind.
    pub enable_random_misprediction: bool,
    /// Seed for the misprediction draw.
    pub seed: u64,
}

impl Default for ExecutePipeParams {
    fn default() -> Self {
        Self {
            execute_time: 1,
            ignore_inst_execute_time: false,
            enable_random_misprediction: false,
            seed: 1,
        }
    }
}

/// One execution pipe (`exeN`).
#[derive(Debug)]
pub struct ExecutePipe {
    name: String,
    alias: Option<String>,
    index: usize,
    /// Home register file; destination readiness is posted here, except for
    /// transfers which cross to the opposite file.
    reg_file: RegFile,
    kinds: Vec<PipeKind>,
    execute_time: u64,
    ignore_inst_execute_time: bool,
    enable_random_misprediction: bool,
    busy: bool,
    execute_event: PayloadEvent,
    complete_event: PayloadEvent,
    lfsr: Lfsr,
    /// Instructions that finished their execute phase on this pipe.
    pub total_insts_executed: u64,
    /// Mispredictions this pipe injected.
    pub mispredicts_injected: u64,
}

impl ExecutePipe {
    /// Creates a pipe serving `kinds`, deriving its home register file from
    /// them. Fails if the kind set is empty, if it mixes the two transfer
    /// directions, or if misprediction injection is requested on a non-branch
    /// unit.
    pub fn new(
        index: usize,
        alias: Option<String>,
        kinds: Vec<PipeKind>,
        params: &ExecutePipeParams,
    ) -> Result<Self, SimError> {
        let name = format!("exe{}", index);
        if kinds.is_empty() {
            return Err(SimError::config(format!("{}: pipe serves no kinds", name)));
        }

        let reg_file = Self::home_file(&kinds);
        if kinds.contains(&PipeKind::I2F) && reg_file != RegFile::Integer {
            return Err(SimError::config(format!(
                "{}: i2f requires an integer-home pipe, derived home is {}",
                name, reg_file
            )));
        }
        if kinds.contains(&PipeKind::F2I) && reg_file != RegFile::Float {
            return Err(SimError::config(format!(
                "{}: f2i requires a float-home pipe, derived home is {}",
                name, reg_file
            )));
        }
        if params.enable_random_misprediction && !kinds.contains(&PipeKind::Branch) {
            return Err(SimError::config(format!(
                "{}: random misprediction can only be enabled on a branch unit",
                name
            )));
        }

        debug!("{} construct: home={} kinds={:?}", name, reg_file, kinds);
        Ok(Self {
            name,
            alias,
            index,
            reg_file,
            kinds,
            execute_time: params.execute_time,
            ignore_inst_execute_time: params.ignore_inst_execute_time,
            enable_random_misprediction: params.enable_random_misprediction,
            busy: false,
            execute_event: PayloadEvent::new(),
            complete_event: PayloadEvent::new(),
            lfsr: Lfsr::new(params.seed),
            total_insts_executed: 0,
            mispredicts_injected: 0,
        })
    }

    /// Home file derivation: any float-side kind makes the pipe float-homed.
    fn home_file(kinds: &[PipeKind]) -> RegFile {
        let float_side = kinds.iter().any(|k| {
            matches!(
                k,
                PipeKind::Float | PipeKind::FAddSub | PipeKind::FMac | PipeKind::F2I
            )
        });
        if float_side {
            RegFile::Float
        } else {
            RegFile::Integer
        }
    }

    /// Canonical name (`exeN`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-friendly secondary name, if configured.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Pipe index within the topology.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Home register file.
    pub fn reg_file(&self) -> RegFile {
        self.reg_file
    }

    /// The kinds this pipe serves.
    pub fn kinds(&self) -> &[PipeKind] {
        &self.kinds
    }

    /// True if the pipe can execute instructions of `kind`.
    pub fn serves(&self, kind: PipeKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// True while an instruction occupies the pipe (its execute event is
    /// still outstanding).
    #[inline]
    pub fn busy(&self) -> bool {
        self.busy
    }

    /// Outstanding execute events (0 or 1 in normal operation).
    pub fn outstanding_execute(&self) -> usize {
        self.execute_event.outstanding()
    }

    /// All outstanding timed events on this pipe (execute and complete).
    pub fn pending_events(&self) -> usize {
        self.execute_event.outstanding() + self.complete_event.outstanding()
    }

    /// Whether misprediction injection is armed.
    pub fn random_misprediction_enabled(&self) -> bool {
        self.enable_random_misprediction
    }

    /// Accepts an instruction from the owning issue queue.
    ///
    /// The pipe must be idle; the effective latency must be at least one
    /// cycle. Marks the instruction scheduled and books the execute event at
    /// `now + latency`.
    pub fn insert(&mut self, inst: InstPtr, events: &mut EventQueue) -> Result<(), SimError> {
        if self.busy {
            return Err(SimError::invariant(format!(
                "{} received a new instruction while busy",
                self.name
            )));
        }

        let exe_time = if self.ignore_inst_execute_time {
            self.execute_time
        } else {
            inst.borrow().execute_time
        };
        if exe_time == 0 {
            return Err(SimError::invariant(format!(
                "{}: zero execute latency for {}",
                self.name,
                inst.borrow()
            )));
        }

        inst.borrow_mut().status = InstStatus::Scheduled;
        debug!(
            "{} collected {} with duration {}",
            self.name,
            inst.borrow(),
            exe_time
        );

        self.busy = true;
        self.execute_event.schedule(
            events,
            exe_time,
            EventTarget::Pipe(self.index),
            EventKind::Execute,
            inst,
        );
        Ok(())
    }

    /// Fires the execute event with sequence number `seq`.
    ///
    /// Writes destination readiness to the scoreboard (crossing files for a
    /// transfer), optionally injects a misprediction, frees the pipe, and
    /// books the completion one cycle out. Returns flush criteria when a
    /// misprediction was injected. A `seq` whose payload was cancelled by a
    /// flush resolves to nothing and is ignored.
    pub fn execute_done(
        &mut self,
        seq: u64,
        events: &mut EventQueue,
        scoreboard: &mut Scoreboard,
    ) -> Result<Option<FlushCriteria>, SimError> {
        let inst = match self.execute_event.take(seq) {
            Some(inst) => inst,
            None => return Ok(None),
        };
        trace!("{} executed {}", self.name, inst.borrow());

        {
            let inst = inst.borrow();
            if inst.is_transfer {
                match inst.kind {
                    PipeKind::I2F => {
                        // Integer source, float destination.
                        if self.reg_file != RegFile::Integer {
                            return Err(SimError::invariant(format!(
                                "{}: i2f instruction on a pipe that does not source the \
                                 integer file: {}",
                                self.name, inst
                            )));
                        }
                        scoreboard.set_ready(RegFile::Float, inst.dests(RegFile::Float));
                    }
                    PipeKind::F2I => {
                        if self.reg_file != RegFile::Float {
                            return Err(SimError::invariant(format!(
                                "{}: f2i instruction on a pipe that does not source the \
                                 float file: {}",
                                self.name, inst
                            )));
                        }
                        scoreboard.set_ready(RegFile::Integer, inst.dests(RegFile::Integer));
                    }
                    _ => {
                        return Err(SimError::invariant(format!(
                            "{}: instruction marked transfer but neither i2f nor f2i: {}",
                            self.name, inst
                        )));
                    }
                }
            } else {
                scoreboard.set_ready(self.reg_file, inst.dests(self.reg_file));
            }
        }

        // Stress mode: randomly turn an executed branch into a misprediction
        // to exercise the flush path.
        let mut flush = None;
        if self.enable_random_misprediction && inst.borrow().is_branch && self.lfsr.one_in(20) {
            let origin = inst.borrow().uid;
            debug!("{} randomly injecting a mispredicted branch: uid={}", self.name, origin);
            self.mispredicts_injected += 1;
            flush = Some(FlushCriteria::misprediction(origin));
        }

        self.busy = false;
        self.total_insts_executed += 1;

        self.complete_event.schedule(
            events,
            1,
            EventTarget::Pipe(self.index),
            EventKind::Complete,
            inst,
        );
        Ok(flush)
    }

    /// Fires the completion event with sequence number `seq`. Returns the
    /// completed instruction so the caller can send the downstream credit,
    /// or `None` if the payload was cancelled by a flush.
    pub fn complete(&mut self, seq: u64) -> Option<InstPtr> {
        let inst = self.complete_event.take(seq)?;
        inst.borrow_mut().status = InstStatus::Completed;
        trace!("{} completing {}", self.name, inst.borrow());
        Some(inst)
    }

    /// Cancels every pending event whose instruction falls inside the flush
    /// cone. The busy flag clears (and the occupancy record closes) only once
    /// no execute event remains. Returns the cancelled instructions.
    pub fn flush(&mut self, criteria: &FlushCriteria) -> Vec<InstPtr> {
        debug!("{} got flush for criteria: {}", self.name, criteria);
        let mut cancelled = self.complete_event.cancel_if(|inst| criteria.includes(inst));
        cancelled.extend(self.execute_event.cancel_if(|inst| criteria.includes(inst)));
        for inst in &cancelled {
            inst.borrow_mut().status = InstStatus::Flushed;
        }
        if self.execute_event.is_empty() && self.busy {
            self.busy = false;
            debug!("{} drained by flush", self.name);
        }
        cancelled
    }
}
