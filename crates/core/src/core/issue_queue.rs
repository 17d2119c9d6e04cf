//! Issue queue: wakeup, oldest-first select, and issue to matched pipes.
//!
//! A queue holds a bounded, age-ordered set of renamed instructions and
//! watches the shared scoreboard. Each cycle it:
//! 1. **Wakes up** residents whose source registers are all ready in both
//!    register files.
//! 2. **Selects** ready residents in oldest-first order (age ids are unique
//!    and monotone, so no tie-break is needed).
//! 3. **Issues** each selected instruction to a free owned pipe serving its
//!    kind, continuing until every ready resident issued or no matching pipe
//!    is free. Finding no free pipe is normal backpressure, not an error.
//!
//! Credits back to the dispatcher are always `capacity - occupancy`.

use std::collections::{HashMap, VecDeque};

use log::{debug, trace};

use crate::common::SimError;
use crate::core::exe_pipe::ExecutePipe;
use crate::core::flush::FlushCriteria;
use crate::core::inst::{InstPtr, PipeKind, RegFile};
use crate::core::scoreboard::Scoreboard;
use crate::sim::event::EventQueue;

/// One issue queue (`iqN`).
#[derive(Debug)]
pub struct IssueQueue {
    name: String,
    alias: Option<String>,
    index: usize,
    capacity: usize,
    /// Residents in age order, oldest first.
    queue: VecDeque<InstPtr>,
    /// Routing table built at late bind: kind to the owned pipes serving it,
    /// ascending by pipe index. Frozen once the clock starts.
    route: HashMap<PipeKind, Vec<usize>>,
    /// All pipe indices owned by this queue.
    pipe_indices: Vec<usize>,
    /// Instructions this queue has issued to a pipe.
    pub total_insts_issued: u64,
}

impl IssueQueue {
    /// Creates an empty queue. The alias, if any, is fixed at construction;
    /// it cannot be attached after the node is parented into the topology.
    pub fn new(index: usize, alias: Option<String>, capacity: usize) -> Self {
        Self {
            name: format!("iq{}", index),
            alias,
            index,
            capacity,
            queue: VecDeque::with_capacity(capacity),
            route: HashMap::new(),
            pipe_indices: Vec::new(),
            total_insts_issued: 0,
        }
    }

    /// Canonical name (`iqN`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-friendly secondary name, if configured.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Queue index within the topology.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current occupancy.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if no instruction is resident.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Credits available to the dispatcher.
    pub fn credits(&self) -> usize {
        self.capacity - self.queue.len()
    }

    /// True if some owned pipe serves `kind`.
    pub fn serves(&self, kind: PipeKind) -> bool {
        self.route.contains_key(&kind)
    }

    /// The kinds this queue serves (per the routing table).
    pub fn served_kinds(&self) -> impl Iterator<Item = PipeKind> + '_ {
        self.route.keys().copied()
    }

    /// Owned pipes serving `kind`, ascending by pipe index.
    pub fn pipes_for(&self, kind: PipeKind) -> &[usize] {
        self.route.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All owned pipe indices.
    pub fn owned_pipes(&self) -> &[usize] {
        &self.pipe_indices
    }

    /// Late-bind wiring: registers an owned pipe and extends the routing
    /// table with its kinds. Factory use only, before the clock starts.
    pub(crate) fn bind_pipe(&mut self, pipe_index: usize, kinds: &[PipeKind]) {
        self.pipe_indices.push(pipe_index);
        for &kind in kinds {
            let pipes = self.route.entry(kind).or_default();
            pipes.push(pipe_index);
            pipes.sort_unstable();
        }
    }

    /// Accepts a renamed instruction from dispatch.
    ///
    /// The kind must be served here (anything else is a configuration error:
    /// the routing tables and the dispatcher disagree) and a credit must be
    /// available (dispatch beyond credits is an invariant violation).
    pub fn dispatch(&mut self, inst: InstPtr) -> Result<(), SimError> {
        let kind = inst.borrow().kind;
        if !self.serves(kind) {
            return Err(SimError::config(format!(
                "{} does not serve pipe kind '{}'",
                self.name, kind
            )));
        }
        if self.queue.len() >= self.capacity {
            return Err(SimError::invariant(format!(
                "{} over capacity: dispatcher ignored credits",
                self.name
            )));
        }
        trace!("{} accepted {}", self.name, inst.borrow());
        self.queue.push_back(inst);
        Ok(())
    }

    /// One wakeup/select/issue pass.
    ///
    /// Residents are scanned oldest first; each ready instruction goes to the
    /// first free owned pipe serving its kind. An instruction with no free
    /// pipe stays resident and younger ready instructions are still
    /// considered. Issuing never makes another resident unready, so a single
    /// pass is exhaustive. Returns the number of instructions issued.
    pub fn issue_ready(
        &mut self,
        scoreboard: &Scoreboard,
        pipes: &mut [ExecutePipe],
        events: &mut EventQueue,
    ) -> Result<u64, SimError> {
        let mut issued = 0;
        let mut idx = 0;
        while idx < self.queue.len() {
            let (kind, ready) = {
                let inst = self.queue[idx].borrow();
                let ready = scoreboard.all_ready(RegFile::Integer, inst.srcs(RegFile::Integer))
                    && scoreboard.all_ready(RegFile::Float, inst.srcs(RegFile::Float));
                (inst.kind, ready)
            };
            if !ready {
                idx += 1;
                continue;
            }

            let free_pipe = self
                .pipes_for(kind)
                .iter()
                .copied()
                .find(|&p| !pipes[p].busy());
            match free_pipe {
                Some(p) => {
                    let inst = self.queue.remove(idx).expect("resident index in range");
                    trace!("{} issuing {} to {}", self.name, inst.borrow(), pipes[p].name());
                    pipes[p].insert(inst, events)?;
                    self.total_insts_issued += 1;
                    issued += 1;
                    // Do not advance idx: the next resident slid into place.
                }
                None => {
                    // Transient rejection: stays resident, try again next
                    // cycle.
                    idx += 1;
                }
            }
        }
        Ok(issued)
    }

    /// Discards every resident inside the flush cone and returns them.
    /// Pipes are not touched; their own flush handler cancels in-flight
    /// work.
    pub fn flush(&mut self, criteria: &FlushCriteria) -> Vec<InstPtr> {
        let before = self.queue.len();
        let mut dropped = Vec::new();
        self.queue.retain(|inst| {
            if criteria.includes(&inst.borrow()) {
                dropped.push(inst.clone());
                false
            } else {
                true
            }
        });
        for inst in &dropped {
            inst.borrow_mut().status = crate::core::inst::InstStatus::Flushed;
        }
        if !dropped.is_empty() {
            debug!(
                "{} flushed {} of {} residents for criteria: {}",
                self.name,
                dropped.len(),
                before,
                criteria
            );
        }
        dropped
    }
}
