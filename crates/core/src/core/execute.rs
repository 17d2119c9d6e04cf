//! Execute topology: factory, routing tables, and flush propagation.
//!
//! The factory turns the declarative topology description into live pipes and
//! queues in two phases:
//! 1. **Configure:** parse and validate the queue-to-pipe ranges, create each
//!    issue queue and execution pipe with its name and (pre-parenting) alias,
//!    and materialize the flat `pipe_to_iq` table.
//! 2. **Late bind:** once every node exists, arm misprediction injection on
//!    branch-serving pipes, register each pipe with its owning queue, and
//!    build every queue's `kind -> [pipes]` routing table (ascending pipe
//!    index, so issue order is reproducible).
//!
//! After `bind_late` the topology is frozen: all runtime lookups are indexed
//! through the flat tables and nothing rewires. Malformed input fails
//! construction with a configuration error before the clock starts. The
//! frozen [`Execute`] also owns the runtime coupling: the per-cycle issue
//! pass, pipe event delivery, and flush propagation across its pipes and
//! queues.

use log::debug;

use crate::common::SimError;
use crate::config::Config;
use crate::core::exe_pipe::{ExecutePipe, ExecutePipeParams};
use crate::core::flush::FlushCriteria;
use crate::core::inst::{InstPtr, PipeKind};
use crate::core::issue_queue::IssueQueue;
use crate::core::scoreboard::Scoreboard;
use crate::sim::event::{EventKind, EventQueue, FiredEvent};

/// What a delivered pipe event produced.
#[derive(Default)]
pub struct PipeEventOutcome {
    /// Instruction that completed this event (downstream credit due).
    pub completed: Option<InstPtr>,
    /// Flush criteria emitted by misprediction injection.
    pub flush: Option<FlushCriteria>,
}

/// The frozen execute topology: every pipe, every queue, and the flat
/// ownership table between them.
#[derive(Debug)]
pub struct Execute {
    pipes: Vec<ExecutePipe>,
    queues: Vec<IssueQueue>,
    /// Owning queue index per pipe index.
    pipe_to_iq: Vec<usize>,
}

/// Intermediate state between the two factory phases: nodes exist with
/// stable names, cross-references are not yet wired.
pub struct ExecuteFactory {
    pipes: Vec<ExecutePipe>,
    queues: Vec<IssueQueue>,
    pipe_to_iq: Vec<usize>,
    pipe_kinds: Vec<Vec<PipeKind>>,
}

impl ExecuteFactory {
    /// Phase 1: parse, validate, and create all tree nodes.
    pub fn configure(config: &Config) -> Result<Self, SimError> {
        let topo = &config.topology;
        if topo.pipelines.is_empty() {
            return Err(SimError::config("topology has no pipelines"));
        }
        if topo.issue_queue_to_pipe_map.is_empty() {
            return Err(SimError::config("topology has no issue_queue_to_pipe_map"));
        }

        let num_pipes = topo.pipelines.len();
        let num_queues = topo.issue_queue_to_pipe_map.len();

        // Queue ranges and the pipe -> queue ownership table. Every pipe must
        // be owned by exactly one queue.
        let mut ranges = Vec::with_capacity(num_queues);
        let mut pipe_to_iq: Vec<Option<usize>> = vec![None; num_pipes];
        for (iq_num, entry) in topo.issue_queue_to_pipe_map.iter().enumerate() {
            let (lo, hi) = Self::parse_range(iq_num, entry, num_pipes)?;
            for (pipe_idx, owner) in pipe_to_iq.iter_mut().enumerate().take(hi + 1).skip(lo) {
                if let Some(prev) = owner {
                    return Err(SimError::config(format!(
                        "pipe {} owned by both iq{} and iq{}",
                        pipe_idx, prev, iq_num
                    )));
                }
                *owner = Some(iq_num);
            }
            ranges.push((lo, hi));
        }
        let pipe_to_iq: Vec<usize> = pipe_to_iq
            .into_iter()
            .enumerate()
            .map(|(p, owner)| {
                owner.ok_or_else(|| {
                    SimError::config(format!("pipe {} not owned by any issue queue", p))
                })
            })
            .collect::<Result<_, _>>()?;

        // Issue queue nodes. An alias has to be attached at construction,
        // before the node is parented into the topology.
        let mut queues = Vec::with_capacity(num_queues);
        for iq_num in 0..num_queues {
            let name = format!("iq{}", iq_num);
            let alias = Self::alias_for(&topo.issue_queue_alias, iq_num, num_queues, &name)?;
            queues.push(IssueQueue::new(
                iq_num,
                alias,
                config.execute.issue_queue_size,
            ));
        }

        // Pipe kind lists, parsed once. Name matching stays confined to
        // config load.
        let mut pipe_kinds = Vec::with_capacity(num_pipes);
        for (pipe_idx, kinds) in topo.pipelines.iter().enumerate() {
            let mut parsed: Vec<PipeKind> = Vec::with_capacity(kinds.len());
            for name in kinds {
                let kind: PipeKind = name.parse()?;
                if parsed.contains(&kind) {
                    return Err(SimError::config(format!(
                        "pipe {} lists kind '{}' twice",
                        pipe_idx, kind
                    )));
                }
                parsed.push(kind);
            }
            pipe_kinds.push(parsed);
        }

        // Execution pipe nodes, grouped under their owning queue.
        let mut pipes = Vec::with_capacity(num_pipes);
        for (pipe_idx, kinds) in pipe_kinds.iter().enumerate() {
            let name = format!("exe{}", pipe_idx);
            let alias = Self::alias_for(&topo.exe_pipe_alias, pipe_idx, num_pipes, &name)?;
            let params = ExecutePipeParams {
                execute_time: config.execute.execute_time,
                ignore_inst_execute_time: config.execute.ignore_inst_execute_time,
                enable_random_misprediction: config.execute.enable_random_misprediction
                    && kinds.contains(&PipeKind::Branch),
                seed: config
                    .general
                    .seed
                    .wrapping_add(0x9e3779b97f4a7c15u64.wrapping_mul(pipe_idx as u64 + 1)),
            };
            pipes.push(ExecutePipe::new(pipe_idx, alias, kinds.clone(), &params)?);
            debug!("exe{} grouped under iq{}_group", pipe_idx, pipe_to_iq[pipe_idx]);
        }

        Self::check_queue_topology(topo, &ranges)?;

        Ok(Self {
            pipes,
            queues,
            pipe_to_iq,
            pipe_kinds,
        })
    }

    /// Phase 2: wire pipes to queues and freeze.
    pub fn bind_late(mut self) -> Execute {
        for (pipe_idx, kinds) in self.pipe_kinds.iter().enumerate() {
            let iq_num = self.pipe_to_iq[pipe_idx];
            self.queues[iq_num].bind_pipe(pipe_idx, kinds);
        }
        Execute {
            pipes: self.pipes,
            queues: self.queues,
            pipe_to_iq: self.pipe_to_iq,
        }
    }

    /// Parses one `[lo]` or `[lo, hi]` range entry (inclusive, in bounds).
    fn parse_range(
        iq_num: usize,
        entry: &[String],
        num_pipes: usize,
    ) -> Result<(usize, usize), SimError> {
        if entry.is_empty() || entry.len() > 2 {
            return Err(SimError::config(format!(
                "iq{}: pipe range must have 1 or 2 entries, got {}",
                iq_num,
                entry.len()
            )));
        }
        let parse = |s: &String| {
            s.parse::<usize>().map_err(|_| {
                SimError::config(format!("iq{}: pipe index '{}' is not a number", iq_num, s))
            })
        };
        let lo = parse(&entry[0])?;
        let hi = if entry.len() > 1 { parse(&entry[1])? } else { lo };
        if lo > hi {
            return Err(SimError::config(format!(
                "iq{}: descending pipe range [{}, {}]",
                iq_num, lo, hi
            )));
        }
        if hi >= num_pipes {
            return Err(SimError::config(format!(
                "iq{}: pipe range [{}, {}] exceeds {} pipelines",
                iq_num, lo, hi, num_pipes
            )));
        }
        Ok((lo, hi))
    }

    /// Looks up the alias for node `idx`. A non-empty alias list must cover
    /// every node with a `[canonical, alias]` pair.
    fn alias_for(
        aliases: &[Vec<String>],
        idx: usize,
        count: usize,
        canonical: &str,
    ) -> Result<Option<String>, SimError> {
        if aliases.is_empty() {
            return Ok(None);
        }
        if aliases.len() != count {
            return Err(SimError::config(format!(
                "alias list covers {} nodes, topology has {}",
                aliases.len(),
                count
            )));
        }
        let pair = &aliases[idx];
        if pair.len() != 2 {
            return Err(SimError::config(format!(
                "alias entry for {} must be a [canonical, alias] pair",
                canonical
            )));
        }
        if pair[0] != canonical {
            return Err(SimError::config(format!(
                "alias entry names '{}', expected '{}'",
                pair[0], canonical
            )));
        }
        Ok(Some(pair[1].clone()))
    }

    /// Cross-checks the optional `issue_queue_topology` name lists against
    /// the range map.
    fn check_queue_topology(
        topo: &crate::config::TopologyConfig,
        ranges: &[(usize, usize)],
    ) -> Result<(), SimError> {
        if topo.issue_queue_topology.is_empty() {
            return Ok(());
        }
        if topo.issue_queue_topology.len() != ranges.len() {
            return Err(SimError::config(format!(
                "issue_queue_topology lists {} queues, range map has {}",
                topo.issue_queue_topology.len(),
                ranges.len()
            )));
        }
        for (iq_num, (names, &(lo, hi))) in topo
            .issue_queue_topology
            .iter()
            .zip(ranges.iter())
            .enumerate()
        {
            let expected: Vec<String> = (lo..=hi).map(|p| format!("exe{}", p)).collect();
            let mut got = names.clone();
            got.sort();
            let mut want = expected.clone();
            want.sort();
            if got != want {
                return Err(SimError::config(format!(
                    "iq{}: issue_queue_topology names {:?}, range map implies {:?}",
                    iq_num, names, expected
                )));
            }
        }
        Ok(())
    }
}

impl Execute {
    /// Builds the frozen topology from configuration (both factory phases).
    pub fn build(config: &Config) -> Result<Self, SimError> {
        Ok(ExecuteFactory::configure(config)?.bind_late())
    }

    /// All pipes, by pipe index.
    pub fn pipes(&self) -> &[ExecutePipe] {
        &self.pipes
    }

    /// All queues, by queue index.
    pub fn queues(&self) -> &[IssueQueue] {
        &self.queues
    }

    /// One pipe.
    pub fn pipe(&self, idx: usize) -> &ExecutePipe {
        &self.pipes[idx]
    }

    /// One queue.
    pub fn queue(&self, idx: usize) -> &IssueQueue {
        &self.queues[idx]
    }

    /// The queue owning pipe `pipe_idx`.
    pub fn home_queue(&self, pipe_idx: usize) -> usize {
        self.pipe_to_iq[pipe_idx]
    }

    /// Looks a pipe up by canonical name or alias.
    pub fn find_pipe(&self, name: &str) -> Option<&ExecutePipe> {
        self.pipes
            .iter()
            .find(|p| p.name() == name || p.alias() == Some(name))
    }

    /// Looks a queue up by canonical name or alias.
    pub fn find_queue(&self, name: &str) -> Option<&IssueQueue> {
        self.queues
            .iter()
            .find(|q| q.name() == name || q.alias() == Some(name))
    }

    /// True if some queue serving `kind` has a credit. A kind no queue
    /// serves at all is a configuration error.
    pub fn can_accept(&self, kind: PipeKind) -> Result<bool, SimError> {
        let mut serving = false;
        for q in &self.queues {
            if q.serves(kind) {
                serving = true;
                if q.credits() > 0 {
                    return Ok(true);
                }
            }
        }
        if !serving {
            return Err(SimError::config(format!(
                "no issue queue serves pipe kind '{}'",
                kind
            )));
        }
        Ok(false)
    }

    /// Routes a renamed instruction to the lowest-indexed queue that serves
    /// its kind and has a credit. Returns `false` when every serving queue is
    /// out of credits (the dispatcher must hold the instruction). A kind no
    /// queue serves means the topology and the workload disagree.
    pub fn dispatch(&mut self, inst: InstPtr) -> Result<bool, SimError> {
        let kind = inst.borrow().kind;
        let mut serving = false;
        for q in 0..self.queues.len() {
            if !self.queues[q].serves(kind) {
                continue;
            }
            serving = true;
            if self.queues[q].credits() > 0 {
                self.queues[q].dispatch(inst)?;
                return Ok(true);
            }
        }
        if !serving {
            return Err(SimError::config(format!(
                "no issue queue serves pipe kind '{}'",
                kind
            )));
        }
        Ok(false)
    }

    /// Runs the wakeup/select/issue pass of every queue for this cycle.
    /// Returns the number of instructions issued.
    pub fn issue_cycle(
        &mut self,
        scoreboard: &Scoreboard,
        events: &mut EventQueue,
    ) -> Result<u64, SimError> {
        let mut issued = 0;
        for q in &mut self.queues {
            issued += q.issue_ready(scoreboard, &mut self.pipes, events)?;
        }
        Ok(issued)
    }

    /// Delivers a fired pipe event to its pipe.
    pub fn handle_event(
        &mut self,
        ev: FiredEvent,
        pipe_idx: usize,
        events: &mut EventQueue,
        scoreboard: &mut Scoreboard,
    ) -> Result<PipeEventOutcome, SimError> {
        let mut outcome = PipeEventOutcome::default();
        match ev.kind {
            EventKind::Execute => {
                outcome.flush =
                    self.pipes[pipe_idx].execute_done(ev.seq, events, scoreboard)?;
            }
            EventKind::Complete => {
                outcome.completed = self.pipes[pipe_idx].complete(ev.seq);
            }
        }
        Ok(outcome)
    }

    /// Propagates a flush to every pipe and every queue. Returns all
    /// discarded instructions.
    pub fn flush(&mut self, criteria: &FlushCriteria) -> Vec<InstPtr> {
        let mut dropped = Vec::new();
        for pipe in &mut self.pipes {
            dropped.extend(pipe.flush(criteria));
        }
        for queue in &mut self.queues {
            dropped.extend(queue.flush(criteria));
        }
        dropped
    }

    /// True while any pipe holds an instruction or any queue has residents.
    pub fn in_flight(&self) -> bool {
        self.pipes.iter().any(|p| p.busy()) || self.queues.iter().any(|q| !q.is_empty())
    }

    /// Outstanding timed events across all pipes.
    pub fn pending_events(&self) -> usize {
        self.pipes.iter().map(|p| p.pending_events()).sum()
    }

    /// Instructions issued across all queues.
    pub fn total_insts_issued(&self) -> u64 {
        self.queues.iter().map(|q| q.total_insts_issued).sum()
    }

    /// Instructions executed across all pipes.
    pub fn total_insts_executed(&self) -> u64 {
        self.pipes.iter().map(|p| p.total_insts_executed).sum()
    }
}

impl Drop for Execute {
    fn drop(&mut self) {
        // Teardown order mirrors construction in reverse: pipes release
        // before queues.
        self.pipes.clear();
        self.queues.clear();
    }
}
