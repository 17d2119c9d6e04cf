//! Simulation statistics collection and reporting.
//!
//! This module aggregates the model's counters for end-of-run reporting:
//! 1. **Throughput:** cycles, dispatched/issued/executed/retired counts, IPC.
//! 2. **Memory path:** load/store unit issues.
//! 3. **Speculation:** flushes delivered, instructions discarded, injected
//!    mispredictions.
//!
//! Per-unit counters (each queue's `total_insts_issued`, each pipe's
//! `total_insts_executed`) stay on the units themselves; a snapshot is
//! assembled by the simulator at read-out.

/// Aggregate counters for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Total simulated cycles.
    pub cycles: u64,
    /// Instructions renamed and placed by the dispatcher.
    pub insts_dispatched: u64,
    /// Instructions issued by the issue queues.
    pub insts_issued: u64,
    /// Instructions that finished execution on a pipe.
    pub insts_executed: u64,
    /// Instructions retired (completion credit delivered downstream).
    pub insts_retired: u64,
    /// Instructions discarded by flushes.
    pub insts_flushed: u64,
    /// Memory operations issued by the load/store unit.
    pub lsu_insts_issued: u64,
    /// Flush deliveries.
    pub flushes: u64,
    /// Randomly injected branch mispredictions.
    pub mispredicts_injected: u64,
}

impl SimStats {
    /// Retired instructions per cycle.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.insts_retired as f64 / self.cycles as f64
        }
    }

    /// Prints the end-of-run report.
    pub fn print(&self) {
        println!("==== Simulation statistics ====");
        println!("  Cycles:            {}", self.cycles);
        println!("  Dispatched:        {}", self.insts_dispatched);
        println!("  Issued:            {}", self.insts_issued);
        println!("  Executed:          {}", self.insts_executed);
        println!("  Retired:           {}", self.insts_retired);
        println!("  IPC:               {:.3}", self.ipc());
        println!("  LSU issued:        {}", self.lsu_insts_issued);
        println!("  Flushes:           {}", self.flushes);
        println!("  Flushed insts:     {}", self.insts_flushed);
        println!("  Mispredicts (inj): {}", self.mispredicts_injected);
    }
}
