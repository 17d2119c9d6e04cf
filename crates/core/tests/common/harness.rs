use o3sim_core::Simulator;
use o3sim_core::config::Config;
use o3sim_core::core::inst::RegFile;
use o3sim_core::core::rename::ArchOp;
use o3sim_core::stats::SimStats;

/// Test harness: a simulator plus the small amount of driving logic the
/// scenario tests share.
pub struct TestContext {
    pub sim: Simulator,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            sim: Simulator::new(config).expect("model builds"),
        }
    }

    /// Builds a config whose topology is given inline as (pipelines, range
    /// map) string tables, everything else default.
    pub fn topology_config(pipelines: &[&[&str]], map: &[&[&str]]) -> Config {
        let mut config = Config::default();
        config.topology.pipelines = pipelines
            .iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect();
        config.topology.issue_queue_to_pipe_map = map
            .iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect();
        config
    }

    /// Loads a program into the dispatcher.
    pub fn load_program(mut self, ops: Vec<ArchOp>) -> Self {
        self.sim.push_program(ops);
        self
    }

    /// Runs a fixed number of cycles.
    pub fn run(&mut self, cycles: u64) {
        self.sim.run(cycles).expect("run");
    }

    /// Runs until nothing is in flight (bounded by the configured budget).
    pub fn run_until_idle(&mut self) {
        self.sim.run_until_idle().expect("run to idle");
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> SimStats {
        self.sim.stats()
    }

    /// Free physical registers in one file.
    pub fn free_regs(&self, rf: RegFile) -> usize {
        self.sim.renamer.free_regs(rf)
    }
}
