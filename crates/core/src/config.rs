//! Configuration system for the back-end model.
//!
//! This module defines all configuration structures used to parameterize the
//! model. It provides:
//! 1. **Defaults:** baseline parameters (queue capacity, latencies, physical
//!    register file size, dispatch bandwidth).
//! 2. **Structures:** hierarchical config for general simulation settings,
//!    execution parameters, and the pipe/queue topology.
//!
//! Configuration is supplied as JSON (deserialized with serde) or via
//! `Config::default()`. The topology keeps its entries as strings; spelling
//! validation and materialization into routing tables happen once, when the
//! execute topology is built, and any malformed entry fails construction
//! before the clock starts.

use serde::Deserialize;

/// Default configuration constants for the model.
mod defaults {
    /// Issue queue capacity (instructions resident per queue).
    pub const ISSUE_QUEUE_SIZE: usize = 8;

    /// Default execute latency in cycles, used when a pipe ignores the
    /// instruction's declared latency.
    pub const EXECUTE_TIME: u64 = 1;

    /// Instructions the dispatcher may send per cycle.
    pub const DISPATCH_BANDWIDTH: usize = 4;

    /// Physical registers per register file.
    ///
    /// Bounded at 128 by the scoreboard's bitmask representation.
    pub const PRF_SIZE: usize = 128;

    /// Load/store queue capacity.
    pub const LSU_QUEUE_SIZE: usize = 8;

    /// Load-to-use latency in cycles.
    pub const LOAD_TO_USE_LATENCY: u64 = 4;

    /// Seed for all pseudo-random draws (misprediction injection).
    pub const SEED: u64 = 0x5eed;

    /// Safety bound for run-until-idle driving.
    pub const MAX_CYCLES: u64 = 100_000;
}

/// Root configuration for the model.
///
/// # Examples
///
/// Deserializing from JSON:
///
/// ```
/// use o3sim_core::config::Config;
///
/// let json = r#"{
///     "general": { "seed": 7 },
///     "execute": { "issue_queue_size": 4 },
///     "topology": {
///         "pipelines": [["int"], ["int", "mul"], ["br"]],
///         "issue_queue_to_pipe_map": [["0", "1"], ["2"]]
///     }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.general.seed, 7);
/// assert_eq!(config.execute.issue_queue_size, 4);
/// assert_eq!(config.topology.pipelines.len(), 3);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Execution pipe, issue queue, and collaborator parameters.
    #[serde(default)]
    pub execute: ExecuteConfig,
    /// Pipe/queue topology.
    #[serde(default)]
    pub topology: TopologyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            execute: ExecuteConfig::default(),
            topology: TopologyConfig::default(),
        }
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Seed for pseudo-random draws. Runs are deterministic per seed.
    #[serde(default = "GeneralConfig::default_seed")]
    pub seed: u64,

    /// Upper bound on cycles when running until idle.
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,
}

impl GeneralConfig {
    fn default_seed() -> u64 {
        defaults::SEED
    }

    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: defaults::SEED,
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}

/// Execution parameters shared by the pipes, queues, and collaborators.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteConfig {
    /// Issue queue capacity.
    #[serde(default = "ExecuteConfig::default_issue_queue_size")]
    pub issue_queue_size: usize,

    /// Default execute latency in cycles.
    #[serde(default = "ExecuteConfig::default_execute_time")]
    pub execute_time: u64,

    /// If true, pipes use `execute_time` for every instruction instead of
    /// the instruction's declared latency.
    #[serde(default)]
    pub ignore_inst_execute_time: bool,

    /// Arm 1/20 random misprediction injection on every branch-serving pipe.
    #[serde(default)]
    pub enable_random_misprediction: bool,

    /// Instructions the dispatcher may send per cycle.
    #[serde(default = "ExecuteConfig::default_dispatch_bandwidth")]
    pub dispatch_bandwidth: usize,

    /// Physical registers per register file (at most 128).
    #[serde(default = "ExecuteConfig::default_prf_size")]
    pub prf_size: usize,

    /// Load/store queue capacity.
    #[serde(default = "ExecuteConfig::default_lsu_queue_size")]
    pub lsu_queue_size: usize,

    /// Load-to-use latency in cycles.
    #[serde(default = "ExecuteConfig::default_load_to_use_latency")]
    pub load_to_use_latency: u64,
}

impl ExecuteConfig {
    fn default_issue_queue_size() -> usize {
        defaults::ISSUE_QUEUE_SIZE
    }

    fn default_execute_time() -> u64 {
        defaults::EXECUTE_TIME
    }

    fn default_dispatch_bandwidth() -> usize {
        defaults::DISPATCH_BANDWIDTH
    }

    fn default_prf_size() -> usize {
        defaults::PRF_SIZE
    }

    fn default_lsu_queue_size() -> usize {
        defaults::LSU_QUEUE_SIZE
    }

    fn default_load_to_use_latency() -> u64 {
        defaults::LOAD_TO_USE_LATENCY
    }
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            issue_queue_size: defaults::ISSUE_QUEUE_SIZE,
            execute_time: defaults::EXECUTE_TIME,
            ignore_inst_execute_time: false,
            enable_random_misprediction: false,
            dispatch_bandwidth: defaults::DISPATCH_BANDWIDTH,
            prf_size: defaults::PRF_SIZE,
            lsu_queue_size: defaults::LSU_QUEUE_SIZE,
            load_to_use_latency: defaults::LOAD_TO_USE_LATENCY,
        }
    }
}

/// Declarative pipe/queue topology.
///
/// Entries are strings, matching the external configuration format; they are
/// parsed and validated when the execute topology is built. `pipelines[p]`
/// lists the kinds pipe `p` supports; `issue_queue_to_pipe_map[q]` is a
/// `[lo]` or `[lo, hi]` inclusive pipe-index range owned by queue `q`;
/// aliases are optional `[canonical, alias]` pairs; `issue_queue_topology`,
/// when present, redundantly names each queue's pipes and is checked for
/// consistency.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyConfig {
    /// Supported pipe kinds per pipe, indexed by pipe number.
    pub pipelines: Vec<Vec<String>>,

    /// Inclusive pipe-index range per queue, indexed by queue number.
    pub issue_queue_to_pipe_map: Vec<Vec<String>>,

    /// Optional `[canonical, alias]` pairs for queues.
    #[serde(default)]
    pub issue_queue_alias: Vec<Vec<String>>,

    /// Optional `[canonical, alias]` pairs for pipes.
    #[serde(default)]
    pub exe_pipe_alias: Vec<Vec<String>>,

    /// Optional per-queue pipe-name lists, cross-checked against the range
    /// map at build time.
    #[serde(default)]
    pub issue_queue_topology: Vec<Vec<String>>,
}

impl TopologyConfig {
    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }
}

impl Default for TopologyConfig {
    /// A representative ten-pipe, five-queue core: six integer-capable
    /// pipes (two of which also multiply or divide, one of which also
    /// transfers and conditionally moves), two float pipes, and two branch
    /// pipes, paired off into issue queues.
    fn default() -> Self {
        Self {
            pipelines: Self::strings(&[
                &["int"],
                &["int", "div"],
                &["int", "mul"],
                &["int", "mul", "i2f", "cmov"],
                &["int"],
                &["int"],
                &["float", "faddsub", "fmac"],
                &["float", "f2i"],
                &["br"],
                &["br"],
            ]),
            issue_queue_to_pipe_map: Self::strings(&[
                &["0", "1"],
                &["2", "3"],
                &["4", "5"],
                &["6", "7"],
                &["8", "9"],
            ]),
            issue_queue_alias: Vec::new(),
            exe_pipe_alias: Vec::new(),
            issue_queue_topology: Vec::new(),
        }
    }
}
