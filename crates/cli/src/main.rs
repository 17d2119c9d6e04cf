//! Out-of-order back-end model CLI.
//!
//! This binary provides the entry point for driving the model. It performs:
//! 1. **Configuration:** load a JSON config file or fall back to defaults.
//! 2. **Workload:** generate a deterministic synthetic instruction mix from
//!    a seed.
//! 3. **Run:** drive the clock until the stream drains (or a cycle budget
//!    expires) and print the statistics report.

use clap::{Parser, Subcommand};
use std::{fs, process};

use o3sim_core::Simulator;
use o3sim_core::common::Lfsr;
use o3sim_core::config::Config;
use o3sim_core::core::rename::ArchOp;

#[derive(Parser, Debug)]
#[command(
    name = "o3sim",
    author,
    version,
    about = "Cycle-accurate out-of-order back-end model",
    long_about = "Build the pipe/queue topology from a JSON config (or defaults), \
feed it a synthetic workload, and report issue/execute/retire statistics.\n\n\
Examples:\n  o3sim run\n  o3sim run -c topology.json -n 50000\n  o3sim run --mispredict --seed 7"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a synthetic workload through the model.
    Run {
        /// JSON configuration file (defaults when omitted).
        #[arg(short, long)]
        config: Option<String>,

        /// Number of instructions to generate.
        #[arg(short = 'n', long, default_value_t = 10_000)]
        insts: u64,

        /// Workload seed (defaults to the config seed).
        #[arg(long)]
        seed: Option<u64>,

        /// Arm random misprediction injection on branch pipes.
        #[arg(long)]
        mispredict: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            insts,
            seed,
            mispredict,
        } => cmd_run(config, insts, seed, mispredict),
    }
}

/// Builds the model, generates the workload, runs to idle, prints stats.
fn cmd_run(config_path: Option<String>, insts: u64, seed: Option<u64>, mispredict: bool) {
    let mut config = match config_path {
        Some(path) => {
            let text = fs::read_to_string(&path).unwrap_or_else(|e| {
                eprintln!("Error reading config {}: {}", path, e);
                process::exit(1);
            });
            serde_json::from_str::<Config>(&text).unwrap_or_else(|e| {
                eprintln!("Error parsing config {}: {}", path, e);
                process::exit(1);
            })
        }
        None => Config::default(),
    };
    if mispredict {
        config.execute.enable_random_misprediction = true;
    }
    let workload_seed = seed.unwrap_or(config.general.seed);

    println!(
        "Configuration: {} pipes, {} queues, queue size {}",
        config.topology.pipelines.len(),
        config.topology.issue_queue_to_pipe_map.len(),
        config.execute.issue_queue_size
    );
    println!(
        "  Workload: {} insts, seed {:#x}, mispredict injection: {}",
        insts, workload_seed, config.execute.enable_random_misprediction
    );
    println!();

    let mut sim = Simulator::new(config).unwrap_or_else(|e| {
        eprintln!("[!] {}", e);
        process::exit(1);
    });
    sim.push_program(generate_workload(insts, workload_seed));

    match sim.run_until_idle() {
        Ok(cycles) => {
            println!("[*] Drained after {} cycles", cycles);
            sim.stats().print();
        }
        Err(e) => {
            eprintln!("[!] FATAL at cycle {}: {}", sim.cycle(), e);
            sim.stats().print();
            process::exit(1);
        }
    }
}

/// Deterministic synthetic instruction mix.
///
/// Roughly: 40% add, 15% multiply, 10% float add, 10% load, 10% store,
/// 5% branch, 10% transfers. Register choices overlap enough to keep a
/// steady stream of read-after-write dependences without serializing
/// everything.
fn generate_workload(insts: u64, seed: u64) -> Vec<ArchOp> {
    let mut lfsr = Lfsr::new(seed);
    let mut ops = Vec::with_capacity(insts as usize);
    for _ in 0..insts {
        let rd = 3 + (lfsr.next() % 20) as usize;
        let rs1 = 1 + (lfsr.next() % 28) as usize;
        let rs2 = 1 + (lfsr.next() % 28) as usize;
        let op = match lfsr.next() % 100 {
            0..=39 => ArchOp::add(rd, rs1, rs2),
            40..=54 => ArchOp::mul(rd, rs1, rs2),
            55..=64 => ArchOp::fadd(rd, rs1, rs2),
            65..=74 => ArchOp::load(rd, rs1),
            75..=84 => ArchOp::store(rs1, rs2),
            85..=89 => ArchOp::branch(rs1, rs2),
            90..=94 => ArchOp::i2f(rd, rs1),
            _ => ArchOp::f2i(rd, rs1),
        };
        ops.push(op);
    }
    ops
}
