//! Cycle-accurate model of a superscalar out-of-order execution back-end.
//!
//! This crate implements the path from a renamed instruction entering an
//! issue queue, through wakeup/select/issue, to completion in an execution
//! pipe, with speculative flush recovery:
//! 1. **Core:** issue queues, single-slot execution pipes, the shared
//!    readiness scoreboard, and the topology factory that wires them from a
//!    declarative description.
//! 2. **Collaborators:** a credit-based dispatcher, a minimal register
//!    renamer with per-file free lists, and an in-order load/store unit.
//! 3. **Simulation:** a deterministic discrete-event clock, the cycle loop,
//!    configuration, and statistics collection.

/// Shared definitions (errors, tick type, xorshift generator).
pub mod common;
/// Model configuration (defaults, hierarchical config, topology).
pub mod config;
/// Model units (pipes, queues, factory, collaborators).
pub mod core;
/// Simulation kernel (event queue, simulator top).
pub mod sim;
/// Statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Simulator top; construct with `Simulator::new`.
pub use crate::sim::Simulator;
/// Fatal error type shared across the model.
pub use crate::common::SimError;
