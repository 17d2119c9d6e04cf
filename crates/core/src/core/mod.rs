//! Model units of the out-of-order back-end.
//!
//! This module aggregates the core machinery and its immediate
//! collaborators:
//! 1. **Data model:** instruction handles, pipe kinds, register masks
//!    (`inst`), readiness scoreboard (`scoreboard`), flush criteria
//!    (`flush`).
//! 2. **Core units:** single-slot execution pipes (`exe_pipe`), issue queues
//!    with wakeup/select/issue (`issue_queue`), and the topology factory
//!    that wires them (`execute`).
//! 3. **Collaborators:** credit-based dispatcher (`dispatch`), minimal
//!    renamer (`rename`), and load/store unit (`lsu`).

/// Credit-based in-order dispatcher.
pub mod dispatch;
/// Single-slot timed execution pipe.
pub mod exe_pipe;
/// Topology factory, routing tables, flush propagation.
pub mod execute;
/// Speculative flush criteria.
pub mod flush;
/// Instruction handles, pipe kinds, register masks.
pub mod inst;
/// Issue queue: wakeup, select, issue.
pub mod issue_queue;
/// Minimal load/store unit.
pub mod lsu;
/// Minimal register renamer and architectural operations.
pub mod rename;
/// Readiness scoreboard.
pub mod scoreboard;
