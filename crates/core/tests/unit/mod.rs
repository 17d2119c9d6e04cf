//! # Scenario tests
//!
//! End-to-end tests that drive the model through the simulator top, one
//! file per concern.

/// Completion-credit ordering through the downstream listener seam.
pub mod completion;

/// Flush-cone recovery, external and injected.
pub mod flush;


/// Load/store path: program order against producing instructions.
pub mod memory;


/// Free-list accounting across retire, including atomic retention.
pub mod rename_accounting;

/// Topology construction from configuration.
pub mod topology;

/// Cross-file transfer plumbing.
pub mod transfer;
