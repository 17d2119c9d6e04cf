//! Fatal error definitions for the back-end model.
//!
//! This module defines the two error classes the model can raise. It provides:
//! 1. **Configuration errors:** malformed topology or parameters, raised while
//!    the model is being built, before the clock starts.
//! 2. **Invariant violations:** a structural rule broken at run time (busy pipe
//!    receiving an instruction, zero execute latency, credit overrun).
//!
//! Both are fatal at the model boundary; there is no recovery path. An issue
//! attempt that finds no free pipe is *not* an error, it is normal backpressure
//! and the instruction simply stays resident.

use std::fmt;

/// Fatal simulation error.
#[derive(Clone, Debug, PartialEq)]
pub enum SimError {
    /// Malformed topology or parameters, detected at build time.
    ///
    /// Construction fails before the clock starts; a partially built model is
    /// never run.
    Configuration(String),

    /// A structural invariant was broken at run time.
    ///
    /// Indicates a bug in the model or in a collaborator (e.g. a dispatcher
    /// ignoring credits). The simulation cannot continue.
    InvariantViolation(String),
}

impl SimError {
    /// Builds a `Configuration` error from anything displayable.
    pub fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }

    /// Builds an `InvariantViolation` error from anything displayable.
    pub fn invariant(msg: impl Into<String>) -> Self {
        SimError::InvariantViolation(msg.into())
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            SimError::InvariantViolation(msg) => write!(f, "invariant violation: {}", msg),
        }
    }
}

impl std::error::Error for SimError {}
