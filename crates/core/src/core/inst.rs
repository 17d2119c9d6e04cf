//! Instruction handles and the functional-pipe taxonomy.
//!
//! This module defines the data the back-end observes about an instruction:
//! 1. **Pipe kinds:** the closed set of functional-unit categories an
//!    instruction can request and a pipe can supply.
//! 2. **Register files:** the integer/float split, and bitmask sets of
//!    physical registers within each file.
//! 3. **Instruction handles:** reference-counted `Inst` records carrying the
//!    age id, operand masks, latency, predicate flags, and lifecycle status.
//!
//! Functional semantics of the operation itself (what an `add` computes) are
//! outside the model; only timing-relevant attributes live here.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::common::SimError;

/// Shared handle to an in-flight instruction.
///
/// The issue queue and the execution pipe each hold a strong reference while
/// the instruction is resident, and drop it on issue-out, completion, or
/// flush. The model is single threaded, so `Rc<RefCell<..>>` is sufficient.
pub type InstPtr = Rc<RefCell<Inst>>;

/// Architectural register file identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegFile {
    /// General-purpose integer registers.
    Integer,
    /// Floating-point registers.
    Float,
}

impl RegFile {
    /// Number of register files in the model.
    pub const COUNT: usize = 2;

    /// The opposite file (used by transfer instructions, which read one file
    /// and write the other).
    pub fn other(self) -> Self {
        match self {
            RegFile::Integer => RegFile::Float,
            RegFile::Float => RegFile::Integer,
        }
    }

    /// Index into per-file arrays.
    #[inline]
    pub fn idx(self) -> usize {
        match self {
            RegFile::Integer => 0,
            RegFile::Float => 1,
        }
    }
}

impl fmt::Display for RegFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegFile::Integer => write!(f, "int"),
            RegFile::Float => write!(f, "float"),
        }
    }
}

/// Functional-pipe category.
///
/// An instruction requests exactly one kind; an execution pipe supplies one
/// or more. The config-file spellings are the lowercase short names
/// (`int`, `mul`, `div`, `br`, `i2f`, `f2i`, `float`, `faddsub`, `fmac`,
/// `cmov`); anything else is a configuration error at topology load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipeKind {
    /// Integer ALU.
    Int,
    /// Integer multiply.
    Mul,
    /// Integer divide.
    Div,
    /// Branch resolution.
    Branch,
    /// Integer-to-float transfer.
    I2F,
    /// Float-to-integer transfer.
    F2I,
    /// Generic float.
    Float,
    /// Float add/subtract.
    FAddSub,
    /// Float multiply-accumulate.
    FMac,
    /// Compare-and-move.
    Cmov,
}

impl PipeKind {
    /// All kinds, in config-index order.
    pub const ALL: [PipeKind; 10] = [
        PipeKind::Int,
        PipeKind::Mul,
        PipeKind::Div,
        PipeKind::Branch,
        PipeKind::I2F,
        PipeKind::F2I,
        PipeKind::Float,
        PipeKind::FAddSub,
        PipeKind::FMac,
        PipeKind::Cmov,
    ];

    /// The config-file spelling of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            PipeKind::Int => "int",
            PipeKind::Mul => "mul",
            PipeKind::Div => "div",
            PipeKind::Branch => "br",
            PipeKind::I2F => "i2f",
            PipeKind::F2I => "f2i",
            PipeKind::Float => "float",
            PipeKind::FAddSub => "faddsub",
            PipeKind::FMac => "fmac",
            PipeKind::Cmov => "cmov",
        }
    }

    /// True for the two cross-file transfer kinds.
    pub fn is_transfer(self) -> bool {
        matches!(self, PipeKind::I2F | PipeKind::F2I)
    }
}

impl FromStr for PipeKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(PipeKind::Int),
            "mul" => Ok(PipeKind::Mul),
            "div" => Ok(PipeKind::Div),
            "br" => Ok(PipeKind::Branch),
            "i2f" => Ok(PipeKind::I2F),
            "f2i" => Ok(PipeKind::F2I),
            "float" => Ok(PipeKind::Float),
            "faddsub" => Ok(PipeKind::FAddSub),
            "fmac" => Ok(PipeKind::FMac),
            "cmov" => Ok(PipeKind::Cmov),
            other => Err(SimError::config(format!("unknown pipe kind '{}'", other))),
        }
    }
}

impl fmt::Display for PipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bitmask over the physical registers of one register file.
///
/// A `u128` backing bounds the physical register file at 128 entries, which
/// the renamer enforces at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RegMask(pub u128);

impl RegMask {
    /// Maximum number of physical registers a mask can cover.
    pub const CAPACITY: usize = 128;

    /// The empty mask.
    pub const EMPTY: RegMask = RegMask(0);

    /// Mask with a single register set.
    pub fn single(reg: usize) -> Self {
        debug_assert!(reg < Self::CAPACITY);
        RegMask(1u128 << reg)
    }

    /// True if no register is set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of registers set.
    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Set a register.
    pub fn set(&mut self, reg: usize) {
        debug_assert!(reg < Self::CAPACITY);
        self.0 |= 1u128 << reg;
    }

    /// True if `reg` is set.
    pub fn contains(self, reg: usize) -> bool {
        reg < Self::CAPACITY && self.0 & (1u128 << reg) != 0
    }

    /// True if every register in `self` is also in `other`.
    #[inline]
    pub fn subset_of(self, other: RegMask) -> bool {
        self.0 & !other.0 == 0
    }

    /// Union in place.
    pub fn union(&mut self, other: RegMask) {
        self.0 |= other.0;
    }

    /// Remove every register in `other` from `self`.
    pub fn remove(&mut self, other: RegMask) {
        self.0 &= !other.0;
    }

    /// Iterate over the set register indices, ascending.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..Self::CAPACITY).filter(move |&r| self.contains(r))
    }
}

/// Lifecycle status of an instruction as seen by the back-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstStatus {
    /// Renamed and resident in an issue queue (or the load/store queue).
    Dispatched,
    /// Accepted by an execution pipe; the execute event is pending.
    Scheduled,
    /// Occupying the load/store unit's single slot.
    Executing,
    /// Execution and completion both done; retired downstream.
    Completed,
    /// Discarded by a speculative flush.
    Flushed,
}

/// One in-flight instruction, as the back-end observes it.
///
/// Produced by the renamer (or directly by tests via [`InstBuilder`]); the
/// decode-side origin of these attributes is outside the model.
#[derive(Clone, Debug)]
pub struct Inst {
    /// Unique, monotonically increasing age id. Younger instructions have
    /// strictly larger ids; dispatch order is age order.
    pub uid: u64,
    /// The functional-pipe kind this instruction must execute on.
    pub kind: PipeKind,
    /// Lifecycle status.
    pub status: InstStatus,
    /// Declared execute latency in cycles. Must be at least 1 by the time the
    /// instruction reaches a pipe.
    pub execute_time: u64,
    /// Source physical registers, per register file.
    pub srcs: [RegMask; RegFile::COUNT],
    /// Destination physical registers, per register file.
    pub dests: [RegMask; RegFile::COUNT],
    /// Branch predicate.
    pub is_branch: bool,
    /// Cross-file transfer predicate (implied by an `i2f`/`f2i` kind).
    pub is_transfer: bool,
    /// Load predicate (routed to the load/store unit).
    pub is_load: bool,
    /// Store predicate (routed to the load/store unit).
    pub is_store: bool,
    /// Rename bookkeeping: the architectural destination, if any.
    pub dest_arch: Option<(RegFile, usize)>,
    /// Rename bookkeeping: physical register allocated for the destination.
    pub new_phys: Option<u16>,
    /// Rename bookkeeping: the destination's previous physical mapping.
    pub prev_phys: Option<u16>,
}

impl Inst {
    /// Starts building an instruction of the given kind.
    pub fn builder(kind: PipeKind) -> InstBuilder {
        InstBuilder::new(kind)
    }

    /// Source mask for one register file.
    #[inline]
    pub fn srcs(&self, rf: RegFile) -> RegMask {
        self.srcs[rf.idx()]
    }

    /// Destination mask for one register file.
    #[inline]
    pub fn dests(&self, rf: RegFile) -> RegMask {
        self.dests[rf.idx()]
    }

    /// True once the instruction has left the dispatched state for good
    /// (completed or flushed).
    pub fn is_done(&self) -> bool {
        matches!(self.status, InstStatus::Completed | InstStatus::Flushed)
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid={} kind={} status={:?}", self.uid, self.kind, self.status)
    }
}

/// Fluent builder for [`Inst`] handles.
///
/// Operand masks are given directly in physical-register terms; the renamer
/// uses this internally, and tests use it to drive the core without a rename
/// stage in the way.
pub struct InstBuilder {
    uid: u64,
    kind: PipeKind,
    execute_time: u64,
    srcs: [RegMask; RegFile::COUNT],
    dests: [RegMask; RegFile::COUNT],
    is_branch: bool,
    is_load: bool,
    is_store: bool,
}

impl InstBuilder {
    fn new(kind: PipeKind) -> Self {
        Self {
            uid: 0,
            kind,
            execute_time: 1,
            srcs: [RegMask::EMPTY; RegFile::COUNT],
            dests: [RegMask::EMPTY; RegFile::COUNT],
            is_branch: kind == PipeKind::Branch,
            is_load: false,
            is_store: false,
        }
    }

    /// Sets the age id.
    pub fn uid(mut self, uid: u64) -> Self {
        self.uid = uid;
        self
    }

    /// Adds a source physical register.
    pub fn src(mut self, rf: RegFile, reg: usize) -> Self {
        self.srcs[rf.idx()].set(reg);
        self
    }

    /// Adds a destination physical register.
    pub fn dest(mut self, rf: RegFile, reg: usize) -> Self {
        self.dests[rf.idx()].set(reg);
        self
    }

    /// Overrides the declared execute latency.
    pub fn execute_time(mut self, cycles: u64) -> Self {
        self.execute_time = cycles;
        self
    }

    /// Marks the instruction as a load.
    pub fn load(mut self) -> Self {
        self.is_load = true;
        self
    }

    /// Marks the instruction as a store.
    pub fn store(mut self) -> Self {
        self.is_store = true;
        self
    }

    /// Finishes the handle.
    pub fn build(self) -> InstPtr {
        Rc::new(RefCell::new(Inst {
            uid: self.uid,
            kind: self.kind,
            status: InstStatus::Dispatched,
            execute_time: self.execute_time,
            srcs: self.srcs,
            dests: self.dests,
            is_branch: self.is_branch,
            is_transfer: self.kind.is_transfer(),
            is_load: self.is_load,
            is_store: self.is_store,
            dest_arch: None,
            new_phys: None,
            prev_phys: None,
        }))
    }
}
