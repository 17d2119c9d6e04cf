//! Minimal register renamer and architectural operation descriptions.
//!
//! The back-end proper consumes physical-register instructions; this module
//! supplies the collaborator that produces them. It provides:
//! 1. **`ArchOp`:** an architectural-level operation description (kind,
//!    architectural operands, latency, predicate flags) with fluent helpers
//!    for common shapes.
//! 2. **`Renamer`:** architectural to physical mapping with a free list per
//!    register file, scoreboard initialization, retire-time reclamation, and
//!    youngest-first flush rollback.
//!
//! Renaming throughput, checkpointing, and wider structural modeling are the
//! front-end's business and are not modeled.

use std::collections::VecDeque;

use log::trace;

use crate::common::SimError;
use crate::core::inst::{Inst, InstPtr, PipeKind, RegFile};
use crate::core::scoreboard::Scoreboard;

/// Architectural registers per file.
pub const ARCH_REGS: usize = 32;

/// An operation at the architectural level, before renaming.
#[derive(Clone, Debug)]
pub struct ArchOp {
    /// Requested functional-pipe kind.
    pub kind: PipeKind,
    /// Architectural destination, if any. Integer x0 is treated as no
    /// destination.
    pub dest: Option<(RegFile, usize)>,
    /// Architectural sources. Integer x0 reads as always ready.
    pub srcs: Vec<(RegFile, usize)>,
    /// Declared execute latency in cycles.
    pub execute_time: u64,
    /// Load predicate.
    pub is_load: bool,
    /// Store predicate.
    pub is_store: bool,
}

impl ArchOp {
    /// A bare operation of the given kind.
    pub fn new(kind: PipeKind) -> Self {
        Self {
            kind,
            dest: None,
            srcs: Vec::new(),
            execute_time: 1,
            is_load: false,
            is_store: false,
        }
    }

    /// Sets the destination register.
    pub fn with_dest(mut self, rf: RegFile, reg: usize) -> Self {
        self.dest = Some((rf, reg));
        self
    }

    /// Adds a source register.
    pub fn with_src(mut self, rf: RegFile, reg: usize) -> Self {
        self.srcs.push((rf, reg));
        self
    }

    /// Overrides the declared latency.
    pub fn with_latency(mut self, cycles: u64) -> Self {
        self.execute_time = cycles;
        self
    }

    // Helpers for the common shapes the tests and the workload generator use.

    /// Integer add: `rd <- rs1, rs2`.
    pub fn add(rd: usize, rs1: usize, rs2: usize) -> Self {
        Self::new(PipeKind::Int)
            .with_dest(RegFile::Integer, rd)
            .with_src(RegFile::Integer, rs1)
            .with_src(RegFile::Integer, rs2)
    }

    /// Integer multiply: `rd <- rs1, rs2`.
    pub fn mul(rd: usize, rs1: usize, rs2: usize) -> Self {
        Self::new(PipeKind::Mul)
            .with_dest(RegFile::Integer, rd)
            .with_src(RegFile::Integer, rs1)
            .with_src(RegFile::Integer, rs2)
    }

    /// Conditional branch on `rs1, rs2`. No destination.
    pub fn branch(rs1: usize, rs2: usize) -> Self {
        Self::new(PipeKind::Branch)
            .with_src(RegFile::Integer, rs1)
            .with_src(RegFile::Integer, rs2)
    }

    /// Integer-to-float transfer: `fd <- rs1`.
    pub fn i2f(fd: usize, rs1: usize) -> Self {
        Self::new(PipeKind::I2F)
            .with_dest(RegFile::Float, fd)
            .with_src(RegFile::Integer, rs1)
    }

    /// Float-to-integer transfer: `rd <- fs1`.
    pub fn f2i(rd: usize, fs1: usize) -> Self {
        Self::new(PipeKind::F2I)
            .with_dest(RegFile::Integer, rd)
            .with_src(RegFile::Float, fs1)
    }

    /// Float add/subtract: `fd <- fs1, fs2`.
    pub fn fadd(fd: usize, fs1: usize, fs2: usize) -> Self {
        Self::new(PipeKind::FAddSub)
            .with_dest(RegFile::Float, fd)
            .with_src(RegFile::Float, fs1)
            .with_src(RegFile::Float, fs2)
    }

    /// Load: `rd <- mem[rs1]`.
    pub fn load(rd: usize, rs1: usize) -> Self {
        let mut op = Self::new(PipeKind::Int)
            .with_dest(RegFile::Integer, rd)
            .with_src(RegFile::Integer, rs1);
        op.is_load = true;
        op
    }

    /// Store: `mem[rs1] <- rs2`.
    pub fn store(rs1: usize, rs2: usize) -> Self {
        let mut op = Self::new(PipeKind::Int)
            .with_src(RegFile::Integer, rs1)
            .with_src(RegFile::Integer, rs2);
        op.is_store = true;
        op
    }

    /// Atomic add: reads and writes `rd` through memory at `rs1`.
    pub fn amo_add(rd: usize, rs1: usize) -> Self {
        let mut op = Self::new(PipeKind::Int)
            .with_dest(RegFile::Integer, rd)
            .with_src(RegFile::Integer, rs1)
            .with_src(RegFile::Integer, rd);
        op.is_load = true;
        op.is_store = true;
        op
    }
}

/// Architectural to physical register mapping with per-file free lists.
pub struct Renamer {
    /// Current mapping per file; integer x0 stays unmapped.
    map: [[Option<u16>; ARCH_REGS]; RegFile::COUNT],
    /// Free physical registers per file.
    freelist: [VecDeque<u16>; RegFile::COUNT],
    /// Mapping retained past its owner's retire (atomic read-modify-write
    /// rule), reclaimed when the next producer of the register retires.
    retained: [[Option<u16>; ARCH_REGS]; RegFile::COUNT],
}

impl Renamer {
    /// Creates a renamer over `prf_size` physical registers per file and
    /// marks every physical register ready on the scoreboard.
    ///
    /// Initial state: integer `x1..x31` map to physical `0..30` (x0 is
    /// unmapped and reads as constant), float `f0..f31` map to physical
    /// `0..31`; everything else is free.
    pub fn new(prf_size: usize, scoreboard: &mut Scoreboard) -> Result<Self, SimError> {
        if !(33..=128).contains(&prf_size) {
            return Err(SimError::config(format!(
                "prf_size must be within 33..=128, got {}",
                prf_size
            )));
        }

        let mut map = [[None; ARCH_REGS]; RegFile::COUNT];
        let mut freelist: [VecDeque<u16>; RegFile::COUNT] = Default::default();

        for arch in 1..ARCH_REGS {
            map[RegFile::Integer.idx()][arch] = Some((arch - 1) as u16);
        }
        for phys in (ARCH_REGS - 1)..prf_size {
            freelist[RegFile::Integer.idx()].push_back(phys as u16);
        }

        for arch in 0..ARCH_REGS {
            map[RegFile::Float.idx()][arch] = Some(arch as u16);
        }
        for phys in ARCH_REGS..prf_size {
            freelist[RegFile::Float.idx()].push_back(phys as u16);
        }

        for rf in [RegFile::Integer, RegFile::Float] {
            for phys in 0..prf_size {
                scoreboard.set_ready(rf, crate::core::inst::RegMask::single(phys));
            }
        }

        Ok(Self {
            map,
            freelist,
            retained: [[None; ARCH_REGS]; RegFile::COUNT],
        })
    }

    /// Free physical registers in one file.
    pub fn free_regs(&self, rf: RegFile) -> usize {
        self.freelist[rf.idx()].len()
    }

    /// Current physical mapping of an architectural register.
    pub fn mapping(&self, rf: RegFile, arch: usize) -> Option<u16> {
        self.map[rf.idx()][arch]
    }

    /// Renames one operation into a physical-register instruction handle.
    ///
    /// Sources read the current mapping; the destination allocates a fresh
    /// physical register (clearing its scoreboard ready bit) and remembers
    /// the previous mapping for retire/rollback.
    pub fn rename(
        &mut self,
        op: &ArchOp,
        uid: u64,
        scoreboard: &mut Scoreboard,
    ) -> Result<InstPtr, SimError> {
        let mut builder = Inst::builder(op.kind).uid(uid).execute_time(op.execute_time);
        if op.is_load {
            builder = builder.load();
        }
        if op.is_store {
            builder = builder.store();
        }

        for &(rf, arch) in &op.srcs {
            if arch >= ARCH_REGS {
                return Err(SimError::config(format!(
                    "architectural register {} out of range",
                    arch
                )));
            }
            match self.map[rf.idx()][arch] {
                Some(phys) => builder = builder.src(rf, phys as usize),
                // Integer x0: constant zero, always ready.
                None => {}
            }
        }

        let mut dest_arch = None;
        let mut new_phys = None;
        let mut prev_phys = None;
        if let Some((rf, arch)) = op.dest {
            if arch >= ARCH_REGS {
                return Err(SimError::config(format!(
                    "architectural register {} out of range",
                    arch
                )));
            }
            // Integer x0 writes are discarded; no allocation.
            if !(rf == RegFile::Integer && arch == 0) {
                let phys = self.freelist[rf.idx()].pop_front().ok_or_else(|| {
                    SimError::invariant(format!("{} free list exhausted", rf))
                })?;
                prev_phys = self.map[rf.idx()][arch];
                self.map[rf.idx()][arch] = Some(phys);
                scoreboard.clear_ready(rf, crate::core::inst::RegMask::single(phys as usize));
                builder = builder.dest(rf, phys as usize);
                dest_arch = Some((rf, arch));
                new_phys = Some(phys);
            }
        }

        let inst = builder.build();
        {
            let mut i = inst.borrow_mut();
            i.dest_arch = dest_arch;
            i.new_phys = new_phys;
            i.prev_phys = prev_phys;
        }
        trace!("renamed uid={} kind={}", uid, op.kind);
        Ok(inst)
    }

    /// Retire-time reclamation.
    ///
    /// Frees the destination's previous mapping. An atomic read-modify-write
    /// keeps its previous mapping past its own retire; the retained register
    /// is reclaimed when the next producer of the same architectural
    /// register retires.
    pub fn retire(&mut self, inst: &InstPtr) {
        let inst = inst.borrow();
        let Some((rf, arch)) = inst.dest_arch else {
            return;
        };
        if let Some(held) = self.retained[rf.idx()][arch].take() {
            self.freelist[rf.idx()].push_back(held);
        }
        let Some(prev) = inst.prev_phys else {
            return;
        };
        if inst.is_load && inst.is_store {
            self.retained[rf.idx()][arch] = Some(prev);
        } else {
            self.freelist[rf.idx()].push_back(prev);
        }
    }

    /// Flush rollback for one instruction.
    ///
    /// Call in youngest-first order across the flushed set so the mapping
    /// chain unwinds correctly. Restores the previous mapping and returns
    /// the allocated register to the free list, ready again.
    pub fn rollback(&mut self, inst: &InstPtr, scoreboard: &mut Scoreboard) {
        let inst = inst.borrow();
        let Some((rf, arch)) = inst.dest_arch else {
            return;
        };
        self.map[rf.idx()][arch] = inst.prev_phys;
        if let Some(phys) = inst.new_phys {
            self.freelist[rf.idx()].push_front(phys);
            scoreboard.set_ready(rf, crate::core::inst::RegMask::single(phys as usize));
        }
    }
}
