use o3sim_core::core::rename::ArchOp;

/// Fluent builder for small architectural programs.
pub struct ProgramBuilder {
    ops: Vec<ArchOp>,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn add(mut self, rd: usize, rs1: usize, rs2: usize) -> Self {
        self.ops.push(ArchOp::add(rd, rs1, rs2));
        self
    }

    pub fn mul(mut self, rd: usize, rs1: usize, rs2: usize) -> Self {
        self.ops.push(ArchOp::mul(rd, rs1, rs2));
        self
    }

    pub fn fadd(mut self, fd: usize, fs1: usize, fs2: usize) -> Self {
        self.ops.push(ArchOp::fadd(fd, fs1, fs2));
        self
    }

    pub fn branch(mut self, rs1: usize, rs2: usize) -> Self {
        self.ops.push(ArchOp::branch(rs1, rs2));
        self
    }

    pub fn i2f(mut self, fd: usize, rs1: usize) -> Self {
        self.ops.push(ArchOp::i2f(fd, rs1));
        self
    }

    pub fn f2i(mut self, rd: usize, fs1: usize) -> Self {
        self.ops.push(ArchOp::f2i(rd, fs1));
        self
    }

    pub fn load(mut self, rd: usize, rs1: usize) -> Self {
        self.ops.push(ArchOp::load(rd, rs1));
        self
    }

    pub fn store(mut self, rs1: usize, rs2: usize) -> Self {
        self.ops.push(ArchOp::store(rs1, rs2));
        self
    }

    pub fn amo_add(mut self, rd: usize, rs1: usize) -> Self {
        self.ops.push(ArchOp::amo_add(rd, rs1));
        self
    }

    /// Overrides the declared latency of the most recent operation.
    pub fn latency(mut self, cycles: u64) -> Self {
        if let Some(op) = self.ops.last_mut() {
            op.execute_time = cycles;
        }
        self
    }

    /// Appends an arbitrary operation.
    pub fn op(mut self, op: ArchOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn build(self) -> Vec<ArchOp> {
        self.ops
    }
}
