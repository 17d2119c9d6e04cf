use crate::common::builder::ProgramBuilder;
use crate::common::harness::TestContext;
use o3sim_core::core::inst::RegFile;

/// An integer-to-float transfer executes on an integer-home pipe and posts
/// readiness to the float scoreboard, leaving the integer side untouched.
/// The float free list shrinks by one while the transfer is in flight; the
/// integer free list never moves.
#[test]
fn i2f_crosses_register_files() {
    let mut ctx = TestContext::new();
    let int_ready_before = ctx.sim.scoreboard.ready_mask(RegFile::Integer);
    let free_float_before = ctx.free_regs(RegFile::Float);
    let free_int_before = ctx.free_regs(RegFile::Integer);

    ctx.sim.push_program(ProgramBuilder::new().i2f(5, 1).build());

    // Dispatch, then issue. In the default topology only exe3 (integer
    // home) serves i2f.
    ctx.run(2);
    assert_eq!(ctx.free_regs(RegFile::Float), free_float_before - 1);
    assert_eq!(ctx.free_regs(RegFile::Integer), free_int_before);
    let f5 = ctx.sim.renamer.mapping(RegFile::Float, 5).unwrap() as usize;
    assert!(!ctx.sim.scoreboard.is_ready(RegFile::Float, f5));
    assert!(ctx.sim.execute.pipe(3).busy());

    // Execute: the float destination goes ready, integer bits unchanged.
    ctx.run(1);
    assert!(ctx.sim.scoreboard.is_ready(RegFile::Float, f5));
    assert_eq!(ctx.sim.scoreboard.ready_mask(RegFile::Integer), int_ready_before);
    assert_eq!(ctx.sim.execute.pipe(3).total_insts_executed, 1);

    // Retire returns the previous f5 mapping to the free list.
    ctx.run_until_idle();
    assert_eq!(ctx.free_regs(RegFile::Float), free_float_before);
    assert_eq!(ctx.free_regs(RegFile::Integer), free_int_before);
}

/// A float-to-integer transfer runs the opposite direction on a float-home
/// pipe.
#[test]
fn f2i_crosses_register_files() {
    let mut ctx = TestContext::new();
    let free_int_before = ctx.free_regs(RegFile::Integer);

    ctx.sim.push_program(ProgramBuilder::new().f2i(7, 3).build());
    ctx.run(2);
    assert_eq!(ctx.free_regs(RegFile::Integer), free_int_before - 1);
    // exe7 is the f2i pipe of the default topology.
    assert!(ctx.sim.execute.pipe(7).busy());
    assert_eq!(ctx.sim.execute.pipe(7).reg_file(), RegFile::Float);

    ctx.run(1);
    let x7 = ctx.sim.renamer.mapping(RegFile::Integer, 7).unwrap() as usize;
    assert!(ctx.sim.scoreboard.is_ready(RegFile::Integer, x7));

    ctx.run_until_idle();
    assert_eq!(ctx.free_regs(RegFile::Integer), free_int_before);
}

/// A consumer of the transferred value wakes up off the cross-file write.
#[test]
fn transfer_wakes_float_consumer() {
    let mut ctx = TestContext::new().load_program(
        ProgramBuilder::new()
            .i2f(5, 1) // f5 <- x1
            .fadd(6, 5, 0) // f6 <- f5, f0  (depends on the transfer)
            .build(),
    );

    // The fadd cannot issue until the transfer's float write is visible.
    ctx.run(3);
    assert_eq!(ctx.stats().insts_executed, 1);
    ctx.run_until_idle();
    assert_eq!(ctx.stats().insts_retired, 2);
}
