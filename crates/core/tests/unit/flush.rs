use crate::common::builder::ProgramBuilder;
use crate::common::harness::TestContext;
use o3sim_core::core::flush::FlushCriteria;
use o3sim_core::core::inst::RegFile;

/// An external misprediction flush cancels every younger instruction in
/// pipes and queues within the same tick, leaves older work running, and
/// unwinds the rename state.
#[test]
fn flush_cone_discards_younger_work() {
    let config = TestContext::topology_config(
        &[&["int"], &["int"], &["br"]],
        &[&["0", "1"], &["2"]],
    );
    let mut ctx = TestContext::with_config(config).load_program(
        ProgramBuilder::new()
            .add(3, 1, 2)
            .latency(10) // uid 1: old, stays
            .branch(1, 2) // uid 2: resolves quickly
            .add(4, 1, 2)
            .latency(10) // uid 3: young, in a pipe when flushed
            .add(5, 4, 2) // uid 4: young, resident in the queue
            .build(),
    );

    // Cycle 2 issues uids 1, 2, 3; uid 4 waits on x4. Cycle 4 retires the
    // branch.
    ctx.run(4);
    assert!(ctx.sim.execute.pipe(0).busy());
    assert!(ctx.sim.execute.pipe(1).busy());
    assert_eq!(ctx.stats().insts_retired, 1);

    ctx.sim.flush(FlushCriteria::misprediction(3));

    // Younger work is gone by the end of the tick; the older add runs on.
    assert!(ctx.sim.execute.pipe(0).busy());
    assert!(!ctx.sim.execute.pipe(1).busy());
    assert_eq!(ctx.sim.execute.pipe(1).outstanding_execute(), 0);
    assert!(ctx.sim.execute.queue(0).is_empty());
    assert_eq!(ctx.stats().insts_flushed, 2);
    // uids 3 and 4 rolled back; only uid 1's destination is still held.
    assert_eq!(ctx.free_regs(RegFile::Integer), 96);

    // No flushed instruction ever executes.
    ctx.run_until_idle();
    assert_eq!(ctx.sim.execute.pipe(1).total_insts_executed, 0);
    assert_eq!(ctx.stats().insts_retired, 2);
    assert_eq!(ctx.free_regs(RegFile::Integer), 97);
}

/// Re-delivering the same criteria, or delivering criteria that match
/// nothing, changes no state.
#[test]
fn flush_is_idempotent() {
    let config = TestContext::topology_config(&[&["int"]], &[&["0"]]);
    let mut ctx = TestContext::with_config(config).load_program(
        ProgramBuilder::new()
            .add(3, 1, 2)
            .latency(20)
            .add(4, 1, 2)
            .build(),
    );
    ctx.run(2);

    ctx.sim.flush(FlushCriteria::misprediction(2));
    let flushed_once = ctx.stats().insts_flushed;
    let free_once = ctx.free_regs(RegFile::Integer);
    assert_eq!(flushed_once, 1);

    ctx.sim.flush(FlushCriteria::misprediction(2));
    assert_eq!(ctx.stats().insts_flushed, flushed_once);
    assert_eq!(ctx.free_regs(RegFile::Integer), free_once);

    ctx.sim.flush(FlushCriteria::none());
    assert_eq!(ctx.stats().insts_flushed, flushed_once);
    assert!(ctx.sim.execute.pipe(0).busy());

    ctx.run_until_idle();
    assert_eq!(ctx.stats().insts_retired, 1);
}

/// An injected misprediction flushes its own originator and everything
/// younger, while effects that already fired in the tick stand.
#[test]
fn injected_misprediction_flushes_originator_and_younger() {
    let mut config = TestContext::topology_config(&[&["br"], &["int"]], &[&["0"], &["1"]]);
    config.execute.enable_random_misprediction = true;
    // Seeded so the first executed branch draws an injection.
    config.general.seed = 19;

    let mut ctx = TestContext::with_config(config).load_program(
        ProgramBuilder::new()
            .branch(1, 2) // uid 1: injects at execute
            .add(3, 1, 2) // uid 2: executes in the same tick, then flushes
            .add(4, 1, 2) // uid 3: still resident, dropped
            .build(),
    );

    ctx.run_until_idle();

    let stats = ctx.stats();
    assert_eq!(stats.mispredicts_injected, 1);
    assert_eq!(stats.flushes, 1);
    // The branch and the same-tick add both executed; nothing retired.
    assert_eq!(stats.insts_executed, 2);
    assert_eq!(stats.insts_retired, 0);
    assert_eq!(stats.insts_flushed, 3);
    // Rename state fully unwound.
    assert_eq!(ctx.free_regs(RegFile::Integer), 97);
    assert!(ctx.sim.idle());
}

/// Exception criteria spare their originator.
#[test]
fn exception_flush_excludes_origin() {
    let config = TestContext::topology_config(&[&["int"]], &[&["0"]]);
    let mut ctx = TestContext::with_config(config).load_program(
        ProgramBuilder::new()
            .add(3, 1, 2)
            .latency(20)
            .add(4, 1, 2)
            .build(),
    );
    ctx.run(2);
    assert!(ctx.sim.execute.pipe(0).busy());

    // Origin uid 1 stays; uid 2 (queue resident) goes.
    ctx.sim.flush(FlushCriteria::exception(1));
    assert!(ctx.sim.execute.pipe(0).busy());
    assert_eq!(ctx.stats().insts_flushed, 1);

    ctx.run_until_idle();
    assert_eq!(ctx.stats().insts_retired, 1);
}
