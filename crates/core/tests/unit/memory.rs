use crate::common::builder::ProgramBuilder;
use crate::common::harness::TestContext;

/// A store whose data register is produced by an in-flight add does not
/// issue from the load/store unit until the add's scoreboard write lands.
#[test]
fn store_waits_for_producer() {
    let mut ctx = TestContext::new().load_program(
        ProgramBuilder::new()
            .add(3, 1, 2)
            .latency(3) // x3 <- x1, x2, in flight for 3 cycles
            .store(1, 3) // mem[x1] <- x3
            .build(),
    );

    // Cycle 1 dispatches both; the add issues at cycle 2 and executes at
    // cycle 5. While it occupies its pipe, the store stays queued.
    ctx.run(4);
    assert_eq!(ctx.stats().lsu_insts_issued, 0);
    assert!(ctx.sim.lsu.in_flight());
    assert_eq!(ctx.stats().insts_issued, 1);

    // Cycle 5: the add's write lands. Cycle 6: the store wakes and issues.
    ctx.run(2);
    assert_eq!(ctx.stats().lsu_insts_issued, 1);

    ctx.run_until_idle();
    assert_eq!(ctx.stats().insts_retired, 2);
}

/// A dependent load wakes its integer consumer through the scoreboard.
#[test]
fn load_wakes_consumer() {
    let mut ctx = TestContext::new().load_program(
        ProgramBuilder::new()
            .load(4, 1) // x4 <- mem[x1]
            .add(5, 4, 2) // x5 <- x4, x2
            .build(),
    );

    // Load issues at cycle 2, data lands after the load-to-use latency
    // (4 cycles, at cycle 6), so the add issues at cycle 7.
    ctx.run(6);
    assert_eq!(ctx.stats().insts_issued, 0);
    ctx.run(1);
    assert_eq!(ctx.stats().insts_issued, 1);

    ctx.run_until_idle();
    assert_eq!(ctx.stats().insts_retired, 2);
    assert_eq!(ctx.stats().lsu_insts_issued, 1);
}

/// Memory operations never reorder, even when a younger one is ready first.
#[test]
fn memory_ops_stay_in_program_order() {
    let mut ctx = TestContext::new().load_program(
        ProgramBuilder::new()
            .add(3, 1, 2)
            .latency(6)
            .store(1, 3) // blocked on x3
            .load(4, 1) // ready, but younger than the store
            .build(),
    );

    ctx.run(6);
    assert_eq!(ctx.stats().lsu_insts_issued, 0);

    ctx.run_until_idle();
    assert_eq!(ctx.stats().lsu_insts_issued, 2);
    assert_eq!(ctx.stats().insts_retired, 3);
}
