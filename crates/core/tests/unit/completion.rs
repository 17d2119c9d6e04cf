use mockall::mock;
use mockall::predicate::eq;

use crate::common::builder::ProgramBuilder;
use crate::common::harness::TestContext;
use o3sim_core::sim::CompletionListener;

mock! {
    pub Listener {}
    impl CompletionListener for Listener {
        fn on_complete(&mut self, uid: u64);
    }
}

/// A dependent pair completes in dependence order: the producer's credit
/// arrives strictly before the consumer's.
#[test]
fn credits_arrive_in_dependence_order() {
    let mut ctx = TestContext::new().load_program(
        ProgramBuilder::new().add(3, 1, 2).add(4, 3, 2).build(),
    );

    let mut seq = mockall::Sequence::new();
    let mut listener = MockListener::new();
    listener
        .expect_on_complete()
        .with(eq(1))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| ());
    listener
        .expect_on_complete()
        .with(eq(2))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| ());
    ctx.sim.set_completion_listener(Box::new(listener));

    ctx.run_until_idle();
    // Expectations verify when the mock drops with the simulator.
}

/// Every retired instruction produces exactly one credit; flushed ones
/// produce none.
#[test]
fn one_credit_per_retired_inst() {
    let mut ctx = TestContext::new().load_program(
        ProgramBuilder::new()
            .add(3, 1, 2)
            .add(4, 1, 2)
            .fadd(5, 1, 2)
            .build(),
    );

    let mut listener = MockListener::new();
    listener.expect_on_complete().times(3).returning(|_| ());
    ctx.sim.set_completion_listener(Box::new(listener));

    ctx.run_until_idle();
    assert_eq!(ctx.stats().insts_retired, 3);
}
