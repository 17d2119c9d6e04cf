use crate::common::builder::ProgramBuilder;
use crate::common::harness::TestContext;
use o3sim_core::core::inst::RegFile;

/// With a 128-entry integer file and x1..x31 live, a plain add allocates
/// one register and frees its previous mapping at retire: the free list
/// returns to 97.
#[test]
fn plain_add_steady_state() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.free_regs(RegFile::Integer), 97);

    ctx.sim.push_program(ProgramBuilder::new().add(3, 1, 2).build());
    ctx.run(1);
    assert_eq!(ctx.free_regs(RegFile::Integer), 96);

    ctx.run_until_idle();
    assert_eq!(ctx.free_regs(RegFile::Integer), 97);
}

/// An atomic add that reads and writes x3 retains x3's previous mapping
/// past its own retire: the post-retire free list is 96, one below the
/// plain-add steady state.
#[test]
fn amo_add_retains_mapping() {
    let mut ctx = TestContext::new().load_program(ProgramBuilder::new().amo_add(3, 1).build());
    ctx.run_until_idle();

    assert_eq!(ctx.stats().insts_retired, 1);
    assert_eq!(ctx.stats().lsu_insts_issued, 1);
    assert_eq!(ctx.free_regs(RegFile::Integer), 96);
}

/// The retained mapping is reclaimed when the next producer of the same
/// architectural register retires.
#[test]
fn retained_mapping_reclaimed_by_next_producer() {
    let mut ctx = TestContext::new().load_program(
        ProgramBuilder::new().amo_add(3, 1).add(3, 1, 2).build(),
    );
    ctx.run_until_idle();

    assert_eq!(ctx.stats().insts_retired, 2);
    assert_eq!(ctx.free_regs(RegFile::Integer), 97);
}

/// Back-to-back renames of the same architectural register never leak
/// physical registers across a long run.
#[test]
fn waw_chain_conserves_registers() {
    let mut program = ProgramBuilder::new();
    for _ in 0..40 {
        program = program.add(3, 3, 2);
    }
    let mut ctx = TestContext::new().load_program(program.build());
    ctx.run_until_idle();

    assert_eq!(ctx.stats().insts_retired, 40);
    assert_eq!(ctx.free_regs(RegFile::Integer), 97);
}
