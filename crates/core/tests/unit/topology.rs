use crate::common::builder::ProgramBuilder;
use crate::common::harness::TestContext;
use o3sim_core::Simulator;
use o3sim_core::config::Config;

/// A full configuration arriving as JSON builds a working model.
#[test]
fn json_config_builds_and_runs() {
    let json = r#"{
        "execute": { "issue_queue_size": 4 },
        "topology": {
            "pipelines": [["int"], ["int", "mul"], ["br"]],
            "issue_queue_to_pipe_map": [["0", "1"], ["2"]],
            "issue_queue_alias": [["iq0", "alu_q"], ["iq1", "br_q"]],
            "exe_pipe_alias": [["exe0", "alu0"], ["exe1", "alu1"], ["exe2", "br0"]],
            "issue_queue_topology": [["exe0", "exe1"], ["exe2"]]
        }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    let mut ctx = TestContext::with_config(config)
        .load_program(ProgramBuilder::new().add(3, 1, 2).mul(4, 1, 2).branch(1, 2).build());

    assert_eq!(ctx.sim.execute.find_queue("br_q").unwrap().name(), "iq1");
    assert_eq!(ctx.sim.execute.find_pipe("alu1").unwrap().name(), "exe1");

    ctx.run_until_idle();
    assert_eq!(ctx.stats().insts_retired, 3);
}

/// Malformed topology fails at build, before any cycle runs.
#[test]
fn malformed_topology_prevents_clock_start() {
    let bad = [
        // unknown kind
        r#"{"topology": {"pipelines": [["vec"]], "issue_queue_to_pipe_map": [["0"]]}}"#,
        // range past the pipeline list
        r#"{"topology": {"pipelines": [["int"]], "issue_queue_to_pipe_map": [["0", "5"]]}}"#,
        // pipe left unowned
        r#"{"topology": {"pipelines": [["int"], ["int"]], "issue_queue_to_pipe_map": [["0"]]}}"#,
        // inconsistent wiring list
        r#"{"topology": {"pipelines": [["int"], ["int"]],
             "issue_queue_to_pipe_map": [["0", "1"]],
             "issue_queue_topology": [["exe0"]]}}"#,
    ];
    for json in bad {
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(Simulator::new(config).is_err(), "accepted: {}", json);
    }
}

/// Instructions only ever execute on pipes whose kind set includes theirs:
/// with `mul` on exe1 alone, every multiply lands there.
#[test]
fn kind_capability_respected() {
    let config = TestContext::topology_config(&[&["int"], &["int", "mul"]], &[&["0", "1"]]);
    let mut ctx = TestContext::with_config(config).load_program(
        ProgramBuilder::new()
            .mul(3, 1, 2)
            .mul(4, 1, 2)
            .mul(5, 1, 2)
            .build(),
    );
    ctx.run_until_idle();

    assert_eq!(ctx.sim.execute.pipe(1).total_insts_executed, 3);
    assert_eq!(ctx.sim.execute.pipe(0).total_insts_executed, 0);
    assert_eq!(ctx.stats().insts_retired, 3);
}

/// Mixed work spreads across a queue's pipes while respecting capability.
#[test]
fn mixed_kinds_share_a_queue() {
    let config = TestContext::topology_config(&[&["int"], &["int", "mul"]], &[&["0", "1"]]);
    let mut ctx = TestContext::with_config(config).load_program(
        ProgramBuilder::new()
            .add(3, 1, 2)
            .mul(4, 1, 2)
            .add(5, 1, 2)
            .add(6, 1, 2)
            .build(),
    );
    ctx.run_until_idle();

    let stats = ctx.stats();
    assert_eq!(stats.insts_retired, 4);
    // The multiply can only have run on exe1.
    assert!(ctx.sim.execute.pipe(1).total_insts_executed >= 1);
    assert_eq!(
        ctx.sim.execute.pipe(0).total_insts_executed
            + ctx.sim.execute.pipe(1).total_insts_executed,
        4
    );
}
