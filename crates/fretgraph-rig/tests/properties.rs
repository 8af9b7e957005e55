//! Property-based tests for the graph compiler's structural invariants:
//! acyclicity, determinism, and single-writer-port enforcement.

use proptest::prelude::*;

use fretgraph_rig::{
    compile, render_offline, ChannelMode, CompileError, ConnectionDescriptor, DefaultNodeFactory, EngineConfig,
    NodeDescriptor, RigDescription,
};

const CHAIN_EFFECT: &str = "distortion";

fn config() -> EngineConfig {
    EngineConfig {
        sample_rate: 48_000.0,
        max_frames: 32,
        channel_mode: ChannelMode::Stereo,
    }
}

/// A linear `src -> e0 -> e1 -> ... -> sink` rig of `n` effect nodes.
fn linear_chain(n: usize) -> RigDescription {
    let mut rig = RigDescription::new("chain").with_node(NodeDescriptor::source("src"));
    for i in 0..n {
        rig = rig.with_node(NodeDescriptor::effect(format!("e{i}"), CHAIN_EFFECT));
    }
    rig = rig.with_node(NodeDescriptor::sink("out"));

    let mut prev = "src".to_string();
    for i in 0..n {
        let node = format!("e{i}");
        rig = rig.with_connection(ConnectionDescriptor::simple(prev.as_str(), node.as_str()));
        prev = node;
    }
    rig.with_connection(ConnectionDescriptor::simple(prev.as_str(), "out"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any chain of effect nodes with one extra edge feeding an *earlier*
    /// node back from a *later* one always contains a cycle, and the
    /// compiler must reject every such rig rather than hang or miscompile.
    #[test]
    fn cyclic_rigs_are_always_rejected(n in 2usize..8, back_from in 0usize..8, back_to in 0usize..8) {
        let back_from = back_from % n;
        let back_to = back_to % n;
        prop_assume!(back_from != back_to);
        // Ensure the edge actually runs backward (later index -> earlier
        // index), which always closes a cycle against the forward chain.
        let (hi, lo) = if back_from > back_to { (back_from, back_to) } else { (back_to, back_from) };

        let rig = linear_chain(n).with_connection(ConnectionDescriptor::simple(
            format!("e{hi}"),
            format!("e{lo}"),
        ));
        let factory = DefaultNodeFactory::default();
        let result = compile(&rig, &factory, config());
        prop_assert!(matches!(result, Err(CompileError::Cycle(_))), "expected a Cycle error, got {:?}", result.map(|_| ()));
    }

    /// Two distinct upstream nodes wired into the same node's default input
    /// port must always be rejected — a port is single-writer by construction.
    #[test]
    fn double_connected_input_port_is_always_rejected(n in 2usize..6) {
        let rig = linear_chain(n)
            .with_node(NodeDescriptor::effect("intruder", CHAIN_EFFECT))
            .with_connection(ConnectionDescriptor::simple("intruder", "e0"));
        let factory = DefaultNodeFactory::default();
        let result = compile(&rig, &factory, config());
        prop_assert!(
            matches!(result, Err(CompileError::InputPortAlreadyConnected { .. })),
            "expected InputPortAlreadyConnected, got {:?}", result.map(|_| ())
        );
    }

    /// Compiling the same rig description twice, independently, and
    /// rendering identical input through both plans must produce bit-identical
    /// output — the compiler has no hidden nondeterminism (hash-map
    /// iteration order, random tie-breaks) that could make two builds of the
    /// same rig diverge.
    #[test]
    fn identical_rigs_compile_to_identically_behaving_plans(n in 1usize..6, frames in 1usize..200) {
        let rig = linear_chain(n);
        let factory = DefaultNodeFactory::default();

        let input: Vec<f32> = (0..frames).map(|i| ((i % 17) as f32 / 17.0) - 0.5).collect();

        let out_a = render_offline(&rig, &factory, config(), &input, &input).unwrap();
        let out_b = render_offline(&rig, &factory, config(), &input, &input).unwrap();

        prop_assert_eq!(out_a.left, out_b.left);
        prop_assert_eq!(out_a.right, out_b.right);

        // Node ids and source/sink classification must also agree exactly.
        let plan_a = compile(&rig, &factory, config()).unwrap();
        let plan_b = compile(&rig, &factory, config()).unwrap();
        prop_assert_eq!(plan_a.node_ids().clone().into_iter().collect::<std::collections::BTreeMap<_, _>>(),
                         plan_b.node_ids().clone().into_iter().collect::<std::collections::BTreeMap<_, _>>());
        prop_assert_eq!(plan_a.source_nodes().to_vec(), plan_b.source_nodes().to_vec());
        prop_assert_eq!(plan_a.sink_nodes().to_vec(), plan_b.sink_nodes().to_vec());
        prop_assert_eq!(plan_a.total_latency_samples, plan_b.total_latency_samples);
    }
}
