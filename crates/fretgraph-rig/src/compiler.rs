//! Turns a [`RigDescription`] into an [`ExecutionPlan`] (spec §4.2).
//!
//! Compilation runs entirely on the control thread and never touches
//! anything the audio thread can see until the finished plan is handed off
//! through [`crate::control`]. The seven steps below mirror the spec:
//! resolve node types, validate connections against each node's port layout,
//! reject cycles, topologically order the nodes (ties broken by rig
//! insertion order), allocate buffer slots, `prepare` every node, and
//! assemble the plan.

use std::collections::HashMap;

use crate::error::CompileError;
use crate::factory::NodeFactory;
use crate::model::{ChannelMode, NodeDescriptor, ParamValue, RigDescription};
use crate::node::RigNode;
use crate::plan::{BufferRef, EngineConfig, ExecutionPlan, ProcessStep};
use crate::port::{layout_for, PortLayout};

/// Compiles `rig` into a ready-to-run plan, or the first structural problem
/// found. The currently live plan (if any) is untouched by a failed compile —
/// the caller simply doesn't call [`crate::control::ControlHandle::swap_plan`].
pub fn compile(rig: &RigDescription, factory: &dyn NodeFactory, config: EngineConfig) -> Result<ExecutionPlan, CompileError> {
    let node_count = rig.nodes.len();

    let mut node_index = HashMap::with_capacity(node_count);
    for (i, node) in rig.nodes.iter().enumerate() {
        node_index.insert(node.id.clone(), i);
    }

    // Step 1/2: derive port layouts (no node constructed yet) and validate
    // every connection against them.
    let layouts: Vec<PortLayout> = rig.nodes.iter().map(layout_for).collect();
    let (input_conn, adjacency, in_degree) = wire_connections(rig, &node_index, &layouts)?;

    // Step 3/4: cycle check + topological order, insertion-order tie-break.
    let order = topological_order(node_count, &adjacency, &in_degree)
        .map_err(|unordered| CompileError::Cycle(unordered.into_iter().map(|idx| rig.nodes[idx].id.clone()).collect()))?;

    // Step 5: allocate a fresh, never-reused buffer slot range per output
    // port, plus a permanently-silent reserved slot for unconnected inputs.
    let channel_mode = config.channel_mode;
    let silence = match channel_mode {
        ChannelMode::Mono => BufferRef::Mono(0),
        ChannelMode::Stereo => BufferRef::Stereo(0, 1),
    };
    let mut next_slot = match channel_mode {
        ChannelMode::Mono => 1,
        ChannelMode::Stereo => 2,
    };
    let mut output_bufs: Vec<Vec<BufferRef>> = layouts.iter().map(|l| vec![silence; l.outputs.len()]).collect();
    for &idx in &order {
        for slot in &mut output_bufs[idx] {
            *slot = match channel_mode {
                ChannelMode::Mono => {
                    let r = BufferRef::Mono(next_slot);
                    next_slot += 1;
                    r
                }
                ChannelMode::Stereo => {
                    let r = BufferRef::Stereo(next_slot, next_slot + 1);
                    next_slot += 2;
                    r
                }
            };
        }
    }
    let slot_count = next_slot;

    let mut steps = Vec::with_capacity(node_count);
    for &idx in &order {
        let inputs = (0..layouts[idx].inputs.len())
            .map(|port_idx| match input_conn[idx][port_idx] {
                Some((source_idx, source_port_idx)) => output_bufs[source_idx][source_port_idx],
                None => {
                    tracing::warn!(
                        node = %rig.nodes[idx].id,
                        port = %layouts[idx].inputs[port_idx],
                        "unconnected input port, feeding silence"
                    );
                    silence
                }
            })
            .collect();
        steps.push(ProcessStep {
            node_idx: idx,
            inputs,
            outputs: output_bufs[idx].clone(),
        });
    }

    // Construct every node (original rig order, independent of `order`) and
    // apply its parameter map before `prepare`.
    let mut nodes: Vec<Box<dyn RigNode>> = Vec::with_capacity(node_count);
    for descriptor in &rig.nodes {
        let mut node = factory.build(descriptor, config.sample_rate)?;
        apply_params(node.as_mut(), descriptor);
        nodes.push(node);
    }

    // Step 6: prepare in topological order, so a node whose behavior depends
    // on an upstream node's latency (none currently do, but the contract
    // allows it) sees a fully set-up predecessor first.
    for &idx in &order {
        nodes[idx].prepare(config.sample_rate, config.max_frames);
    }

    // Longest source-to-sink path, used as the plan's reported latency.
    let mut distance = vec![0u32; node_count];
    for &idx in &order {
        let upstream = (0..layouts[idx].inputs.len())
            .filter_map(|port_idx| input_conn[idx][port_idx].map(|(source_idx, _)| distance[source_idx]))
            .max()
            .unwrap_or(0);
        distance[idx] = upstream + nodes[idx].latency_samples();
    }

    let source_nodes = node_indices_with_tag(rig, crate::factory::SOURCE_TAG);
    let sink_nodes = node_indices_with_tag(rig, crate::factory::SINK_TAG);
    let total_latency_samples = sink_nodes.iter().map(|&idx| distance[idx]).max().unwrap_or(0);

    let node_bypassed: Vec<bool> = rig.nodes.iter().map(|n| n.bypassed).collect();
    let node_single_port: Vec<bool> = layouts.iter().map(|l| l.inputs.len() == 1 && l.outputs.len() == 1).collect();

    Ok(ExecutionPlan::new(
        nodes,
        node_index,
        node_bypassed,
        node_single_port,
        steps,
        slot_count,
        source_nodes,
        sink_nodes,
        config,
        rig.structural_hash(),
        total_latency_samples,
    ))
}

type InputWiring = Vec<Vec<Option<(usize, usize)>>>;
type Adjacency = Vec<Vec<usize>>;

/// Resolves every connection to a `(node index, port index)` pair on each
/// side, rejecting unknown nodes/ports and doubly-connected inputs.
fn wire_connections(
    rig: &RigDescription,
    node_index: &HashMap<String, usize>,
    layouts: &[PortLayout],
) -> Result<(InputWiring, Adjacency, Vec<usize>), CompileError> {
    let node_count = rig.nodes.len();
    let mut input_conn: InputWiring = layouts.iter().map(|l| vec![None; l.inputs.len()]).collect();
    let mut adjacency: Adjacency = vec![Vec::new(); node_count];
    let mut in_degree = vec![0usize; node_count];

    for conn in &rig.connections {
        let source_idx = *node_index
            .get(conn.source_node.as_str())
            .ok_or_else(|| CompileError::UnknownNode(conn.source_node.clone()))?;
        let target_idx = *node_index
            .get(conn.target_node.as_str())
            .ok_or_else(|| CompileError::UnknownNode(conn.target_node.clone()))?;
        let source_port_idx = layouts[source_idx].output_index(&conn.source_port).ok_or_else(|| CompileError::UnknownPort {
            node: conn.source_node.clone(),
            port: conn.source_port.clone(),
        })?;
        let target_port_idx = layouts[target_idx].input_index(&conn.target_port).ok_or_else(|| CompileError::UnknownPort {
            node: conn.target_node.clone(),
            port: conn.target_port.clone(),
        })?;

        let slot = &mut input_conn[target_idx][target_port_idx];
        if slot.is_some() {
            return Err(CompileError::InputPortAlreadyConnected {
                node: conn.target_node.clone(),
                port: conn.target_port.clone(),
            });
        }
        *slot = Some((source_idx, source_port_idx));
        adjacency[source_idx].push(target_idx);
        in_degree[target_idx] += 1;
    }

    Ok((input_conn, adjacency, in_degree))
}

/// Kahn's algorithm, always picking the lowest-index ready node so two rigs
/// with the same topology in a different node order compile deterministically
/// differently (per [`RigDescription`]'s documented ordering contract).
///
/// On failure, returns the indices that never reached in-degree zero — the
/// nodes on or downstream of the cycle — for [`CompileError::Cycle`] to name.
fn topological_order(node_count: usize, adjacency: &Adjacency, in_degree: &[usize]) -> Result<Vec<usize>, Vec<usize>> {
    let mut remaining = in_degree.to_vec();
    let mut emitted = vec![false; node_count];
    let mut order = Vec::with_capacity(node_count);

    for _ in 0..node_count {
        let next = (0..node_count).find(|&i| !emitted[i] && remaining[i] == 0);
        let Some(next) = next else {
            let stuck = (0..node_count).filter(|&i| !emitted[i]).collect();
            return Err(stuck);
        };
        emitted[next] = true;
        order.push(next);
        for &target in &adjacency[next] {
            remaining[target] -= 1;
        }
    }

    Ok(order)
}

fn node_indices_with_tag(rig: &RigDescription, tag: &str) -> Vec<usize> {
    rig.nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.type_tag == tag)
        .map(|(i, _)| i)
        .collect()
}

/// Applies a node descriptor's parameter map before `prepare`, so the first
/// block a node ever processes already reflects the rig's saved values
/// instead of each effect's built-in defaults.
fn apply_params(node: &mut dyn RigNode, descriptor: &NodeDescriptor) {
    let descriptors = node.parameters();
    for (key, value) in &descriptor.params {
        let Some(desc) = descriptors.iter().find(|d| d.string_id == key) else {
            continue;
        };
        let raw = match value {
            ParamValue::Choice(label) => node
                .choice_labels(key)
                .and_then(|labels| labels.iter().position(|l| l.eq_ignore_ascii_case(label)))
                .map(|i| i as f32)
                .unwrap_or_else(|| value.as_f32_lossy()),
            other => other.as_f32_lossy(),
        };
        node.set_param(key, desc.clamp(raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::DefaultNodeFactory;
    use crate::model::{ConnectionDescriptor, NodeDescriptor};

    fn config() -> EngineConfig {
        EngineConfig {
            sample_rate: 48_000.0,
            max_frames: 128,
            channel_mode: ChannelMode::Stereo,
        }
    }

    #[test]
    fn compiles_source_effect_sink_chain() {
        let rig = RigDescription::new("chain")
            .with_node(NodeDescriptor::source("in"))
            .with_node(NodeDescriptor::effect("drive", "distortion"))
            .with_node(NodeDescriptor::sink("out"))
            .with_connection(ConnectionDescriptor::simple("in", "drive"))
            .with_connection(ConnectionDescriptor::simple("drive", "out"));
        let factory = DefaultNodeFactory::default();
        let plan = compile(&rig, &factory, config()).expect("compiles");
        assert_eq!(plan.source_nodes(), &[0]);
        assert_eq!(plan.sink_nodes(), &[2]);
    }

    #[test]
    fn rejects_cycle() {
        let rig = RigDescription::new("loop")
            .with_node(NodeDescriptor::effect("a", "distortion"))
            .with_node(NodeDescriptor::effect("b", "distortion"))
            .with_connection(ConnectionDescriptor::simple("a", "b"))
            .with_connection(ConnectionDescriptor::simple("b", "a"));
        let factory = DefaultNodeFactory::default();
        let err = compile(&rig, &factory, config()).unwrap_err();
        let CompileError::Cycle(nodes) = err else {
            panic!("expected Cycle, got {err:?}");
        };
        assert!(nodes.contains(&"a".to_string()));
        assert!(nodes.contains(&"b".to_string()));
    }

    #[test]
    fn rejects_unknown_node_in_connection() {
        let rig = RigDescription::new("bad")
            .with_node(NodeDescriptor::effect("a", "distortion"))
            .with_connection(ConnectionDescriptor::simple("a", "missing"));
        let factory = DefaultNodeFactory::default();
        let err = compile(&rig, &factory, config()).unwrap_err();
        assert!(matches!(err, CompileError::UnknownNode(n) if n == "missing"));
    }

    #[test]
    fn rejects_double_connected_input() {
        let rig = RigDescription::new("bad")
            .with_node(NodeDescriptor::source("a"))
            .with_node(NodeDescriptor::source("b"))
            .with_node(NodeDescriptor::effect("c", "distortion"))
            .with_connection(ConnectionDescriptor::simple("a", "c"))
            .with_connection(ConnectionDescriptor::simple("b", "c"));
        let factory = DefaultNodeFactory::default();
        let err = compile(&rig, &factory, config()).unwrap_err();
        assert!(matches!(err, CompileError::InputPortAlreadyConnected { .. }));
    }

    #[test]
    fn rejects_unknown_effect_type() {
        let rig = RigDescription::new("bad").with_node(NodeDescriptor::effect("x", "not_a_real_effect"));
        let factory = DefaultNodeFactory::default();
        let err = compile(&rig, &factory, config()).unwrap_err();
        assert!(matches!(err, CompileError::UnknownEffectType(t) if t == "not_a_real_effect"));
    }

    #[test]
    fn unconnected_input_feeds_silence_without_failing_compile() {
        let rig = RigDescription::new("orphan").with_node(NodeDescriptor::effect("d", "distortion"));
        let factory = DefaultNodeFactory::default();
        assert!(compile(&rig, &factory, config()).is_ok());
    }

    #[test]
    fn applies_saved_parameters_before_first_render() {
        let rig = RigDescription::new("params").with_node(
            NodeDescriptor::effect("d", "distortion").with_param("dist_drive", ParamValue::Number(30.0)),
        );
        let factory = DefaultNodeFactory::default();
        let mut plan = compile(&rig, &factory, config()).expect("compiles");
        let idx = plan.index_of("d").unwrap();
        let value = plan.node_mut(idx).get_param("dist_drive").unwrap();
        assert!((value - 30.0).abs() < 0.01);
    }

    #[test]
    fn topological_tie_break_is_insertion_order() {
        // Two independent source->sink chains with no connections between
        // them: both are "ready" at once, so the lower rig index must win.
        let rig = RigDescription::new("parallel")
            .with_node(NodeDescriptor::source("s1"))
            .with_node(NodeDescriptor::source("s2"))
            .with_node(NodeDescriptor::sink("o1"))
            .with_node(NodeDescriptor::sink("o2"))
            .with_connection(ConnectionDescriptor::simple("s1", "o1"))
            .with_connection(ConnectionDescriptor::simple("s2", "o2"));
        let factory = DefaultNodeFactory::default();
        let plan = compile(&rig, &factory, config()).expect("compiles");
        assert_eq!(plan.source_nodes(), &[0, 1]);
    }
}
