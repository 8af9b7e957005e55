//! Offline renderer (spec §4.10).
//!
//! Replaces source nodes with memory-input nodes and sink nodes with
//! memory-output nodes, then drives [`ExecutionPlan::render`] in a tight
//! loop over the input buffer in block-sized chunks, advancing each memory
//! node's position exactly as the real-time scheduler advances them block
//! by block. No audio thread, control channel, or device is involved — the
//! plan's `render` semantics are identical either way, which is the
//! property this module exists to make testable ("offline ≡ real-time,
//! modulo I/O").

use crate::compiler::compile;
use crate::error::CompileError;
use crate::factory::NodeFactory;
use crate::model::RigDescription;
use crate::plan::{EngineConfig, ExecutionPlan};
use crate::structural::{MemoryBuffer, SinkNode, SourceNode};

/// Stereo samples captured from every sink node, summed if a rig has more
/// than one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfflineOutput {
    /// Captured left channel.
    pub left: Vec<f32>,
    /// Captured right channel.
    pub right: Vec<f32>,
}

/// Compiles `rig` and renders `input_l`/`input_r` through it, in
/// `config.max_frames`-sized blocks, returning the captured sink output.
///
/// The input channels must be the same length. Rendering stops once every
/// input sample has been consumed — callers whose rig has nonzero
/// [`ExecutionPlan::total_latency_samples`] and want the processing tail to
/// ring out (reverb decay, delay repeats) should pad the input with that
/// many trailing zero samples before calling this.
pub fn render_offline(
    rig: &RigDescription,
    factory: &dyn NodeFactory,
    config: EngineConfig,
    input_l: &[f32],
    input_r: &[f32],
) -> Result<OfflineOutput, CompileError> {
    assert_eq!(input_l.len(), input_r.len(), "left/right input channels must match in length");
    let mut plan = compile(rig, factory, config)?;
    wire_memory_nodes(&mut plan, input_l, input_r);
    run_blocks(&mut plan, input_l.len(), config.max_frames.max(1));
    Ok(collect_output(&mut plan))
}

/// Swaps every source/sink node in `plan` onto a memory buffer: sources read
/// `input_l`/`input_r`, sinks capture into a fresh, growable buffer.
fn wire_memory_nodes(plan: &mut ExecutionPlan, input_l: &[f32], input_r: &[f32]) {
    for &idx in plan.source_nodes() {
        if let Some(source) = downcast_mut::<SourceNode>(plan.node_mut(idx)) {
            source.set_memory_buffer(MemoryBuffer::new(input_l.to_vec(), input_r.to_vec()));
        }
    }
    for &idx in plan.sink_nodes() {
        if let Some(sink) = downcast_mut::<SinkNode>(plan.node_mut(idx)) {
            sink.set_memory_buffer(MemoryBuffer::empty());
        }
    }
}

/// Drives `render` over `total_frames` in chunks no larger than `block`,
/// exactly as a real-time callback would deliver them.
fn run_blocks(plan: &mut ExecutionPlan, total_frames: usize, block: usize) {
    let mut rendered = 0;
    while rendered < total_frames {
        let frames = block.min(total_frames - rendered);
        plan.render(frames);
        rendered += frames;
    }
}

/// Sums every sink's captured memory buffer into one stereo pair. Most rigs
/// have exactly one sink; a rig with several sums them, matching how a
/// physical output device would receive the combined signal.
fn collect_output(plan: &mut ExecutionPlan) -> OfflineOutput {
    let mut out = OfflineOutput::default();
    for &idx in plan.sink_nodes() {
        let Some(sink) = downcast_mut::<SinkNode>(plan.node_mut(idx)) else {
            continue;
        };
        let Some(buf) = sink.memory_buffer() else {
            continue;
        };
        let (l, r) = buf.channels();
        if out.left.len() < l.len() {
            out.left.resize(l.len(), 0.0);
            out.right.resize(r.len(), 0.0);
        }
        for i in 0..l.len() {
            out.left[i] += l[i];
            out.right[i] += r[i];
        }
    }
    out
}

fn downcast_mut<T: 'static>(node: &mut dyn crate::node::RigNode) -> Option<&mut T> {
    node.as_any_mut().downcast_mut::<T>()
}
