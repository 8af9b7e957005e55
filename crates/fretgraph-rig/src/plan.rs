//! The compiled, audio-thread-ready form of a rig (spec §4.2, §4.4).
//!
//! An [`ExecutionPlan`] is immutable once built: the control thread swaps
//! pointers to whole plans (via [`crate::control`]) rather than mutating one
//! in place, so the audio thread never observes a half-updated graph.

use std::collections::HashMap;

use crate::model::ChannelMode;
use crate::node::{PortSignal, PortSignalMut, RigNode};

/// A reference to one port's buffer slot(s) within a plan's [`BufferPool`].
/// Stereo slots are always two adjacent indices, `(left, left + 1)` — the
/// compiler only ever allocates fresh, monotonically increasing slots, which
/// is what lets [`BufferPool`] hand out several disjoint mutable output
/// views from one `Vec<Vec<f32>>` without any unsafe code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRef {
    /// A single-channel slot.
    Mono(usize),
    /// Two adjacent slots, left then right.
    Stereo(usize, usize),
}

impl BufferRef {
    fn channel_count(self) -> usize {
        match self {
            BufferRef::Mono(_) => 1,
            BufferRef::Stereo(..) => 2,
        }
    }

    fn lowest_index(self) -> usize {
        match self {
            BufferRef::Mono(i) => i,
            BufferRef::Stereo(l, _) => l,
        }
    }

    fn highest_index(self) -> usize {
        match self {
            BufferRef::Mono(i) => i,
            BufferRef::Stereo(_, r) => r,
        }
    }
}

/// One instruction in a plan's render sequence: run a node, reading
/// `inputs` and writing `outputs` (both in the node's declared port order).
/// `node_idx` doubles as the key into [`ExecutionPlan`]'s bypass table, so
/// bypass can be toggled live without recompiling.
pub struct ProcessStep {
    /// Index into [`ExecutionPlan`]'s node list.
    pub node_idx: usize,
    /// Input port buffers.
    pub inputs: Vec<BufferRef>,
    /// Output port buffers. Always freshly allocated, strictly increasing
    /// slot indices — see [`BufferRef`].
    pub outputs: Vec<BufferRef>,
}

/// Owns every buffer slot a plan's steps read from and write to, plus a
/// fixed staging area used to read a step's inputs before that step's node
/// gets a mutable handle on its own output slots.
///
/// Indexing a single `Vec<Vec<f32>>` to borrow one slot immutably and a
/// different slot mutably in the same expression needs either nightly's
/// `get_many_mut` or `unsafe`; neither is available here. Each step's input
/// samples are instead copied into pre-allocated per-step scratch channels
/// first (a plain, bounds-checked copy, not an allocation — the scratch is
/// sized once at compile time), so the node is called with views borrowed
/// from two different fields of this struct (`scratch` for inputs, `slots`
/// for outputs), which the borrow checker accepts unaided.
pub struct BufferPool {
    slots: Vec<Vec<f32>>,
    /// Per-step flattened input-channel scratch, in the same order as that
    /// step's `inputs` once each [`BufferRef`] is expanded to 1 or 2 channels.
    scratch: Vec<Vec<Vec<f32>>>,
}

impl BufferPool {
    /// Allocates `slot_count` zeroed slots of `max_frames` samples each, and
    /// one scratch channel per flattened input channel of every step.
    fn new(slot_count: usize, max_frames: usize, steps: &[ProcessStep]) -> Self {
        let scratch = steps
            .iter()
            .map(|step| {
                let channels: usize = step.inputs.iter().map(|r| r.channel_count()).sum();
                vec![vec![0.0f32; max_frames]; channels]
            })
            .collect();
        Self {
            slots: vec![vec![0.0; max_frames]; slot_count],
            scratch,
        }
    }

    /// Number of allocated slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn stage_inputs(&mut self, step_idx: usize, inputs: &[BufferRef], frames: usize) {
        let scratch = &mut self.scratch[step_idx];
        let mut channel = 0usize;
        for input in inputs {
            match *input {
                BufferRef::Mono(slot) => {
                    scratch[channel][..frames].copy_from_slice(&self.slots[slot][..frames]);
                    channel += 1;
                }
                BufferRef::Stereo(l, r) => {
                    scratch[channel][..frames].copy_from_slice(&self.slots[l][..frames]);
                    scratch[channel + 1][..frames].copy_from_slice(&self.slots[r][..frames]);
                    channel += 2;
                }
            }
        }
    }

    fn input_views(&self, step_idx: usize, inputs: &[BufferRef], frames: usize) -> Vec<PortSignal<'_>> {
        let scratch = &self.scratch[step_idx];
        let mut channel = 0usize;
        inputs
            .iter()
            .map(|input| {
                let view = match input {
                    BufferRef::Mono(_) => PortSignal::Mono(&scratch[channel][..frames]),
                    BufferRef::Stereo(..) => {
                        PortSignal::Stereo(&scratch[channel][..frames], &scratch[channel + 1][..frames])
                    }
                };
                channel += input.channel_count();
                view
            })
            .collect()
    }

    /// Produces disjoint mutable views for every output of one step. Sound
    /// because the compiler hands out output slots in strictly increasing
    /// order with no reuse, so splitting the slot vector from the front
    /// exactly once per output never aliases two views.
    fn output_views(&mut self, outputs: &[BufferRef], frames: usize) -> Vec<PortSignalMut<'_>> {
        let mut views = Vec::with_capacity(outputs.len());
        let mut rest: &mut [Vec<f32>] = &mut self.slots;
        let mut consumed = 0usize;
        for output in outputs {
            let skip = output.lowest_index() - consumed;
            let span = output.highest_index() - output.lowest_index() + 1;
            let (_, tail) = rest.split_at_mut(skip);
            let (taken, new_rest) = tail.split_at_mut(span);
            rest = new_rest;
            consumed = output.highest_index() + 1;
            let view = match *output {
                BufferRef::Mono(_) => PortSignalMut::Mono(&mut taken[0][..frames]),
                BufferRef::Stereo(..) => {
                    let (left, right) = taken.split_at_mut(1);
                    PortSignalMut::Stereo(&mut left[0][..frames], &mut right[0][..frames])
                }
            };
            views.push(view);
        }
        views
    }

    fn copy_direct(&mut self, input: BufferRef, output: BufferRef, frames: usize) {
        match (input, output) {
            (BufferRef::Mono(si), BufferRef::Mono(so)) => {
                let (src, dst) = split_two_mut(&mut self.slots, si, so);
                dst[..frames].copy_from_slice(&src[..frames]);
            }
            (BufferRef::Stereo(sil, sir), BufferRef::Stereo(sol, sor)) => {
                let (sl, dl) = split_two_mut(&mut self.slots, sil, sol);
                dl[..frames].copy_from_slice(&sl[..frames]);
                let (sr, dr) = split_two_mut(&mut self.slots, sir, sor);
                dr[..frames].copy_from_slice(&sr[..frames]);
            }
            // Engine-level bypass never connects a mono port to a stereo
            // one: channel mode is uniform for the whole plan.
            _ => {}
        }
    }
}

/// Borrows two distinct elements of a slice mutably at once. Panics if the
/// indices are equal (callers never do this — bypass always copies between
/// two distinct freshly-allocated slots).
fn split_two_mut<T>(slice: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b);
    if a < b {
        let (left, right) = slice.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = slice.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Engine-wide configuration a plan is compiled against.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Maximum block size this plan will ever be asked to render.
    pub max_frames: usize,
    /// Mono or stereo processing throughout the graph.
    pub channel_mode: ChannelMode,
}

/// A compiled, ready-to-run rig. Built by [`crate::compiler::compile`],
/// executed by [`ExecutionPlan::render`], swapped in by [`crate::control`].
pub struct ExecutionPlan {
    nodes: Vec<Box<dyn RigNode>>,
    node_index: HashMap<String, usize>,
    node_bypassed: Vec<bool>,
    /// Whether a node is single-port (eligible for the bypass shortcut).
    node_single_port: Vec<bool>,
    steps: Vec<ProcessStep>,
    buffers: BufferPool,
    source_nodes: Vec<usize>,
    sink_nodes: Vec<usize>,
    config: EngineConfig,
    /// Structural hash of the [`crate::model::RigDescription`] this plan was
    /// compiled from, used to detect no-op recompiles.
    pub source_hash: u64,
    /// Sum of per-node reported latencies along the graph's longest
    /// source-to-sink path. Reported to hosts as plugin delay compensation;
    /// no per-path sample alignment between parallel branches is performed
    /// (see `DESIGN.md`).
    pub total_latency_samples: u32,
}

impl ExecutionPlan {
    /// Used only by [`crate::compiler::compile`], which has already
    /// validated every invariant `render` and `set_param` rely on.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        nodes: Vec<Box<dyn RigNode>>,
        node_index: HashMap<String, usize>,
        node_bypassed: Vec<bool>,
        node_single_port: Vec<bool>,
        steps: Vec<ProcessStep>,
        slot_count: usize,
        source_nodes: Vec<usize>,
        sink_nodes: Vec<usize>,
        config: EngineConfig,
        source_hash: u64,
        total_latency_samples: u32,
    ) -> Self {
        let buffers = BufferPool::new(slot_count, config.max_frames, &steps);
        Self {
            nodes,
            node_index,
            node_bypassed,
            node_single_port,
            steps,
            buffers,
            source_nodes,
            sink_nodes,
            config,
            source_hash,
            total_latency_samples,
        }
    }

    /// Engine configuration this plan was compiled against.
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Node indices, in rig order, of every `source` node in the plan.
    pub fn source_nodes(&self) -> &[usize] {
        &self.source_nodes
    }

    /// Node indices, in rig order, of every `sink` node in the plan.
    pub fn sink_nodes(&self) -> &[usize] {
        &self.sink_nodes
    }

    /// Looks up a node's plan index by its rig id.
    pub fn index_of(&self, node_id: &str) -> Option<usize> {
        self.node_index.get(node_id).copied()
    }

    /// The full rig-id → plan-index mapping, for callers (the control
    /// channel) that need to cache it once a plan is handed to the audio
    /// thread and can no longer be queried directly.
    pub fn node_ids(&self) -> &HashMap<String, usize> {
        &self.node_index
    }

    /// Calls `release` on every node, once this plan has left every live
    /// slot and is about to be freed.
    pub fn release_all(&mut self) {
        for node in &mut self.nodes {
            node.release();
        }
    }

    /// Mutable access to a node by plan index, for control-thread operations
    /// (parameter writes, downcasting to feed/drain I/O nodes).
    pub fn node_mut(&mut self, idx: usize) -> &mut dyn RigNode {
        self.nodes[idx].as_mut()
    }

    /// Sets a node's engine-level bypass flag. Takes effect on the next
    /// `render` call, no recompile needed.
    pub fn set_bypassed(&mut self, idx: usize, bypassed: bool) {
        if let Some(slot) = self.node_bypassed.get_mut(idx) {
            *slot = bypassed;
        }
    }

    /// Resets every node's transient state without touching parameters.
    pub fn reset_all(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    /// Renders `frames` samples (`frames <= config.max_frames`) through
    /// every step in order. Must not allocate, lock, or block. Returns the
    /// number of nodes that reported an internal fault this block (already
    /// absorbed into silence/pass-through by the node itself).
    pub fn render(&mut self, frames: usize) -> u32 {
        let mut faults = 0u32;
        for (step_idx, step) in self.steps.iter().enumerate() {
            let bypassed = self.node_bypassed[step.node_idx]
                && self.node_single_port[step.node_idx]
                && step.inputs.len() == 1
                && step.outputs.len() == 1;
            if bypassed {
                self.buffers.copy_direct(step.inputs[0], step.outputs[0], frames);
                continue;
            }
            self.buffers.stage_inputs(step_idx, &step.inputs, frames);
            let input_views = self.buffers.input_views(step_idx, &step.inputs, frames);
            let mut output_views = self.buffers.output_views(&step.outputs, frames);
            let ok = self.nodes[step.node_idx].process(&input_views, &mut output_views, frames);
            if !ok {
                faults += 1;
            }
        }
        faults
    }
}
