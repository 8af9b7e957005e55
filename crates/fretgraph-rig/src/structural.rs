//! Structural node kinds: source, sink, splitter, mixer (spec §4.3).
//!
//! Unlike DSP effects these have more than one port, or draw/deliver audio
//! from/to somewhere other than an upstream/downstream node, so they
//! implement [`RigNode`] directly rather than going through
//! [`crate::node::EffectNodeAdapter`].

use std::any::Any;
use std::f32::consts::PI;

use fretgraph_core::{ParamDescriptor, ParamId};

use crate::node::{PortSignal, PortSignalMut, RigNode};

/// Stable string id for the mixer's master level parameter.
const MIXER_MASTER_PARAM: &str = "mixer_master";

/// Stable string ids for per-input level parameters, `levels[i]` ↔ `in{i}`.
/// Covers the spec's "typically 1..4" inputs with headroom; a mixer wired
/// with more inputs than this simply has no live control past the last one.
const MIXER_LEVEL_PARAMS: [&str; 8] = [
    "mixer_level_0",
    "mixer_level_1",
    "mixer_level_2",
    "mixer_level_3",
    "mixer_level_4",
    "mixer_level_5",
    "mixer_level_6",
    "mixer_level_7",
];

/// Stable string ids for per-input pan parameters, `pans[i]` ↔ `in{i}`.
const MIXER_PAN_PARAMS: [&str; 8] = [
    "mixer_pan_0",
    "mixer_pan_1",
    "mixer_pan_2",
    "mixer_pan_3",
    "mixer_pan_4",
    "mixer_pan_5",
    "mixer_pan_6",
    "mixer_pan_7",
];

/// Where a [`SourceNode`] or [`SinkNode`] gets/puts its audio.
enum Feed {
    /// Fed externally, once per block, by the block scheduler from the I/O
    /// adapter (`feed_block`/`take_block`).
    External,
    /// Reads from (sources) or writes into (sinks) an owned memory buffer at
    /// a settable position, for offline rendering (spec §4.10).
    Memory(MemoryBuffer),
}

/// A position-tracked, two-channel memory buffer used by offline sources and
/// sinks. Reads past the end zero-fill; writes past the end are discarded.
pub struct MemoryBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
    position: usize,
}

impl MemoryBuffer {
    /// Wraps pre-loaded stereo sample data (for a source) or allocates an
    /// empty, growable buffer (for a sink — use [`MemoryBuffer::empty`]).
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Self {
        Self {
            left,
            right,
            position: 0,
        }
    }

    /// An empty buffer for capturing sink output; grows as frames are written.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Resets the read/write cursor to the start without discarding content.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Current read/write position in samples.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Captured/loaded content so far.
    pub fn channels(&self) -> (&[f32], &[f32]) {
        (&self.left, &self.right)
    }

    fn read(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let frames = out_l.len();
        for i in 0..frames {
            let idx = self.position + i;
            out_l[i] = self.left.get(idx).copied().unwrap_or(0.0);
            out_r[i] = self.right.get(idx).copied().unwrap_or(0.0);
        }
        self.position += frames;
    }

    fn write(&mut self, in_l: &[f32], in_r: &[f32]) {
        let frames = in_l.len();
        let needed = self.position + frames;
        if self.left.len() < needed {
            self.left.resize(needed, 0.0);
            self.right.resize(needed, 0.0);
        }
        self.left[self.position..needed].copy_from_slice(in_l);
        self.right[self.position..needed].copy_from_slice(in_r);
        self.position += frames;
    }
}

/// A `source` structural node: output port `out`, no inputs.
pub struct SourceNode {
    feed: Feed,
    pending_l: Vec<f32>,
    pending_r: Vec<f32>,
}

impl Default for SourceNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNode {
    /// A device-fed source (the common real-time case).
    pub fn new() -> Self {
        Self {
            feed: Feed::External,
            pending_l: Vec::new(),
            pending_r: Vec::new(),
        }
    }

    /// Switches to reading from a memory buffer (offline rendering).
    pub fn set_memory_buffer(&mut self, buffer: MemoryBuffer) {
        self.feed = Feed::Memory(buffer);
    }

    /// Supplies this callback's input block. Called by the block scheduler
    /// before `render`; a no-op in memory mode.
    pub fn feed_block(&mut self, left: &[f32], right: &[f32]) {
        if matches!(self.feed, Feed::External) {
            self.pending_l.clear();
            self.pending_l.extend_from_slice(left);
            self.pending_r.clear();
            self.pending_r.extend_from_slice(right);
        }
    }

    /// Borrows the memory buffer installed via [`set_memory_buffer`](Self::set_memory_buffer),
    /// if any — `None` for a device-fed source.
    pub fn memory_buffer(&self) -> Option<&MemoryBuffer> {
        match &self.feed {
            Feed::Memory(buf) => Some(buf),
            Feed::External => None,
        }
    }
}

impl RigNode for SourceNode {
    fn prepare(&mut self, _sample_rate: f32, max_frames: usize) {
        self.pending_l = vec![0.0; max_frames];
        self.pending_r = vec![0.0; max_frames];
    }

    fn process(&mut self, _inputs: &[PortSignal<'_>], outputs: &mut [PortSignalMut<'_>], frames: usize) -> bool {
        match &self.feed {
            Feed::External => match &mut outputs[0] {
                PortSignalMut::Mono(out) => out[..frames].copy_from_slice(&self.pending_l[..frames]),
                PortSignalMut::Stereo(ol, or_) => {
                    ol[..frames].copy_from_slice(&self.pending_l[..frames]);
                    or_[..frames].copy_from_slice(&self.pending_r[..frames]);
                }
            },
            Feed::Memory(_) => {
                let Feed::Memory(buf) = &mut self.feed else {
                    unreachable!()
                };
                match &mut outputs[0] {
                    PortSignalMut::Mono(out) => {
                        let mut scratch = vec![0.0; frames];
                        buf.read(&mut out[..frames], &mut scratch);
                    }
                    PortSignalMut::Stereo(ol, or_) => buf.read(&mut ol[..frames], &mut or_[..frames]),
                }
            }
        }
        true
    }

    fn reset(&mut self) {
        if let Feed::Memory(buf) = &mut self.feed {
            buf.rewind();
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A `sink` structural node: input port `in`, no outputs.
pub struct SinkNode {
    feed: Feed,
    captured_l: Vec<f32>,
    captured_r: Vec<f32>,
}

impl Default for SinkNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SinkNode {
    /// A device-fed sink (the common real-time case).
    pub fn new() -> Self {
        Self {
            feed: Feed::External,
            captured_l: Vec::new(),
            captured_r: Vec::new(),
        }
    }

    /// Switches to writing into a memory buffer (offline rendering).
    pub fn set_memory_buffer(&mut self, buffer: MemoryBuffer) {
        self.feed = Feed::Memory(buffer);
    }

    /// Retrieves this callback's output block. Called by the block scheduler
    /// after `render`; empty in memory mode (use the memory buffer instead).
    pub fn take_block(&self) -> (&[f32], &[f32]) {
        (&self.captured_l, &self.captured_r)
    }

    /// Borrows the memory buffer installed via [`set_memory_buffer`](Self::set_memory_buffer),
    /// if any — `None` for a device-fed sink. In memory mode this is where
    /// the full captured signal lives, not [`take_block`](Self::take_block).
    pub fn memory_buffer(&self) -> Option<&MemoryBuffer> {
        match &self.feed {
            Feed::Memory(buf) => Some(buf),
            Feed::External => None,
        }
    }
}

impl RigNode for SinkNode {
    fn prepare(&mut self, _sample_rate: f32, max_frames: usize) {
        self.captured_l = vec![0.0; max_frames];
        self.captured_r = vec![0.0; max_frames];
    }

    fn process(&mut self, inputs: &[PortSignal<'_>], _outputs: &mut [PortSignalMut<'_>], frames: usize) -> bool {
        match &inputs[0] {
            PortSignal::Mono(inp) => {
                self.captured_l[..frames].copy_from_slice(&inp[..frames]);
                self.captured_r[..frames].copy_from_slice(&inp[..frames]);
            }
            PortSignal::Stereo(il, ir) => {
                self.captured_l[..frames].copy_from_slice(&il[..frames]);
                self.captured_r[..frames].copy_from_slice(&ir[..frames]);
            }
        }
        if let Feed::Memory(buf) = &mut self.feed {
            buf.write(&self.captured_l[..frames], &self.captured_r[..frames]);
        }
        true
    }

    fn reset(&mut self) {
        if let Feed::Memory(buf) = &mut self.feed {
            buf.rewind();
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A `splitter` structural node: one `in`, `N` distinct-slot `out1..outN`.
pub struct SplitterNode {
    num_outputs: u32,
}

impl SplitterNode {
    /// Creates a splitter with the given fan-out.
    pub fn new(num_outputs: u32) -> Self {
        Self { num_outputs }
    }
}

impl RigNode for SplitterNode {
    fn prepare(&mut self, _sample_rate: f32, _max_frames: usize) {}

    fn process(&mut self, inputs: &[PortSignal<'_>], outputs: &mut [PortSignalMut<'_>], _frames: usize) -> bool {
        debug_assert_eq!(outputs.len(), self.num_outputs as usize);
        for out in outputs.iter_mut() {
            out.copy_from(&inputs[0]);
        }
        true
    }

    fn reset(&mut self) {}
}

/// A `mixer` structural node: `N` inputs `in1..inN`, one `out`, with
/// per-input level/pan and a master level (spec §4.3).
pub struct MixerNode {
    num_inputs: u32,
    stereo: bool,
    levels: Vec<f32>,
    pans: Vec<f32>,
    master_level: f32,
}

impl MixerNode {
    /// Creates a mixer with the given fan-in, stereo mode, and mix settings.
    /// `levels`/`pans` shorter than `num_inputs` are padded with unity/center.
    pub fn new(num_inputs: u32, stereo: bool, mut levels: Vec<f32>, mut pans: Vec<f32>, master_level: f32) -> Self {
        levels.resize(num_inputs as usize, 1.0);
        pans.resize(num_inputs as usize, 0.0);
        Self {
            num_inputs,
            stereo,
            levels,
            pans,
            master_level,
        }
    }

    /// Sets the linear level for input `index` (0-based), clamped to `[0, 2]`.
    pub fn set_level(&mut self, index: usize, level: f32) {
        if let Some(slot) = self.levels.get_mut(index) {
            *slot = level.clamp(0.0, 2.0);
        }
    }

    /// Sets the pan for input `index` (0-based), clamped to `[-1, 1]`.
    pub fn set_pan(&mut self, index: usize, pan: f32) {
        if let Some(slot) = self.pans.get_mut(index) {
            *slot = pan.clamp(-1.0, 1.0);
        }
    }

    /// Sets the master linear level.
    pub fn set_master_level(&mut self, master: f32) {
        self.master_level = master.clamp(0.0, 2.0);
    }
}

impl RigNode for MixerNode {
    fn prepare(&mut self, _sample_rate: f32, _max_frames: usize) {}

    fn process(&mut self, inputs: &[PortSignal<'_>], outputs: &mut [PortSignalMut<'_>], frames: usize) -> bool {
        debug_assert_eq!(inputs.len(), self.num_inputs as usize);
        match &mut outputs[0] {
            PortSignalMut::Mono(out) => {
                out[..frames].fill(0.0);
                for (i, input) in inputs.iter().enumerate() {
                    let level = self.levels[i];
                    if let PortSignal::Mono(inp) = input {
                        for s in 0..frames {
                            out[s] += inp[s] * level;
                        }
                    }
                }
                for s in out[..frames].iter_mut() {
                    *s *= self.master_level;
                }
            }
            PortSignalMut::Stereo(ol, or_) => {
                ol[..frames].fill(0.0);
                or_[..frames].fill(0.0);
                for (i, input) in inputs.iter().enumerate() {
                    let level = self.levels[i];
                    let (lgain, rgain) = if self.stereo {
                        let pan = self.pans[i];
                        (((pan + 1.0) * PI / 4.0).cos(), ((pan + 1.0) * PI / 4.0).sin())
                    } else {
                        (1.0, 1.0)
                    };
                    if let PortSignal::Stereo(il, ir) = input {
                        for s in 0..frames {
                            ol[s] += il[s] * level * lgain;
                            or_[s] += ir[s] * level * rgain;
                        }
                    }
                }
                for s in 0..frames {
                    ol[s] *= self.master_level;
                    or_[s] *= self.master_level;
                }
            }
        }
        true
    }

    fn reset(&mut self) {}

    /// Master level plus one level/pan pair per input, addressable live
    /// through the same control path as any DSP effect (spec §4.6/§4.8) —
    /// mixer mix settings are seeded from `NodeConfig` at construction but
    /// from then on are ordinary parameters, not a recompile-only config.
    fn parameters(&self) -> Vec<ParamDescriptor> {
        let mut params = vec![ParamDescriptor::custom("Master Level", "Master", 0.0, 2.0, 1.0)
            .with_id(ParamId(0), MIXER_MASTER_PARAM)];
        for i in 0..(self.num_inputs as usize).min(MIXER_LEVEL_PARAMS.len()) {
            params.push(ParamDescriptor::custom("Input Level", "Level", 0.0, 2.0, 1.0).with_id(ParamId(0), MIXER_LEVEL_PARAMS[i]));
            if self.stereo {
                params.push(ParamDescriptor::custom("Input Pan", "Pan", -1.0, 1.0, 0.0).with_id(ParamId(0), MIXER_PAN_PARAMS[i]));
            }
        }
        params
    }

    fn get_param(&self, id: &str) -> Option<f32> {
        if id == MIXER_MASTER_PARAM {
            return Some(self.master_level);
        }
        if let Some(i) = MIXER_LEVEL_PARAMS.iter().position(|&p| p == id) {
            return self.levels.get(i).copied();
        }
        if let Some(i) = MIXER_PAN_PARAMS.iter().position(|&p| p == id) {
            return self.pans.get(i).copied();
        }
        None
    }

    fn set_param(&mut self, id: &str, value: f32) {
        if id == MIXER_MASTER_PARAM {
            self.set_master_level(value);
            return;
        }
        if let Some(i) = MIXER_LEVEL_PARAMS.iter().position(|&p| p == id) {
            self.set_level(i, value);
            return;
        }
        if let Some(i) = MIXER_PAN_PARAMS.iter().position(|&p| p == id) {
            self.set_pan(i, value);
        }
    }
}
