//! Real-time block scheduler wiring a compiled rig to device I/O (spec §4.5).
//!
//! [`RigAudioCallback`] is the audio thread's half: it owns the
//! [`fretgraph_rig::AudioPort`], deinterleaves/interleaves against a
//! device's callback buffer, and feeds the rig's `source`/`sink` nodes each
//! block. [`RigEngineHandle`] is the control thread's half: it compiles and
//! swaps rigs, writes parameters, and reads back engine metrics. Splitting
//! these two types mirrors [`fretgraph_rig`]'s own control/audio split
//! ([`fretgraph_rig::ControlHandle`]/[`fretgraph_rig::AudioPort`]), and
//! [`RigAudioCallback::process`] is meant to be handed straight to an
//! [`crate::AudioStream`] or [`crate::backend::AudioBackend`] callback.

use std::sync::Arc;
use std::time::Instant;

use fretgraph_core::{EngineMetrics, MetricsSnapshot};
use fretgraph_rig::{
    compile, control_channel, AudioPort, CompileError, ControlError, ControlHandle, EngineConfig,
    NodeFactory, RigDescription, SinkNode, SourceNode,
};

/// Default capacity of the control→audio edit queue (spec §4.8 sizing note:
/// generous relative to expected per-block edit volume).
pub const DEFAULT_CONTROL_QUEUE_CAPACITY: usize = 256;

/// Creates a linked [`RigEngineHandle`]/[`RigAudioCallback`] pair for the
/// given engine configuration. `queue_capacity` bounds the control channel;
/// use [`DEFAULT_CONTROL_QUEUE_CAPACITY`] unless a rig is known to need an
/// unusually high parameter-edit rate.
pub fn rig_engine(config: EngineConfig, queue_capacity: usize) -> (RigEngineHandle, RigAudioCallback) {
    let (control, port) = control_channel(queue_capacity);
    let metrics = Arc::new(EngineMetrics::new());
    let max_frames = config.max_frames;
    let handle = RigEngineHandle {
        control,
        metrics: Arc::clone(&metrics),
        config,
    };
    let callback = RigAudioCallback {
        port,
        metrics,
        config,
        scratch_in_l: vec![0.0; max_frames],
        scratch_in_r: vec![0.0; max_frames],
        scratch_out_l: vec![0.0; max_frames],
        scratch_out_r: vec![0.0; max_frames],
    };
    (handle, callback)
}

/// Failures loading a rig onto a running engine: either the rig failed to
/// compile, or the (vanishingly unlikely) control queue was full.
#[derive(Debug, thiserror::Error)]
pub enum LoadRigError {
    /// The rig description failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// The control channel could not accept the swap.
    #[error(transparent)]
    Control(#[from] ControlError),
}

/// The control thread's half of a running engine: compiles rigs, edits
/// parameters, and reads metrics. Never touches the live plan directly —
/// every change crosses [`fretgraph_rig::control_channel`].
pub struct RigEngineHandle {
    control: ControlHandle,
    metrics: Arc<EngineMetrics>,
    config: EngineConfig,
}

impl RigEngineHandle {
    /// Compiles `rig` against this engine's configuration and swaps it in as
    /// the live plan. The plan the audio thread was running (if any) is
    /// retired through the normal epoch mechanism, not freed here.
    pub fn load_rig(&mut self, rig: &RigDescription, factory: &dyn NodeFactory) -> Result<(), LoadRigError> {
        let plan = compile(rig, factory, self.config)?;
        self.metrics.set_latency_samples(plan.total_latency_samples);
        self.control.swap_plan(Box::new(plan))?;
        Ok(())
    }

    /// Writes a node's live parameter target (spec §4.6).
    pub fn set_parameter(&mut self, node_id: &str, param_id: &'static str, value: f32) -> Result<(), ControlError> {
        self.control.set_parameter(node_id, param_id, value)
    }

    /// Toggles a node's engine-level bypass.
    pub fn set_bypass(&mut self, node_id: &str, bypassed: bool) -> Result<(), ControlError> {
        self.control.set_bypass(node_id, bypassed)
    }

    /// Clears one node's transient state.
    pub fn reset_node(&mut self, node_id: &str) -> Result<(), ControlError> {
        self.control.reset_node(node_id)
    }

    /// Clears every node's transient state.
    pub fn reset_all(&mut self) -> Result<(), ControlError> {
        self.control.reset_all()
    }

    /// Frees plans the audio thread has retired and whose epoch has passed.
    /// Call periodically (e.g. once per UI tick); never from the audio thread.
    pub fn poll_retirement(&mut self) {
        self.control.poll_retirement();
    }

    /// A snapshot of the engine's live metrics (spec component 9).
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The engine configuration this handle's rigs are compiled against.
    pub fn config(&self) -> EngineConfig {
        self.config
    }
}

/// The audio thread's half of a running engine. Implements the per-block
/// sequence from spec §4.5: drain control edits, feed every source node,
/// render the plan, drain every sink node, publish metrics. Call
/// [`RigAudioCallback::process`] once per device callback.
pub struct RigAudioCallback {
    port: AudioPort,
    metrics: Arc<EngineMetrics>,
    config: EngineConfig,
    scratch_in_l: Vec<f32>,
    scratch_in_r: Vec<f32>,
    scratch_out_l: Vec<f32>,
    scratch_out_r: Vec<f32>,
}

impl RigAudioCallback {
    /// Processes one block of interleaved stereo audio: `input`/`output` are
    /// `[L0, R0, L1, R1, ...]`. Mono devices should duplicate their single
    /// channel into both before calling this.
    ///
    /// Never allocates: every scratch buffer was sized to `config.max_frames`
    /// at construction. A `frames` count beyond that capacity is silently
    /// truncated to it rather than panicking, so a misbehaving device
    /// driver handing over an oversized buffer cannot crash the audio thread
    /// (the remainder of `output` is filled with silence).
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        let start = Instant::now();
        let frames = (input.len() / 2).min(self.scratch_in_l.len());

        for i in 0..frames {
            self.scratch_in_l[i] = input[i * 2];
            self.scratch_in_r[i] = input[i * 2 + 1];
        }

        self.port.drain_and_apply();
        self.feed_sources(frames);
        let faults = self.port.render(frames);
        self.drain_sinks(frames);

        let out_frames = (output.len() / 2).min(frames);
        for i in 0..out_frames {
            output[i * 2] = self.scratch_out_l[i];
            output[i * 2 + 1] = self.scratch_out_r[i];
        }
        output[out_frames * 2..].fill(0.0);

        let period = frames as f32 / self.config.sample_rate;
        let load = if period > 0.0 {
            start.elapsed().as_secs_f32() / period
        } else {
            0.0
        };
        self.metrics.record_callback(
            load,
            &self.scratch_out_l[..frames],
            &self.scratch_out_r[..frames],
            faults > 0,
        );
    }

    fn feed_sources(&mut self, frames: usize) {
        let in_l = &self.scratch_in_l;
        let in_r = &self.scratch_in_r;
        let Some(plan) = self.port.current_mut() else {
            return;
        };
        let count = plan.source_nodes().len();
        for i in 0..count {
            let idx = plan.source_nodes()[i];
            if let Some(source) = plan.node_mut(idx).as_any_mut().downcast_mut::<SourceNode>() {
                source.feed_block(&in_l[..frames], &in_r[..frames]);
            }
        }
    }

    fn drain_sinks(&mut self, frames: usize) {
        self.scratch_out_l[..frames].fill(0.0);
        self.scratch_out_r[..frames].fill(0.0);
        let Some(plan) = self.port.current_mut() else {
            return;
        };
        let count = plan.sink_nodes().len();
        for i in 0..count {
            let idx = plan.sink_nodes()[i];
            if let Some(sink) = plan.node_mut(idx).as_any_mut().downcast_mut::<SinkNode>() {
                let (l, r) = sink.take_block();
                let n = frames.min(l.len());
                for s in 0..n {
                    self.scratch_out_l[s] += l[s];
                    self.scratch_out_r[s] += r[s];
                }
            }
        }
    }

    /// Current engine configuration.
    pub fn config(&self) -> EngineConfig {
        self.config
    }
}
