//! The uniform node contract every rig node obeys (spec §4.1).
//!
//! `prepare` is one-shot and is where all allocation happens; `process` is
//! called every block thereafter and must not allocate, lock, or block;
//! `reset` clears transient state without touching parameters; `release`
//! runs on the control thread once a node leaves every live plan.

use fretgraph_core::ParamDescriptor;

/// A read-only view of one port's signal for the current block.
#[derive(Debug)]
pub enum PortSignal<'a> {
    /// Single-channel signal.
    Mono(&'a [f32]),
    /// Independent left/right signals.
    Stereo(&'a [f32], &'a [f32]),
}

/// A writable view of one port's signal for the current block.
#[derive(Debug)]
pub enum PortSignalMut<'a> {
    /// Single-channel signal.
    Mono(&'a mut [f32]),
    /// Independent left/right signals.
    Stereo(&'a mut [f32], &'a mut [f32]),
}

impl PortSignalMut<'_> {
    /// Zero-fills the port (used for unconnected sinks and silent sources).
    pub fn fill_silence(&mut self) {
        match self {
            PortSignalMut::Mono(buf) => buf.fill(0.0),
            PortSignalMut::Stereo(l, r) => {
                l.fill(0.0);
                r.fill(0.0);
            }
        }
    }

    /// Copies a read-only port view into this one, channel for channel.
    /// Used for engine-level bypass (primary input → primary output) and
    /// for wiring a splitter's single input to each of its outputs.
    pub fn copy_from(&mut self, src: &PortSignal<'_>) {
        match (self, src) {
            (PortSignalMut::Mono(dst), PortSignal::Mono(s)) => dst.copy_from_slice(s),
            (PortSignalMut::Stereo(dl, dr), PortSignal::Stereo(sl, sr)) => {
                dl.copy_from_slice(sl);
                dr.copy_from_slice(sr);
            }
            // Mono source feeding a stereo sink (or vice versa) duplicates/
            // downmixes the single channel rather than panicking — channel
            // mode is engine-wide so this only happens for the reserved
            // all-zero silence source, where both paths are equivalent.
            (PortSignalMut::Stereo(dl, dr), PortSignal::Mono(s)) => {
                dl.copy_from_slice(s);
                dr.copy_from_slice(s);
            }
            (PortSignalMut::Mono(dst), PortSignal::Stereo(sl, _)) => dst.copy_from_slice(sl),
        }
    }
}

/// Object-safe contract implemented by every node the engine can host —
/// structural (source/sink/splitter/mixer) and DSP alike.
///
/// `fretgraph_core::Effect` already covers the mono/stereo single-port case;
/// [`EffectNodeAdapter`] bridges any `Box<dyn EffectWithParams + Send>` into
/// this trait so the ~40 registered DSP effects need no changes to run
/// inside a rig. Multi-port structural nodes implement `RigNode` directly.
pub trait RigNode: Send + 'static {
    /// One-shot setup; allocates everything the node will ever need.
    /// Idempotent when called again with identical arguments.
    fn prepare(&mut self, sample_rate: f32, max_frames: usize);

    /// Processes exactly `frames` samples. `inputs`/`outputs` are indexed in
    /// the node's declared port order (see [`crate::port::PortLayout`]).
    /// Must not allocate, lock, or perform I/O. Must not panic: on internal
    /// fault, fill outputs with silence or pass-through and return `false` so
    /// the scheduler can count a dropout.
    fn process(&mut self, inputs: &[PortSignal<'_>], outputs: &mut [PortSignalMut<'_>], frames: usize) -> bool;

    /// Zeroes transient state (delay lines, filter history, FFT accumulators).
    /// Parameter values and prepared buffers survive.
    fn reset(&mut self);

    /// Releases resources held since `prepare`. Called from the control
    /// thread once the node leaves every live plan.
    fn release(&mut self) {}

    /// Parameter descriptors, stable for the node's lifetime.
    fn parameters(&self) -> Vec<ParamDescriptor> {
        Vec::new()
    }

    /// Current value of the named parameter.
    fn get_param(&self, _id: &str) -> Option<f32> {
        None
    }

    /// Writes the live target for the named parameter (already clamped by
    /// the caller). No-op for unknown ids.
    fn set_param(&mut self, _id: &str, _value: f32) {}

    /// Enumerated labels for a choice parameter, if `id` names one. Used to
    /// resolve `ParamValue::Choice` strings loaded from a rig file.
    fn choice_labels(&self, _id: &str) -> Option<&'static [&'static str]> {
        None
    }

    /// Samples of latency introduced by this node, stable after `prepare`.
    fn latency_samples(&self) -> u32 {
        0
    }

    /// Downcasting escape hatch used by the block scheduler to feed/drain
    /// source and sink nodes, which need access beyond the uniform contract.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Bridges a boxed `fretgraph_core::EffectWithParams` (the ~40 registered DSP
/// effects) into [`RigNode`]. Every DSP effect has exactly one input port
/// (`in`) and one output port (`out`); the adapter dispatches to the mono or
/// stereo block entry points depending on which [`PortSignal`] variant it's
/// handed, mirroring the channel-mode dispatch flag the compiler bakes into
/// each `ProcessStep`.
pub struct EffectNodeAdapter {
    effect: Box<dyn fretgraph_core::EffectWithParams + Send>,
}

impl EffectNodeAdapter {
    /// Wraps a boxed effect for use as a rig node.
    pub fn new(effect: Box<dyn fretgraph_core::EffectWithParams + Send>) -> Self {
        Self { effect }
    }
}

impl RigNode for EffectNodeAdapter {
    fn prepare(&mut self, sample_rate: f32, max_frames: usize) {
        self.effect.prepare(sample_rate, max_frames);
    }

    fn process(&mut self, inputs: &[PortSignal<'_>], outputs: &mut [PortSignalMut<'_>], frames: usize) -> bool {
        match (&inputs[0], &mut outputs[0]) {
            (PortSignal::Mono(inp), PortSignalMut::Mono(out)) => {
                self.effect.process_block(&inp[..frames], &mut out[..frames]);
            }
            (PortSignal::Stereo(il, ir), PortSignalMut::Stereo(ol, or_)) => {
                self.effect
                    .process_block_stereo(&il[..frames], &ir[..frames], &mut ol[..frames], &mut or_[..frames]);
            }
            // Channel mode is fixed for the whole plan, so these never occur
            // in practice; absorb rather than panic per the no-throw contract.
            _ => return false,
        }
        true
    }

    fn reset(&mut self) {
        self.effect.reset();
    }

    fn release(&mut self) {
        self.effect.release();
    }

    fn parameters(&self) -> Vec<ParamDescriptor> {
        (0..self.effect.effect_param_count())
            .filter_map(|i| self.effect.effect_param_info(i))
            .collect()
    }

    fn get_param(&self, id: &str) -> Option<f32> {
        (0..self.effect.effect_param_count())
            .find(|&i| self.effect.effect_param_info(i).is_some_and(|d| d.string_id == id))
            .map(|i| self.effect.effect_get_param(i))
    }

    fn set_param(&mut self, id: &str, value: f32) {
        if let Some(i) = (0..self.effect.effect_param_count())
            .find(|&i| self.effect.effect_param_info(i).is_some_and(|d| d.string_id == id))
        {
            self.effect.effect_set_param(i, value);
        }
    }

    fn latency_samples(&self) -> u32 {
        self.effect.latency_samples() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl fretgraph_core::Effect for Silent {
        fn process(&mut self, _input: f32) -> f32 {
            0.0
        }
        fn set_sample_rate(&mut self, _sample_rate: f32) {}
        fn reset(&mut self) {}
    }
    impl fretgraph_core::ParameterInfo for Silent {
        fn param_count(&self) -> usize {
            0
        }
        fn param_info(&self, _index: usize) -> Option<ParamDescriptor> {
            None
        }
        fn get_param(&self, _index: usize) -> f32 {
            0.0
        }
        fn set_param(&mut self, _index: usize, _value: f32) {}
    }

    #[test]
    fn adapter_processes_mono_block() {
        let mut node = EffectNodeAdapter::new(Box::new(Silent));
        node.prepare(48000.0, 64);
        let input = [1.0f32; 4];
        let mut output = [9.0f32; 4];
        let inputs = [PortSignal::Mono(&input)];
        let mut outputs = [PortSignalMut::Mono(&mut output)];
        assert!(node.process(&inputs, &mut outputs, 4));
        assert_eq!(output, [0.0; 4]);
    }
}
