//! Neural-layer effect: dense feedforward inference over a sliding window
//! of past input samples, one output sample produced per step.
//!
//! # Model file format
//!
//! Line-oriented UTF-8, as exported by an offline training tool:
//!
//! ```text
//! JFXNN1
//! <inputWindowSize>
//! <outputSize>
//! <layerCount>
//! <inSize>,<outSize>,<ACTIVATION>
//! <outSize rows of inSize comma-separated weights>
//! <outSize comma-separated biases>
//! ... (repeated per layer)
//! ```
//!
//! `ACTIVATION` is one of `LINEAR`, `RELU`, `LEAKY_RELU`, `TANH`, `SIGMOID`,
//! `SOFTPLUS`. Row `j` of a layer's weight block is the set of input weights
//! feeding output neuron `j`; `output[j] = activation(bias[j] + sum_i
//! weight[j][i] * input[i])`.
//!
//! Model files are only ever read on the control thread
//! ([`NeuralEffect::load_model_file`]/[`parse_model`]); [`NeuralEffect::process`]
//! only ever reads the already-parsed, heap-allocated [`NeuralModel`] it was
//! handed — no I/O or allocation happens on the audio thread.

use std::sync::Arc;

use fretgraph_core::{Effect, ParamDescriptor, ParamFlags, ParamId, ParamUnit, ParameterInfo};

/// Magic line identifying a trained model file.
pub const MODEL_MAGIC: &str = "JFXNN1";

/// Errors loading or parsing a trained model file.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    /// The file could not be read from disk.
    #[error("could not read model file: {0}")]
    Io(#[from] std::io::Error),

    /// The first line was not [`MODEL_MAGIC`].
    #[error("not a neural model file (expected magic {MODEL_MAGIC:?})")]
    BadMagic,

    /// The file ended before a required field or layer was read.
    #[error("model file truncated: expected {0}")]
    Truncated(&'static str),

    /// A header or weight field was not a valid number.
    #[error("malformed numeric field: {0:?}")]
    MalformedNumber(String),

    /// A layer header line was not `inSize,outSize,activation`.
    #[error("malformed layer header on layer {0}: {1:?}")]
    MalformedLayerHeader(usize, String),

    /// An activation name did not match any known kind.
    #[error("unknown activation {0:?} on layer {1}")]
    UnknownActivation(String, usize),

    /// A weight row had the wrong number of columns.
    #[error("layer {layer} row {row}: expected {expected} weights, got {got}")]
    WrongWeightCount { layer: usize, row: usize, expected: usize, got: usize },

    /// The bias line had the wrong number of entries.
    #[error("layer {layer}: expected {expected} biases, got {got}")]
    WrongBiasCount { layer: usize, expected: usize, got: usize },

    /// A layer's declared input size did not match the previous layer's output size
    /// (or, for the first layer, the header's `inputWindowSize`).
    #[error("layer {layer}: input size {got} does not match expected {expected}")]
    LayerSizeMismatch { layer: usize, expected: usize, got: usize },

    /// The final layer's output size did not match the header's `outputSize`.
    #[error("model declares outputSize {declared} but final layer produces {actual}")]
    OutputSizeMismatch { declared: usize, actual: usize },
}

/// Activation function applied to a layer's pre-activation outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Identity, `f(x) = x`.
    Linear,
    /// Rectified linear unit, `f(x) = max(0, x)`.
    Relu,
    /// Leaky ReLU with a fixed `0.01` negative slope.
    LeakyRelu,
    /// Hyperbolic tangent.
    Tanh,
    /// Logistic sigmoid.
    Sigmoid,
    /// Softplus, `f(x) = ln(1 + e^x)`, numerically stabilized for large `x`.
    Softplus,
}

impl Activation {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "LINEAR" => Some(Self::Linear),
            "RELU" => Some(Self::Relu),
            "LEAKY_RELU" => Some(Self::LeakyRelu),
            "TANH" => Some(Self::Tanh),
            "SIGMOID" => Some(Self::Sigmoid),
            "SOFTPLUS" => Some(Self::Softplus),
            _ => None,
        }
    }

    #[inline]
    fn apply(self, x: f32) -> f32 {
        match self {
            Self::Linear => x,
            Self::Relu => x.max(0.0),
            Self::LeakyRelu => if x > 0.0 { x } else { 0.01 * x },
            Self::Tanh => libm::tanhf(x),
            Self::Sigmoid => 1.0 / (1.0 + libm::expf(-x)),
            Self::Softplus => {
                // ln(1 + e^x); for large x this overflows e^x before the log
                // brings it back down, so fall back to the linear asymptote.
                if x > 20.0 {
                    x
                } else {
                    libm::logf(1.0 + libm::expf(x))
                }
            }
        }
    }
}

/// One dense layer: `outSize` neurons, each a weighted sum of `inSize`
/// inputs plus a bias, passed through [`Activation`].
#[derive(Debug, Clone)]
pub struct Layer {
    in_size: usize,
    out_size: usize,
    activation: Activation,
    /// Row-major, `out_size` rows of `in_size` weights each.
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    /// Runs this layer's forward pass, reading `input` (must be `in_size`
    /// long) and writing into `output` (must be `out_size` long).
    fn forward(&self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), self.in_size);
        debug_assert_eq!(output.len(), self.out_size);
        for j in 0..self.out_size {
            let row = &self.weights[j * self.in_size..(j + 1) * self.in_size];
            let mut acc = self.biases[j];
            for (w, x) in row.iter().zip(input.iter()) {
                acc += w * x;
            }
            output[j] = self.activation.apply(acc);
        }
    }
}

/// A fully parsed, ready-to-run feedforward model.
#[derive(Debug, Clone)]
pub struct NeuralModel {
    input_window_size: usize,
    layers: Vec<Layer>,
}

impl NeuralModel {
    /// Length of the sliding input window this model expects.
    pub fn input_window_size(&self) -> usize {
        self.input_window_size
    }

    /// Runs the full forward pass over `window` (must be
    /// [`input_window_size`](Self::input_window_size) long), returning the
    /// first element of the final layer's output — the single sample this
    /// step produces.
    fn infer(&self, window: &[f32], scratch: &mut [Vec<f32>; 2]) -> f32 {
        let mut current = 0usize;
        scratch[current].clear();
        scratch[current].extend_from_slice(window);

        for layer in &self.layers {
            let next = 1 - current;
            scratch[next].resize(layer.out_size, 0.0);
            layer.forward(&scratch[current], &mut scratch[next]);
            current = next;
        }

        scratch[current].first().copied().unwrap_or(0.0)
    }
}

/// Parses a model file's text into a [`NeuralModel`] (spec §6 "Trained model file").
pub fn parse_model(text: &str) -> Result<NeuralModel, ModelLoadError> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let magic = lines.next().ok_or(ModelLoadError::Truncated("magic"))?;
    if magic != MODEL_MAGIC {
        return Err(ModelLoadError::BadMagic);
    }

    let input_window_size = parse_usize(lines.next().ok_or(ModelLoadError::Truncated("inputWindowSize"))?)?;
    let output_size = parse_usize(lines.next().ok_or(ModelLoadError::Truncated("outputSize"))?)?;
    let layer_count = parse_usize(lines.next().ok_or(ModelLoadError::Truncated("layerCount"))?)?;

    let mut layers = Vec::with_capacity(layer_count);
    let mut expected_in = input_window_size;

    for layer_index in 0..layer_count {
        let header = lines.next().ok_or(ModelLoadError::Truncated("layer header"))?;
        let mut parts = header.split(',').map(str::trim);
        let in_size = parts
            .next()
            .ok_or_else(|| ModelLoadError::MalformedLayerHeader(layer_index, header.to_string()))
            .and_then(parse_usize)?;
        let out_size = parts
            .next()
            .ok_or_else(|| ModelLoadError::MalformedLayerHeader(layer_index, header.to_string()))
            .and_then(parse_usize)?;
        let activation_name = parts
            .next()
            .ok_or_else(|| ModelLoadError::MalformedLayerHeader(layer_index, header.to_string()))?;
        if parts.next().is_some() {
            return Err(ModelLoadError::MalformedLayerHeader(layer_index, header.to_string()));
        }
        let activation = Activation::parse(activation_name)
            .ok_or_else(|| ModelLoadError::UnknownActivation(activation_name.to_string(), layer_index))?;

        if in_size != expected_in {
            return Err(ModelLoadError::LayerSizeMismatch {
                layer: layer_index,
                expected: expected_in,
                got: in_size,
            });
        }

        let mut weights = Vec::with_capacity(in_size * out_size);
        for row in 0..out_size {
            let row_line = lines.next().ok_or(ModelLoadError::Truncated("weight row"))?;
            let values = parse_row(row_line)?;
            if values.len() != in_size {
                return Err(ModelLoadError::WrongWeightCount {
                    layer: layer_index,
                    row,
                    expected: in_size,
                    got: values.len(),
                });
            }
            weights.extend(values);
        }

        let bias_line = lines.next().ok_or(ModelLoadError::Truncated("bias row"))?;
        let biases = parse_row(bias_line)?;
        if biases.len() != out_size {
            return Err(ModelLoadError::WrongBiasCount {
                layer: layer_index,
                expected: out_size,
                got: biases.len(),
            });
        }

        expected_in = out_size;
        layers.push(Layer { in_size, out_size, activation, weights, biases });
    }

    let final_out = layers.last().map_or(input_window_size, |l| l.out_size);
    if final_out != output_size {
        return Err(ModelLoadError::OutputSizeMismatch { declared: output_size, actual: final_out });
    }

    Ok(NeuralModel { input_window_size, layers })
}

fn parse_usize(field: &str) -> Result<usize, ModelLoadError> {
    field
        .trim()
        .parse::<usize>()
        .map_err(|_| ModelLoadError::MalformedNumber(field.to_string()))
}

fn parse_row(line: &str) -> Result<Vec<f32>, ModelLoadError> {
    line.split(',')
        .map(|f| f.trim().parse::<f32>().map_err(|_| ModelLoadError::MalformedNumber(f.to_string())))
        .collect()
}

/// Loads and parses a model file from disk. Control-thread only.
pub fn load_model_file(path: &std::path::Path) -> Result<NeuralModel, ModelLoadError> {
    let text = std::fs::read_to_string(path)?;
    parse_model(&text)
}

/// Dense feedforward neural inference effect (spec §4.9 "Optional
/// neural-layer effect").
///
/// Maintains a sliding window of the last `input_window_size` raw input
/// samples and runs one forward pass per sample, producing one output
/// sample per step. With no model loaded it passes audio through unchanged
/// — a rig can host this node before a model has been picked.
pub struct NeuralEffect {
    sample_rate: f32,
    model: Option<Arc<NeuralModel>>,
    window: Vec<f32>,
    write: usize,
    /// Reusable oldest-first view of `window`, refilled in place each step
    /// so inference never allocates on the audio thread.
    ordered: Vec<f32>,
    scratch: [Vec<f32>; 2],
    mix: fretgraph_core::SmoothedParam,
    output_level: fretgraph_core::SmoothedParam,
}

impl NeuralEffect {
    /// Creates a neural effect with no model loaded (transparent passthrough).
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            model: None,
            window: Vec::new(),
            write: 0,
            ordered: Vec::new(),
            scratch: [Vec::new(), Vec::new()],
            mix: fretgraph_core::SmoothedParam::with_config(0.5, sample_rate, 10.0),
            output_level: fretgraph_core::gain::output_level_param(sample_rate),
        }
    }

    /// Installs a freshly loaded model, resizing the sliding window to
    /// match. Control-thread only; the returned effect's `process` never
    /// allocates once this has run.
    pub fn set_model(&mut self, model: NeuralModel) {
        self.window = vec![0.0; model.input_window_size()];
        self.ordered = vec![0.0; model.input_window_size()];
        self.write = 0;
        let widest = model
            .layers
            .iter()
            .map(|l| l.out_size)
            .max()
            .unwrap_or(model.input_window_size())
            .max(model.input_window_size());
        self.scratch[0] = Vec::with_capacity(widest);
        self.scratch[1] = Vec::with_capacity(widest);
        self.model = Some(Arc::new(model));
    }

    /// Loads a model file from disk and installs it. Control-thread only.
    pub fn load_model_file(&mut self, path: &std::path::Path) -> Result<(), ModelLoadError> {
        let model = load_model_file(path)?;
        self.set_model(model);
        Ok(())
    }

    /// Removes the currently installed model, reverting to passthrough.
    pub fn clear_model(&mut self) {
        self.model = None;
        self.window.clear();
    }

    /// Whether a model is currently installed.
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Sets the dry/wet mix, `0.0` = fully dry, `1.0` = fully wet.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_target(mix.clamp(0.0, 1.0));
    }

    /// Returns the current dry/wet mix target.
    pub fn mix(&self) -> f32 {
        self.mix.target()
    }

    fn push_sample(&mut self, input: f32) -> f32 {
        let Some(model) = self.model.clone() else {
            return input;
        };
        if self.window.is_empty() {
            return input;
        }
        self.window[self.write] = input;
        self.write = (self.write + 1) % self.window.len();

        // `infer` expects oldest-first order; `write` is the index the
        // *next* sample will land on, i.e. also the oldest sample's index.
        // Refilled in place rather than collected, so this never allocates.
        let len = self.window.len();
        for i in 0..len {
            self.ordered[i] = self.window[(self.write + i) % len];
        }
        model.infer(&self.ordered, &mut self.scratch)
    }
}

impl Effect for NeuralEffect {
    fn process(&mut self, input: f32) -> f32 {
        let wet = self.push_sample(input);
        let mx = self.mix.advance();
        let dry_wet = input + (wet - input) * mx;
        dry_wet * self.output_level.advance()
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.mix.set_sample_rate(sample_rate);
        self.output_level.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.window.iter_mut().for_each(|v| *v = 0.0);
        self.write = 0;
        self.mix.snap_to_target();
        self.output_level.snap_to_target();
    }

    fn latency_samples(&self) -> usize {
        0
    }
}

fretgraph_core::impl_params! {
    NeuralEffect, this {
        [0] ParamDescriptor::mix()
                .with_id(ParamId(2100), "neural_mix"),
            get: this.mix() * 100.0,
            set: |v| this.set_mix(v / 100.0);

        [1] ParamDescriptor::custom("Model Loaded", "Loaded", 0.0, 1.0, 0.0)
                .with_step(1.0)
                .with_id(ParamId(2101), "neural_loaded")
                .with_flags(ParamFlags::READ_ONLY.union(ParamFlags::STEPPED))
                .with_unit(ParamUnit::None)
                .with_step_labels(&["No", "Yes"]),
            get: if this.has_model() { 1.0 } else { 0.0 },
            set: |_v| {};

        [2] fretgraph_core::gain::output_param_descriptor()
                .with_id(ParamId(2102), "neural_output"),
            get: fretgraph_core::gain::output_level_db(&this.output_level),
            set: |v| fretgraph_core::gain::set_output_level_db(&mut this.output_level, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_model_text() -> String {
        // One linear layer: window size 3 -> output size 1, weights select
        // the most recent sample (index 2, since the window is oldest-first).
        "JFXNN1\n3\n1\n1\n3,1,LINEAR\n0.0,0.0,1.0\n0.0\n".to_string()
    }

    #[test]
    fn parses_a_minimal_model() {
        let model = parse_model(&identity_model_text()).unwrap();
        assert_eq!(model.input_window_size(), 3);
        assert_eq!(model.layers.len(), 1);
    }

    #[test]
    fn rejects_bad_magic() {
        let text = identity_model_text().replacen("JFXNN1", "NOPE", 1);
        assert!(matches!(parse_model(&text), Err(ModelLoadError::BadMagic)));
    }

    #[test]
    fn rejects_unknown_activation() {
        let text = identity_model_text().replace("LINEAR", "SWISH");
        assert!(matches!(parse_model(&text), Err(ModelLoadError::UnknownActivation(_, _))));
    }

    #[test]
    fn rejects_wrong_weight_row_length() {
        let text = identity_model_text().replace("0.0,0.0,1.0", "0.0,1.0");
        assert!(matches!(parse_model(&text), Err(ModelLoadError::WrongWeightCount { .. })));
    }

    #[test]
    fn rejects_output_size_mismatch() {
        let text = "JFXNN1\n3\n2\n1\n3,1,LINEAR\n0.0,0.0,1.0\n0.0\n";
        assert!(matches!(parse_model(text), Err(ModelLoadError::OutputSizeMismatch { .. })));
    }

    #[test]
    fn passthrough_without_a_model() {
        let mut effect = NeuralEffect::new(48000.0);
        assert!(!effect.has_model());
        for i in 0..16 {
            let input = i as f32 * 0.01;
            let out = effect.process(input);
            assert!((out - input).abs() < 1e-4);
        }
    }

    #[test]
    fn selects_the_most_recent_sample_once_window_fills() {
        let model = parse_model(&identity_model_text()).unwrap();
        let mut effect = NeuralEffect::new(48000.0);
        effect.set_model(model);
        effect.set_mix(1.0);
        effect.reset();

        for v in [0.1, 0.2, 0.3, 0.4, 0.5] {
            let _ = effect.process(v);
        }
        // Push happens before inference, so this call's window is
        // [0.4, 0.5, 0.6] and the model selects the newest entry, 0.6.
        let out = effect.process(0.6);
        assert!((out - 0.6).abs() < 1e-4);
    }

    #[test]
    fn clearing_the_model_reverts_to_passthrough() {
        let model = parse_model(&identity_model_text()).unwrap();
        let mut effect = NeuralEffect::new(48000.0);
        effect.set_model(model);
        effect.clear_model();
        assert!(!effect.has_model());
        let out = effect.process(0.42);
        assert!((out - 0.42).abs() < 1e-4);
    }

    #[test]
    fn output_stays_finite_with_a_deep_model() {
        let text = "JFXNN1\n2\n1\n2\n2,4,RELU\n1.0,-1.0\n0.5,0.5\n-0.3,0.3\n0.2,-0.2\n0.1,0.1,0.1,0.1\n4,1,SIGMOID\n0.2,0.2,0.2,0.2\n0.0\n";
        let model = parse_model(text).unwrap();
        let mut effect = NeuralEffect::new(48000.0);
        effect.set_model(model);
        effect.set_mix(1.0);
        for i in 0..64 {
            let t = i as f32 / 48000.0;
            let input = libm::sinf(2.0 * core::f32::consts::PI * 220.0 * t);
            let out = effect.process(input);
            assert!(out.is_finite());
        }
    }
}
