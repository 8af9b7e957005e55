//! Port naming conventions shared by the model and the compiler.

/// Default input port name for single-input nodes.
pub const DEFAULT_INPUT: &str = "in";
/// Default output port name for single-output nodes.
pub const DEFAULT_OUTPUT: &str = "out";

/// Name of the `n`th (1-based) splitter output port.
pub fn splitter_output(n: u32) -> String {
    format!("out{n}")
}

/// Name of the `n`th (1-based) mixer input port.
pub fn mixer_input(n: u32) -> String {
    format!("in{n}")
}

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    /// Carries a signal into the node.
    Input,
    /// Carries a signal out of the node.
    Output,
}

/// The static port layout of a node, derived from its type tag and
/// [`crate::model::NodeConfig`] — never from the constructed [`crate::node::RigNode`]
/// instance, so the compiler can validate connections before it builds nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortLayout {
    /// Ordered input port names.
    pub inputs: Vec<String>,
    /// Ordered output port names.
    pub outputs: Vec<String>,
}

impl PortLayout {
    /// A node with no ports at all (never legal, but useful as a default).
    pub fn empty() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Single `in` → single `out`, the common case for DSP effects.
    pub fn single_in_out() -> Self {
        Self {
            inputs: vec![DEFAULT_INPUT.to_string()],
            outputs: vec![DEFAULT_OUTPUT.to_string()],
        }
    }

    /// A `source` node: no inputs, one `out`.
    pub fn source() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: vec![DEFAULT_OUTPUT.to_string()],
        }
    }

    /// A `sink` node: one `in`, no outputs.
    pub fn sink() -> Self {
        Self {
            inputs: vec![DEFAULT_INPUT.to_string()],
            outputs: Vec::new(),
        }
    }

    /// A `splitter` node: one `in`, `num_outputs` outputs named `out1..outN`.
    pub fn splitter(num_outputs: u32) -> Self {
        Self {
            inputs: vec![DEFAULT_INPUT.to_string()],
            outputs: (1..=num_outputs).map(splitter_output).collect(),
        }
    }

    /// A `mixer` node: `num_inputs` inputs named `in1..inN`, one `out`.
    pub fn mixer(num_inputs: u32) -> Self {
        Self {
            inputs: (1..=num_inputs).map(mixer_input).collect(),
            outputs: vec![DEFAULT_OUTPUT.to_string()],
        }
    }

    /// Index of an input port by name.
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p == name)
    }

    /// Index of an output port by name.
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|p| p == name)
    }
}

/// Derives a node's port layout from its type tag and configuration alone —
/// never from a constructed node — so the compiler can validate connections
/// before building anything. Unrecognized type tags are assumed to be
/// single-port DSP effects; the factory catches genuinely unknown ids.
pub fn layout_for(descriptor: &crate::model::NodeDescriptor) -> PortLayout {
    use crate::model::NodeConfig;
    match descriptor.type_tag.as_str() {
        crate::factory::SOURCE_TAG => PortLayout::source(),
        crate::factory::SINK_TAG => PortLayout::sink(),
        crate::factory::SPLITTER_TAG => {
            let num_outputs = match descriptor.config {
                NodeConfig::Splitter { num_outputs } => num_outputs,
                _ => 2,
            };
            PortLayout::splitter(num_outputs)
        }
        crate::factory::MIXER_TAG => {
            let num_inputs = match &descriptor.config {
                NodeConfig::Mixer { num_inputs, .. } => *num_inputs,
                _ => 2,
            };
            PortLayout::mixer(num_inputs)
        }
        _ => PortLayout::single_in_out(),
    }
}
