//! In-memory rig description: the control thread's source of truth.
//!
//! A [`RigDescription`] names nodes and connections declaratively. It carries
//! no DSP state and no audio-thread constraints — it is plain data, freely
//! cloned, diffed, and serialized. [`crate::compiler::compile`] turns one into
//! an [`crate::plan::ExecutionPlan`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw parameter value as it appears in a rig description or a loaded file,
/// before being resolved against a node's [`fretgraph_core::ParamDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A plain numeric value (continuous parameters).
    Number(f64),
    /// A boolean toggle.
    Bool(bool),
    /// A named choice label (resolved against the node's choice labels).
    Choice(String),
}

impl ParamValue {
    /// Best-effort conversion to a plain `f32`, independent of any parameter
    /// descriptor. Booleans become `0.0`/`1.0`; choice labels that don't parse
    /// as numbers become `0.0` (the compiler resolves labels properly via
    /// [`crate::node::RigNode::choice_labels`] before falling back to this).
    pub fn as_f32_lossy(&self) -> f32 {
        match self {
            ParamValue::Number(n) => *n as f32,
            ParamValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ParamValue::Choice(s) => s.parse::<f64>().unwrap_or(0.0) as f32,
        }
    }
}

/// Stereo/mono rendering mode for a mixer node (and the engine as a whole).
///
/// Serialized uppercase (`MONO`/`STEREO`) to match the rig file schema (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelMode {
    /// Single channel.
    Mono,
    /// Two independent channels (see REDESIGN note on mixer stereo handling).
    #[default]
    Stereo,
}

/// Type-specific configuration that doesn't fit the uniform parameter map.
///
/// Untagged in JSON: a splitter's `config` carries only `numOutputs`, a
/// mixer's carries `numInputs`/`stereoMode`/etc, and a plain effect, source,
/// or sink simply omits `config` entirely (the containing field's serde
/// default resolves that case to `None` without ever looking at this enum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeConfig {
    /// Mixer fan-in configuration.
    Mixer {
        /// Number of input ports (`in1..inN`).
        #[serde(rename = "numInputs")]
        num_inputs: u32,
        /// Mono or stereo routing.
        #[serde(rename = "stereoMode")]
        stereo_mode: ChannelMode,
        /// Per-input linear level, range `[0, 2]`. Length `num_inputs`; missing
        /// entries default to `1.0`.
        #[serde(default)]
        levels: Vec<f32>,
        /// Per-input pan, range `[-1, 1]`. Ignored in mono mode. Length
        /// `num_inputs`; missing entries default to `0.0`.
        #[serde(default)]
        pans: Vec<f32>,
        /// Master output level, linear gain.
        #[serde(rename = "masterLevel")]
        master_level: f32,
    },
    /// Splitter fan-out count.
    Splitter {
        /// Number of output ports (`out1..outN`).
        #[serde(rename = "numOutputs")]
        num_outputs: u32,
    },
    /// No type-specific configuration (plain DSP effect, source, sink).
    None,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig::None
    }
}

impl NodeConfig {
    /// Explicit `None`, used as a serde default for loaded files that omit
    /// `config` entirely.
    fn none() -> Self {
        NodeConfig::None
    }

    /// Builds a default mixer config for `num_inputs` inputs, unity levels,
    /// centered pans, unity master.
    pub fn default_mixer(num_inputs: u32, stereo_mode: ChannelMode) -> Self {
        NodeConfig::Mixer {
            num_inputs,
            stereo_mode,
            levels: vec![1.0; num_inputs as usize],
            pans: vec![0.0; num_inputs as usize],
            master_level: 1.0,
        }
    }
}

/// One node in a [`RigDescription`].
///
/// Wire field names follow spec §6's rig-file schema exactly
/// (`type`/`x`/`y`/`parameters`, not the Rust-conventional `type_tag`/
/// `position`/`params`) so files this crate writes are loadable by, and
/// files it loads were plausibly produced by, any other §6-conformant tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Unique, case-sensitive, stable identifier within the rig.
    pub id: String,
    /// Registered type tag: an effect id (e.g. `"distortion"`), or one of the
    /// structural kinds `"source"`, `"sink"`, `"splitter"`, `"mixer"`.
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Display name (defaults to `type_tag` if absent when loaded).
    pub name: String,
    /// Engine-level bypass: output mirrors input, `process` is skipped.
    #[serde(default)]
    pub bypassed: bool,
    /// Opaque canvas X position, carried through but never interpreted.
    #[serde(default)]
    pub x: Option<f32>,
    /// Opaque canvas Y position, carried through but never interpreted.
    #[serde(default)]
    pub y: Option<f32>,
    /// Parameter id → value, applied at compile time (unknown ids ignored,
    /// values clamped to range).
    #[serde(default, rename = "parameters")]
    pub params: BTreeMap<String, ParamValue>,
    /// Type-specific configuration (splitter fan-out, mixer fan-in/levels).
    #[serde(default = "NodeConfig::none")]
    pub config: NodeConfig,
}

impl NodeDescriptor {
    /// A plain DSP effect node with no parameters set yet.
    pub fn effect(id: impl Into<String>, type_tag: impl Into<String>) -> Self {
        let type_tag = type_tag.into();
        Self {
            id: id.into(),
            name: type_tag.clone(),
            type_tag,
            bypassed: false,
            x: None,
            y: None,
            params: BTreeMap::new(),
            config: NodeConfig::None,
        }
    }

    /// A `source` structural node.
    pub fn source(id: impl Into<String>) -> Self {
        Self::effect(id, "source")
    }

    /// A `sink` structural node.
    pub fn sink(id: impl Into<String>) -> Self {
        Self::effect(id, "sink")
    }

    /// A `splitter` structural node with `num_outputs` fan-out.
    pub fn splitter(id: impl Into<String>, num_outputs: u32) -> Self {
        let mut node = Self::effect(id, "splitter");
        node.config = NodeConfig::Splitter { num_outputs };
        node
    }

    /// A `mixer` structural node with `num_inputs` fan-in.
    pub fn mixer(id: impl Into<String>, num_inputs: u32, stereo_mode: ChannelMode) -> Self {
        let mut node = Self::effect(id, "mixer");
        node.config = NodeConfig::default_mixer(num_inputs, stereo_mode);
        node
    }

    /// Sets a parameter value, builder-style.
    pub fn with_param(mut self, id: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(id.into(), value);
        self
    }
}

/// One audio connection: `source_node.source_port -> target_node.target_port`.
///
/// Serialized as `sourceNode`/`sourcePort`/`targetNode`/`targetPort` per §6.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
    /// Id of the node providing the signal.
    pub source_node: String,
    /// Output port name on the source node.
    pub source_port: String,
    /// Id of the node receiving the signal.
    pub target_node: String,
    /// Input port name on the target node.
    pub target_port: String,
}

impl ConnectionDescriptor {
    /// Connects the default `out` port of `source` to the default `in` port
    /// of `target`.
    pub fn simple(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_node: source.into(),
            source_port: crate::port::DEFAULT_OUTPUT.to_string(),
            target_node: target.into(),
            target_port: crate::port::DEFAULT_INPUT.to_string(),
        }
    }

    /// Connects an explicit `(node, port)` pair on each side.
    pub fn new(
        source_node: impl Into<String>,
        source_port: impl Into<String>,
        target_node: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source_node: source_node.into(),
            source_port: source_port.into(),
            target_node: target_node.into(),
            target_port: target_port.into(),
        }
    }
}

/// Rig-level metadata, persisted alongside the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigMetadata {
    /// Rig name.
    #[serde(default = "RigMetadata::default_name")]
    pub name: String,
    /// Author, defaults to `"User"` when absent in a loaded file.
    #[serde(default = "RigMetadata::default_author")]
    pub author: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Category label (e.g. `"Lead"`, `"Clean"`).
    #[serde(default)]
    pub category: Option<String>,
    /// Free-form tags. Persisted as a single comma-joined string per §6, not
    /// a JSON array.
    #[serde(default, with = "comma_joined_tags")]
    pub tags: Vec<String>,
    /// Schema/content version, defaults to `"1.0"`.
    #[serde(default = "RigMetadata::default_version")]
    pub version: String,
    /// ISO-8601 creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// ISO-8601 last-modified timestamp.
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// (De)serializes `Vec<String>` as the comma-joined string §6's rig schema
/// uses for `tags`, rather than serde's default JSON array.
mod comma_joined_tags {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&tags.join(","))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let joined = String::deserialize(deserializer)?;
        Ok(joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect())
    }
}

impl RigMetadata {
    fn default_name() -> String {
        String::from("Untitled")
    }

    fn default_author() -> String {
        String::from("User")
    }

    fn default_version() -> String {
        String::from("1.0")
    }
}

impl Default for RigMetadata {
    fn default() -> Self {
        Self {
            name: String::from("Untitled"),
            author: String::from("User"),
            description: None,
            category: None,
            tags: Vec::new(),
            version: String::from("1.0"),
            created_at: None,
            modified_at: None,
        }
    }
}

/// Declarative description of a signal graph: metadata plus an ordered set
/// of node and connection descriptors.
///
/// Node and connection order is part of the rig's identity: the graph
/// compiler's topological tie-break is insertion order, so two rigs with the
/// same nodes/connections in a different order can compile to differently
/// ordered (though behaviorally equivalent) plans.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RigDescription {
    /// Rig-level metadata.
    #[serde(default)]
    pub metadata: RigMetadata,
    /// Ordered node descriptors.
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    /// Ordered connection descriptors.
    #[serde(default)]
    pub connections: Vec<ConnectionDescriptor>,
}

impl RigDescription {
    /// An empty rig with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: RigMetadata {
                name: name.into(),
                ..RigMetadata::default()
            },
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Appends a node, builder-style.
    pub fn with_node(mut self, node: NodeDescriptor) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends a connection, builder-style.
    pub fn with_connection(mut self, connection: ConnectionDescriptor) -> Self {
        self.connections.push(connection);
        self
    }

    /// Returns the node descriptor with the given id, if present.
    pub fn node(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// A stable hash of the rig's structural content (node ids/types/config
    /// and connections — not metadata or canvas position), used by the
    /// compiler to detect no-op recompiles.
    pub fn structural_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for node in &self.nodes {
            node.id.hash(&mut hasher);
            node.type_tag.hash(&mut hasher);
            node.bypassed.hash(&mut hasher);
            for (k, v) in &node.params {
                k.hash(&mut hasher);
                match v {
                    ParamValue::Number(n) => n.to_bits().hash(&mut hasher),
                    ParamValue::Bool(b) => b.hash(&mut hasher),
                    ParamValue::Choice(s) => s.hash(&mut hasher),
                }
            }
            hash_config(&node.config, &mut hasher);
        }
        for conn in &self.connections {
            conn.hash(&mut hasher);
        }
        hasher.finish()
    }
}

fn hash_config(config: &NodeConfig, hasher: &mut impl std::hash::Hasher) {
    use std::hash::Hash;
    match config {
        NodeConfig::None => 0u8.hash(hasher),
        NodeConfig::Splitter { num_outputs } => {
            1u8.hash(hasher);
            num_outputs.hash(hasher);
        }
        NodeConfig::Mixer {
            num_inputs,
            stereo_mode,
            levels,
            pans,
            master_level,
        } => {
            2u8.hash(hasher);
            num_inputs.hash(hasher);
            (*stereo_mode == ChannelMode::Stereo).hash(hasher);
            for l in levels {
                l.to_bits().hash(hasher);
            }
            for p in pans {
                p.to_bits().hash(hasher);
            }
            master_level.to_bits().hash(hasher);
        }
    }
}
