//! Maps a node's `type_tag` to a constructed [`RigNode`] (spec §4.2 step 1).

use fretgraph_registry::EffectRegistry;

use crate::error::CompileError;
use crate::model::{ChannelMode, NodeConfig, NodeDescriptor};
use crate::node::{EffectNodeAdapter, RigNode};
use crate::structural::{MixerNode, SinkNode, SourceNode, SplitterNode};

/// Built-in structural type tags, reserved and never resolved against the
/// effect registry.
pub const SOURCE_TAG: &str = "source";
pub const SINK_TAG: &str = "sink";
pub const SPLITTER_TAG: &str = "splitter";
pub const MIXER_TAG: &str = "mixer";

/// Builds a [`RigNode`] from a node's type tag and configuration, at an
/// initial sample rate (the compiler calls `prepare` separately once the
/// full engine configuration is known).
pub trait NodeFactory {
    /// Constructs the node named by `descriptor.type_tag`, or
    /// `Err(CompileError::UnknownEffectType)` if it names neither a
    /// structural kind nor a registered effect.
    fn build(&self, descriptor: &NodeDescriptor, sample_rate: f32) -> Result<Box<dyn RigNode>, CompileError>;
}

/// The standard factory: structural kinds plus every effect in an
/// [`EffectRegistry`].
pub struct DefaultNodeFactory {
    registry: EffectRegistry,
}

impl DefaultNodeFactory {
    /// Wraps an effect registry (typically [`EffectRegistry::new`], which
    /// registers every built-in effect).
    pub fn new(registry: EffectRegistry) -> Self {
        Self { registry }
    }
}

impl Default for DefaultNodeFactory {
    fn default() -> Self {
        Self::new(EffectRegistry::new())
    }
}

impl NodeFactory for DefaultNodeFactory {
    fn build(&self, descriptor: &NodeDescriptor, sample_rate: f32) -> Result<Box<dyn RigNode>, CompileError> {
        match descriptor.type_tag.as_str() {
            SOURCE_TAG => Ok(Box::new(SourceNode::new())),
            SINK_TAG => Ok(Box::new(SinkNode::new())),
            SPLITTER_TAG => {
                let NodeConfig::Splitter { num_outputs } = descriptor.config else {
                    return Ok(Box::new(SplitterNode::new(2)));
                };
                Ok(Box::new(SplitterNode::new(num_outputs)))
            }
            MIXER_TAG => {
                let (num_inputs, stereo, levels, pans, master) = match &descriptor.config {
                    NodeConfig::Mixer {
                        num_inputs,
                        stereo_mode,
                        levels,
                        pans,
                        master_level,
                    } => (
                        *num_inputs,
                        *stereo_mode == ChannelMode::Stereo,
                        levels.clone(),
                        pans.clone(),
                        *master_level,
                    ),
                    _ => (2, true, vec![1.0, 1.0], vec![0.0, 0.0], 1.0),
                };
                Ok(Box::new(MixerNode::new(num_inputs, stereo, levels, pans, master)))
            }
            id => self
                .registry
                .create(id, sample_rate)
                .map(|effect| Box::new(EffectNodeAdapter::new(effect)) as Box<dyn RigNode>)
                .ok_or_else(|| CompileError::UnknownEffectType(id.to_string())),
        }
    }
}
