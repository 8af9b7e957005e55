//! Declarative rig description, graph compiler, and real-time control
//! channel (spec §3, §4.1–§4.4, §4.8).
//!
//! A [`model::RigDescription`] is the control thread's editable source of
//! truth. [`compiler::compile`] turns one into an immutable
//! [`plan::ExecutionPlan`]; [`control::control_channel`] hands plans and
//! live edits to the audio thread without it ever locking, allocating, or
//! freeing memory.

pub mod compiler;
pub mod control;
pub mod error;
pub mod factory;
pub mod model;
pub mod node;
pub mod offline;
pub mod plan;
pub mod port;
pub mod rig_file;
pub mod structural;

pub use compiler::compile;
pub use control::{control_channel, AudioPort, ControlError, ControlHandle, ControlMessage};
pub use error::{CompileError, RigError};
pub use factory::{DefaultNodeFactory, NodeFactory, MIXER_TAG, SINK_TAG, SOURCE_TAG, SPLITTER_TAG};
pub use model::{ChannelMode, ConnectionDescriptor, NodeConfig, NodeDescriptor, ParamValue, RigDescription, RigMetadata};
pub use node::{PortSignal, PortSignalMut, RigNode};
pub use offline::{render_offline, OfflineOutput};
pub use plan::{BufferRef, EngineConfig, ExecutionPlan};
pub use rig_file::{load_rig, load_rig_str, save_rig, save_rig_str};
pub use structural::{MemoryBuffer, MixerNode, SinkNode, SourceNode, SplitterNode};
