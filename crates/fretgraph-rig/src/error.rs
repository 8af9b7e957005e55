//! Error types surfaced by compilation, loading, and saving.

use thiserror::Error;

/// Failures that can occur while turning a [`crate::model::RigDescription`]
/// into an [`crate::plan::ExecutionPlan`] (spec §4.2).
#[derive(Debug, Error)]
pub enum CompileError {
    /// `type_tag` doesn't name a registered effect or a structural kind.
    #[error("unknown node type `{0}`")]
    UnknownEffectType(String),
    /// A connection references a node id that isn't in the rig.
    #[error("connection references unknown node `{0}`")]
    UnknownNode(String),
    /// A connection references a port the node doesn't declare.
    #[error("node `{node}` has no port named `{port}`")]
    UnknownPort {
        /// Offending node id.
        node: String,
        /// Offending port name.
        port: String,
    },
    /// Two connections target the same input port.
    #[error("input port `{node}.{port}` is already connected")]
    InputPortAlreadyConnected {
        /// Offending node id.
        node: String,
        /// Offending port name.
        port: String,
    },
    /// The connection graph contains a cycle. Carries the ids of every node
    /// that never reached in-degree zero during the topological sort — the
    /// nodes that make up (or hang off) the offending cycle.
    #[error("connection graph contains a cycle involving nodes {0:?}")]
    Cycle(Vec<String>),
    /// A node's `prepare` call failed or panicked (caught via `catch_unwind`
    /// at the call site if the caller chooses to).
    #[error("node `{0}` failed to prepare")]
    PreparationFailed(String),
}

/// Failures loading or saving a rig, favorites store, or preset file.
#[derive(Debug, Error)]
pub enum RigError {
    /// Underlying filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON.
    #[error("invalid rig JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Malformed key-value preset text.
    #[error("invalid preset format: {0}")]
    PresetFormat(String),
}
