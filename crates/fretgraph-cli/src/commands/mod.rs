//! CLI command implementations.

pub mod analyze;
pub mod common;
pub mod compare;
pub mod devices;
pub mod effects;
pub mod generate;
pub mod info;
pub mod play;
pub mod presets;
pub mod process;
pub mod realtime;
pub mod rig;
