//! The concrete stages of the artifact pipeline.

pub mod access;
pub mod inject;
pub mod merge;
pub mod patch;
pub mod remap;

pub use access::{AccessTransformStage, ACCESS_FINGERPRINT};
pub use inject::InjectClassesStage;
pub use merge::MergeStage;
pub use patch::PatchStage;
pub use remap::{MappingSource, RemapStage};
