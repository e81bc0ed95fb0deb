//! Incremental jar transformation pipeline.
//!
//! Two clean jars (client and server) are patched, enriched with injected
//! classes, widened by access rules, remapped between name spaces and
//! finally merged. Every intermediate artifact is cached under a
//! deterministic name and rebuilt only when its inputs change.

pub mod access;
pub mod bytecode;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod hierarchy;
pub mod jar;
pub mod mapping;
pub mod pipeline;
pub mod remap;
pub mod testkit;
pub mod tools;

// Re-export commonly used types
pub use crate::config::{load_config, JarloomConfig};
pub use crate::errors::{MemberKind, PipelineError, Result};
pub use crate::mapping::{MappingIndex, MappingTree};
pub use crate::pipeline::{
    Artifact, ArtifactState, FingerprintMode, PipelineOrchestrator, RunPlan, RunReport, StageKind,
    Variant,
};
pub use crate::remap::NamespaceRemapper;
pub use crate::tools::Toolset;
