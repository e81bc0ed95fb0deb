//! CLI command implementations.
//!
//! - **run**: bring every artifact up to date
//! - **status**: report which stages are stale
//! - **clean**: delete derived artifacts and fingerprints
//! - **resolve**: look up one member name through the mapping set

pub mod clean;
pub mod resolve;
pub mod run;
pub mod status;

pub use clean::clean_artifacts;
pub use resolve::{resolve_member, ResolveRequest};
pub use run::run_pipeline;
pub use status::{format_plan, show_status};
