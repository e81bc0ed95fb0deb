//! Error types shared by the remapper and the artifact pipeline.
//!
//! Every fatal condition carries enough context (stage, variant, symbol or
//! file path) to diagnose a failed run without re-running it. Fingerprint
//! drift is deliberately absent here: it is a cache verdict, not a failure.

use crate::pipeline::{StageKind, Variant};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Kind of member named in an [`PipelineError::UnresolvableReference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Field,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Method => write!(f, "method"),
            MemberKind::Field => write!(f, "field"),
        }
    }
}

/// Main error type for jarloom operations
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A name-only lookup matched several distinct target names and no owner
    /// was supplied to narrow it down.
    #[error("ambiguous {kind} lookup {name} {} is not unique", .descriptor.as_deref().unwrap_or("<no descriptor>"))]
    UnresolvableReference {
        kind: MemberKind,
        name: String,
        descriptor: Option<String>,
    },

    /// A stage started but one of its declared inputs does not exist.
    #[error("{stage} ({variant}) is missing upstream artifact {}", .path.display())]
    MissingUpstreamArtifact {
        stage: StageKind,
        variant: Variant,
        path: PathBuf,
    },

    /// An external tool exited unsuccessfully or could not be launched.
    #[error("{tool} failed during {stage} ({variant}): {message}")]
    ExternalToolFailure {
        tool: String,
        stage: StageKind,
        variant: Variant,
        status: Option<i32>,
        message: String,
    },

    /// File system errors with the path that was being touched
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive read/write errors
    #[error("archive error in {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Malformed or unsupported classfile
    #[error("invalid class file {entry}: {message}")]
    ClassFormat { entry: String, message: String },

    /// Malformed mapping input
    #[error("mapping error at line {line}: {message}")]
    Mapping { line: usize, message: String },

    /// Malformed access-rule line
    #[error("access rule error at line {line}: {message}")]
    AccessRule { line: usize, message: String },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Wraps a failure with the stage that produced it.
    #[error("{stage} ({variant}) failed: {source}")]
    Stage {
        stage: StageKind,
        variant: Variant,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Create an I/O error with path context
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an archive error with path context
    pub fn archive(path: impl AsRef<Path>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn class_format(entry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClassFormat {
            entry: entry.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Attach stage context. Errors that already name their stage are left as-is.
    pub fn in_stage(self, stage: StageKind, variant: Variant) -> Self {
        match self {
            Self::MissingUpstreamArtifact { .. }
            | Self::ExternalToolFailure { .. }
            | Self::Stage { .. } => self,
            other => Self::Stage {
                stage,
                variant,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping stage context wrappers.
    pub fn root(&self) -> &PipelineError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for attaching paths to raw I/O results
pub trait IoResultExt<T> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| PipelineError::io(path, e))
    }
}
