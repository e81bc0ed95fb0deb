//! Persisted digests of cache-invalidating inputs.
//!
//! An optional input that is absent hashes to the digest of the empty byte
//! string, so "nothing configured" is itself a comparable state. Digests are
//! stored as lowercase hex in a sidecar file.

use crate::errors::{IoResultExt, Result};
use once_cell::sync::Lazy;
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Lowercase hex SHA-256, as stored in sidecar files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest standing for an absent optional input.
pub static EMPTY_DIGEST: Lazy<Digest> = Lazy::new(|| digest(Some(&[])));

pub fn digest(input: Option<&[u8]>) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(input.unwrap_or_default());
    Digest(format!("{:x}", hasher.finalize()))
}

/// Digest of a file, or [`EMPTY_DIGEST`] when no file is given.
pub fn digest_file(path: Option<&Path>) -> Result<Digest> {
    match path {
        Some(path) => {
            let bytes = fs::read(path).at_path(path)?;
            Ok(digest(Some(&bytes)))
        }
        None => Ok(EMPTY_DIGEST.clone()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Dirty,
}

impl Verdict {
    pub fn is_dirty(self) -> bool {
        self == Verdict::Dirty
    }
}

/// Sidecar file holding the last persisted digest of one input.
#[derive(Debug, Clone)]
pub struct ArtifactFingerprint {
    persisted: PathBuf,
}

impl ArtifactFingerprint {
    pub fn new(persisted: impl Into<PathBuf>) -> Self {
        Self {
            persisted: persisted.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.persisted
    }

    /// Last persisted digest. Unreadable or malformed sidecars count as absent.
    pub fn persisted(&self) -> Option<Digest> {
        let text = fs::read_to_string(&self.persisted).ok()?;
        let text = text.trim();
        (!text.is_empty()).then(|| Digest(text.to_string()))
    }

    /// Compare without writing anything.
    pub fn check(&self, current: &Digest) -> Verdict {
        match self.persisted() {
            Some(previous) if previous == *current => Verdict::Clean,
            _ => Verdict::Dirty,
        }
    }

    /// Compare, and on `Dirty` persist `current` right away.
    pub fn check_and_update(&self, current: &Digest) -> Result<Verdict> {
        let verdict = self.check(current);
        if verdict.is_dirty() {
            log::debug!(
                "Fingerprint {} changed, now {}",
                self.persisted.display(),
                current
            );
            self.persist(current)?;
        }
        Ok(verdict)
    }

    pub fn persist(&self, digest: &Digest) -> Result<()> {
        if let Some(parent) = self.persisted.parent() {
            fs::create_dir_all(parent).at_path(parent)?;
        }
        fs::write(&self.persisted, format!("{}\n", digest)).at_path(&self.persisted)
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.persisted) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(crate::errors::PipelineError::io(&self.persisted, e))
            }
            _ => Ok(()),
        }
    }
}
