//! Stand-ins for the external tools a pipeline run invokes.

use crate::bytecode::is_class_entry;
use crate::errors::{PipelineError, Result};
use crate::jar::Jar;
use crate::tools::{PatchApplier, ToolContext};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Treats the patch set as a jar of replacement classes.
///
/// The output holds the clean jar's resources and the patch set's entries.
/// Like a real binary patcher, it lacks every class the patch set does not
/// touch.
#[derive(Debug, Default)]
pub struct OverlayPatcher {
    calls: AtomicUsize,
}

impl OverlayPatcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PatchApplier for OverlayPatcher {
    fn name(&self) -> &str {
        "overlay"
    }

    fn apply_patches(&self, clean: &Path, patches: &Path, output: &Path, _ctx: ToolContext) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut out = Jar::new(output);
        for (name, bytes) in Jar::open(clean)?.entries() {
            if !is_class_entry(name) {
                out.insert(name, bytes.to_vec());
            }
        }
        for (name, bytes) in Jar::open(patches)?.into_entries() {
            out.insert(name, bytes);
        }
        out.write()
    }
}

/// Writes a truncated output and then reports failure.
#[derive(Debug, Default)]
pub struct FailingPatcher;

impl PatchApplier for FailingPatcher {
    fn name(&self) -> &str {
        "failing"
    }

    fn apply_patches(&self, _clean: &Path, _patches: &Path, output: &Path, ctx: ToolContext) -> Result<()> {
        fs::write(output, b"PK\x03\x04truncated").map_err(|e| PipelineError::io(output, e))?;
        Err(ctx.failure(self.name(), Some(1), "simulated patch failure"))
    }
}
