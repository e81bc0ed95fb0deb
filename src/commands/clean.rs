use crate::config::JarloomConfig;
use crate::pipeline::orchestrator::clean_layout;
use anyhow::{Context, Result};

/// Only the cache layout is needed, so this works with an incomplete config.
pub fn clean_artifacts(config: &JarloomConfig) -> Result<usize> {
    let layout = config.layout();
    let removed = clean_layout(&layout)
        .with_context(|| format!("Failed to clean {}", layout.root().display()))?;
    println!("Removed {} files from {}", removed, layout.root().display());
    Ok(removed)
}
