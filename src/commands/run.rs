use crate::config::JarloomConfig;
use crate::pipeline::{PipelineOrchestrator, RunReport};
use crate::tools::Toolset;
use anyhow::Result;

pub fn run_pipeline(config: &JarloomConfig, refresh: bool) -> Result<RunReport> {
    let toolset = Toolset::from_config(&config.tools);
    log::debug!("Using tools {:?}", toolset);

    let orchestrator = PipelineOrchestrator::from_config(config, &toolset)?
        .with_force_refresh(refresh || config.pipeline.force_refresh);
    let report = orchestrator.run()?;

    for outcome in &report.outcomes {
        println!("{}", outcome.format());
    }
    if let Some(merged) = report.merged_output() {
        println!("Merged jar: {}", merged.display());
    }
    Ok(report)
}
