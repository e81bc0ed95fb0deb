use crate::config::JarloomConfig;
use crate::pipeline::{FingerprintMode, PipelineOrchestrator, RunPlan};
use crate::tools::Toolset;
use anyhow::Result;

/// Print the plan a `run` would follow. Never updates fingerprints.
pub fn show_status(config: &JarloomConfig, json: bool) -> Result<RunPlan> {
    let toolset = Toolset::from_config(&config.tools);
    let plan = PipelineOrchestrator::from_config(config, &toolset)?
        .with_force_refresh(config.pipeline.force_refresh)
        .plan(FingerprintMode::ReadOnly)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", format_plan(&plan));
    }
    Ok(plan)
}

pub fn format_plan(plan: &RunPlan) -> String {
    let mut out = String::new();
    for status in &plan.stages {
        let state = match &status.stale {
            Some(reason) => format!("stale ({})", reason),
            None => "up to date".to_string(),
        };
        let label = format!("{} ({})", status.kind, status.variant);
        out.push_str(&format!("{:<28} {}\n", label, state));
    }
    if plan.is_up_to_date() {
        out.push_str("All artifacts are up to date\n");
    } else {
        out.push_str(&format!("{} stages would run\n", plan.stale_count()));
    }
    out
}
