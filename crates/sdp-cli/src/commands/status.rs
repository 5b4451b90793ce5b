//! §6 `status` verb: effective configuration, checkpoint summary, next action.

use super::common::cli_overrides;
use crate::args::Cli;
use crate::error::CliError;
use camino::Utf8Path;
use sdp_utils::identifiers::FeatureId;

pub async fn execute(cli: &Cli, project_root: &Utf8Path, feature_id: &str, json: bool) -> Result<(), CliError> {
    let feature = FeatureId::parse(feature_id)?;
    let report = sdp_status::build(project_root, &feature, &cli_overrides(cli))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("feature:      {}", report.feature_id);
    println!("initialized:  {}", report.initialized);
    println!("phase:        {}", report.phase);
    println!("next action:  {}", report.next_action);
    println!("effective configuration:");
    for value in &report.effective_config {
        println!("  {:<24} {:<10} ({})", value.key, value.value, value.source);
    }
    if !report.workstreams.is_empty() {
        println!("workstreams:");
        for ws in &report.workstreams {
            println!("  {:<16} {}", ws.id, ws.status);
        }
    }
    if let Some(review) = &report.review {
        println!("review:       iteration {} — {}", review.iteration, review.status);
    }
    Ok(())
}
