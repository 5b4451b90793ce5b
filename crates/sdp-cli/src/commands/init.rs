//! §6 `init` verb: create a feature's checkpoint and run-log in `init` phase.

use super::common::{build_supervisor, load_environment};
use crate::args::Cli;
use crate::error::CliError;
use camino::Utf8Path;
use sdp_utils::identifiers::FeatureId;

pub async fn execute(cli: &Cli, project_root: &Utf8Path, feature_id: &str, branch: Option<String>) -> Result<(), CliError> {
    let feature = FeatureId::parse(feature_id)?;
    let env = load_environment(project_root, cli)?;
    let supervisor = build_supervisor(cli, project_root, &env)?;
    let branch = branch.unwrap_or_else(|| format!("feature/{}", feature_id.to_lowercase()));
    let (checkpoint, run_log_path) = supervisor.init(feature, branch)?;

    println!("initialized {} at phase {} (run log: {run_log_path})", checkpoint.feature_id, checkpoint.phase);
    Ok(())
}
