//! §6 `advance` verb: drive a feature through exactly its next phase step.

use super::common::{build_supervisor, find_run_log_path, load_environment, to_utf8};
use crate::args::Cli;
use crate::error::CliError;
use camino::Utf8Path;
use sdp_phase_api::NextAction;
use sdp_utils::identifiers::FeatureId;
use tokio_util::sync::CancellationToken;

pub async fn execute(cli: &Cli, project_root: &Utf8Path, feature_id: &str) -> Result<(), CliError> {
    let feature = FeatureId::parse(feature_id)?;
    let mut checkpoint = sdp_checkpoint::load(project_root, &feature)?.ok_or_else(|| CliError::FeatureNotInitialized(feature_id.to_string()))?;

    let env = load_environment(project_root, cli)?;
    let mut supervisor = build_supervisor(cli, project_root, &env)?;
    let runs_dir = to_utf8(&cli.runs_dir);
    let run_log_path = find_run_log_path(&runs_dir, feature_id)?.ok_or_else(|| CliError::RunLogNotFound(feature_id.to_string()))?;

    let cancel = cancellation_token();
    let next = supervisor.step(&mut checkpoint, &run_log_path, &cancel).await?;

    println!("{} -> phase {}", checkpoint.feature_id, checkpoint.phase);
    match next {
        NextAction::Init => println!("next: init"),
        NextAction::Build(ws) => println!("next: build {ws}"),
        NextAction::Review => println!("next: review"),
        NextAction::Pr => println!("next: open pull request"),
        NextAction::CiLoop(pr) => println!("next: ci loop (pr {})", pr.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string())),
        NextAction::Done => println!("next: done"),
    }
    Ok(())
}

fn cancellation_token() -> CancellationToken {
    let token = CancellationToken::new();
    let watched = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watched.cancel();
        }
    });
    token
}
