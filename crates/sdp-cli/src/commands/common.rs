//! Shared setup used by every command: loading configuration, the hooks
//! and constraints documents, the tracker mapping, and assembling the
//! `Supervisor` the phase-driving commands (`init`, `advance`) need.

use crate::args::Cli;
use crate::error::CliError;
use crate::tracker::{self, FileBackedResolver};
use camino::{Utf8Path, Utf8PathBuf};
use sdp_config::{CliOverrides, Config};
use sdp_constraints::{ConstraintEngine, ConstraintsDocument};
use sdp_hooks::HooksDocument;
use sdp_orchestrator::{CiCommands, PublishCommands, Supervisor};
use sdp_phases::WorkerInvocation;
use sdp_runner::CommandSpec;
use std::time::Duration;

pub fn cli_overrides(cli: &Cli) -> CliOverrides {
    CliOverrides {
        build_timeout_secs: cli.build_timeout_secs,
        review_timeout_secs: cli.review_timeout_secs,
        publish_timeout_secs: cli.publish_timeout_secs,
        ci_timeout_secs: cli.ci_timeout_secs,
        hook_timeout_secs: cli.hook_timeout_secs,
        max_retries: cli.max_retries,
        retry_delay_secs: cli.retry_delay_secs,
        hooks_path: cli.hooks_path.as_ref().map(|p| to_utf8(p)),
        constraints_path: cli.constraints_path.as_ref().map(|p| to_utf8(p)),
    }
}

pub fn to_utf8(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned()))
}

/// Resolved configuration plus the loaded hooks/constraints documents and
/// tracker mapping every phase-aware command needs.
pub struct Environment {
    pub config: Config,
    pub hooks: HooksDocument,
    pub constraints_doc: ConstraintsDocument,
    pub tracker_mapping: sdp_attestation::TrackerMapping,
    pub resolver: FileBackedResolver,
    pub worker: WorkerInvocation,
}

impl Environment {
    /// A freshly constructed engine over the loaded constraints document.
    /// `ConstraintEngine` accumulates per-constraint violation counts as it
    /// evaluates, so each phase run gets its own rather than sharing one.
    pub fn build_constraint_engine(&self) -> Result<Option<ConstraintEngine>, CliError> {
        if self.constraints_doc.constraints.is_empty() {
            return Ok(None);
        }
        Ok(Some(ConstraintEngine::new(
            self.constraints_doc.constraints.clone(),
            self.constraints_doc.thresholds.clone(),
        )?))
    }
}

pub fn load_environment(project_root: &Utf8Path, cli: &Cli) -> Result<Environment, CliError> {
    let (config, _effective) = sdp_config::load(project_root, &cli_overrides(cli))?;
    let hooks = sdp_hooks::load(&config.hooks_path)?;
    let constraints_doc = sdp_constraints::load(&config.constraints_path)?;
    let tracker_mapping = tracker::load(&to_utf8(&cli.tracker_mapping))?;
    let resolver = FileBackedResolver::new(tracker_mapping.clone());
    let worker = WorkerInvocation {
        program: cli.worker.clone(),
        build_role: cli.build_role.clone(),
        review_role: cli.review_role.clone(),
    };

    Ok(Environment {
        config,
        hooks,
        constraints_doc,
        tracker_mapping,
        resolver,
        worker,
    })
}

/// `git push` followed by `gh pr create --json number,url`, the publish
/// invocation shape the publish phase runner expects to parse.
struct GitHubPublishCommands;

impl PublishCommands for GitHubPublishCommands {
    fn push(&self, branch: &str) -> CommandSpec {
        CommandSpec::new("git").arg("push").arg("--set-upstream").arg("origin").arg(branch)
    }

    fn pr_create(&self, branch: &str, feature_id: &str) -> CommandSpec {
        CommandSpec::new("gh")
            .arg("pr")
            .arg("create")
            .arg("--head")
            .arg(branch)
            .arg("--title")
            .arg(feature_id)
            .arg("--fill")
            .arg("--json")
            .arg("number,url")
    }
}

/// Delegates the CI-loop to the same worker binary under a dedicated verb.
struct DelegateCiCommands {
    program: String,
}

impl CiCommands for DelegateCiCommands {
    fn ci_loop(&self, pr_number: u64, feature_id: &str, checkpoint_dir: &Utf8Path, runs_dir: &Utf8Path) -> CommandSpec {
        CommandSpec::new(self.program.clone())
            .arg("ci-loop")
            .arg("--pr")
            .arg(pr_number.to_string())
            .arg("--feature")
            .arg(feature_id)
            .arg("--checkpoint-dir")
            .arg(checkpoint_dir.as_str())
            .arg("--runs-dir")
            .arg(runs_dir.as_str())
    }
}

/// Find the run-log belonging to `feature_id` under `runs_dir`. Run-logs are
/// named `oneshot-<FeatureID>-<UTC-compact>.json`; the compact timestamp
/// sorts lexicographically, so the greatest matching name is the most
/// recent run.
pub fn find_run_log_path(runs_dir: &Utf8Path, feature_id: &str) -> std::io::Result<Option<Utf8PathBuf>> {
    if !runs_dir.is_dir() {
        return Ok(None);
    }
    let prefix = format!("oneshot-{feature_id}-");
    let mut best: Option<String> = None;
    for entry in std::fs::read_dir(runs_dir.as_std_path())? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with(&prefix) && name.ends_with(".json") && best.as_deref().is_none_or(|b| name > *b) {
            best = Some(name);
        }
    }
    Ok(best.map(|name| runs_dir.join(name)))
}

pub fn build_supervisor<'a>(cli: &'a Cli, project_root: &'a Utf8Path, env: &'a Environment) -> Result<Supervisor<'a>, CliError> {
    Ok(Supervisor {
        project_root,
        orchestrator_name: &cli.orchestrator_name,
        worker: env.worker.clone(),
        agents_doc_path: to_utf8(&cli.agents_doc),
        skill_doc_path: cli.skill_doc.as_deref().map(to_utf8),
        tracker: &env.resolver,
        tracker_mapping: env.tracker_mapping.clone(),
        hooks: env.hooks.clone(),
        constraints: env.build_constraint_engine()?,
        build_timeout: Duration::from_secs(env.config.timeouts.build_secs),
        review_timeout: Duration::from_secs(env.config.timeouts.review_secs),
        publish_timeout: Duration::from_secs(env.config.timeouts.publish_secs),
        ci_timeout: Duration::from_secs(env.config.timeouts.ci_secs),
        publish: Some(Box::new(GitHubPublishCommands)),
        ci: Some(Box::new(DelegateCiCommands { program: cli.worker.clone() })),
        runs_dir: to_utf8(&cli.runs_dir),
        branch_base: cli.branch_base.clone(),
    })
}
