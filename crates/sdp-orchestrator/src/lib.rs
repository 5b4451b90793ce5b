//! §9 Supervisor: the single-feature control loop that walks the FSM
//! (`init -> build -> review -> pr -> ci -> done`), invoking the matching
//! phase runner at each step, persisting the checkpoint and run-log after
//! every transition, and writing the attestation statement once `done` is
//! reached.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use sdp_attestation::{build as build_attestation, write as write_attestation, AttestationInput, TrackerMapping};
use sdp_checkpoint::{runlog, Checkpoint, CheckpointError, WorkstreamStatus};
use sdp_constraints::ConstraintEngine;
use sdp_hooks::{HookError, HooksDocument};
use sdp_packet::DependencyResolver;
use sdp_phase_api::{advance, compute_next_action, FsmError, NextAction, Phase};
use sdp_phases::{
    run_build, run_ci, run_publish, run_review, BuildError, CiConfig, CiError, PhaseEnv, PublishConfig, PublishError,
    ReviewError, WorkerInvocation,
};
use sdp_runner::CommandSpec;
use sdp_utils::identifiers::FeatureId;
use sdp_workstream::{discover, DiscoveryError, WorkstreamSpec};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Builds the platform CLI invocations for the publish phase, which need a
/// branch name and feature id only known at run time.
pub trait PublishCommands: Send + Sync {
    fn push(&self, branch: &str) -> CommandSpec;
    fn pr_create(&self, branch: &str, feature_id: &str) -> CommandSpec;
}

/// Builds the CI-loop delegate invocation once the PR number is known.
pub trait CiCommands: Send + Sync {
    fn ci_loop(&self, pr_number: u64, feature_id: &str, checkpoint_dir: &Utf8Path, runs_dir: &Utf8Path) -> CommandSpec;
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    RunLog(#[from] runlog::RunLogError),
    #[error(transparent)]
    Fsm(#[from] FsmError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Ci(#[from] CiError),
    #[error(transparent)]
    AttestationWrite(#[from] sdp_attestation::AttestationWriteError),
    #[error("publish phase reached but no publish command set is configured")]
    MissingPublishCommands,
    #[error("ci phase reached but no CI-loop command set is configured")]
    MissingCiCommands,
    #[error("ci phase reached with no stored pull request number")]
    MissingPrNumber,
    #[error("supervisor cancelled")]
    Cancelled,
}

pub struct Supervisor<'a> {
    pub project_root: &'a Utf8Path,
    pub orchestrator_name: &'a str,
    pub worker: WorkerInvocation,
    pub agents_doc_path: Utf8PathBuf,
    pub skill_doc_path: Option<Utf8PathBuf>,
    pub tracker: &'a dyn DependencyResolver,
    pub tracker_mapping: TrackerMapping,
    pub hooks: HooksDocument,
    pub constraints: Option<ConstraintEngine>,
    pub build_timeout: Duration,
    pub review_timeout: Duration,
    pub publish_timeout: Duration,
    pub ci_timeout: Duration,
    pub publish: Option<Box<dyn PublishCommands>>,
    pub ci: Option<Box<dyn CiCommands>>,
    pub runs_dir: Utf8PathBuf,
    pub branch_base: String,
}

impl<'a> Supervisor<'a> {
    fn phase_env_for(&self, feature_id: &str) -> PhaseEnv<'_> {
        PhaseEnv {
            project_root: self.project_root,
            feature_id: feature_id.to_string(),
            worker: &self.worker,
            agents_doc_path: &self.agents_doc_path,
            skill_doc_path: self.skill_doc_path.as_deref(),
            tracker: self.tracker,
            hooks: &self.hooks,
            hook_timeout: Duration::from_secs(60),
            orchestrator_name: self.orchestrator_name,
        }
    }

    /// Initialize a fresh feature: a checkpoint in `init` phase and its
    /// run-log, both persisted.
    pub fn init(&self, feature_id: FeatureId, branch: String) -> Result<(Checkpoint, Utf8PathBuf), OrchestratorError> {
        let now = Utc::now();
        let checkpoint = Checkpoint::init(feature_id.clone(), branch.clone(), now);
        sdp_checkpoint::save(self.project_root, &checkpoint)?;
        let (run_log_path, _log) = runlog::create(&self.runs_dir, &feature_id, self.orchestrator_name, &branch, now)?;
        Ok((checkpoint, run_log_path))
    }

    /// Advance `checkpoint` through exactly the next phase step: discovers
    /// workstreams, runs the phase runner `compute_next_action` selects,
    /// attempts the FSM transition its guard now permits, then persists the
    /// checkpoint and appends a run-log event. Returns the resulting next
    /// action so callers can loop until `Done`.
    pub async fn step(
        &mut self,
        checkpoint: &mut Checkpoint,
        run_log_path: &Utf8Path,
        cancel: &CancellationToken,
    ) -> Result<NextAction, OrchestratorError> {
        if cancel.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }

        let feature_str = checkpoint.feature_id.to_string();
        let workstreams = discover(self.project_root, &feature_str)?;
        if checkpoint.workstreams.is_empty() && checkpoint.phase == Phase::Init {
            checkpoint.workstreams = workstreams.iter().map(|w| WorkstreamStatus::pending(w.ws_id.clone())).collect();
            self.transition(checkpoint, Phase::Build)?;
        }

        let first_pending = checkpoint.first_pending_workstream().map(std::string::ToString::to_string);
        let action = compute_next_action(checkpoint.phase, first_pending.as_deref(), checkpoint.pr_number);

        match &action {
            NextAction::Init => {}
            NextAction::Build(_) => self.run_build_step(&workstreams, checkpoint, &feature_str, cancel).await?,
            NextAction::Review => self.run_review_step(&workstreams, checkpoint, &feature_str, cancel).await?,
            NextAction::Pr => self.run_publish_step(checkpoint, &feature_str, cancel).await?,
            NextAction::CiLoop(pr_number) => {
                self.run_ci_step(checkpoint, &feature_str, *pr_number, cancel).await?;
                self.write_attestation(checkpoint, &workstreams)?;
            }
            NextAction::Done => {}
        }

        sdp_checkpoint::save(self.project_root, checkpoint)?;
        runlog::append(run_log_path, checkpoint.phase, &format!("{}/ok", checkpoint.phase), Utc::now())?;

        let first_pending = checkpoint.first_pending_workstream().map(std::string::ToString::to_string);
        Ok(compute_next_action(checkpoint.phase, first_pending.as_deref(), checkpoint.pr_number))
    }

    /// Drive `checkpoint` forward one step at a time until it reaches
    /// `done` or an error occurs. On cancellation the checkpoint reached so
    /// far has already been persisted by the last successful `step`.
    pub async fn run_to_completion(
        &mut self,
        checkpoint: &mut Checkpoint,
        run_log_path: &Utf8Path,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        loop {
            match self.step(checkpoint, run_log_path, cancel).await? {
                NextAction::Done => return Ok(()),
                _ => continue,
            }
        }
    }

    fn transition(&self, checkpoint: &mut Checkpoint, to: Phase) -> Result<(), OrchestratorError> {
        let guard = checkpoint.guard_input();
        checkpoint.phase = advance(checkpoint.phase, to, guard)?;
        Ok(())
    }

    async fn run_build_step(
        &mut self,
        workstreams: &[WorkstreamSpec],
        checkpoint: &mut Checkpoint,
        feature_str: &str,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        let env = self.phase_env_for(feature_str);
        run_build(
            workstreams,
            checkpoint,
            &env,
            self.constraints.as_mut(),
            self.build_timeout,
            cancel,
            Utc::now,
        )
        .await?;
        if checkpoint.all_workstreams_done() {
            self.transition(checkpoint, Phase::Review)?;
        }
        Ok(())
    }

    async fn run_review_step(
        &self,
        workstreams: &[WorkstreamSpec],
        checkpoint: &mut Checkpoint,
        feature_str: &str,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        let env = self.phase_env_for(feature_str);
        run_review(workstreams, checkpoint, &env, self.review_timeout, cancel, Utc::now).await?;
        if checkpoint.review_approved() {
            self.transition(checkpoint, Phase::Pr)?;
        }
        Ok(())
    }

    async fn run_publish_step(
        &self,
        checkpoint: &mut Checkpoint,
        feature_str: &str,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        let commands = self.publish.as_deref().ok_or(OrchestratorError::MissingPublishCommands)?;
        let push = commands.push(&checkpoint.branch);
        let pr_create = commands.pr_create(&checkpoint.branch, feature_str);
        let env = self.phase_env_for(feature_str);
        let cfg = PublishConfig { push: &push, pr_create: &pr_create };
        run_publish(checkpoint, &env, &cfg, self.publish_timeout, cancel, Utc::now).await?;
        self.transition(checkpoint, Phase::Ci)?;
        Ok(())
    }

    async fn run_ci_step(
        &self,
        checkpoint: &mut Checkpoint,
        feature_str: &str,
        pr_number: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        let pr_number = pr_number.ok_or(OrchestratorError::MissingPrNumber)?;
        let commands = self.ci.as_deref().ok_or(OrchestratorError::MissingCiCommands)?;
        let checkpoint_dir = sdp_checkpoint::checkpoint_path(self.project_root, &checkpoint.feature_id);
        let checkpoint_dir = checkpoint_dir.parent().map(camino::Utf8Path::to_path_buf).unwrap_or_else(|| self.project_root.to_path_buf());
        let ci_loop = commands.ci_loop(pr_number, feature_str, &checkpoint_dir, &self.runs_dir);
        let env = self.phase_env_for(feature_str);
        let cfg = CiConfig { ci_loop: &ci_loop };
        run_ci(checkpoint, &env, &cfg, self.ci_timeout, cancel, Utc::now).await?;
        self.transition(checkpoint, Phase::Done)?;
        Ok(())
    }

    fn write_attestation(&self, checkpoint: &Checkpoint, workstreams: &[WorkstreamSpec]) -> Result<(), OrchestratorError> {
        let allowed_prefixes = union_scope_files(workstreams);
        let changed_files = checkpoint
            .workstreams
            .iter()
            .flat_map(|w| workstreams.iter().find(|s| s.ws_id == w.id).map(|s| s.scope_files.clone()).unwrap_or_default())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let run_id = format!("oneshot-{}-{}", checkpoint.feature_id, runlog::compact_timestamp(Utc::now()));
        let input = AttestationInput {
            checkpoint,
            changed_files: &changed_files,
            allowed_prefixes: &allowed_prefixes,
            rationale: "automated feature pipeline",
            tracker_mapping: &self.tracker_mapping,
            orchestrator: self.orchestrator_name,
            run_id: &run_id,
            verification_status: if checkpoint.review_approved() { "passed" } else { "pending" },
            now: Utc::now(),
        };
        let statement = build_attestation(&input);
        write_attestation(self.project_root, &checkpoint.feature_id, &statement)?;
        Ok(())
    }
}

fn union_scope_files(workstreams: &[WorkstreamSpec]) -> Vec<String> {
    let mut set = std::collections::BTreeSet::new();
    for ws in workstreams {
        set.extend(ws.scope_files.iter().cloned());
    }
    set.into_iter().collect()
}
