//! Assembles the `status` report from the configuration layer, the
//! checkpoint store and the finite-state machine, without mutating any of
//! them.

use camino::Utf8Path;
use sdp_checkpoint::{Checkpoint, ReviewState, WorkstreamState};
use sdp_config::{CliOverrides, Config, ConfigSource, EffectiveConfig};
use sdp_phase_api::{compute_next_action, NextAction, Phase};
use sdp_utils::identifiers::FeatureId;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error(transparent)]
    Config(#[from] sdp_config::ConfigError),
    #[error(transparent)]
    Checkpoint(#[from] sdp_checkpoint::CheckpointError),
}

/// One resolved configuration value paired with the source that won.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue {
    pub key: String,
    pub value: String,
    pub source: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkstreamSummary {
    pub id: String,
    pub status: &'static str,
    pub attempts: u32,
    pub commit: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub iteration: u32,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub feature_id: String,
    pub initialized: bool,
    pub effective_config: Vec<ConfigValue>,
    pub phase: &'static str,
    pub workstreams: Vec<WorkstreamSummary>,
    pub review: Option<ReviewSummary>,
    pub next_action: String,
}

/// Assemble a [`StatusReport`] for `feature_id`. A feature with no
/// checkpoint yet is reported as uninitialized, still carrying the
/// effective configuration the next `init` would use.
pub fn build(project_root: &Utf8Path, feature_id: &FeatureId, cli: &CliOverrides) -> Result<StatusReport, StatusError> {
    let (config, effective) = sdp_config::load(project_root, cli)?;
    let effective_config = render_effective_config(&config, &effective);

    let checkpoint = sdp_checkpoint::load(project_root, feature_id)?;

    let report = match checkpoint {
        None => StatusReport {
            feature_id: feature_id.to_string(),
            initialized: false,
            effective_config,
            phase: phase_label(Phase::Init),
            workstreams: Vec::new(),
            review: None,
            next_action: next_action_label(&NextAction::Init),
        },
        Some(checkpoint) => build_from_checkpoint(feature_id, effective_config, &checkpoint),
    };

    Ok(report)
}

fn build_from_checkpoint(feature_id: &FeatureId, effective_config: Vec<ConfigValue>, checkpoint: &Checkpoint) -> StatusReport {
    let first_pending = checkpoint.first_pending_workstream().map(std::string::ToString::to_string);
    let action = compute_next_action(checkpoint.phase, first_pending.as_deref(), checkpoint.pr_number);

    let workstreams = checkpoint
        .workstreams
        .iter()
        .map(|w| WorkstreamSummary {
            id: w.id.to_string(),
            status: workstream_state_label(w.status),
            attempts: w.attempts,
            commit: w.commit.clone(),
        })
        .collect();

    let review = checkpoint.review.as_ref().map(|r| ReviewSummary {
        iteration: r.iteration,
        status: review_state_label(r.status),
    });

    StatusReport {
        feature_id: feature_id.to_string(),
        initialized: true,
        effective_config,
        phase: phase_label(checkpoint.phase),
        workstreams,
        review,
        next_action: next_action_label(&action),
    }
}

const CONFIG_KEYS: &[&str] = &[
    "timeouts.build_secs",
    "timeouts.review_secs",
    "timeouts.publish_secs",
    "timeouts.ci_secs",
    "timeouts.hook_secs",
    "retry.max_retries",
    "retry.delay_secs",
    "hooks_path",
    "constraints_path",
];

/// `EffectiveConfig` records only the winning source per key, not the
/// resolved value; pair each known key's concrete value back in from
/// `config` to produce the full `{key, value, source}` report.
fn render_effective_config(config: &Config, effective: &EffectiveConfig) -> Vec<ConfigValue> {
    CONFIG_KEYS
        .iter()
        .map(|&key| {
            let value = match key {
                "timeouts.build_secs" => config.timeouts.build_secs.to_string(),
                "timeouts.review_secs" => config.timeouts.review_secs.to_string(),
                "timeouts.publish_secs" => config.timeouts.publish_secs.to_string(),
                "timeouts.ci_secs" => config.timeouts.ci_secs.to_string(),
                "timeouts.hook_secs" => config.timeouts.hook_secs.to_string(),
                "retry.max_retries" => config.retry.max_retries.to_string(),
                "retry.delay_secs" => config.retry.delay_secs.to_string(),
                "hooks_path" => config.hooks_path.to_string(),
                "constraints_path" => config.constraints_path.to_string(),
                _ => unreachable!("CONFIG_KEYS is the exhaustive source of keys matched here"),
            };
            ConfigValue {
                key: (*key).to_string(),
                value,
                source: effective.source(key).map(source_label).unwrap_or("default"),
            }
        })
        .collect()
}

fn source_label(source: ConfigSource) -> &'static str {
    match source {
        ConfigSource::Cli => "cli",
        ConfigSource::ConfigFile => "config_file",
        ConfigSource::Default => "default",
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Init => "init",
        Phase::Build => "build",
        Phase::Review => "review",
        Phase::Pr => "pr",
        Phase::Ci => "ci",
        Phase::Done => "done",
    }
}

fn workstream_state_label(state: WorkstreamState) -> &'static str {
    match state {
        WorkstreamState::Pending => "pending",
        WorkstreamState::InProgress => "in_progress",
        WorkstreamState::Done => "done",
    }
}

fn review_state_label(state: ReviewState) -> &'static str {
    match state {
        ReviewState::Pending => "pending",
        ReviewState::Approved => "approved",
    }
}

fn next_action_label(action: &NextAction) -> String {
    match action {
        NextAction::Init => "init".to_string(),
        NextAction::Build(ws) => format!("build {ws}"),
        NextAction::Review => "review".to_string(),
        NextAction::Pr => "pr".to_string(),
        NextAction::CiLoop(Some(pr)) => format!("ci (pr #{pr})"),
        NextAction::CiLoop(None) => "ci".to_string(),
        NextAction::Done => "done".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_utils::test_support::TestProject;

    fn feature() -> FeatureId {
        FeatureId::parse("F016").unwrap()
    }

    #[test]
    fn uninitialized_feature_reports_defaults_and_init_action() {
        let project = TestProject::new();
        let report = build(&project.root, &feature(), &CliOverrides::default()).unwrap();
        assert!(!report.initialized);
        assert_eq!(report.phase, "init");
        assert_eq!(report.next_action, "init");
        assert!(report.workstreams.is_empty());
        assert_eq!(
            report.effective_config.iter().find(|c| c.key == "timeouts.build_secs").unwrap().source,
            "default"
        );
    }

    #[test]
    fn cli_override_is_reflected_in_the_report() {
        let project = TestProject::new();
        let cli = CliOverrides {
            build_timeout_secs: Some(42),
            ..Default::default()
        };
        let report = build(&project.root, &feature(), &cli).unwrap();
        let entry = report.effective_config.iter().find(|c| c.key == "timeouts.build_secs").unwrap();
        assert_eq!(entry.value, "42");
        assert_eq!(entry.source, "cli");
    }

    #[test]
    fn initialized_feature_reports_checkpoint_summary() {
        let project = TestProject::new();
        let now = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&chrono::Utc);
        let mut checkpoint = Checkpoint::init(feature(), "feature/f016".to_string(), now);
        checkpoint.phase = Phase::Build;
        checkpoint
            .workstreams
            .push(sdp_checkpoint::WorkstreamStatus::pending(sdp_utils::identifiers::WorkstreamId::parse("00-016-01").unwrap()));
        sdp_checkpoint::save(&project.root, &checkpoint).unwrap();

        let report = build(&project.root, &feature(), &CliOverrides::default()).unwrap();
        assert!(report.initialized);
        assert_eq!(report.phase, "build");
        assert_eq!(report.workstreams.len(), 1);
        assert_eq!(report.workstreams[0].status, "pending");
        assert_eq!(report.next_action, "build 00-016-01");
    }
}
