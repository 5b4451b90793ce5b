//! CLI argument definitions and parsing structures.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// xchecker - orchestration core for spec-driven feature automation.
#[derive(Parser, Debug)]
#[command(name = "xchecker")]
#[command(about = "Drives a feature through init -> build -> review -> pr -> ci -> done")]
#[command(version)]
pub struct Cli {
    /// Project root; defaults to the current directory.
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,

    /// Worker program invoked as `<worker> run --agent <role>`.
    #[arg(long, global = true, default_value = "claude")]
    pub worker: String,

    /// Agent role passed to the worker for the build phase.
    #[arg(long, global = true, default_value = "builder")]
    pub build_role: String,

    /// Agent role passed to the worker for the review phase.
    #[arg(long, global = true, default_value = "reviewer")]
    pub review_role: String,

    /// Path to the agents document included in prompt provenance.
    #[arg(long, global = true, default_value = ".sdp/AGENTS.md")]
    pub agents_doc: PathBuf,

    /// Optional path to a skill document included in prompt provenance.
    #[arg(long, global = true)]
    pub skill_doc: Option<PathBuf>,

    /// Directory run-logs are written under.
    #[arg(long, global = true, default_value = ".sdp/runs")]
    pub runs_dir: PathBuf,

    /// Branch the feature branch is cut from.
    #[arg(long, global = true, default_value = "main")]
    pub branch_base: String,

    /// Name recorded as the orchestrator in run-logs and attestations.
    #[arg(long, global = true, default_value = "xchecker")]
    pub orchestrator_name: String,

    /// Path to the workstream-id -> tracker-id mapping file.
    #[arg(long, global = true, default_value = ".beads-sdp-mapping.jsonl")]
    pub tracker_mapping: PathBuf,

    /// Override the configured build-phase timeout, in seconds.
    #[arg(long, global = true)]
    pub build_timeout_secs: Option<u64>,

    /// Override the configured review-phase timeout, in seconds.
    #[arg(long, global = true)]
    pub review_timeout_secs: Option<u64>,

    /// Override the configured publish-phase timeout, in seconds.
    #[arg(long, global = true)]
    pub publish_timeout_secs: Option<u64>,

    /// Override the configured CI-phase timeout, in seconds.
    #[arg(long, global = true)]
    pub ci_timeout_secs: Option<u64>,

    /// Override the configured hook timeout, in seconds.
    #[arg(long, global = true)]
    pub hook_timeout_secs: Option<u64>,

    /// Override the configured maximum executor retries.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Override the configured executor retry delay, in seconds.
    #[arg(long, global = true)]
    pub retry_delay_secs: Option<u64>,

    /// Override the hooks document path.
    #[arg(long, global = true)]
    pub hooks_path: Option<PathBuf>,

    /// Override the constraints document path.
    #[arg(long, global = true)]
    pub constraints_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a fresh feature: writes its checkpoint in `init` phase.
    Init {
        /// Feature identifier, e.g. `F016`.
        feature_id: String,
        /// Branch name to record on the checkpoint.
        #[arg(long)]
        branch: Option<String>,
    },

    /// Advance a feature through exactly its next phase step.
    Advance {
        /// Feature identifier, e.g. `F016`.
        feature_id: String,
    },

    /// Run every workstream for a feature outside the phased FSM.
    Apply {
        /// Feature identifier, e.g. `F016`.
        feature_id: String,
        /// Emit one JSON line per progress event instead of a human-readable bar.
        #[arg(long)]
        json: bool,
    },

    /// Report effective configuration, checkpoint summary and next action.
    Status {
        /// Feature identifier, e.g. `F016`.
        feature_id: String,
        /// Emit the report as JSON instead of a human-readable summary.
        #[arg(long)]
        json: bool,
    },

    /// Shared-boundary detection across feature scopes.
    Boundary(BoundaryCommands),

    /// Contract generation and validation.
    Contract(ContractCommands),
}

#[derive(Subcommand, Debug)]
pub enum BoundaryCommands {
    /// Detect files declared in scope by two or more features and extract their types.
    Detect {
        /// `<feature_id>=<scope-files-relative-to-project-root,comma-separated>` pairs.
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
        /// Additional roots to resolve declared files against, beyond the project root.
        #[arg(long = "root")]
        candidate_roots: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContractCommands {
    /// Generate draft contract documents from detected shared boundaries.
    Generate {
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
        #[arg(long = "root")]
        candidate_roots: Vec<PathBuf>,
        /// Directory contract documents are written under.
        #[arg(long, default_value = ".contracts")]
        output_dir: PathBuf,
    },
    /// Validate implementations against previously generated contracts.
    Validate {
        #[arg(long, default_value = ".contracts")]
        contracts_dir: PathBuf,
        /// Directories searched for each contract's implementation file.
        #[arg(long = "impl-dir", required = true)]
        impl_dirs: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

/// Where `project_root` resolves to when the flag is absent.
pub fn resolve_project_root(explicit: Option<&PathBuf>) -> std::io::Result<Utf8PathBuf> {
    let root = match explicit {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    Ok(Utf8PathBuf::from_path_buf(root).unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned())))
}
