//! §4.9 Phase Runners: build, review, publish and ci, each honoring its own
//! timeout and the pre/post hooks configured for it.

mod build;
mod ci;
mod publish;
mod review;
mod worker;

pub use build::{run_build, BuildError};
pub use ci::{run_ci, CiConfig, CiError};
pub use publish::{run_publish, PublishConfig, PublishError};
pub use review::{run_review, ReviewError};
pub use worker::WorkerInvocation;

use sdp_hooks::HooksDocument;
use sdp_packet::DependencyResolver;
use std::time::Duration;

/// Everything a phase runner needs beyond the checkpoint and workstream
/// specs it is passed directly: worker command, hook documents, tracker
/// resolution, and per-phase timeouts. Borrowed for the duration of one
/// phase invocation.
pub struct PhaseEnv<'a> {
    pub project_root: &'a camino::Utf8Path,
    pub feature_id: String,
    pub worker: &'a WorkerInvocation,
    pub agents_doc_path: &'a camino::Utf8Path,
    pub skill_doc_path: Option<&'a camino::Utf8Path>,
    pub tracker: &'a dyn DependencyResolver,
    pub hooks: &'a HooksDocument,
    pub hook_timeout: Duration,
    pub orchestrator_name: &'a str,
}
