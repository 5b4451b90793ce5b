//! §3 *Checkpoint* and §4.7 *Checkpoint Store*: atomic per-feature state
//! persistence and the append-only run log.

pub mod model;
pub mod runlog;
pub mod store;

pub use model::{Checkpoint, ReviewState, ReviewStatus, WorkstreamState, WorkstreamStatus, SCHEMA_VERSION};
pub use runlog::{RunEvent, RunLog, RunLogError};
pub use store::{checkpoint_path, load, save, CheckpointError};
