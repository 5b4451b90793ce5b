//! §6 `status` verb: effective configuration, checkpoint summary and the
//! next action the supervisor would take next, assembled read-only.

mod report;

pub use report::{build, ConfigValue, ReviewSummary, StatusError, StatusReport, WorkstreamSummary};
