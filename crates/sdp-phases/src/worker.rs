//! §4.10 Subprocess Invocation Contract: the worker is always invoked with
//! the fixed verb `run` and a `--agent <role>` flag, prompt fed on stdin.

use sdp_runner::CommandSpec;

#[derive(Debug, Clone)]
pub struct WorkerInvocation {
    pub program: String,
    pub build_role: String,
    pub review_role: String,
}

impl WorkerInvocation {
    #[must_use]
    pub fn command_for(&self, role: &str) -> CommandSpec {
        CommandSpec::new(self.program.clone()).arg("run").arg("--agent").arg(role)
    }

    #[must_use]
    pub fn build_command(&self) -> CommandSpec {
        self.command_for(&self.build_role)
    }

    #[must_use]
    pub fn review_command(&self) -> CommandSpec {
        self.command_for(&self.review_role)
    }
}
