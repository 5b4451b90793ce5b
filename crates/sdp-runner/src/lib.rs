//! §4.10 Subprocess Invocation Contract and its siblings: every external
//! collaborator this core talks to (the worker agent, the CI-loop delegate,
//! the issue-tracker CLI, the VCS CLI, hook commands) is invoked the same
//! way — argv-style (never a shell string, so no shell injection surface),
//! optional bytes on stdin, combined stdout/stderr captured into a bounded
//! buffer, wrapped in a cancellable timeout.

use sdp_utils::ring_buffer::RingBuffer;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// Maximum bytes of combined stdout/stderr retained per invocation.
const MAX_CAPTURED_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },
    #[error("cancelled while running {program}")]
    Cancelled { program: String },
    #[error("{program} exited with status {status}: {output}")]
    NonZeroExit {
        program: String,
        status: i32,
        output: String,
    },
}

/// The outcome of a completed (non-erroring) invocation.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: i32,
    pub combined_output: String,
    pub truncated: bool,
}

impl RunOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Run `spec`, feeding `stdin` (if any) and returning once the process exits,
/// the `timeout` elapses, or `cancel` resolves — whichever comes first.
/// Never surfaces a non-zero exit as an error itself; callers decide whether
/// that is fatal (review/build do, most other phases propagate it).
pub async fn run(
    spec: &CommandSpec,
    stdin: Option<&[u8]>,
    timeout: Duration,
    cancel: impl std::future::Future<Output = ()>,
) -> Result<RunOutcome, RunnerError> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
        program: spec.program.clone(),
        source,
    })?;

    if let Some(bytes) = stdin {
        if let Some(mut child_stdin) = child.stdin.take() {
            let _ = child_stdin.write_all(bytes).await;
        }
    }

    let mut stdout = child.stdout.take().expect("piped stdout");
    let mut stderr = child.stderr.take().expect("piped stderr");

    let run_fut = async {
        let mut buf = RingBuffer::new(MAX_CAPTURED_BYTES);
        let mut out_chunk = [0u8; 8192];
        let mut err_chunk = [0u8; 8192];
        loop {
            tokio::select! {
                n = stdout.read(&mut out_chunk) => {
                    match n {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend(&out_chunk[..n]),
                    }
                }
                n = stderr.read(&mut err_chunk) => {
                    match n {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend(&err_chunk[..n]),
                    }
                }
            }
        }
        let status = child.wait().await;
        (status, buf)
    };

    tokio::select! {
        biased;
        () = cancel => Err(RunnerError::Cancelled { program: spec.program.clone() }),
        result = tokio::time::timeout(timeout, run_fut) => {
            match result {
                Ok((status, buf)) => {
                    let status = status.map_err(|source| RunnerError::Spawn {
                        program: spec.program.clone(),
                        source,
                    })?;
                    Ok(RunOutcome {
                        status: status.code().unwrap_or(-1),
                        combined_output: sdp_redaction::redact(&buf.to_string_lossy()),
                        truncated: buf.truncated(),
                    })
                }
                Err(_) => Err(RunnerError::Timeout {
                    program: spec.program.clone(),
                    timeout_secs: timeout.as_secs(),
                }),
            }
        }
    }
}

/// Convenience: run and turn a non-zero exit into [`RunnerError::NonZeroExit`].
pub async fn run_checked(
    spec: &CommandSpec,
    stdin: Option<&[u8]>,
    timeout: Duration,
    cancel: impl std::future::Future<Output = ()>,
) -> Result<RunOutcome, RunnerError> {
    let outcome = run(spec, stdin, timeout, cancel).await?;
    if outcome.success() {
        Ok(outcome)
    } else {
        Err(RunnerError::NonZeroExit {
            program: spec.program.clone(),
            status: outcome.status,
            output: outcome.combined_output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn never() -> impl std::future::Future<Output = ()> {
        std::future::pending()
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let spec = CommandSpec::new("sh").arg("-c").arg("echo hello; exit 0");
        let out = run(&spec, None, Duration::from_secs(5), never()).await.unwrap();
        assert_eq!(out.status, 0);
        assert!(out.combined_output.contains("hello"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_not_an_error_from_run() {
        let spec = CommandSpec::new("sh").arg("-c").arg("exit 3");
        let out = run(&spec, None, Duration::from_secs(5), never()).await.unwrap();
        assert_eq!(out.status, 3);
        assert!(!out.success());
    }

    #[tokio::test]
    async fn run_checked_surfaces_non_zero_exit() {
        let spec = CommandSpec::new("sh").arg("-c").arg("exit 3");
        let err = run_checked(&spec, None, Duration::from_secs(5), never())
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::NonZeroExit { status: 3, .. }));
    }

    #[tokio::test]
    async fn feeds_stdin_to_child() {
        let spec = CommandSpec::new("cat");
        let out = run(&spec, Some(b"from stdin"), Duration::from_secs(5), never())
            .await
            .unwrap();
        assert!(out.combined_output.contains("from stdin"));
    }

    #[tokio::test]
    async fn passes_declared_env_vars_to_child() {
        let spec = CommandSpec::new("sh").arg("-c").arg("echo $SDP_PHASE").env("SDP_PHASE", "build");
        let out = run(&spec, None, Duration::from_secs(5), never()).await.unwrap();
        assert!(out.combined_output.contains("build"));
    }

    #[tokio::test]
    async fn times_out_long_running_process() {
        let spec = CommandSpec::new("sleep").arg("5");
        let err = run(&spec, None, Duration::from_millis(50), never())
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Timeout { .. }));
    }
}
