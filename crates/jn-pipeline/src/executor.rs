//! Spawns a `PipelineSpec` as a chain of OS processes connected by pipes
//! (§4.G, §5). Grounded on the `Command`/`Stdio::piped` wiring idiom used
//! by plugin-manager style subprocess hosts: each stage's stdout becomes
//! the next stage's stdin directly, with no buffering or thread in
//! between, so back-pressure is whatever the kernel pipe already gives us.

use std::process::{Child, Command, ExitStatus, Stdio};

use crate::error::ExecError;
use crate::spec::PipelineSpec;

#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

pub struct RunningPipeline {
    children: Vec<(String, Child)>,
}

impl RunningPipeline {
    /// Spawn every stage in `spec`, wiring stage `i`'s stdout directly into
    /// stage `i+1`'s stdin. `stdin` feeds the first stage (or is ignored if
    /// `spec` is empty); `stdout` receives the last stage's output (or is
    /// ignored if `spec` is empty, in which case the caller is expected to
    /// copy `stdin` to `stdout` itself).
    pub fn spawn(spec: &PipelineSpec, stdin: Stdio, stdout: Stdio) -> Result<RunningPipeline, ExecError> {
        let mut children = Vec::with_capacity(spec.stages.len());
        let mut next_stdin = Some(stdin);
        let mut final_stdout = Some(stdout);
        let last_index = spec.stages.len().saturating_sub(1);

        for (i, stage) in spec.stages.iter().enumerate() {
            let stage_stdin = next_stdin.take().unwrap_or(Stdio::null());
            let stage_stdout = if i == last_index {
                final_stdout.take().unwrap_or(Stdio::null())
            } else {
                Stdio::piped()
            };

            let command_name = stage.command.display().to_string();
            let mut child = Command::new(&stage.command)
                .args(&stage.args)
                .stdin(stage_stdin)
                .stdout(stage_stdout)
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|source| ExecError::Spawn {
                    command: command_name.clone(),
                    source,
                })?;

            if i < last_index {
                let piped_stdout = child.stdout.take().ok_or_else(|| {
                    ExecError::Wiring(std::io::Error::other("child stdout was not piped"))
                })?;
                next_stdin = Some(Stdio::from(piped_stdout));
            }

            children.push((command_name, child));
        }

        Ok(RunningPipeline { children })
    }

    /// Take the last stage's stdout, when it was spawned with
    /// `Stdio::piped()`. Used by callers that need to read the pipeline's
    /// output themselves rather than handing it a pre-opened file/stdout.
    pub fn take_final_stdout(&mut self) -> Option<std::process::ChildStdout> {
        self.children.last_mut().and_then(|(_, child)| child.stdout.take())
    }

    /// Take the first stage's stdin, when it was spawned with
    /// `Stdio::piped()`. Used by callers that need to feed the pipeline
    /// themselves rather than handing it a pre-opened file/stdin.
    pub fn take_first_stdin(&mut self) -> Option<std::process::ChildStdin> {
        self.children.first_mut().and_then(|(_, child)| child.stdin.take())
    }

    /// Wait for every stage and fold their exit statuses into a single
    /// process exit code, per §4.G: the rightmost stage's status wins
    /// unless an earlier stage failed for a reason other than SIGPIPE, in
    /// which case that earlier (leftmost) failure wins instead.
    pub fn wait(mut self) -> Result<i32, ExecError> {
        let mut statuses = Vec::with_capacity(self.children.len());
        for (name, child) in &mut self.children {
            let status = child.wait().map_err(|source| ExecError::Wait {
                command: name.clone(),
                source,
            })?;
            statuses.push((name.clone(), status));
        }

        let rightmost = statuses.last().map(|(_, s)| *s);

        for (name, status) in &statuses[..statuses.len().saturating_sub(1)] {
            if !status.success() && !is_sigpipe(*status) {
                tracing::warn!(stage = %name, status = %status, "upstream stage failed");
                return Ok(exit_code_of(*status));
            }
        }

        Ok(rightmost.map(exit_code_of).unwrap_or(0))
    }

    /// Deliver SIGTERM to every still-running stage, rightmost first, so a
    /// cancelled pipeline unwinds the same direction data flows instead of
    /// leaving an upstream process writing into a dead pipe.
    #[cfg(unix)]
    pub fn terminate(&mut self) {
        for (name, child) in self.children.iter_mut().rev() {
            let pid = child.id() as libc::pid_t;
            // SAFETY: `pid` is a live child of this process; sending SIGTERM
            // to it is the documented, safe use of `kill(2)`.
            if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
                tracing::debug!(stage = %name, "SIGTERM delivery failed, process likely already exited");
            }
        }
    }

    #[cfg(not(unix))]
    pub fn terminate(&mut self) {
        for (_, child) in self.children.iter_mut().rev() {
            let _ = child.kill();
        }
    }
}

#[cfg(unix)]
fn is_sigpipe(status: ExitStatus) -> bool {
    status.signal() == Some(libc::SIGPIPE)
}

#[cfg(not(unix))]
fn is_sigpipe(_status: ExitStatus) -> bool {
    false
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => 128 + status.signal().unwrap_or(0),
    }
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{IoShape, StageRole, StageSpec};
    use std::path::PathBuf;

    fn sh_stage(script: &str) -> StageSpec {
        StageSpec {
            command: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            role: StageRole::Format,
            io_shape: IoShape::BytesToBytes,
        }
    }

    #[test]
    fn single_stage_echoes_through() {
        let spec = PipelineSpec {
            stages: vec![sh_stage("cat")],
        };
        let pipeline = RunningPipeline::spawn(&spec, Stdio::null(), Stdio::null()).unwrap();
        let code = pipeline.wait().unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn two_stage_pipeline_chains_stdout_to_stdin() {
        let spec = PipelineSpec {
            stages: vec![sh_stage("echo hello"), sh_stage("cat")],
        };
        let pipeline = RunningPipeline::spawn(&spec, Stdio::null(), Stdio::null()).unwrap();
        let code = pipeline.wait().unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn leftmost_non_sigpipe_failure_wins_over_rightmost_success() {
        let spec = PipelineSpec {
            stages: vec![sh_stage("exit 7"), sh_stage("cat >/dev/null")],
        };
        let pipeline = RunningPipeline::spawn(&spec, Stdio::null(), Stdio::null()).unwrap();
        let code = pipeline.wait().unwrap();
        assert_eq!(code, 7);
    }

    #[test]
    fn rightmost_status_wins_when_upstream_succeeded() {
        let spec = PipelineSpec {
            stages: vec![sh_stage("echo hi"), sh_stage("exit 3")],
        };
        let pipeline = RunningPipeline::spawn(&spec, Stdio::null(), Stdio::null()).unwrap();
        let code = pipeline.wait().unwrap();
        assert_eq!(code, 3);
    }
}
