// System process runner
// tokio for async process management; elevation is delegated to sudo when
// the process is not already root.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use connectctl_core::port::{ProcessRunner, RunOptions, SpawnFailure};

/// ProcessRunner spawning real subprocesses
///
/// Commands requesting elevation are prefixed with `sudo -n` unless the
/// current process already runs as root. No timeout is imposed; a hung
/// subprocess is the caller's problem by contract.
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn effective_argv(&self, argv: &[String], options: RunOptions) -> Vec<String> {
        if options.elevate && !running_as_root() {
            let mut elevated = vec!["sudo".to_string(), "-n".to_string()];
            elevated.extend_from_slice(argv);
            elevated
        } else {
            argv.to_vec()
        }
    }
}

impl Default for SystemProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, argv: &[String], options: RunOptions) -> Result<String, SpawnFailure> {
        let argv = self.effective_argv(argv, options);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SpawnFailure::launch("empty command line"))?;

        debug!(command = argv.join(" "), "starting subprocess");

        let child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SpawnFailure::launch(format!("failed to launch {program}: {e}")))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SpawnFailure::launch(format!("failed to collect {program}: {e}")))?;

        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        if options.merge_stderr {
            captured.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        info!(
            command = argv.join(" "),
            exit_code = ?output.status.code(),
            success = output.status.success(),
            "subprocess completed"
        );

        if output.status.success() {
            return Ok(captured);
        }

        let exit_signal = exit_signal(&output.status);
        let message = match (output.status.code(), exit_signal) {
            (Some(code), _) => format!("{program} exited with status {code}"),
            (None, Some(signal)) => format!("{program} killed by signal {signal}"),
            (None, None) => format!("{program} terminated abnormally"),
        };

        Err(SpawnFailure {
            message,
            exit_status: output.status.code(),
            exit_signal,
            output: Some(captured),
        })
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}
