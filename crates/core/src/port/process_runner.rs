// Process Runner Port
// Abstraction over launching the external subscription tooling; the backends
// never spawn processes themselves.

use async_trait::async_trait;
use thiserror::Error;

/// Options for one subprocess invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Run with elevated privileges
    pub elevate: bool,
    /// Merge stderr into the captured output stream
    pub merge_stderr: bool,
}

impl RunOptions {
    pub fn elevated() -> Self {
        Self {
            elevate: true,
            merge_stderr: false,
        }
    }

    pub fn elevated_merged() -> Self {
        Self {
            elevate: true,
            merge_stderr: true,
        }
    }
}

/// Structured failure of one subprocess invocation
///
/// The only error type crossing the process boundary; every higher-level
/// error is derived from it. `exit_status` is None when the process could
/// not be launched at all or died to a signal.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct SpawnFailure {
    pub message: String,
    pub exit_status: Option<i32>,
    pub exit_signal: Option<i32>,
    /// Partially captured output, when any was produced before failure
    pub output: Option<String>,
}

impl SpawnFailure {
    /// Failure before the process produced an exit status (launch error)
    pub fn launch(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_status: None,
            exit_signal: None,
            output: None,
        }
    }

    /// Failure carrying a non-zero exit status and its captured output
    pub fn exited(status: i32, message: impl Into<String>, output: Option<String>) -> Self {
        Self {
            message: message.into(),
            exit_status: Some(status),
            exit_signal: None,
            output,
        }
    }

    /// Captured output, or empty when none was produced
    pub fn output_text(&self) -> &str {
        self.output.as_deref().unwrap_or("")
    }
}

/// Process execution port
///
/// Implementations:
/// - SystemProcessRunner (infra-system): tokio subprocess with elevation
/// - ScriptedRunner (mocks): canned responses for tests
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a command to completion and return its captured stdout
    ///
    /// # Errors
    /// - `SpawnFailure` with `exit_status: None` if the process cannot be
    ///   launched
    /// - `SpawnFailure` with the exit status and captured output on non-zero
    ///   exit
    async fn run(&self, argv: &[String], options: RunOptions) -> Result<String, SpawnFailure>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock ProcessRunner replaying a scripted sequence of outcomes
    ///
    /// Records every argv it was invoked with so tests can assert on exact
    /// command lines and invocation counts.
    pub struct ScriptedRunner {
        script: Mutex<VecDeque<Result<String, SpawnFailure>>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn push_ok(&self, output: impl Into<String>) {
            self.script.lock().unwrap().push_back(Ok(output.into()));
        }

        pub fn push_err(&self, failure: SpawnFailure) {
            self.script.lock().unwrap().push_back(Err(failure));
        }

        /// Queue `count` consecutive failures with the given exit status
        pub fn push_exit_failures(&self, status: i32, count: usize) {
            for _ in 0..count {
                self.push_err(SpawnFailure::exited(status, format!("exit {status}"), None));
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn recorded_calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Default for ScriptedRunner {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(&self, argv: &[String], _options: RunOptions) -> Result<String, SpawnFailure> {
            self.calls.lock().unwrap().push(argv.to_vec());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedRunner: script exhausted")
        }
    }
}
