// Backend Contract
// One uniform abstraction over the two execution strategies; the selected
// implementation is a process-lifetime singleton with no mutable state.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::application::constants::{REBOOT_MARKER, SUCCESS_MARKER};
use crate::domain::{Extension, ProductKey, Subscription};
use crate::error::Result;
use crate::port::SpawnFailure;

/// First "Error: ..." line of a failed invocation's output
static ERROR_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)Error: (.*?)$").expect("error-line pattern"));

/// Inputs to a registration attempt
///
/// Empty and absent values are equivalent: neither produces a flag on the
/// built command line.
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub regcode: Option<String>,
    pub email: Option<String>,
    pub product: Option<ProductKey>,
    /// Registration server override, forwarded by the snapshot variant as
    /// `--url <url> --write-config`
    pub server_url: Option<String>,
}

/// Outcome of a registration attempt
///
/// Subprocess failure with an exit status is encoded here rather than
/// raised; success is decided by the output marker, not the exit code, since
/// the external tool may exit non-zero on success-with-warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub succeeded: bool,
    /// Captured output on success, extracted diagnostic on failure
    pub message: String,
    /// A reboot is advised before the change is fully effective
    pub reboot_required: bool,
}

impl RegistrationOutcome {
    /// Build from successful captured output
    pub fn from_output(output: String) -> Self {
        Self {
            succeeded: output.contains(SUCCESS_MARKER),
            reboot_required: output.contains(REBOOT_MARKER),
            message: output,
        }
    }

    /// Build from a subprocess failure carrying an exit status
    pub fn from_failure(failure: &SpawnFailure) -> Self {
        Self {
            succeeded: false,
            reboot_required: failure.output_text().contains(REBOOT_MARKER),
            message: failure_diagnostic(failure),
        }
    }
}

/// Whether a deregistration output advises a reboot
pub fn reboot_advised(output: &str) -> bool {
    output.contains(REBOOT_MARKER)
}

/// Human-readable diagnostic for a failed mutation
///
/// Prefers the first `Error: ...` line of the captured output over the raw
/// process failure message.
pub(crate) fn failure_diagnostic(failure: &SpawnFailure) -> String {
    ERROR_LINE
        .captures(failure.output_text())
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| failure.message.clone())
}

/// Turn a fixed command prefix into an owned argv
pub(crate) fn base_argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}

/// Append `flag value` only when the value is present and non-empty
pub(crate) fn push_option(argv: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        argv.push(flag.to_string());
        argv.push(value.to_string());
    }
}

/// Uniform contract over one subscription-management execution strategy
///
/// Implementations hold no mutable state; a query and a mutation may run
/// concurrently, but callers must serialize mutations against the same
/// product key themselves.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Registered subscriptions, "Not Registered" entries excluded
    ///
    /// # Errors
    /// - `BackendError::QueryExhausted` when the package database stays busy
    /// - `BackendError::Parse` on malformed output
    /// - `BackendError::Query` on any other subprocess failure
    async fn subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Extensions available for activation; empty is a valid success value
    async fn extensions(&self) -> Result<Vec<Extension>>;

    /// Register the system or activate a product
    ///
    /// Never fails on a non-zero subprocess exit: that is encoded in the
    /// outcome. Only a launch failure is raised.
    async fn register(&self, request: &RegisterRequest) -> Result<RegistrationOutcome>;

    /// Deregister a product, or the base product when `product` is None
    ///
    /// A base-product conflict is recovered by escalating once to a base
    /// deregistration; returns the raw captured output, success being
    /// implied by the absence of an error.
    async fn deregister(&self, product: Option<&ProductKey>) -> Result<String>;
}
