// Port Layer - Interfaces for external dependencies

pub mod host_probe;
pub mod process_runner;

// Re-exports
pub use host_probe::HostProbe;
pub use process_runner::{ProcessRunner, RunOptions, SpawnFailure};
