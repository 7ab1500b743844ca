// connectctl Infrastructure - Host Adapters
// Implements: ProcessRunner, HostProbe

pub mod host_probe;
pub mod process_runner;

pub use host_probe::SystemHostProbe;
pub use process_runner::SystemProcessRunner;
