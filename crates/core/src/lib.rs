// connectctl Core - Domain Logic & Ports
// NO infrastructure dependencies (hexagonal layout): backends talk to the
// host only through the ProcessRunner and HostProbe ports.

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{BackendError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
