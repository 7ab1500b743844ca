// Application Layer - Backend engine built on the ports

pub mod backend;
pub mod constants;
pub mod parser;
pub mod query;
pub mod selector;
pub mod suseconnect;
pub mod transactional;

// Re-exports
pub use backend::{reboot_advised, Backend, RegisterRequest, RegistrationOutcome};
pub use query::QueryResource;
pub use selector::{build_backend, detect_backend_kind, select_backend, BackendKind};
pub use suseconnect::SuseConnectBackend;
pub use transactional::TransactionalUpdateBackend;
