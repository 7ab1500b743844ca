// Strategy Selector
// Probes the host once at startup and yields the single Backend used for
// the rest of the process lifetime. No re-probe exists; a restart is needed
// to re-evaluate availability.

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::application::backend::Backend;
use crate::application::constants::{SUSECONNECT_PATH, TRANSACTIONAL_UPDATE_PATH};
use crate::application::suseconnect::SuseConnectBackend;
use crate::application::transactional::TransactionalUpdateBackend;
use crate::port::{HostProbe, ProcessRunner};

/// Which execution strategy the host supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    TransactionalUpdate,
    SuseConnect,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::TransactionalUpdate => write!(f, "transactional-update"),
            BackendKind::SuseConnect => write!(f, "suseconnect"),
        }
    }
}

/// Probe the host for an available strategy
///
/// The snapshot tool wins when both are present. None means neither tool
/// exists and all operations are unavailable.
pub async fn detect_backend_kind(probe: &dyn HostProbe) -> Option<BackendKind> {
    if probe
        .executable_exists(Path::new(TRANSACTIONAL_UPDATE_PATH))
        .await
    {
        return Some(BackendKind::TransactionalUpdate);
    }
    if probe.executable_exists(Path::new(SUSECONNECT_PATH)).await {
        return Some(BackendKind::SuseConnect);
    }
    None
}

/// Construct the Backend for a detected strategy
pub fn build_backend(kind: BackendKind, runner: Arc<dyn ProcessRunner>) -> Arc<dyn Backend> {
    match kind {
        BackendKind::TransactionalUpdate => Arc::new(TransactionalUpdateBackend::new(runner)),
        BackendKind::SuseConnect => Arc::new(SuseConnectBackend::new(runner)),
    }
}

/// Probe once and build the process-lifetime Backend
pub async fn select_backend(
    probe: &dyn HostProbe,
    runner: Arc<dyn ProcessRunner>,
) -> Option<Arc<dyn Backend>> {
    let kind = detect_backend_kind(probe).await?;
    info!(backend = %kind, "selected subscription backend");
    Some(build_backend(kind, runner))
}
