// Host probe implementation
// Plain existence checks; mirrors `test -e <path>` semantics.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use connectctl_core::port::HostProbe;

/// HostProbe backed by the real filesystem
pub struct SystemHostProbe;

impl SystemHostProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemHostProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostProbe for SystemHostProbe {
    async fn executable_exists(&self, path: &Path) -> bool {
        let exists = tokio::fs::metadata(path).await.is_ok();
        debug!(path = %path.display(), exists, "probed for executable");
        exists
    }
}
