// Host Probe Port
// Filesystem presence checks used once at startup to pick the backend.

use async_trait::async_trait;
use std::path::Path;

/// Host probe port for backend availability checks
#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Whether an executable exists at the given path
    async fn executable_exists(&self, path: &Path) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::path::PathBuf;

    /// Mock HostProbe backed by a fixed set of present paths
    pub struct StaticHostProbe {
        present: Vec<PathBuf>,
    }

    impl StaticHostProbe {
        pub fn new<I, P>(present: I) -> Self
        where
            I: IntoIterator<Item = P>,
            P: Into<PathBuf>,
        {
            Self {
                present: present.into_iter().map(Into::into).collect(),
            }
        }

        pub fn empty() -> Self {
            Self { present: vec![] }
        }
    }

    #[async_trait]
    impl HostProbe for StaticHostProbe {
        async fn executable_exists(&self, path: &Path) -> bool {
            self.present.iter().any(|p| p == path)
        }
    }
}
