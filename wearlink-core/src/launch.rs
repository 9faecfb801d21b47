//! Companion launch: open a deep link on the companion, fall back to the store page.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::host::{LaunchError, RemoteLauncher};

/// Outcome of a launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched,
    FellBackToStore,
    Failed(String),
}

pub struct LaunchOrchestrator {
    launcher: Arc<dyn RemoteLauncher>,
    store_uri: String,
}

impl LaunchOrchestrator {
    pub fn new(launcher: Arc<dyn RemoteLauncher>, store_uri: String) -> Self {
        Self {
            launcher,
            store_uri,
        }
    }

    /// Store page for this application's own package.
    pub fn store_uri(&self) -> &str {
        &self.store_uri
    }

    /// Try `uri`; only after it fails, try the store page once.
    pub async fn launch(&self, uri: &str) -> LaunchOutcome {
        info!(uri, "launching companion app");
        let first: Result<(), LaunchError> = self.launcher.start_remote(uri).await;
        let Err(e) = first else {
            info!(uri, "companion app launched");
            return LaunchOutcome::Launched;
        };
        warn!(uri, error = %e, "companion launch failed, redirecting to store");
        match self.launcher.start_remote(&self.store_uri).await {
            Ok(()) => {
                info!(store = %self.store_uri, "redirected to store");
                LaunchOutcome::FellBackToStore
            }
            Err(e) => {
                error!(store = %self.store_uri, error = %e, "store redirect failed");
                LaunchOutcome::Failed(e.0)
            }
        }
    }
}

/// `prefix` followed by the package, e.g. `https://play.google.com/store/apps/details?id=pkg`.
pub fn store_uri_for(prefix: &str, package: &str) -> String {
    format!("{prefix}{package}")
}
