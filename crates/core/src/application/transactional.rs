// Snapshot-Tool Backend
// Mutations run inside the transactional snapshot tool so they land in the
// next snapshot; reads still go through the plain subscription manager.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::backend::{
    base_argv, push_option, Backend, RegisterRequest, RegistrationOutcome,
};
use crate::application::constants::{
    BASE_PRODUCT_CONFLICT_EXIT, TRANSACTIONAL_UPDATE_BIN, WRAPPED_CONFLICT_MARKER,
};
use crate::application::query;
use crate::domain::{Extension, ProductKey, Subscription};
use crate::error::Result;
use crate::port::{ProcessRunner, RunOptions, SpawnFailure};

/// Backend wrapping the subscription manager in the snapshot tool
pub struct TransactionalUpdateBackend {
    runner: Arc<dyn ProcessRunner>,
}

impl TransactionalUpdateBackend {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

/// The snapshot tool reports the wrapped manager's base-product conflict
/// either as its own exit status or as literal text in the merged output.
fn is_base_conflict(failure: &SpawnFailure) -> bool {
    failure.exit_status == Some(BASE_PRODUCT_CONFLICT_EXIT)
        || failure.output_text().contains(WRAPPED_CONFLICT_MARKER)
}

#[async_trait]
impl Backend for TransactionalUpdateBackend {
    async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        query::fetch_subscriptions(self.runner.as_ref()).await
    }

    async fn extensions(&self) -> Result<Vec<Extension>> {
        query::fetch_extensions(self.runner.as_ref()).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegistrationOutcome> {
        let mut argv = base_argv(&[
            TRANSACTIONAL_UPDATE_BIN,
            "--no-selfupdate",
            "-n",
            "-d",
            "register",
        ]);
        push_option(&mut argv, "-r", request.regcode.as_deref());
        push_option(&mut argv, "-e", request.email.as_deref());
        let product = request.product.as_ref().map(ProductKey::to_string);
        push_option(&mut argv, "-p", product.as_deref());
        if let Some(url) = request.server_url.as_deref().filter(|u| !u.is_empty()) {
            argv.push("--url".to_string());
            argv.push(url.to_string());
            argv.push("--write-config".to_string());
        }

        info!(command = argv.join(" "), "attempting to register system");
        match self.runner.run(&argv, RunOptions::elevated()).await {
            Ok(output) => {
                debug!(output = %output, "registration result");
                Ok(RegistrationOutcome::from_output(output))
            }
            Err(failure) if failure.exit_status.is_some() => {
                warn!(exit_status = ?failure.exit_status, "registration command failed");
                Ok(RegistrationOutcome::from_failure(&failure))
            }
            Err(failure) => Err(failure.into()),
        }
    }

    async fn deregister(&self, product: Option<&ProductKey>) -> Result<String> {
        let mut argv = base_argv(&[
            TRANSACTIONAL_UPDATE_BIN,
            "--no-selfupdate",
            "-d",
            "register",
            "-d",
        ]);
        let key = product.map(ProductKey::to_string);
        push_option(&mut argv, "-p", key.as_deref());

        info!(command = argv.join(" "), "deregistering");
        // stderr is merged so the wrapped manager's conflict text is visible
        match self.runner.run(&argv, RunOptions::elevated_merged()).await {
            Ok(output) => Ok(output),
            Err(failure) if product.is_some() && is_base_conflict(&failure) => {
                warn!("base product conflict, escalating to base deregistration");
                let argv = base_argv(&[
                    TRANSACTIONAL_UPDATE_BIN,
                    "--no-selfupdate",
                    "-d",
                    "register",
                    "-d",
                ]);
                Ok(self.runner.run(&argv, RunOptions::elevated()).await?)
            }
            Err(failure) => Err(failure.into()),
        }
    }
}
