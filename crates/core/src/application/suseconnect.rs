// Direct Backend
// Drives the subscription manager binary itself; used on hosts without the
// snapshot tool.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::backend::{
    base_argv, push_option, Backend, RegisterRequest, RegistrationOutcome,
};
use crate::application::constants::{BASE_CONFLICT_MARKER, SUSECONNECT_BIN};
use crate::application::query;
use crate::domain::{Extension, ProductKey, Subscription};
use crate::error::Result;
use crate::port::{ProcessRunner, RunOptions};

/// Backend invoking the subscription manager directly
pub struct SuseConnectBackend {
    runner: Arc<dyn ProcessRunner>,
}

impl SuseConnectBackend {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Backend for SuseConnectBackend {
    async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        query::fetch_subscriptions(self.runner.as_ref()).await
    }

    async fn extensions(&self) -> Result<Vec<Extension>> {
        query::fetch_extensions(self.runner.as_ref()).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegistrationOutcome> {
        let mut argv = base_argv(&[SUSECONNECT_BIN]);
        push_option(&mut argv, "-r", request.regcode.as_deref());
        push_option(&mut argv, "-e", request.email.as_deref());
        let product = request.product.as_ref().map(ProductKey::to_string);
        push_option(&mut argv, "-p", product.as_deref());
        // The direct manager reads its server configuration from
        // /etc/SUSEConnect; request.server_url is a snapshot-variant concern.

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
        let mut argv = base_argv(&[SUSECONNECT_BIN, "-d"]);
        let key = product.map(ProductKey::to_string);
        push_option(&mut argv, "-p", key.as_deref());

        info!(command = argv.join(" "), "deregistering");
        match self.runner.run(&argv, RunOptions::elevated()).await {
            Ok(output) => Ok(output),
            Err(failure)
                if product.is_some() && failure.output_text().contains(BASE_CONFLICT_MARKER) =>
            {
                // The chosen product is the base product; escalate once to a
                // base deregistration, a second conflict is fatal.
                warn!("base product conflict, escalating to base deregistration");
                let argv = base_argv(&[SUSECONNECT_BIN, "-d"]);
                Ok(self.runner.run(&argv, RunOptions::elevated()).await?)
            }
            Err(failure) => Err(failure.into()),
        }
    }
}
