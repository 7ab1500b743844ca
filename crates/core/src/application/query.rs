// Retrying Query Executor
// Shared read-path algorithm: bounded busy-retry around one query command,
// one parse per successful invocation, filtering at the boundary.

use tracing::{debug, warn};

use crate::application::constants::{
    MAX_QUERY_ATTEMPTS, NOT_REGISTERED_EXIT, SUSECONNECT_BIN, ZYPP_BUSY_EXIT,
};
use crate::application::backend::base_argv;
use crate::application::parser;
use crate::domain::{Extension, Subscription};
use crate::error::BackendError;
use crate::port::{ProcessRunner, RunOptions};

/// Which read query is being executed; names the resource in errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryResource {
    Subscriptions,
    Extensions,
}

impl std::fmt::Display for QueryResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryResource::Subscriptions => write!(f, "subscriptions"),
            QueryResource::Extensions => write!(f, "extensions"),
        }
    }
}

/// Query registered subscriptions, dropping "Not Registered" entries
///
/// Both backend variants query through the plain subscription manager; even
/// on snapshot-managed hosts the status read needs no snapshot setup and
/// skipping it saves most of the load time.
pub async fn fetch_subscriptions(
    runner: &dyn ProcessRunner,
) -> Result<Vec<Subscription>, BackendError> {
    let argv = base_argv(&[SUSECONNECT_BIN, "-s"]);
    let mut subscriptions = query_with_retry(
        runner,
        &argv,
        QueryResource::Subscriptions,
        parser::parse_subscriptions,
    )
    .await?;
    subscriptions.retain(|product| product.status != "Not Registered");
    Ok(subscriptions)
}

/// Query extensions available for activation
///
/// Only extensions that are free, available and not yet activated are
/// exposed; an unregistered system yields an empty listing rather than an
/// error.
pub async fn fetch_extensions(runner: &dyn ProcessRunner) -> Result<Vec<Extension>, BackendError> {
    let argv = base_argv(&[SUSECONNECT_BIN, "--json", "-l"]);
    let extensions = query_with_retry(
        runner,
        &argv,
        QueryResource::Extensions,
        parser::parse_extensions,
    )
    .await?;
    Ok(extensions
        .into_iter()
        .filter(Extension::is_activatable)
        .collect())
}

/// Bounded retry loop shared by both queries
///
/// At most MAX_QUERY_ATTEMPTS subprocess invocations; a busy package
/// database (exit 7) loops without delay, anything else terminates
/// immediately. Retries are sequential: one invocation is outstanding at a
/// time.
async fn query_with_retry<T, P>(
    runner: &dyn ProcessRunner,
    argv: &[String],
    resource: QueryResource,
    parse: P,
) -> Result<Vec<T>, BackendError>
where
    P: Fn(&str) -> Result<Vec<T>, serde_json::Error>,
{
    for attempt in 1..=MAX_QUERY_ATTEMPTS {
        match runner.run(argv, RunOptions::elevated()).await {
            Ok(output) => {
                return parse(&output).map_err(|source| BackendError::Parse { resource, source });
            }
            Err(failure) if failure.exit_status == Some(ZYPP_BUSY_EXIT) => {
                debug!(%resource, attempt, "package database busy, retrying query");
            }
            Err(failure)
                if resource == QueryResource::Extensions
                    && failure.exit_status == Some(NOT_REGISTERED_EXIT) =>
            {
                debug!(%resource, "system not registered, returning empty listing");
                return Ok(Vec::new());
            }
            Err(failure) => {
                warn!(
                    %resource,
                    exit_status = ?failure.exit_status,
                    exit_signal = ?failure.exit_signal,
                    "query failed"
                );
                return Err(BackendError::Query {
                    resource,
                    source: failure,
                });
            }
        }
    }

    warn!(%resource, attempts = MAX_QUERY_ATTEMPTS, "query attempts exhausted");
    Err(BackendError::QueryExhausted {
        resource,
        attempts: MAX_QUERY_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::process_runner::mocks::ScriptedRunner;
    use crate::port::SpawnFailure;

    const STATUS_FIXTURE: &str = r#"[
        {"identifier":"SLES","version":"15.5","arch":"x86_64","status":"Registered"},
        {"identifier":"sle-module-basesystem","version":"15.5","arch":"x86_64","status":"Not Registered"},
        {"identifier":"sle-module-server-applications","version":"15.5","arch":"x86_64","status":"Registered"}
    ]"#;

    const EXTENSIONS_FIXTURE: &str = r#"{"extensions":[
        {"name":"A","identifier":"a","version":"15.5","arch":"x86_64",
         "activated":false,"available":true,"free":true,"extensions":[]},
        {"name":"B","identifier":"b","version":"15.5","arch":"x86_64",
         "activated":true,"available":true,"free":true,"extensions":[]},
        {"name":"C","identifier":"c","version":"15.5","arch":"x86_64",
         "activated":false,"available":false,"free":true,"extensions":[]}
    ]}"#;

    #[tokio::test]
    async fn drops_not_registered_entries_preserving_order() {
        let runner = ScriptedRunner::new();
        runner.push_ok(STATUS_FIXTURE);

        let subs = fetch_subscriptions(&runner).await.unwrap();

        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].identifier, "SLES");
        assert_eq!(subs[1].identifier, "sle-module-server-applications");
        assert_eq!(runner.recorded_calls()[0], vec!["suseconnect", "-s"]);
    }

    #[tokio::test]
    async fn only_activatable_extensions_survive_filtering() {
        let runner = ScriptedRunner::new();
        runner.push_ok(EXTENSIONS_FIXTURE);

        let extensions = fetch_extensions(&runner).await.unwrap();

        assert_eq!(extensions.len(), 1);
        assert_eq!(extensions[0].identifier, "a");
        assert!(extensions.iter().all(Extension::is_activatable));
        assert_eq!(runner.recorded_calls()[0], vec!["suseconnect", "--json", "-l"]);
    }

    #[tokio::test]
    async fn busy_failures_retry_until_success() {
        let runner = ScriptedRunner::new();
        runner.push_exit_failures(ZYPP_BUSY_EXIT, 5);
        runner.push_ok(STATUS_FIXTURE);

        let subs = fetch_subscriptions(&runner).await.unwrap();

        assert_eq!(subs.len(), 2);
        assert_eq!(runner.call_count(), 6);
    }

    #[tokio::test]
    async fn exhaustion_after_exactly_max_attempts() {
        let runner = ScriptedRunner::new();
        runner.push_exit_failures(ZYPP_BUSY_EXIT, MAX_QUERY_ATTEMPTS as usize);

        let err = fetch_subscriptions(&runner).await.unwrap_err();

        assert_eq!(runner.call_count(), MAX_QUERY_ATTEMPTS as usize);
        assert!(matches!(
            err,
            BackendError::QueryExhausted {
                resource: QueryResource::Subscriptions,
                attempts: MAX_QUERY_ATTEMPTS,
            }
        ));
    }

    #[tokio::test]
    async fn unregistered_system_lists_no_extensions() {
        let runner = ScriptedRunner::new();
        runner.push_exit_failures(NOT_REGISTERED_EXIT, 1);

        let extensions = fetch_extensions(&runner).await.unwrap();

        assert!(extensions.is_empty());
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn not_registered_is_fatal_for_subscriptions() {
        // The empty-listing recovery applies to the extensions query only
        let runner = ScriptedRunner::new();
        runner.push_exit_failures(NOT_REGISTERED_EXIT, 1);

        let err = fetch_subscriptions(&runner).await.unwrap_err();

        assert!(matches!(err, BackendError::Query { .. }));
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_exit_status_terminates_immediately() {
        let runner = ScriptedRunner::new();
        runner.push_err(SpawnFailure::exited(1, "boom", None));

        let err = fetch_subscriptions(&runner).await.unwrap_err();

        assert!(matches!(err, BackendError::Query { .. }));
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn malformed_output_is_fatal_not_retried() {
        let runner = ScriptedRunner::new();
        runner.push_ok("definitely not json");

        let err = fetch_subscriptions(&runner).await.unwrap_err();

        assert!(matches!(err, BackendError::Parse { .. }));
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn repeated_queries_against_fixed_fixture_are_idempotent() {
        let runner = ScriptedRunner::new();
        runner.push_ok(STATUS_FIXTURE);
        runner.push_ok(STATUS_FIXTURE);

        let first = fetch_subscriptions(&runner).await.unwrap();
        let second = fetch_subscriptions(&runner).await.unwrap();

        assert_eq!(first, second);
    }
}
