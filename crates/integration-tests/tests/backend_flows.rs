//! End-to-end backend flows over mock ports
//!
//! Wires the strategy selector and both backend variants the way the CLI
//! does, replacing only the host-facing ports with mocks.

use std::sync::Arc;

use connectctl_core::application::constants::{
    SUSECONNECT_PATH, TRANSACTIONAL_UPDATE_PATH, ZYPP_BUSY_EXIT,
};
use connectctl_core::application::{select_backend, Backend, RegisterRequest};
use connectctl_core::domain::ProductKey;
use connectctl_core::port::host_probe::mocks::StaticHostProbe;
use connectctl_core::port::process_runner::mocks::ScriptedRunner;
use connectctl_core::port::ProcessRunner;

const STATUS_FIXTURE: &str = r#"[
    {"identifier":"SLES","version":"15.5","arch":"x86_64","status":"Registered",
     "subscription_status":"Active","expires_at":"2026-07-31 00:00:00 UTC"},
    {"identifier":"sle-module-basesystem","version":"15.5","arch":"x86_64","status":"Not Registered"}
]"#;

const EXTENSIONS_FIXTURE: &str = r#"{"extensions":[
    {"name":"Containers Module","identifier":"sle-module-containers","version":"15.5",
     "arch":"x86_64","activated":false,"available":true,"free":true,"extensions":[]}
]}"#;

async fn select(
    present: &[&str],
    runner: Arc<ScriptedRunner>,
) -> Option<Arc<dyn Backend>> {
    let probe = StaticHostProbe::new(present.iter().copied());
    let runner: Arc<dyn ProcessRunner> = runner;
    select_backend(&probe, runner).await
}

#[tokio::test]
async fn unavailable_host_selects_no_backend() {
    let runner = Arc::new(ScriptedRunner::new());
    assert!(select(&[], runner.clone()).await.is_none());
    // Probing never launches a subprocess
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn selected_backend_serves_queries_through_busy_periods() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_exit_failures(ZYPP_BUSY_EXIT, 3);
    runner.push_ok(STATUS_FIXTURE);
    runner.push_ok(EXTENSIONS_FIXTURE);

    let backend = select(&[SUSECONNECT_PATH], runner.clone()).await.unwrap();

    let subscriptions = backend.subscriptions().await.unwrap();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].identifier, "SLES");

    let extensions = backend.extensions().await.unwrap();
    assert_eq!(extensions.len(), 1);
    assert_eq!(extensions[0].identifier, "sle-module-containers");

    // 3 busy retries + 1 status success + 1 extensions success
    assert_eq!(runner.call_count(), 5);
}

#[tokio::test]
async fn snapshot_host_register_goes_through_the_snapshot_tool() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_ok("Successfully registered system\nPlease reboot your machine\n");

    let backend = select(&[TRANSACTIONAL_UPDATE_PATH, SUSECONNECT_PATH], runner.clone())
        .await
        .unwrap();

    let outcome = backend
        .register(&RegisterRequest {
            regcode: Some("REGCODE-42".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(outcome.succeeded);
    assert!(outcome.reboot_required);
    assert_eq!(runner.recorded_calls()[0][0], "transactional-update");
}

#[tokio::test]
async fn direct_host_register_uses_the_manager_directly() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_ok("Successfully registered system\n");

    let backend = select(&[SUSECONNECT_PATH], runner.clone()).await.unwrap();

    let outcome = backend
        .register(&RegisterRequest {
            regcode: Some("REGCODE-42".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(outcome.succeeded);
    assert!(!outcome.reboot_required);
    assert_eq!(
        runner.recorded_calls()[0],
        vec!["suseconnect", "-r", "REGCODE-42"]
    );
}

#[tokio::test]
async fn activation_then_deactivation_round_trip() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_ok("Successfully registered system\n");
    runner.push_ok("Deregistered sle-module-containers\n");

    let backend = select(&[SUSECONNECT_PATH], runner.clone()).await.unwrap();
    let key = ProductKey::new("sle-module-containers", "15.5", "x86_64");

    let outcome = backend
        .register(&RegisterRequest {
            product: Some(key.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(outcome.succeeded);

    let output = backend.deregister(Some(&key)).await.unwrap();
    assert!(output.contains("Deregistered"));

    let calls = runner.recorded_calls();
    assert_eq!(
        calls[0],
        vec!["suseconnect", "-p", "sle-module-containers/15.5/x86_64"]
    );
    assert_eq!(
        calls[1],
        vec!["suseconnect", "-d", "-p", "sle-module-containers/15.5/x86_64"]
    );
}

#[tokio::test]
async fn backend_instance_is_shareable_across_tasks() {
    // The selected backend is a process-lifetime singleton; concurrent use
    // from separate tasks must be possible without locking.
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_ok(STATUS_FIXTURE);
    runner.push_ok(STATUS_FIXTURE);

    let backend = select(&[SUSECONNECT_PATH], runner).await.unwrap();

    let first = tokio::spawn({
        let backend = backend.clone();
        async move { backend.subscriptions().await }
    });
    let second = tokio::spawn({
        let backend = backend.clone();
        async move { backend.subscriptions().await }
    });

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first, second);
}
