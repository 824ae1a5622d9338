//! Cycles hang and self-reads are refused.
//!
//! A cycle never settles, so these tests can only show that nothing has
//! settled after a generous (virtual) timeout.

use std::time::Duration;

use autojoin_core::{
    Orchestrator, OrchestratorConfig, PeerError, PeerLookupError, TaskKey, TaskSet, orchestrate,
};

use crate::common::{LogCapture, init_tracing};

const PATIENCE: Duration = Duration::from_secs(3600);

fn mutual_wait() -> TaskSet<u8, ()> {
    TaskSet::new()
        .with_task("a", |peers| async move {
            let b = peers.wait("b").await.map_err(|_| ())?;
            Ok::<_, ()>(b + 1)
        })
        .with_task("b", |peers| async move {
            let a = peers.wait("a").await.map_err(|_| ())?;
            Ok::<_, ()>(a + 1)
        })
}

#[tokio::test(start_paused = true)]
async fn mutual_wait_never_settles() {
    let run = orchestrate(mutual_wait());
    let (a, b) = (run.handle("a").unwrap(), run.handle("b").unwrap());

    assert!(tokio::time::timeout(PATIENCE, run).await.is_err());
    assert!(!a.is_settled());
    assert!(!b.is_settled());
}

#[tokio::test(start_paused = true)]
async fn transitive_cycle_never_settles() {
    let tasks = TaskSet::<u8, ()>::new()
        .with_task("a", |peers| async move { peers.wait("c").await.map_err(|_| ()) })
        .with_task("b", |peers| async move { peers.wait("a").await.map_err(|_| ()) })
        .with_task("c", |peers| async move { peers.wait("b").await.map_err(|_| ()) })
        .with_task("bystander", |_| async { Ok(0) });
    let run = orchestrate(tasks);
    let bystander = run.handle("bystander").unwrap();

    assert!(tokio::time::timeout(PATIENCE, run).await.is_err());
    assert_eq!(bystander.peek(), Some(Ok(0)));
}

#[tokio::test(start_paused = true)]
async fn stall_warning_does_not_end_the_run() {
    init_tracing();
    let config = OrchestratorConfig::default()
        .with_stall_warning(Duration::from_millis(10))
        .with_label("cycle");
    let run = Orchestrator::new(&config).launch(mutual_wait());

    assert!(tokio::time::timeout(PATIENCE, run).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn stall_warning_names_pending_tasks_once() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let config = OrchestratorConfig::default()
        .with_stall_warning(Duration::from_millis(10))
        .with_label("nightly-graph");
    let tasks = mutual_wait().with_task("done", |_| async { Ok(0) });
    let run = Orchestrator::new(&config).launch(tasks);

    assert!(tokio::time::timeout(PATIENCE, run).await.is_err());

    let warnings = logs.lines_containing("still waiting");
    assert_eq!(warnings.len(), 1, "{warnings:#?}");
    let warning = &warnings[0];
    assert!(warning.contains("WARN"), "{warning}");
    assert!(warning.contains(r#"["a", "b"]"#), "{warning}");
    assert!(!warning.contains("done"), "{warning}");
    // Emitted inside the run's span, which carries the configured label.
    assert!(warning.contains("orchestrate{"), "{warning}");
    assert!(warning.contains("nightly-graph"), "{warning}");
}

#[tokio::test]
async fn own_result_is_not_readable() {
    let err = orchestrate(TaskSet::<u8, String>::new().with_task("me", |peers| async move {
        assert!(!peers.contains("me"));
        match peers.wait("me").await {
            Err(PeerError::Lookup(PeerLookupError::OwnResult(key))) => {
                Err(format!("refused to read {key}"))
            }
            other => Err(format!("unexpected: {other:?}")),
        }
    }))
    .await
    .unwrap_err();

    assert_eq!(err.key(), &TaskKey::from("me"));
    assert_eq!(err.reason().map(String::as_str), Some("refused to read me"));
}
