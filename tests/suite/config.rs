//! Orchestrators built from a config file.

use std::io::Write;
use std::time::Duration;

use autojoin_core::{ConfigError, Orchestrator, OrchestratorConfig, TaskSet};

use crate::common::delayed;

#[tokio::test(start_paused = true)]
async fn orchestrator_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[orchestrator]
stall_warning_ms = 5
label = "from-file"
"#
    )
    .unwrap();

    let config = OrchestratorConfig::load(file.path()).unwrap();
    assert_eq!(config.stall_warning(), Some(Duration::from_millis(5)));

    // The stall warning fires well before the task finishes; the run still completes.
    let values = Orchestrator::new(&config)
        .launch(TaskSet::<&str, ()>::new().with_task("slow", |_| async {
            Ok(delayed("done", 50).await)
        }))
        .await
        .unwrap();
    assert_eq!(values.get("slow"), Some(&"done"));
}

#[test]
fn malformed_config_is_rejected_with_its_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[orchestrator]\nstall_warning_ms = -1").unwrap();

    let err = OrchestratorConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert_eq!(err.path(), Some(file.path()));
}
