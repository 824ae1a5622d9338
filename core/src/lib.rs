//! Concurrent tasks that find their own dependencies.
//!
//! A [`TaskSet`] names a group of async producers. [`orchestrate`] starts all
//! of them at once and gives each one a [`PeerView`]: a handle on every other
//! task's eventual result. A task depends on another simply by waiting on
//! that task's handle, so the dependency graph is whatever the producers
//! actually await. The run resolves to a [`ValueMap`] once every task has
//! succeeded, or to the first [`OrchestrationError`] as soon as any task fails.
//!
//! ```no_run
//! use autojoin_core::{TaskSet, orchestrate};
//!
//! # async fn demo() -> Result<(), autojoin_core::OrchestrationError<String>> {
//! let tasks = TaskSet::<String, String>::new()
//!     .with_task("config", |_| async { Ok("release".to_string()) })
//!     .with_task("build", |peers| async move {
//!         let profile = peers.wait("config").await.map_err(|e| e.to_string())?;
//!         Ok::<_, String>(format!("built ({profile})"))
//!     });
//!
//! let values = orchestrate(tasks).await?;
//! assert_eq!(values.get("build").map(String::as_str), Some("built (release)"));
//! # Ok(())
//! # }
//! ```
//!
//! # Caveats
//!
//! - Cycles are not detected. Two tasks waiting on each other never settle,
//!   and neither does the run. A task cannot wait on itself: its own key is
//!   not part of its view.
//! - Nothing is cancelled. After a failure, the remaining tasks run to
//!   completion in the background.
//! - Every task is started immediately; there is no concurrency limit.

mod handle;
mod orchestrator;
mod peers;
mod task;

pub use autojoin_config::{ConfigError, OrchestratorConfig};
pub use autojoin_types::{
    OrchestrationError, PeerError, PeerLookupError, TaskFailure, TaskKey, ValueMap,
};
pub use handle::ResultHandle;
pub use orchestrator::{Orchestrator, Run, orchestrate};
pub use peers::PeerView;
pub use task::TaskSet;
