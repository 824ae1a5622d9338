//! Launching a task set and joining its results.
//!
//! # Lifecycle
//!
//! ```text
//! launch(tasks)
//!   1. one pending slot per key          (handle::slot)
//!   2. for each key, in input order:
//!        invoke producer(peer view)      (synchronous)
//!        poll its future once, inline    (runs up to the first await)
//!        still pending? -> tokio::spawn  (keeps running even if the run is dropped)
//!   3. the wrapper settles the task's own slot with the producer's outcome
//! await run
//!   4. join all slots: first failure wins, otherwise every value in input order
//! ```
//!
//! Nothing is cancelled. When the run fails fast, tasks that have not settled
//! keep running and settle their own slots later; only [`Run::handle`] can
//! still observe them.
//!
//! There is no cycle detection. A task that waits on a peer that is, directly
//! or transitively, waiting on it never settles, and neither does the run.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::task::noop_waker_ref;
use tracing::Instrument;

use autojoin_config::OrchestratorConfig;
use autojoin_types::{OrchestrationError, TaskKey, ValueMap};

use crate::handle::{self, ResultHandle, Settler};
use crate::peers::{PeerView, SlotTable};
use crate::task::{Producer, TaskSet};

type JoinOutcome<V, E> = Result<ValueMap<V>, OrchestrationError<E>>;

/// Launch every task in `tasks` with the default configuration.
///
/// See [`Orchestrator::launch`].
pub fn orchestrate<V, E>(tasks: TaskSet<V, E>) -> Run<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    Orchestrator::default().launch(tasks)
}

/// Launches task sets with a fixed set of diagnostics settings.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    stall_warning: Option<Duration>,
    label: Option<String>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            stall_warning: config.stall_warning(),
            label: config.label().map(ToOwned::to_owned),
        }
    }

    /// Start every task and return the run that joins them.
    ///
    /// Every producer is invoked, in input order, before this returns, and
    /// each producer's future has already run up to its first suspension
    /// point. Awaiting the returned [`Run`] only waits; it starts nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since tasks that suspend are
    /// handed to `tokio::spawn`.
    pub fn launch<V, E>(&self, tasks: TaskSet<V, E>) -> Run<V, E>
    where
        V: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        let span = tracing::debug_span!(
            "orchestrate",
            label = self.label.as_deref().unwrap_or_default(),
            tasks = tasks.len()
        );
        let _entered = span.enter();

        let (keys, producers): (Vec<TaskKey>, Vec<Producer<V, E>>) =
            tasks.into_entries().into_iter().unzip();
        let (settlers, handles): (Vec<Settler<V, E>>, Vec<ResultHandle<V, E>>) =
            keys.into_iter().map(handle::slot).unzip();
        let table = Arc::new(SlotTable::new(handles));

        tracing::debug!(tasks = table.len(), "launching tasks");
        for (owner, (producer, settler)) in producers.into_iter().zip(settlers).enumerate() {
            let peers = PeerView::new(owner, Arc::clone(&table));
            start_task(producer, peers, settler);
        }

        let join = join_slots(Arc::clone(&table), self.stall_warning)
            .instrument(span.clone())
            .boxed();
        Run { table, join }
    }
}

/// Invoke one producer, poll it once inline, and spawn it if it suspended.
///
/// The future that gets spawned owns the task's settler, so the slot settles
/// when the producer finishes. A panic at any point drops the settler and
/// the slot reads as abandoned.
fn start_task<V, E>(producer: Producer<V, E>, peers: PeerView<V, E>, settler: Settler<V, E>)
where
    V: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let span = tracing::debug_span!("task", task = %settler.key());
    let _entered = span.enter();

    let work = match panic::catch_unwind(AssertUnwindSafe(|| producer(peers))) {
        Ok(work) => work,
        Err(payload) => {
            let panic = panic_message(payload.as_ref());
            tracing::warn!(%panic, "producer panicked before returning its future");
            return;
        }
    };

    let mut wired: BoxFuture<'static, ()> = async move {
        let outcome = work.await;
        settler.settle(outcome);
    }
    .boxed();

    let mut cx = Context::from_waker(noop_waker_ref());
    match panic::catch_unwind(AssertUnwindSafe(|| wired.as_mut().poll(&mut cx))) {
        Ok(Poll::Ready(())) => {}
        Ok(Poll::Pending) => {
            tokio::spawn(wired.instrument(span.clone()));
        }
        Err(payload) => {
            let panic = panic_message(payload.as_ref());
            tracing::warn!(%panic, "task panicked before its first suspension point");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Wait for every slot: the first failure to arrive ends the join.
async fn join_slots<V, E>(
    table: Arc<SlotTable<V, E>>,
    stall_warning: Option<Duration>,
) -> JoinOutcome<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    let mut values: Vec<Option<V>> = vec![None; table.len()];
    let mut pending: FuturesUnordered<_> = table
        .handles()
        .iter()
        .cloned()
        .enumerate()
        .map(|(position, handle)| async move { (position, handle.wait().await) })
        .collect();

    let stall = async {
        match stall_warning {
            Some(after) => tokio::time::sleep(after).await,
            None => future::pending::<()>().await,
        }
    };
    tokio::pin!(stall);
    let mut stall_reported = false;

    loop {
        let next = tokio::select! {
            biased;
            next = pending.next() => next,
            () = &mut stall, if !stall_reported => {
                stall_reported = true;
                let waiting: Vec<&str> = table
                    .keys()
                    .zip(&values)
                    .filter(|(_, value)| value.is_none())
                    .map(|(key, _)| key.as_str())
                    .collect();
                tracing::warn!(
                    ?waiting,
                    "run is still waiting on tasks; check for a dependency cycle"
                );
                continue;
            }
        };

        match next {
            Some((position, Ok(value))) => values[position] = Some(value),
            Some((position, Err(failure))) => {
                let key = table.handles()[position].key().clone();
                let still_pending = values
                    .iter()
                    .filter(|value| value.is_none())
                    .count()
                    .saturating_sub(1);
                tracing::debug!(task = %key, still_pending, "task failed; ending run");
                return Err(OrchestrationError::new(key, failure));
            }
            None => break,
        }
    }

    tracing::debug!(tasks = values.len(), "all tasks succeeded");
    Ok(table
        .keys()
        .cloned()
        .zip(values)
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect())
}

/// A launched task set.
///
/// Awaiting a run yields every task's value in input order, or the first
/// task failure to arrive. Dropping a run does not stop its tasks.
pub struct Run<V, E> {
    table: Arc<SlotTable<V, E>>,
    join: BoxFuture<'static, JoinOutcome<V, E>>,
}

impl<V, E> Run<V, E> {
    /// A handle on one task's slot, readable before or after the run ends.
    #[must_use]
    pub fn handle(&self, key: &str) -> Option<ResultHandle<V, E>> {
        self.table.get(key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.table.keys()
    }
}

impl<V, E> Future for Run<V, E> {
    type Output = JoinOutcome<V, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().join.as_mut().poll(cx)
    }
}

impl<V, E> fmt::Debug for Run<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Run")
            .field("tasks", &self.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
