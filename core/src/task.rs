//! The ordered set of producers handed to an orchestrator.

use std::fmt;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use autojoin_types::TaskKey;

use crate::peers::PeerView;

pub(crate) type TaskFuture<V, E> = BoxFuture<'static, Result<V, E>>;

pub(crate) type Producer<V, E> = Box<dyn FnOnce(PeerView<V, E>) -> TaskFuture<V, E> + Send>;

/// Named producers for one run, kept in insertion order.
///
/// A producer receives the [`PeerView`] of its task and returns the future
/// that computes the task's outcome. Producers are `FnOnce`: each is invoked
/// exactly once, when the set is launched.
///
/// ```no_run
/// # use autojoin_core::{TaskSet, orchestrate};
/// # async fn demo() {
/// let tasks = TaskSet::<String, String>::new()
///     .with_task("foo", |_peers| async { Ok("a".to_string()) })
///     .with_task("bar", |peers| async move {
///         let foo = peers.wait("foo").await.map_err(|e| e.to_string())?;
///         Ok::<_, String>(format!("{foo}b"))
///     });
/// let values = orchestrate(tasks).await.unwrap();
/// assert_eq!(values.get("bar").map(String::as_str), Some("ab"));
/// # }
/// ```
pub struct TaskSet<V, E> {
    tasks: Vec<(TaskKey, Producer<V, E>)>,
}

impl<V, E> TaskSet<V, E> {
    #[must_use]
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn with_task<P, Fut>(mut self, key: impl Into<TaskKey>, producer: P) -> Self
    where
        P: FnOnce(PeerView<V, E>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.insert(key, producer);
        self
    }

    /// Add a producer. A key that is already present keeps its position and
    /// gets the new producer; keys never repeat within a run.
    pub fn insert<P, Fut>(&mut self, key: impl Into<TaskKey>, producer: P)
    where
        P: FnOnce(PeerView<V, E>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let key = key.into();
        let boxed: Producer<V, E> = Box::new(move |peers| producer(peers).boxed());
        match self.tasks.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = boxed,
            None => self.tasks.push((key, boxed)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.tasks.iter().map(|(key, _)| key)
    }

    pub(crate) fn into_entries(self) -> Vec<(TaskKey, Producer<V, E>)> {
        self.tasks
    }
}

impl<V, E> Default for TaskSet<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> fmt::Debug for TaskSet<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSet")
            .field("tasks", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
