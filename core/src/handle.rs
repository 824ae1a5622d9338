//! Single-assignment result slots.
//!
//! Each task gets one slot, split into a [`Settler`] (the only writer) and any
//! number of [`ResultHandle`]s (readers). `settle` consumes the settler, so a
//! slot can be written at most once. A settler dropped without settling
//! closes the slot, and every reader observes [`TaskFailure::Abandoned`].

use std::fmt;

use tokio::sync::watch;

use autojoin_types::{TaskFailure, TaskKey};

enum Slot<V, E> {
    Pending,
    Settled(Result<V, E>),
}

impl<V, E> Slot<V, E> {
    fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(_))
    }
}

impl<V: Clone, E: Clone> Slot<V, E> {
    fn outcome(&self) -> Option<Result<V, TaskFailure<E>>> {
        match self {
            Self::Pending => None,
            Self::Settled(Ok(value)) => Some(Ok(value.clone())),
            Self::Settled(Err(reason)) => Some(Err(TaskFailure::Rejected(reason.clone()))),
        }
    }
}

/// Create a pending slot for `key`.
pub(crate) fn slot<V, E>(key: TaskKey) -> (Settler<V, E>, ResultHandle<V, E>) {
    let (tx, rx) = watch::channel(Slot::Pending);
    let settler = Settler {
        key: key.clone(),
        tx,
    };
    (settler, ResultHandle { key, rx })
}

/// Write half of a slot.
pub(crate) struct Settler<V, E> {
    key: TaskKey,
    tx: watch::Sender<Slot<V, E>>,
}

impl<V, E> Settler<V, E> {
    pub(crate) fn key(&self) -> &TaskKey {
        &self.key
    }

    pub(crate) fn settle(self, outcome: Result<V, E>) {
        tracing::debug!(task = %self.key, ok = outcome.is_ok(), "task settled");
        self.tx.send_replace(Slot::Settled(outcome));
    }
}

impl<V, E> Drop for Settler<V, E> {
    fn drop(&mut self) {
        if !self.tx.borrow().is_settled() {
            tracing::warn!(task = %self.key, "task ended without producing a result");
        }
    }
}

/// Read half of a slot: a future value that settles exactly once.
///
/// Any number of clones may wait on the same slot; all of them observe the
/// same outcome, no matter when or how often they read it.
pub struct ResultHandle<V, E> {
    key: TaskKey,
    rx: watch::Receiver<Slot<V, E>>,
}

impl<V, E> ResultHandle<V, E> {
    #[must_use]
    pub fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Whether the slot has reached its final state (including abandonment).
    #[must_use]
    pub fn is_settled(&self) -> bool {
        let closed = self.rx.has_changed().is_err();
        closed || self.rx.borrow().is_settled()
    }
}

impl<V: Clone, E: Clone> ResultHandle<V, E> {
    /// Wait until the task settles and return its outcome.
    ///
    /// Never returns while the task is still running. Waiting on a task that
    /// is itself (directly or transitively) waiting on the caller never
    /// returns at all.
    pub async fn wait(&self) -> Result<V, TaskFailure<E>> {
        let mut rx = self.rx.clone();
        match rx.wait_for(Slot::is_settled).await {
            Ok(slot) => slot.outcome().unwrap_or(Err(TaskFailure::Abandoned)),
            Err(_) => Err(TaskFailure::Abandoned),
        }
    }

    /// The outcome if the task has already settled, without waiting.
    #[must_use]
    pub fn peek(&self) -> Option<Result<V, TaskFailure<E>>> {
        // Check for closure first: once the settler is gone the slot is final.
        let closed = self.rx.has_changed().is_err();
        match self.rx.borrow().outcome() {
            Some(outcome) => Some(outcome),
            None if closed => Some(Err(TaskFailure::Abandoned)),
            None => None,
        }
    }
}

impl<V, E> Clone for ResultHandle<V, E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<V, E> fmt::Debug for ResultHandle<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("key", &self.key)
            .field("settled", &self.is_settled())
            .finish()
    }
}
