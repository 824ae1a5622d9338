//! Failure taxonomy for orchestration runs.
//!
//! A task can only fail in two ways: its producer returns an error
//! ([`TaskFailure::Rejected`]), or it never produces an outcome at all
//! ([`TaskFailure::Abandoned`]). Everything else here is a view of those two
//! cases from a peer or from the caller of the run.

use thiserror::Error;

use crate::TaskKey;

/// Terminal failure of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFailure<E> {
    /// The producer returned `Err`. The reason is passed through unmodified.
    #[error("rejected: {0}")]
    Rejected(E),
    /// The producer panicked or was dropped before producing an outcome.
    #[error("ended without producing a result")]
    Abandoned,
}

impl<E> TaskFailure<E> {
    #[must_use]
    pub fn reason(&self) -> Option<&E> {
        match self {
            Self::Rejected(reason) => Some(reason),
            Self::Abandoned => None,
        }
    }

    #[must_use]
    pub fn into_reason(self) -> Option<E> {
        match self {
            Self::Rejected(reason) => Some(reason),
            Self::Abandoned => None,
        }
    }

    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Abandoned)
    }
}

/// A key that a task's peer view does not expose.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerLookupError {
    /// Reading your own result would wait forever, so the view hides it.
    #[error("task '{0}' cannot wait on its own result")]
    OwnResult(TaskKey),
    #[error("no task named '{0}' in this run")]
    Unknown(TaskKey),
}

impl PeerLookupError {
    #[must_use]
    pub fn key(&self) -> &TaskKey {
        match self {
            Self::OwnResult(key) | Self::Unknown(key) => key,
        }
    }
}

/// Error returned when a task waits on a peer by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError<E> {
    #[error(transparent)]
    Lookup(#[from] PeerLookupError),
    #[error("peer '{key}' {failure}")]
    Failed { key: TaskKey, failure: TaskFailure<E> },
}

impl<E> PeerError<E> {
    /// The peer's own rejection reason, if the peer was found and rejected.
    #[must_use]
    pub fn reason(&self) -> Option<&E> {
        match self {
            Self::Failed { failure, .. } => failure.reason(),
            Self::Lookup(_) => None,
        }
    }

    #[must_use]
    pub fn into_reason(self) -> Option<E> {
        match self {
            Self::Failed { failure, .. } => failure.into_reason(),
            Self::Lookup(_) => None,
        }
    }
}

/// The first task failure observed by a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task '{key}' {failure}")]
pub struct OrchestrationError<E> {
    key: TaskKey,
    failure: TaskFailure<E>,
}

impl<E> OrchestrationError<E> {
    #[must_use]
    pub fn new(key: TaskKey, failure: TaskFailure<E>) -> Self {
        Self { key, failure }
    }

    /// Key of the task whose failure ended the run.
    #[must_use]
    pub fn key(&self) -> &TaskKey {
        &self.key
    }

    #[must_use]
    pub fn failure(&self) -> &TaskFailure<E> {
        &self.failure
    }

    #[must_use]
    pub fn reason(&self) -> Option<&E> {
        self.failure.reason()
    }

    /// Hand back exactly what the failing producer returned, if it returned anything.
    #[must_use]
    pub fn into_reason(self) -> Option<E> {
        self.failure.into_reason()
    }

    #[must_use]
    pub fn into_parts(self) -> (TaskKey, TaskFailure<E>) {
        (self.key, self.failure)
    }
}
