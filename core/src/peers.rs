//! Per-task views over a run's result slots.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use autojoin_types::{PeerError, PeerLookupError, TaskKey};

use crate::handle::ResultHandle;

/// Every result handle of one run, in input order, with a name index.
pub(crate) struct SlotTable<V, E> {
    handles: Vec<ResultHandle<V, E>>,
    index: HashMap<TaskKey, usize>,
}

impl<V, E> SlotTable<V, E> {
    pub(crate) fn new(handles: Vec<ResultHandle<V, E>>) -> Self {
        let index = handles
            .iter()
            .enumerate()
            .map(|(position, handle)| (handle.key().clone(), position))
            .collect();
        Self { handles, index }
    }

    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub(crate) fn handles(&self) -> &[ResultHandle<V, E>] {
        &self.handles
    }

    pub(crate) fn get(&self, key: &str) -> Option<&ResultHandle<V, E>> {
        self.position(key).map(|position| &self.handles[position])
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.handles.iter().map(ResultHandle::key)
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }
}

/// What a task sees of its siblings: every other task's result handle.
///
/// The task's own slot is not reachable through its view. Asking for it
/// returns [`PeerLookupError::OwnResult`] instead of a handle that could
/// never settle.
pub struct PeerView<V, E> {
    owner: usize,
    table: Arc<SlotTable<V, E>>,
}

impl<V, E> PeerView<V, E> {
    pub(crate) fn new(owner: usize, table: Arc<SlotTable<V, E>>) -> Self {
        Self { owner, table }
    }

    /// Key of the task this view was handed to.
    #[must_use]
    pub fn owner(&self) -> &TaskKey {
        self.table.handles()[self.owner].key()
    }

    pub fn get(&self, key: &str) -> Result<&ResultHandle<V, E>, PeerLookupError> {
        match self.table.position(key) {
            Some(position) if position == self.owner => {
                Err(PeerLookupError::OwnResult(self.owner().clone()))
            }
            Some(position) => Ok(&self.table.handles()[position]),
            None => Err(PeerLookupError::Unknown(TaskKey::from(key))),
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Peer keys in input order, excluding the owner.
    pub fn keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.iter().map(|(key, _)| key)
    }

    /// Peer handles in input order, excluding the owner.
    pub fn iter(&self) -> impl Iterator<Item = (&TaskKey, &ResultHandle<V, E>)> {
        self.table
            .handles()
            .iter()
            .enumerate()
            .filter(move |(position, _)| *position != self.owner)
            .map(|(_, handle)| (handle.key(), handle))
    }

    /// Number of peers (the owner is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone, E: Clone> PeerView<V, E> {
    /// Look up a peer and wait for its outcome.
    pub async fn wait(&self, key: &str) -> Result<V, PeerError<E>> {
        let handle = self.get(key)?;
        handle.wait().await.map_err(|failure| PeerError::Failed {
            key: handle.key().clone(),
            failure,
        })
    }
}

impl<V, E> Clone for PeerView<V, E> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            table: Arc::clone(&self.table),
        }
    }
}

impl<V, E> fmt::Debug for PeerView<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerView")
            .field("owner", self.owner())
            .field("peers", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
