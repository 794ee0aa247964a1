use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::PhotoId;

/// Handle for one admitted unit of work. Minted by the coordinator,
/// monotonically increasing, never reused within a session. A completion
/// report carrying a task id the registry no longer holds is stale.
pub type TaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Fetch,
    Transform,
}

/// Guard condition returned when work for a (photo, stage) is already in
/// flight. Expected and benign; never surfaced to the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyPending;

impl fmt::Display for AlreadyPending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a task for this photo and stage is already pending")
    }
}

/// Single source of truth for in-flight work, one map per stage.
///
/// Only the coordination context touches this; a plain owned struct with no
/// locking is enough given that discipline. `register` is a single
/// check-then-insert step, so the at-most-one-task-per-(photo, stage)
/// invariant holds for any call sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRegistry {
    fetch: BTreeMap<PhotoId, TaskId>,
    transform: BTreeMap<PhotoId, TaskId>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, stage: StageKind) -> &BTreeMap<PhotoId, TaskId> {
        match stage {
            StageKind::Fetch => &self.fetch,
            StageKind::Transform => &self.transform,
        }
    }

    fn map_mut(&mut self, stage: StageKind) -> &mut BTreeMap<PhotoId, TaskId> {
        match stage {
            StageKind::Fetch => &mut self.fetch,
            StageKind::Transform => &mut self.transform,
        }
    }

    /// Records `task` as the in-flight work for `(stage, photo_id)`.
    pub fn register(
        &mut self,
        stage: StageKind,
        photo_id: PhotoId,
        task: TaskId,
    ) -> Result<(), AlreadyPending> {
        use std::collections::btree_map::Entry;
        match self.map_mut(stage).entry(photo_id) {
            Entry::Occupied(_) => Err(AlreadyPending),
            Entry::Vacant(slot) => {
                slot.insert(task);
                Ok(())
            }
        }
    }

    /// Removes and returns the entry, if any. No-op when absent.
    pub fn unregister(&mut self, stage: StageKind, photo_id: PhotoId) -> Option<TaskId> {
        self.map_mut(stage).remove(&photo_id)
    }

    pub fn is_pending(&self, stage: StageKind, photo_id: PhotoId) -> bool {
        self.map(stage).contains_key(&photo_id)
    }

    pub fn task_for(&self, stage: StageKind, photo_id: PhotoId) -> Option<TaskId> {
        self.map(stage).get(&photo_id).copied()
    }

    /// Clears both stage entries for a photo, returning the handles that
    /// still need an engine-side cancel. Idempotent.
    pub fn remove_all(&mut self, photo_id: PhotoId) -> Vec<TaskId> {
        let mut removed = Vec::with_capacity(2);
        removed.extend(self.fetch.remove(&photo_id));
        removed.extend(self.transform.remove(&photo_id));
        removed
    }

    /// Empties the registry, returning every live handle. Used when the
    /// catalog is replaced.
    pub fn drain(&mut self) -> Vec<TaskId> {
        let mut removed: Vec<TaskId> = self.fetch.values().copied().collect();
        removed.extend(self.transform.values().copied());
        self.fetch.clear();
        self.transform.clear();
        removed
    }

    /// Photos with work in flight for either stage.
    pub fn pending_ids(&self) -> BTreeSet<PhotoId> {
        self.fetch.keys().chain(self.transform.keys()).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fetch.is_empty() && self.transform.is_empty()
    }
}
