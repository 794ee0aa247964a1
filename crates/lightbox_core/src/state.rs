use std::collections::{BTreeMap, BTreeSet};

use crate::view_model::{AppViewModel, PhotoRowView};
use crate::{PhotoId, PhotoRecord, TaskId, TaskRegistry};

/// What to do when a `Failed` photo re-enters the visible set.
///
/// The original behavior keeps failures terminal; retry-on-revisit resets the
/// record to `Pending` and admits a fresh fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    #[default]
    KeepFailed,
    RetryOnRevisit,
}

/// Viewport scroll phase. Admission and reconciliation only run in `Idle`;
/// both queues stay suspended for the whole `Dragging`/`Decelerating` span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollState {
    #[default]
    Idle,
    Dragging,
    Decelerating,
}

/// Coordinator state. Owned by whoever runs the serialized update loop; that
/// loop is the coordination context, and nothing here needs locking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) photos: BTreeMap<PhotoId, PhotoRecord>,
    pub(crate) registry: TaskRegistry,
    pub(crate) visible: BTreeSet<PhotoId>,
    pub(crate) scroll: ScrollState,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) next_task_id: TaskId,
    pub(crate) dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_policy(retry_policy: RetryPolicy) -> Self {
        Self {
            retry_policy,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            photos: self
                .photos
                .values()
                .map(|record| PhotoRowView {
                    photo_id: record.id,
                    name: record.name.clone(),
                    state: record.state(),
                })
                .collect(),
            pending_count: self.registry.pending_ids().len(),
            dirty: self.dirty,
        }
    }

    pub fn photo(&self, photo_id: PhotoId) -> Option<&PhotoRecord> {
        self.photos.get(&photo_id)
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    /// Returns the dirty flag and clears it. The render loop polls this to
    /// coalesce redraws.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Next unused task handle. Minted only when a registration succeeds.
    pub(crate) fn mint_task_id(&mut self) -> TaskId {
        self.next_task_id += 1;
        self.next_task_id
    }
}
