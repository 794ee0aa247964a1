use std::collections::BTreeSet;

use crate::{PhotoId, StageKind, TaskId};

/// One `(name, url)` pair from the remote catalog, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
}

/// Why the one-shot catalog load failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFailure {
    /// The catalog could not be fetched.
    Unavailable,
    /// The catalog was fetched but could not be parsed.
    Malformed,
}

/// Result of one stage task, as reported back to the coordinator.
///
/// The engine logs the detailed failure cause before reporting; the
/// coordinator only needs success-or-not to drive the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Success(Vec<u8>),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The catalog source delivered the photo list.
    CatalogLoaded(Vec<CatalogEntry>),
    /// The catalog source failed; surfaced once to the presenter.
    CatalogFailed(CatalogFailure),
    /// A row is about to be displayed; admit its next stage unless scrolling.
    PhotoDisplayed(PhotoId),
    /// The viewport's visible set changed; reconcile unless scrolling.
    ViewportChanged(BTreeSet<PhotoId>),
    /// The user started dragging the viewport.
    DragBegan,
    /// The drag ended; deceleration may follow.
    DragEnded { will_decelerate: bool },
    /// Deceleration after a drag came to rest.
    DecelerationEnded,
    /// A stage task finished. Stale task ids are ignored.
    StageFinished {
        photo_id: PhotoId,
        stage: StageKind,
        task_id: TaskId,
        outcome: StageOutcome,
    },
}
