use crate::{CatalogFailure, PhotoId, TaskId};

/// Side effects requested by [`crate::update`], executed by the platform
/// layer. `Start*`/`Cancel*`/`SetQueuesSuspended` go to the engine; the
/// remainder are presenter notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartFetch {
        task_id: TaskId,
        photo_id: PhotoId,
        url: String,
    },
    StartTransform {
        task_id: TaskId,
        photo_id: PhotoId,
        raw: Vec<u8>,
    },
    CancelTask {
        task_id: TaskId,
    },
    SetQueuesSuspended(bool),
    PhotoChanged {
        photo_id: PhotoId,
    },
    CatalogLoaded,
    CatalogFailed {
        reason: CatalogFailure,
    },
}
