//! Lightbox core: pure photo-loading coordinator and view-model helpers.
mod effect;
mod msg;
mod record;
mod registry;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{CatalogEntry, CatalogFailure, Msg, StageOutcome};
pub use record::{PhotoId, PhotoRecord, StageState};
pub use registry::{AlreadyPending, StageKind, TaskId, TaskRegistry};
pub use state::{AppState, RetryPolicy, ScrollState};
pub use update::update;
pub use view_model::{AppViewModel, PhotoRowView};
