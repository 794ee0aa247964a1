//! Lightbox engine: stage queues, workers and catalog loading.
mod catalog;
mod engine;
mod fetch;
mod queue;
mod transform;
mod types;

pub use catalog::{load_catalog, parse_catalog};
pub use engine::{EngineConfig, EngineHandle};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use queue::StageQueue;
pub use transform::{SepiaTransformer, Transformer};
pub use types::{
    CatalogEntry, CatalogError, EngineEvent, FailureKind, FetchError, PhotoId, StageError,
    StageKind, TaskId, TransformError,
};
