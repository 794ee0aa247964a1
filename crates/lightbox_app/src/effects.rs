use engine_logging::engine_debug;
use lightbox_core::{CatalogFailure, Effect, Msg, StageOutcome};
use lightbox_engine::{CatalogError, EngineConfig, EngineEvent, EngineHandle};

use crate::presenter::Presenter;

/// Executes coordinator effects against the engine and maps engine events
/// back into coordinator messages. The thread that polls `poll_msg` and
/// calls `update` is the single coordination context.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: EngineHandle::new(config),
        }
    }

    pub fn load_catalog(&self, url: &str) {
        self.engine.load_catalog(url);
    }

    pub fn poll_msg(&self) -> Option<Msg> {
        self.engine.try_recv().map(map_event)
    }

    pub fn run(&self, effects: Vec<Effect>, presenter: &dyn Presenter) {
        for effect in effects {
            match effect {
                Effect::StartFetch {
                    task_id,
                    photo_id,
                    url,
                } => {
                    engine_debug!("start fetch task={} photo={}", task_id, photo_id);
                    self.engine.start_fetch(task_id, photo_id, url);
                }
                Effect::StartTransform {
                    task_id,
                    photo_id,
                    raw,
                } => {
                    engine_debug!("start transform task={} photo={}", task_id, photo_id);
                    self.engine.start_transform(task_id, photo_id, raw);
                }
                Effect::CancelTask { task_id } => {
                    engine_debug!("cancel task={}", task_id);
                    self.engine.cancel(task_id);
                }
                Effect::SetQueuesSuspended(suspended) => {
                    self.engine.set_suspended(suspended);
                }
                Effect::PhotoChanged { photo_id } => presenter.photo_changed(photo_id),
                Effect::CatalogLoaded => presenter.catalog_loaded(),
                Effect::CatalogFailed { reason } => presenter.catalog_failed(reason),
            }
        }
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::CatalogLoaded(entries) => Msg::CatalogLoaded(
            entries
                .into_iter()
                .map(|entry| lightbox_core::CatalogEntry {
                    name: entry.name,
                    url: entry.url,
                })
                .collect(),
        ),
        EngineEvent::CatalogFailed(err) => Msg::CatalogFailed(map_catalog_error(&err)),
        EngineEvent::StageFinished {
            photo_id,
            task_id,
            stage,
            result,
        } => Msg::StageFinished {
            photo_id,
            stage: map_stage(stage),
            task_id,
            outcome: match result {
                Ok(bytes) => StageOutcome::Success(bytes),
                // The engine already logged the cause at warn level.
                Err(_) => StageOutcome::Failed,
            },
        },
    }
}

fn map_stage(stage: lightbox_engine::StageKind) -> lightbox_core::StageKind {
    match stage {
        lightbox_engine::StageKind::Fetch => lightbox_core::StageKind::Fetch,
        lightbox_engine::StageKind::Transform => lightbox_core::StageKind::Transform,
    }
}

fn map_catalog_error(err: &CatalogError) -> CatalogFailure {
    match err {
        CatalogError::Unavailable(_) => CatalogFailure::Unavailable,
        CatalogError::Malformed(_) => CatalogFailure::Malformed,
    }
}
