use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use engine_logging::{engine_error, engine_warn};
use tokio_util::sync::CancellationToken;

use crate::catalog;
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::queue::StageQueue;
use crate::transform::{SepiaTransformer, Transformer};
use crate::{EngineEvent, PhotoId, StageError, StageKind, TaskId};

/// Engine tuning knobs. The per-stage bounds cap worker-pool usage; the
/// coordinator's visibility policy keeps the queues short.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fetch_settings: FetchSettings,
    pub fetch_concurrency: usize,
    pub transform_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_settings: FetchSettings::default(),
            fetch_concurrency: 6,
            transform_concurrency: 4,
        }
    }
}

enum EngineCommand {
    LoadCatalog {
        url: String,
    },
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
    Cancel {
        task_id: TaskId,
    },
    SetSuspended(bool),
}

/// Handle to the engine daemon: commands in, events polled out.
///
/// The daemon thread owns a tokio runtime and both stage queues. Completion
/// events are only ever observed through [`EngineHandle::try_recv`], so the
/// thread that polls is the coordination context.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch_settings.clone()));
        Self::with_workers(config, fetcher, Arc::new(SepiaTransformer))
    }

    /// Constructs the engine with caller-supplied workers; used by tests to
    /// substitute deterministic fetch/transform implementations.
    pub fn with_workers(
        config: EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        transformer: Arc<dyn Transformer>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || run_daemon(config, fetcher, transformer, cmd_rx, event_tx));

        Self { cmd_tx, event_rx }
    }

    pub fn load_catalog(&self, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::LoadCatalog { url: url.into() });
    }

    pub fn start_fetch(&self, task_id: TaskId, photo_id: PhotoId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::StartFetch {
            task_id,
            photo_id,
            url: url.into(),
        });
    }

    pub fn start_transform(&self, task_id: TaskId, photo_id: PhotoId, raw: Vec<u8>) {
        let _ = self.cmd_tx.send(EngineCommand::StartTransform {
            task_id,
            photo_id,
            raw,
        });
    }

    pub fn cancel(&self, task_id: TaskId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { task_id });
    }

    pub fn set_suspended(&self, suspended: bool) {
        let _ = self.cmd_tx.send(EngineCommand::SetSuspended(suspended));
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

type TokenMap = Arc<Mutex<HashMap<TaskId, CancellationToken>>>;

fn remove_token(tokens: &TokenMap, task_id: TaskId) -> Option<CancellationToken> {
    tokens.lock().ok()?.remove(&task_id)
}

fn insert_token(tokens: &TokenMap, task_id: TaskId, token: CancellationToken) {
    if let Ok(mut map) = tokens.lock() {
        map.insert(task_id, token);
    }
}

fn run_daemon(
    config: EngineConfig,
    fetcher: Arc<dyn Fetcher>,
    transformer: Arc<dyn Transformer>,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            engine_error!("engine daemon could not start a tokio runtime: {}", err);
            return;
        }
    };
    let (fetch_queue, transform_queue) = {
        let _guard = runtime.enter();
        (
            StageQueue::new("fetch", config.fetch_concurrency),
            StageQueue::new("transform", config.transform_concurrency),
        )
    };
    let tokens: TokenMap = Arc::default();

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::LoadCatalog { url } => {
                let event_tx = event_tx.clone();
                let settings = config.fetch_settings.clone();
                runtime.spawn(async move {
                    let event = match catalog::load_catalog(&url, &settings).await {
                        Ok(entries) => EngineEvent::CatalogLoaded(entries),
                        Err(err) => {
                            engine_warn!("catalog load failed: {}", err);
                            EngineEvent::CatalogFailed(err)
                        }
                    };
                    let _ = event_tx.send(event);
                });
            }
            EngineCommand::StartFetch {
                task_id,
                photo_id,
                url,
            } => {
                let token = CancellationToken::new();
                insert_token(&tokens, task_id, token.clone());
                let fetcher = Arc::clone(&fetcher);
                let event_tx = event_tx.clone();
                let tokens = Arc::clone(&tokens);
                fetch_queue.enqueue(token.clone(), async move {
                    let result = tokio::select! {
                        _ = token.cancelled() => {
                            remove_token(&tokens, task_id);
                            return;
                        }
                        result = fetcher.fetch(photo_id, &url) => {
                            result.map_err(StageError::Fetch)
                        }
                    };
                    remove_token(&tokens, task_id);
                    // Cancellation is checked at the exit point, right before
                    // reporting; a cancelled task reports nothing.
                    if token.is_cancelled() {
                        return;
                    }
                    if let Err(err) = &result {
                        engine_warn!("fetch for photo {} failed: {}", photo_id, err);
                    }
                    let _ = event_tx.send(EngineEvent::StageFinished {
                        photo_id,
                        task_id,
                        stage: StageKind::Fetch,
                        result,
                    });
                });
            }
            EngineCommand::StartTransform {
                task_id,
                photo_id,
                raw,
            } => {
                let token = CancellationToken::new();
                insert_token(&tokens, task_id, token.clone());
                let transformer = Arc::clone(&transformer);
                let event_tx = event_tx.clone();
                let tokens = Arc::clone(&tokens);
                transform_queue.enqueue(token.clone(), async move {
                    let work = tokio::task::spawn_blocking(move || transformer.transform(&raw));
                    let result = tokio::select! {
                        _ = token.cancelled() => {
                            remove_token(&tokens, task_id);
                            return;
                        }
                        joined = work => match joined {
                            Ok(result) => result.map_err(StageError::Transform),
                            Err(err) => {
                                Err(StageError::Internal(format!("transform task panicked: {err}")))
                            }
                        },
                    };
                    remove_token(&tokens, task_id);
                    if token.is_cancelled() {
                        return;
                    }
                    if let Err(err) = &result {
                        engine_warn!("transform for photo {} failed: {}", photo_id, err);
                    }
                    let _ = event_tx.send(EngineEvent::StageFinished {
                        photo_id,
                        task_id,
                        stage: StageKind::Transform,
                        result,
                    });
                });
            }
            EngineCommand::Cancel { task_id } => {
                // Unknown ids (already finished, or double-cancel) are no-ops.
                if let Some(token) = remove_token(&tokens, task_id) {
                    token.cancel();
                }
            }
            EngineCommand::SetSuspended(suspended) => {
                fetch_queue.set_suspended(suspended);
                transform_queue.set_suspended(suspended);
            }
        }
    }
}
