use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use engine_logging::engine_trace;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio_util::sync::CancellationToken;

type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct QueuedTask {
    token: CancellationToken,
    work: TaskFuture,
}

/// Suspendable, concurrency-bounded dispatcher for cancellable futures.
///
/// Admission order among ready tasks is not part of the contract. Suspension
/// gates only tasks that have not been dispatched yet; running tasks are
/// unaffected. A task whose token is cancelled before dispatch never runs.
pub struct StageQueue {
    queue_tx: mpsc::UnboundedSender<QueuedTask>,
    suspend_tx: watch::Sender<bool>,
}

impl StageQueue {
    /// Spawns the dispatcher. Must be called from within a tokio runtime.
    pub fn new(name: &'static str, limit: usize) -> Self {
        let (queue_tx, mut queue_rx) = mpsc::unbounded_channel::<QueuedTask>();
        let (suspend_tx, mut suspend_rx) = watch::channel(false);
        let permits = Arc::new(Semaphore::new(limit));

        tokio::spawn(async move {
            while let Some(task) = queue_rx.recv().await {
                // Hold not-yet-started work while the viewport is scrolling.
                while *suspend_rx.borrow() {
                    if suspend_rx.changed().await.is_err() {
                        return;
                    }
                }
                if task.token.is_cancelled() {
                    engine_trace!("{} queue: dropping task cancelled before start", name);
                    continue;
                }
                let permit = match Arc::clone(&permits).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                tokio::spawn(async move {
                    let _permit = permit;
                    task.work.await;
                });
            }
        });

        Self {
            queue_tx,
            suspend_tx,
        }
    }

    /// Admits a unit of work. The future itself is responsible for observing
    /// its token at the completion boundary.
    pub fn enqueue(
        &self,
        token: CancellationToken,
        work: impl Future<Output = ()> + Send + 'static,
    ) {
        let _ = self.queue_tx.send(QueuedTask {
            token,
            work: Box::pin(work),
        });
    }

    pub fn set_suspended(&self, suspended: bool) {
        let _ = self.suspend_tx.send(suspended);
    }
}
